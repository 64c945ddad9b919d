use drivermatch::cache::{CacheError, CacheManager, DriverCache, RebuildReason};
use drivermatch::scanner::WalkerConfig;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn drivers() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("net.inf"),
        "%LAN% = Install, PCI\\VEN_8086&DEV_15BC\n%WLAN% = Install, PCI\\VEN_8086&DEV_2723\n",
    )
    .unwrap();
    dir
}

fn built_cache(drivers: &Path, cache_dir: &Path) -> CacheManager {
    let manager = CacheManager::new(cache_dir, drivers, WalkerConfig::default());
    manager.load_or_build(false).unwrap();
    manager
}

#[test]
fn test_load_garbage_file() {
    let cache_dir = TempDir::new().unwrap();
    let path = cache_dir.path().join("cache.txt");
    fs::write(&path, b"not a driver cache").unwrap();

    let result = DriverCache::load(&path);
    assert!(matches!(result, Err(CacheError::MissingHeader)));
}

#[test]
fn test_truncated_cache_is_rebuilt() {
    let drivers = drivers();
    let cache_dir = TempDir::new().unwrap();
    let manager = built_cache(drivers.path(), cache_dir.path());

    // Drop the last entry line
    let content = fs::read_to_string(manager.cache_path()).unwrap();
    let truncated: String = content.lines().take(2).map(|l| format!("{l}\n")).collect();
    fs::write(manager.cache_path(), truncated).unwrap();

    assert!(matches!(
        DriverCache::load(manager.cache_path()),
        Err(CacheError::CountMismatch { .. })
    ));

    let loaded = manager.load_or_build(false).unwrap();
    assert!(matches!(loaded.rebuilt, Some(RebuildReason::Invalid(_))));
    assert_eq!(loaded.cache.len(), 2);

    // The rebuilt file is valid again
    assert_eq!(DriverCache::load(manager.cache_path()).unwrap().len(), 2);
}

#[test]
fn test_edited_cache_is_rebuilt() {
    let drivers = drivers();
    let cache_dir = TempDir::new().unwrap();
    let manager = built_cache(drivers.path(), cache_dir.path());

    let content = fs::read_to_string(manager.cache_path()).unwrap();
    fs::write(manager.cache_path(), content.replace("DEV_15BC", "DEV_0000")).unwrap();

    let loaded = manager.load_or_build(false).unwrap();
    assert_eq!(
        loaded.rebuilt,
        Some(RebuildReason::Invalid(
            CacheError::ChecksumMismatch.to_string()
        ))
    );
    assert!(loaded.cache.entries()[0].line.contains("DEV_15BC"));
}

#[test]
fn test_empty_cache_file_is_rebuilt() {
    let drivers = drivers();
    let cache_dir = TempDir::new().unwrap();
    let manager = CacheManager::new(cache_dir.path(), drivers.path(), WalkerConfig::default());
    fs::write(manager.cache_path(), b"").unwrap();

    let loaded = manager.load_or_build(false).unwrap();
    assert!(matches!(loaded.rebuilt, Some(RebuildReason::Invalid(_))));
}

#[test]
fn test_future_version_is_rebuilt() {
    let drivers = drivers();
    let cache_dir = TempDir::new().unwrap();
    let manager = built_cache(drivers.path(), cache_dir.path());

    let content = fs::read_to_string(manager.cache_path()).unwrap();
    fs::write(
        manager.cache_path(),
        content.replacen("\"version\":1", "\"version\":2", 1),
    )
    .unwrap();

    let loaded = manager.load_or_build(false).unwrap();
    assert_eq!(
        loaded.rebuilt,
        Some(RebuildReason::Invalid(
            CacheError::UnsupportedVersion {
                found: 2,
                expected: 1
            }
            .to_string()
        ))
    );
}

#[test]
fn test_no_temporary_file_left_behind() {
    let drivers = drivers();
    let cache_dir = TempDir::new().unwrap();
    built_cache(drivers.path(), cache_dir.path());

    let names: Vec<_> = fs::read_dir(cache_dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["driver-cache.txt"]);
}

#[cfg(unix)]
#[test]
fn test_unwritable_cache_dir_is_error() {
    use std::os::unix::fs::PermissionsExt;

    let drivers = drivers();
    let cache_dir = TempDir::new().unwrap();
    let locked = cache_dir.path().join("locked");
    fs::create_dir(&locked).unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o555)).unwrap();

    // Root ignores directory permissions; only assert when the lock holds
    let probe = locked.join("probe");
    if fs::write(&probe, b"x").is_err() {
        let manager = CacheManager::new(&locked, drivers.path(), WalkerConfig::default());
        let result = manager.load_or_build(false);
        assert!(matches!(result, Err(CacheError::Io { .. })));
    } else {
        fs::remove_file(&probe).unwrap();
    }

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
}
