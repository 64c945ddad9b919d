use drivermatch::cache::{CacheManager, DriverCache, IndexBuilder, RebuildReason, CACHE_SEPARATOR};
use drivermatch::devices::DeviceList;
use drivermatch::matcher::DeviceMatcher;
use drivermatch::scanner::WalkerConfig;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn sample_tree() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "Intel/Chipset/lpc.inf",
        "[Version]\nSignature=\"$WINDOWS NT$\"\n\n[Intel.NTamd64]\n\
         %LPC% = Needs, PCI\\VEN_8086&DEV_A2C8\n%SMBus% = Needs, PCI\\VEN_8086&DEV_A2A3\n",
    );
    write(
        dir.path(),
        "Nvidia/display.inf",
        "%GPU% = Section001, PCI\\VEN_10DE&DEV_1F08&SUBSYS_12AF10DE\n",
    );
    write(dir.path(), "Readme/readme.txt", "PCI\\VEN_8086&DEV_A2C8\n");
    dir
}

#[test]
fn test_build_persist_load_round_trip() {
    let drivers = sample_tree();
    let cache_dir = TempDir::new().unwrap();
    let cache_path = cache_dir.path().join("cache.txt");

    let (cache, summary) = IndexBuilder::new(drivers.path(), WalkerConfig::default())
        .build()
        .unwrap();
    assert_eq!(summary.files_scanned, 2);
    assert_eq!(cache.len(), 3);

    cache.save(&cache_path).unwrap();
    let loaded = DriverCache::load(&cache_path).unwrap();

    assert_eq!(loaded.entries(), cache.entries());
    assert_eq!(loaded.root(), drivers.path());
}

#[test]
fn test_cache_file_is_one_line_per_entry() {
    let drivers = sample_tree();
    let cache_dir = TempDir::new().unwrap();
    let manager = CacheManager::new(cache_dir.path(), drivers.path(), WalkerConfig::default());

    manager.load_or_build(false).unwrap();

    let content = fs::read_to_string(manager.cache_path()).unwrap();
    let lines: Vec<_> = content.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with('#'));
    for line in &lines[1..] {
        assert_eq!(line.matches(CACHE_SEPARATOR).count(), 1);
        assert!(line.ends_with(".inf"));
    }
}

#[test]
fn test_entries_follow_file_order() {
    let drivers = sample_tree();
    let (cache, _) = IndexBuilder::new(drivers.path(), WalkerConfig::default())
        .build()
        .unwrap();

    let lines: Vec<_> = cache.entries().iter().map(|e| e.line.as_str()).collect();
    assert_eq!(
        lines,
        vec![
            "%LPC% = Needs, PCI\\VEN_8086&DEV_A2C8",
            "%SMBus% = Needs, PCI\\VEN_8086&DEV_A2A3",
            "%GPU% = Section001, PCI\\VEN_10DE&DEV_1F08&SUBSYS_12AF10DE",
        ]
    );
}

#[test]
fn test_ignore_patterns_exclude_directories() {
    let drivers = sample_tree();
    let config = WalkerConfig::default().with_ignore_patterns(vec!["Nvidia/".to_string()]);

    let (cache, summary) = IndexBuilder::new(drivers.path(), config).build().unwrap();

    assert_eq!(summary.files_scanned, 1);
    assert!(cache
        .entries()
        .iter()
        .all(|e| !e.source.to_string_lossy().contains("Nvidia")));
}

#[test]
fn test_extension_filter_is_configurable() {
    let drivers = sample_tree();
    let config = WalkerConfig::default().with_extensions(vec![".TXT".to_string()]);

    let (cache, _) = IndexBuilder::new(drivers.path(), config).build().unwrap();

    assert_eq!(cache.len(), 1);
    assert!(cache.entries()[0].source.ends_with("Readme/readme.txt"));
}

#[test]
fn test_matching_against_loaded_cache() {
    let drivers = sample_tree();
    let cache_dir = TempDir::new().unwrap();
    let manager = CacheManager::new(cache_dir.path(), drivers.path(), WalkerConfig::default());
    manager.load_or_build(false).unwrap();

    let loaded = manager.load_or_build(false).unwrap();
    assert!(loaded.rebuilt.is_none());

    let devices = DeviceList::parse(
        "GPU\tPCI\\VEN_10DE&DEV_1F08&SUBSYS_12AF10DE&REV_A1\\4&2283F625&0&0019\n\
         SMBus\tPCI\\VEN_8086&DEV_A2A3&REV_00\\3&11583659&0&FC\n",
    )
    .unwrap();
    let outcome = DeviceMatcher::new(&devices).find_matches(loaded.cache.entries());

    let devices_found: Vec<_> = outcome.records.iter().map(|r| r.device.as_str()).collect();
    assert_eq!(devices_found, vec!["GPU", "SMBus"]);
    assert!(outcome.records[0].source.ends_with("Nvidia/display.inf"));
    assert!(outcome.records[1].source.ends_with("Intel/Chipset/lpc.inf"));
}

#[test]
fn test_forced_rebuild_reason() {
    let drivers = sample_tree();
    let cache_dir = TempDir::new().unwrap();
    let manager = CacheManager::new(cache_dir.path(), drivers.path(), WalkerConfig::default());

    let first = manager.load_or_build(true).unwrap();
    assert_eq!(first.rebuilt, Some(RebuildReason::Forced));
    assert_eq!(first.build_summary.unwrap().files_scanned, 2);
}
