use clap::Parser;
use drivermatch::cache::CACHE_FILE_NAME;
use drivermatch::cli::Cli;
use drivermatch::devices::DeviceListError;
use drivermatch::error::ExitCode;
use drivermatch::run_app_to;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct Fixture {
    drivers: TempDir,
    cache: TempDir,
    config: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let drivers = TempDir::new().unwrap();
        let cache = TempDir::new().unwrap();
        // Empty config file keeps the user's real configuration out of the test
        let config = cache.path().join("test-config.toml");
        fs::write(&config, "").unwrap();
        Self {
            drivers,
            cache,
            config,
        }
    }

    fn write_inf(&self, rel: &str, content: &str) {
        let path = self.drivers.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn write_devices(&self, content: &str) -> PathBuf {
        let path = self.cache.path().join("devices.txt");
        fs::write(&path, content).unwrap();
        path
    }

    fn cache_file(&self) -> PathBuf {
        self.cache.path().join(CACHE_FILE_NAME)
    }

    fn run(&self, command: &str, extra: &[&str]) -> (anyhow::Result<ExitCode>, String) {
        let mut args: Vec<String> = vec![
            "drivermatch".into(),
            "--no-color".into(),
            "--config".into(),
            self.config.to_string_lossy().into_owned(),
            command.into(),
            "--driver-root".into(),
            self.drivers.path().to_string_lossy().into_owned(),
            "--cache-dir".into(),
            self.cache.path().to_string_lossy().into_owned(),
        ];
        args.extend(extra.iter().map(|s| s.to_string()));

        let cli = Cli::try_parse_from(args).unwrap();
        let mut out = Vec::new();
        let result = run_app_to(&cli, &mut out, false);
        (result, String::from_utf8(out).unwrap())
    }
}

fn rel(path: &str) -> String {
    Path::new(path).display().to_string()
}

#[test]
fn test_round_trip_single_file() {
    let fx = Fixture::new();
    fx.write_inf(
        "chipset/lpc.inf",
        "[Intel.NTamd64]\r\n%LPC% = Needs, PCI\\VEN_8086&DEV_A2C8\r\n",
    );
    fx.write_inf("gpu/nv.inf", "%GPU% = Inst, PCI\\VEN_10DE&DEV_1F08\n");

    let (result, out) = fx.run(
        "find",
        &["--device", "LPC Controller=PCI\\VEN_8086&DEV_A2C8&REV_00\\3&11583659&0&F8"],
    );

    assert_eq!(result.unwrap(), ExitCode::Success);
    assert_eq!(out, format!("LPC Controller >>> {}\n", rel("chipset/lpc.inf")));
    assert!(fx.cache_file().exists());
}

#[test]
fn test_no_matches_reports_message() {
    let fx = Fixture::new();
    fx.write_inf("gpu/nv.inf", "%GPU% = Inst, PCI\\VEN_10DE&DEV_1F08\n");

    let (result, out) = fx.run("find", &["--device", "LAN=PCI\\VEN_8086&DEV_15BC"]);

    assert_eq!(result.unwrap(), ExitCode::NoMatches);
    assert_eq!(out, "No matches found.\n");
}

#[test]
fn test_cap_of_three_per_device() {
    let fx = Fixture::new();
    for i in 0..6 {
        fx.write_inf(
            &format!("pkg{i}/audio.inf"),
            "%Codec% = Inst, HDAUDIO\\FUNC_01&VEN_10EC&DEV_0887\n",
        );
    }

    let (result, out) = fx.run(
        "find",
        &["--device", "Audio=HDAUDIO\\FUNC_01&VEN_10EC&DEV_0887&REV_1003\\4&2F3A1C&0&0001"],
    );

    assert_eq!(result.unwrap(), ExitCode::Success);
    let lines: Vec<_> = out.lines().collect();
    assert_eq!(
        lines,
        vec![
            format!("Audio >>> {}", rel("pkg0/audio.inf")),
            format!("Audio >>> {}", rel("pkg1/audio.inf")),
            format!("Audio >>> {}", rel("pkg2/audio.inf")),
        ]
    );
}

#[test]
fn test_sorted_by_device_name() {
    let fx = Fixture::new();
    fx.write_inf("a.inf", "%Z% = I, PCI\\VEN_2222&DEV_0002\n");
    fx.write_inf("b.inf", "%A% = I, PCI\\VEN_1111&DEV_0001\n");
    let devices = fx.write_devices(
        "Zeta Device\tPCI\\VEN_2222&DEV_0002\\0\nAlpha Device\tPCI\\VEN_1111&DEV_0001\\0\n",
    );

    let (result, out) = fx.run("find", &["--devices", devices.to_str().unwrap()]);

    assert_eq!(result.unwrap(), ExitCode::Success);
    let lines: Vec<_> = out.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("Alpha Device >>> "));
    assert!(lines[1].starts_with("Zeta Device >>> "));
}

#[test]
fn test_same_file_shortcut_is_preserved() {
    let fx = Fixture::new();
    // a.inf lists both devices; the second device is only credited to b.inf
    fx.write_inf(
        "a.inf",
        "%One% = I, PCI\\VEN_1111&DEV_0001\n%Two% = I, PCI\\VEN_2222&DEV_0002\n",
    );
    fx.write_inf("b.inf", "%Two% = I, PCI\\VEN_2222&DEV_0002\n");

    let (result, out) = fx.run(
        "find",
        &[
            "--device",
            "One=PCI\\VEN_1111&DEV_0001",
            "--device",
            "Two=PCI\\VEN_2222&DEV_0002",
        ],
    );

    assert_eq!(result.unwrap(), ExitCode::Success);
    let lines: Vec<_> = out.lines().collect();
    assert_eq!(
        lines,
        vec![
            format!("One >>> {}", rel("a.inf")),
            format!("Two >>> {}", rel("b.inf")),
        ]
    );
}

#[test]
fn test_malformed_device_list_aborts_before_cache_io() {
    let fx = Fixture::new();
    fx.write_inf("a.inf", "%One% = I, PCI\\VEN_1111&DEV_0001\n");
    let devices = fx.write_devices("Good\tPCI\\VEN_1111&DEV_0001\nthis line has no instance path\n");

    let (result, out) = fx.run("find", &["--devices", devices.to_str().unwrap()]);

    let err = result.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<DeviceListError>(),
        Some(DeviceListError::Malformed { line: 2, .. })
    ));
    assert_eq!(ExitCode::for_error(&err), ExitCode::InvalidInput);
    assert!(out.is_empty());
    assert!(!fx.cache_file().exists());
}

#[test]
fn test_empty_device_input_is_fatal() {
    let fx = Fixture::new();
    let devices = fx.write_devices("# nothing here\n\n");

    let (result, _) = fx.run("find", &["--devices", devices.to_str().unwrap()]);

    let err = result.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<DeviceListError>(),
        Some(DeviceListError::Empty)
    ));
    assert!(!fx.cache_file().exists());
}

#[test]
fn test_no_device_source_is_fatal() {
    let fx = Fixture::new();
    let (result, _) = fx.run("find", &[]);
    let err = result.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<DeviceListError>(),
        Some(DeviceListError::NoSource)
    ));
    assert_eq!(ExitCode::for_error(&err), ExitCode::InvalidInput);
    assert!(!fx.cache_file().exists());
}

#[test]
fn test_missing_device_file_is_general_error() {
    let fx = Fixture::new();
    let missing = fx.cache.path().join("absent.txt");
    let (result, _) = fx.run("find", &["--devices", missing.to_str().unwrap()]);
    let err = result.unwrap_err();
    assert_eq!(ExitCode::for_error(&err), ExitCode::GeneralError);
}

#[test]
fn test_json_output() {
    let fx = Fixture::new();
    fx.write_inf("net/e1d.inf", "%LAN% = I, PCI\\VEN_8086&DEV_15BC\n");

    let (result, out) = fx.run(
        "find",
        &["--device", "LAN=PCI\\VEN_8086&DEV_15BC", "--output", "json"],
    );

    assert_eq!(result.unwrap(), ExitCode::Success);
    let value: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(value["matches"][0]["device"], "LAN");
    assert_eq!(value["matches"][0]["relative_path"], rel("net/e1d.inf"));
    assert_eq!(value["summary"]["devices_matched"], 1);
    assert_eq!(value["cache"]["rebuilt"], true);
    assert_eq!(value["cache"]["rebuild_reason"], "no cache found");
    assert_eq!(value["exit_code_name"], "DM000");
}

#[test]
fn test_index_then_find_reuses_cache() {
    let fx = Fixture::new();
    fx.write_inf("net/e1d.inf", "%LAN% = I, PCI\\VEN_8086&DEV_15BC\n");

    let (result, out) = fx.run("index", &[]);
    assert_eq!(result.unwrap(), ExitCode::Success);
    assert!(out.is_empty());
    assert!(fx.cache_file().exists());

    let (result, out) = fx.run(
        "find",
        &["--device", "LAN=PCI\\VEN_8086&DEV_15BC", "--output", "json"],
    );
    assert_eq!(result.unwrap(), ExitCode::Success);
    let value: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(value["cache"]["rebuilt"], false);
    assert_eq!(value["cache"]["entries"], 1);
}

#[test]
fn test_refresh_sees_new_files() {
    let fx = Fixture::new();
    fx.write_inf("a.inf", "%Old% = I, PCI\\VEN_1111&DEV_0001\n");
    let (result, _) = fx.run("index", &[]);
    result.unwrap();

    fx.write_inf("b.inf", "%New% = I, PCI\\VEN_2222&DEV_0002\n");

    let (result, out) = fx.run("find", &["--device", "New=PCI\\VEN_2222&DEV_0002"]);
    assert_eq!(result.unwrap(), ExitCode::NoMatches);
    assert_eq!(out, "No matches found.\n");

    let (result, out) = fx.run(
        "find",
        &["--device", "New=PCI\\VEN_2222&DEV_0002", "--refresh"],
    );
    assert_eq!(result.unwrap(), ExitCode::Success);
    assert_eq!(out, format!("New >>> {}\n", rel("b.inf")));
}

#[test]
fn test_utf16_description_file() {
    let fx = Fixture::new();
    let text = "%LAN% = I, PCI\\VEN_8086&DEV_15BC\r\n";
    let mut bytes = vec![0xFF, 0xFE];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    fs::write(fx.drivers.path().join("wide.inf"), bytes).unwrap();

    let (result, out) = fx.run("find", &["--device", "LAN=PCI\\VEN_8086&DEV_15BC"]);

    assert_eq!(result.unwrap(), ExitCode::Success);
    assert_eq!(out, format!("LAN >>> {}\n", rel("wide.inf")));
}

#[test]
fn test_missing_driver_root_is_error() {
    let fx = Fixture::new();
    let missing = fx.drivers.path().join("does-not-exist");
    let cli = Cli::try_parse_from([
        "drivermatch",
        "--config",
        fx.config.to_str().unwrap(),
        "index",
        "--driver-root",
        missing.to_str().unwrap(),
        "--cache-dir",
        fx.cache.path().to_str().unwrap(),
    ])
    .unwrap();

    let result = run_app_to(&cli, &mut Vec::new(), false);

    let err = result.unwrap_err();
    assert_eq!(ExitCode::for_error(&err), ExitCode::GeneralError);
    assert!(!fx.cache_file().exists());
}
