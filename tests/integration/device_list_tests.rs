use drivermatch::devices::{parse_device_arg, DeviceList, DeviceListError, PatternError};
use std::fs;
use tempfile::tempdir;

const INVENTORY: &str = "\
# Device inventory, workstation WS-0142
Intel Ethernet Connection I219-V    PCI\\VEN_8086&DEV_15BC&SUBSYS_86721043&REV_00\\3&11583659&0&FE
NVIDIA GeForce GTX 1650\tPCI\\VEN_10DE&DEV_1F82&SUBSYS_86EB1043&REV_A1\\4&2283F625&0&0008

Realtek High Definition Audio\tHDAUDIO\\FUNC_01&VEN_10EC&DEV_0887&SUBSYS_104386C7&REV_1003\\4&3A8C4D1A&0&0001
USB Root Hub (USB 3.0)   USB\\ROOT_HUB30\\4&1F3E2A5C&0&0
";

#[test]
fn test_parse_inventory() {
    let list = DeviceList::parse(INVENTORY).unwrap();

    let summary: Vec<_> = list
        .iter()
        .map(|d| (d.name.as_str(), d.pattern.as_str()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (
                "Intel Ethernet Connection I219-V",
                "PCI\\VEN_8086&DEV_15BC&SUBSYS_86721043"
            ),
            (
                "NVIDIA GeForce GTX 1650",
                "PCI\\VEN_10DE&DEV_1F82&SUBSYS_86EB1043"
            ),
            (
                "Realtek High Definition Audio",
                "HDAUDIO\\FUNC_01&VEN_10EC&DEV_0887&SUBSYS_104386C7"
            ),
            ("USB Root Hub (USB 3.0)", "USB\\ROOT_HUB30"),
        ]
    );
}

#[test]
fn test_parse_utf16_inventory_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("devices.txt");
    let mut bytes = vec![0xFF, 0xFE];
    for unit in INVENTORY.encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    fs::write(&path, bytes).unwrap();

    let text = drivermatch::scanner::read_text(&path).unwrap();
    let list = DeviceList::parse(&text).unwrap();
    assert_eq!(list.len(), 4);
}

#[test]
fn test_duplicate_names_first_wins() {
    let list = DeviceList::parse(
        "LAN\tPCI\\VEN_8086&DEV_15BC\\0\nLAN\tPCI\\VEN_8086&DEV_15B8\\0\nWLAN\tPCI\\VEN_8086&DEV_2723\\0\n",
    )
    .unwrap();

    assert_eq!(list.len(), 2);
    assert_eq!(list.as_slice()[0].pattern.as_str(), "PCI\\VEN_8086&DEV_15BC");
    assert_eq!(list.as_slice()[1].name, "WLAN");
}

#[test]
fn test_malformed_line_reports_line_number() {
    let text = "LAN\tPCI\\VEN_8086&DEV_15BC\n# comment\n\nJust a name\n";
    let err = DeviceList::parse(text).unwrap_err();
    assert!(matches!(err, DeviceListError::Malformed { line: 4, .. }));
    assert!(err.to_string().starts_with("Line 4:"));
}

#[test]
fn test_comments_only_is_empty() {
    let err = DeviceList::parse("# nothing\n\n   \n").unwrap_err();
    assert!(matches!(err, DeviceListError::Empty));
}

#[test]
fn test_device_argument() {
    let spec = parse_device_arg("Intel LAN=PCI\\VEN_8086&DEV_15BC&REV_00\\3&11583659&0&FE").unwrap();
    assert_eq!(spec.name, "Intel LAN");
    assert_eq!(spec.pattern.as_str(), "PCI\\VEN_8086&DEV_15BC");

    assert!(matches!(
        parse_device_arg("no separator"),
        Err(DeviceListError::InvalidArgument(_))
    ));
    assert!(matches!(
        parse_device_arg("=PCI\\VEN_8086"),
        Err(DeviceListError::InvalidArgument(_))
    ));
}

#[test]
fn test_pattern_metacharacters_pass_through() {
    // Only backslashes are escaped; other metacharacters keep their regex meaning
    let list = DeviceList::parse("Odd\tACPI\\PNP0A0.\\0\n").unwrap();
    let device = &list.as_slice()[0];
    assert!(device.pattern.is_match("ACPI\\PNP0A08"));
    assert!(device.pattern.is_match("ACPI\\PNP0A03"));
}

#[test]
fn test_invalid_expression_is_input_error() {
    let err = DeviceList::parse("Broken\tPCI\\VEN_(8086\\0\n").unwrap_err();
    assert!(matches!(
        err,
        DeviceListError::InvalidPattern {
            line: 1,
            source: PatternError::InvalidExpression { .. }
        }
    ));
}
