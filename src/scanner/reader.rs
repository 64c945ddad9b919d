//! Text decoding for driver-description files.
//!
//! Description files ship in either UTF-8/ANSI or UTF-16 (little-endian, with
//! BOM, is the common Windows case). The BOM decides the decoding; files
//! without one are read as UTF-8, replacing invalid sequences.

use std::path::Path;

use super::ScanError;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16_LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16_BE_BOM: &[u8] = &[0xFE, 0xFF];

/// Read and decode a description file.
///
/// # Errors
///
/// Returns [`ScanError`] if the file cannot be read.
pub fn read_text(path: &Path) -> Result<String, ScanError> {
    let bytes = std::fs::read(path).map_err(|e| ScanError::from_io(path.to_path_buf(), e))?;
    Ok(decode_text(&bytes))
}

/// Decode raw file bytes into text.
///
/// # Examples
///
/// ```
/// use drivermatch::scanner::decode_text;
///
/// let utf16: Vec<u8> = [0xFF, 0xFE]
///     .into_iter()
///     .chain("PCI\\VEN_8086".encode_utf16().flat_map(u16::to_le_bytes))
///     .collect();
/// assert_eq!(decode_text(&utf16), "PCI\\VEN_8086");
/// assert_eq!(decode_text(b"plain"), "plain");
/// ```
#[must_use]
pub fn decode_text(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(UTF8_BOM) {
        String::from_utf8_lossy(rest).into_owned()
    } else if let Some(rest) = bytes.strip_prefix(UTF16_LE_BOM) {
        decode_utf16(rest, u16::from_le_bytes)
    } else if let Some(rest) = bytes.strip_prefix(UTF16_BE_BOM) {
        decode_utf16(rest, u16::from_be_bytes)
    } else {
        String::from_utf8_lossy(bytes).into_owned()
    }
}

fn decode_utf16(bytes: &[u8], to_unit: fn([u8; 2]) -> u16) -> String {
    // A trailing odd byte is dropped
    let units = bytes.chunks_exact(2).map(|pair| to_unit([pair[0], pair[1]]));
    char::decode_utf16(units)
        .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}
