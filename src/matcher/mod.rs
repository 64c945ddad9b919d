//! Device matching module.
//!
//! This module provides functionality for:
//! - Matching a [`DeviceList`](crate::devices::DeviceList) against a loaded
//!   driver cache in one pass
//! - Capping results per device
//! - Producing sorted `device name >>> file path` records
//!
//! See [`engine`] for the scan rules.

pub mod engine;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

pub use engine::DeviceMatcher;

/// Maximum number of records kept for one device.
pub const MAX_MATCHES_PER_DEVICE: usize = 3;

/// Separator between device name and file path in reported records.
pub const RECORD_SEPARATOR: &str = " >>> ";

/// A device credited to a description file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchRecord {
    /// Device name as supplied by the operator
    pub device: String,
    /// Description file containing the device's hardware ID
    pub source: PathBuf,
}

impl MatchRecord {
    /// Create a new record.
    #[must_use]
    pub fn new(device: impl Into<String>, source: impl Into<PathBuf>) -> Self {
        Self {
            device: device.into(),
            source: source.into(),
        }
    }

    /// Ordering key: the combined `device >>> path` string compared with
    /// ASCII case folded, then exactly as written to break ties.
    #[must_use]
    pub fn sort_key(&self) -> (String, String) {
        let combined = self.to_string();
        (combined.to_ascii_lowercase(), combined)
    }

    /// Render with the source path made relative to `root` when possible.
    #[must_use]
    pub fn display_relative(&self, root: &Path) -> String {
        format!(
            "{}{}{}",
            self.device,
            RECORD_SEPARATOR,
            shorten_path(&self.source, root)
        )
    }
}

impl fmt::Display for MatchRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            self.device,
            RECORD_SEPARATOR,
            self.source.display()
        )
    }
}

/// Statistics from one matching pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchStats {
    /// Entries in the cache
    pub entries_total: usize,
    /// Entries examined before the pass ended
    pub entries_scanned: usize,
    /// Entries skipped because their file had just produced a match
    pub entries_skipped_same_file: usize,
    /// Devices searched for
    pub devices: usize,
    /// Devices with at least one record
    pub devices_matched: usize,
    /// Devices that reached [`MAX_MATCHES_PER_DEVICE`]
    pub devices_saturated: usize,
}

/// Sorted records plus statistics.
#[derive(Debug, Clone, Default)]
pub struct MatchOutcome {
    /// Records sorted by [`MatchRecord::sort_key`]
    pub records: Vec<MatchRecord>,
    /// Pass statistics
    pub stats: MatchStats,
}

impl MatchOutcome {
    /// Whether nothing matched at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records credited to `device`, in sorted order.
    pub fn records_for<'a>(&'a self, device: &'a str) -> impl Iterator<Item = &'a MatchRecord> {
        self.records.iter().filter(move |r| r.device == device)
    }
}

/// Path relative to `root`, or the full path when it lies outside `root`.
#[must_use]
pub fn shorten_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .ok()
        .filter(|rel| !rel.as_os_str().is_empty())
        .unwrap_or(path)
        .display()
        .to_string()
}
