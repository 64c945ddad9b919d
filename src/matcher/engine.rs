//! Single-pass device matcher.
//!
//! # Scan rules
//!
//! Cache entries are visited in persisted order. For each entry:
//!
//! 1. If its source file is the file that most recently produced a match,
//!    the entry is skipped without testing any device.
//! 2. Otherwise devices are tried in list order, ignoring devices that
//!    already have [`MAX_MATCHES_PER_DEVICE`] records. The first device whose
//!    pattern occurs in the line is credited, the file becomes the most
//!    recent matching file, and no further devices are tried for this entry.
//!
//! Rule 1 is a coarse shortcut: once any device matched a file, the rest of
//! that file's lines are not examined, so a second device whose ID appears
//! later in the same file is not credited to it (unless the file shows up
//! again after some other file matched). Results therefore depend on scan
//! order; this is the intended behavior, not an oversight to correct.
//!
//! Finished records are sorted by the combined `device >>> path` string,
//! ignoring ASCII case, so `alpha` lists before `Zeta`.

use std::path::Path;

use super::{MatchOutcome, MatchRecord, MatchStats, MAX_MATCHES_PER_DEVICE};
use crate::cache::CacheEntry;
use crate::devices::DeviceList;

/// Mutable state of one matching pass.
#[derive(Debug)]
struct ScanState<'e> {
    /// Source file of the entry that produced the latest match
    last_matching_file: Option<&'e Path>,
    /// Records so far, indexed like the device list
    match_counts: Vec<usize>,
    /// Devices that have reached the cap
    saturated: usize,
}

impl<'e> ScanState<'e> {
    fn new(device_count: usize) -> Self {
        Self {
            last_matching_file: None,
            match_counts: vec![0; device_count],
            saturated: 0,
        }
    }

    fn is_covered(&self, source: &Path) -> bool {
        self.last_matching_file == Some(source)
    }

    fn is_saturated(&self, device_idx: usize) -> bool {
        self.match_counts[device_idx] >= MAX_MATCHES_PER_DEVICE
    }

    fn all_saturated(&self) -> bool {
        self.saturated == self.match_counts.len()
    }

    fn record(&mut self, device_idx: usize, source: &'e Path) {
        self.last_matching_file = Some(source);
        self.match_counts[device_idx] += 1;
        if self.match_counts[device_idx] == MAX_MATCHES_PER_DEVICE {
            self.saturated += 1;
        }
    }
}

/// Matches a device list against cache entries.
#[derive(Debug, Clone, Copy)]
pub struct DeviceMatcher<'d> {
    devices: &'d DeviceList,
}

impl<'d> DeviceMatcher<'d> {
    /// Create a matcher for `devices`.
    #[must_use]
    pub fn new(devices: &'d DeviceList) -> Self {
        Self { devices }
    }

    /// Run one pass over `entries`.
    ///
    /// # Example
    ///
    /// ```
    /// use drivermatch::cache::CacheEntry;
    /// use drivermatch::devices::DeviceList;
    /// use drivermatch::matcher::DeviceMatcher;
    ///
    /// let devices = DeviceList::parse(r"LAN PCI\VEN_8086&DEV_15BC&REV_00\3&1").unwrap();
    /// let entries = vec![CacheEntry::new(r"%L% = I, PCI\VEN_8086&DEV_15BC", "/drv/e1d.inf")];
    ///
    /// let outcome = DeviceMatcher::new(&devices).find_matches(&entries);
    /// assert_eq!(outcome.records[0].to_string(), "LAN >>> /drv/e1d.inf");
    /// ```
    #[must_use]
    pub fn find_matches(&self, entries: &[CacheEntry]) -> MatchOutcome {
        let mut state = ScanState::new(self.devices.len());
        let mut records = Vec::new();
        let mut stats = MatchStats {
            entries_total: entries.len(),
            devices: self.devices.len(),
            ..MatchStats::default()
        };

        for entry in entries {
            if state.all_saturated() {
                log::debug!("All devices saturated; stopping scan early");
                break;
            }
            stats.entries_scanned += 1;

            if state.is_covered(&entry.source) {
                stats.entries_skipped_same_file += 1;
                continue;
            }

            for (idx, device) in self.devices.iter().enumerate() {
                if state.is_saturated(idx) {
                    continue;
                }
                if device.pattern.is_match(&entry.line) {
                    log::debug!(
                        "{} matched {} in {}",
                        device.name,
                        device.pattern,
                        entry.source.display()
                    );
                    records.push(MatchRecord::new(device.name.clone(), entry.source.clone()));
                    state.record(idx, &entry.source);
                    break;
                }
            }
        }

        records.sort_by_cached_key(MatchRecord::sort_key);

        stats.devices_matched = state.match_counts.iter().filter(|&&c| c > 0).count();
        stats.devices_saturated = state.saturated;

        MatchOutcome { records, stats }
    }
}
