//! JSON output formatter for match results.
//!
//! Provides machine-readable JSON output for scripting and automation.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "matches": [
//!     {
//!       "device": "Intel LAN",
//!       "path": "D:\\Drivers\\net\\e1d.inf",
//!       "relative_path": "net\\e1d.inf"
//!     }
//!   ],
//!   "summary": {
//!     "entries_total": 51234,
//!     "entries_scanned": 51234,
//!     "entries_skipped_same_file": 12,
//!     "devices": 4,
//!     "devices_matched": 1,
//!     "devices_saturated": 0
//!   },
//!   "cache": {
//!     "path": "C:\\Users\\op\\AppData\\Local\\drivermatch\\cache\\driver-cache.txt",
//!     "entries": 51234,
//!     "rebuilt": false
//!   },
//!   "exit_code": 0,
//!   "exit_code_name": "DM000"
//! }
//! ```

use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::error::ExitCode;
use crate::matcher::{shorten_path, MatchOutcome, MatchRecord, MatchStats};

/// A single match in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonMatch {
    /// Device name
    pub device: String,
    /// Full path of the description file
    pub path: String,
    /// Path relative to the driver root, or the full path outside it
    pub relative_path: String,
}

impl JsonMatch {
    /// Create a JSON match from a record.
    #[must_use]
    pub fn from_record(record: &MatchRecord, root: &Path) -> Self {
        Self {
            device: record.device.clone(),
            path: record.source.to_string_lossy().into_owned(),
            relative_path: shorten_path(&record.source, root),
        }
    }
}

/// Where the cache came from during this run.
#[derive(Debug, Clone, Serialize)]
pub struct JsonCacheInfo {
    /// Cache file path
    pub path: String,
    /// Entries in the cache
    pub entries: usize,
    /// Whether the cache was rebuilt
    pub rebuilt: bool,
    /// Why it was rebuilt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rebuild_reason: Option<String>,
}

/// Complete JSON output structure.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// Sorted matches
    pub matches: Vec<JsonMatch>,
    /// Matching statistics
    pub summary: MatchStats,
    /// Cache information, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<JsonCacheInfo>,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "DM000")
    pub exit_code_name: String,
}

impl JsonOutput {
    /// Create a new JSON output from a matching outcome and exit code.
    #[must_use]
    pub fn new(outcome: &MatchOutcome, root: &Path, exit_code: ExitCode) -> Self {
        Self {
            matches: outcome
                .records
                .iter()
                .map(|r| JsonMatch::from_record(r, root))
                .collect(),
            summary: outcome.stats.clone(),
            cache: None,
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }

    /// Attach cache information.
    #[must_use]
    pub fn with_cache(mut self, cache: JsonCacheInfo) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Serialize to compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write JSON to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), JsonOutputError> {
        let json = if pretty {
            self.to_json_pretty()?
        } else {
            self.to_json()?
        };
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}
