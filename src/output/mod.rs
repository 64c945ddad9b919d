//! Output formatters for match results.
//!
//! This module provides the report formats of the `find` command:
//! - Text, one `device >>> path` line per record, for people
//! - JSON for automation and scripting
//!
//! # Example
//!
//! ```
//! use drivermatch::error::ExitCode;
//! use drivermatch::matcher::{MatchOutcome, MatchRecord};
//! use drivermatch::output::{JsonOutput, TextOutput};
//! use std::path::Path;
//!
//! let mut outcome = MatchOutcome::default();
//! outcome.records.push(MatchRecord::new("LAN", "/drivers/net/e1d.inf"));
//!
//! let mut text = Vec::new();
//! TextOutput::new(&outcome, Path::new("/drivers"), false).write_to(&mut text).unwrap();
//!
//! let json = JsonOutput::new(&outcome, Path::new("/drivers"), ExitCode::Success);
//! assert_eq!(json.matches.len(), 1);
//! ```

pub mod json;
pub mod text;

// Re-export main types
pub use json::{JsonCacheInfo, JsonOutput, JsonOutputError};
pub use text::TextOutput;
