//! Plain-text report: one `device >>> path` line per record.

use std::io::{self, Write};
use std::path::Path;

use yansi::Paint;

use crate::matcher::{shorten_path, MatchOutcome, RECORD_SEPARATOR};

/// Message printed when nothing matched.
pub const NO_MATCHES_MESSAGE: &str = "No matches found.";

/// Human-readable report of a matching pass.
#[derive(Debug, Clone, Copy)]
pub struct TextOutput<'a> {
    outcome: &'a MatchOutcome,
    root: &'a Path,
    color: bool,
}

impl<'a> TextOutput<'a> {
    /// Create a report; paths are shown relative to `root` where possible.
    #[must_use]
    pub fn new(outcome: &'a MatchOutcome, root: &'a Path, color: bool) -> Self {
        Self {
            outcome,
            root,
            color,
        }
    }

    /// Write the report.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        if self.outcome.is_empty() {
            return writeln!(writer, "{NO_MATCHES_MESSAGE}");
        }

        for record in &self.outcome.records {
            if self.color {
                writeln!(
                    writer,
                    "{}{}{}",
                    record.device.as_str().bold(),
                    RECORD_SEPARATOR,
                    shorten_path(&record.source, self.root)
                )?;
            } else {
                writeln!(writer, "{}", record.display_relative(self.root))?;
            }
        }
        Ok(())
    }
}
