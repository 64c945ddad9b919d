//! Cache entry definitions.

use std::fmt;
use std::path::{Path, PathBuf};

use super::CacheError;

/// Separator between line text and source path in a persisted entry.
///
/// The ASCII unit separator never occurs in a description file written by
/// hand; lines that do contain it are not indexed.
pub const CACHE_SEPARATOR: char = '\u{1F}';

/// One hardware-ID line and the description file it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// The source line, without its line terminator
    pub line: String,
    /// The description file the line was read from
    pub source: PathBuf,
}

impl CacheEntry {
    /// Create a new entry.
    #[must_use]
    pub fn new(line: impl Into<String>, source: impl Into<PathBuf>) -> Self {
        Self {
            line: line.into(),
            source: source.into(),
        }
    }

    /// Whether `line` can be persisted without ambiguity.
    #[must_use]
    pub fn is_storable_line(line: &str) -> bool {
        !line.contains(CACHE_SEPARATOR) && !line.contains('\n')
    }

    /// Whether `path` can be persisted as a single physical line.
    #[must_use]
    pub fn is_storable_path(path: &Path) -> bool {
        let text = path.to_string_lossy();
        !text.contains('\n') && !text.contains('\r')
    }

    /// Encode as a single cache line (without the trailing newline).
    #[must_use]
    pub fn to_cache_line(&self) -> String {
        format!(
            "{}{}{}",
            self.line,
            CACHE_SEPARATOR,
            self.source.to_string_lossy()
        )
    }

    /// Decode a persisted cache line.
    ///
    /// The first separator splits the pair; the line text never contains one.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::MalformedEntry`] if the separator is missing or
    /// the source path is empty.
    pub fn from_cache_line(raw: &str, line_number: usize) -> Result<Self, CacheError> {
        match raw.split_once(CACHE_SEPARATOR) {
            Some((line, source)) if !source.is_empty() => Ok(Self::new(line, source)),
            _ => Err(CacheError::MalformedEntry(line_number)),
        }
    }
}

impl fmt::Display for CacheEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.line.trim(), self.source.display())
    }
}
