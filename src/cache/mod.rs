//! Driver cache module.
//!
//! The cache is a flat, line-oriented index of every hardware-ID line found
//! in the driver tree, each paired with the description file it came from.
//! Building it walks and decodes every description file, which is slow on a
//! network share; matching against it is a single in-memory pass.
//!
//! # Architecture
//!
//! * [`entry`]: The `(line, source file)` pair and its single-line encoding.
//! * [`store`]: The cache file format, integrity checks and atomic writes.
//! * [`builder`]: Extraction of hardware-ID lines from the driver tree.
//! * [`manager`]: Deciding between reusing the persisted cache and rebuilding.
//!
//! # Lifecycle
//!
//! A cache is built (or rebuilt) at the start of a run and is read-only for
//! the rest of it. It is never updated incrementally: any change to the
//! driver tree is picked up by a full rebuild, either forced with the
//! refresh flag or triggered when the persisted cache is missing, corrupt,
//! or was built from a different root.

pub mod builder;
pub mod entry;
pub mod manager;
pub mod store;

use std::path::PathBuf;

pub use builder::{extract_hardware_id_lines, BuildSummary, IndexBuilder};
pub use entry::{CacheEntry, CACHE_SEPARATOR};
pub use manager::{CacheManager, LoadedCache, RebuildReason};
pub use store::{CacheHeader, DriverCache, CACHE_FILE_NAME, CACHE_VERSION};

use crate::scanner::ScanError;

/// Errors that can occur while building, reading or writing the cache.
#[derive(thiserror::Error, Debug)]
pub enum CacheError {
    /// No cache file exists at the given path.
    #[error("Cache file not found: {0}")]
    NotFound(PathBuf),

    /// The first line is not a readable cache header.
    #[error("Cache header is missing or unreadable")]
    MissingHeader,

    /// The cache was written by an incompatible version.
    #[error("Unsupported cache version: {found} (expected {expected})")]
    UnsupportedVersion {
        /// Version found in the header
        found: u32,
        /// Version this build understands
        expected: u32,
    },

    /// An entry line could not be decoded.
    #[error("Malformed cache entry on line {0}")]
    MalformedEntry(usize),

    /// The number of entries differs from the header.
    #[error("Cache entry count mismatch: header says {expected}, found {found}")]
    CountMismatch {
        /// Count recorded in the header
        expected: usize,
        /// Count actually read
        found: usize,
    },

    /// The entry checksum differs from the header.
    #[error("Cache checksum mismatch: the file may be corrupted")]
    ChecksumMismatch,

    /// The driver tree could not be scanned.
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// An I/O error occurred on a specific path.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// An I/O error occurred while streaming cache content.
    #[error("Cache I/O error: {0}")]
    Stream(#[from] std::io::Error),

    /// The header could not be encoded.
    #[error("Failed to encode cache header: {0}")]
    Header(#[from] serde_json::Error),
}

impl CacheError {
    /// Whether this error means the persisted cache is unusable and should
    /// be rebuilt rather than reported.
    #[must_use]
    pub fn is_invalid_content(&self) -> bool {
        matches!(
            self,
            Self::MissingHeader
                | Self::UnsupportedVersion { .. }
                | Self::MalformedEntry(_)
                | Self::CountMismatch { .. }
                | Self::ChecksumMismatch
                | Self::Stream(_)
        )
    }
}
