//! Scanner module for discovering and reading driver-description files.
//!
//! This module provides functionality for:
//! - Single-threaded, deterministic directory walking using walkdir
//! - Extension and gitignore-style filtering of the driver tree
//! - Decoding description files (UTF-8 or UTF-16 with BOM)
//!
//! # Architecture
//!
//! - [`walker`]: Directory traversal and file discovery
//! - [`reader`]: Byte-to-text decoding of description files
//!
//! # Example
//!
//! ```no_run
//! use drivermatch::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new(r"\\fileserver\drivers"), WalkerConfig::default());
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(file) => println!("{}: {} bytes", file.path.display(), file.size),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

pub mod reader;
pub mod walker;

use std::path::PathBuf;

pub use reader::{decode_text, read_text};
pub use walker::Walker;

/// Extension of Windows driver-description files.
pub const DEFAULT_EXTENSION: &str = "inf";

/// A discovered driver-description file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptionFile {
    /// Path to the file, rooted at the walk root
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
}

impl DescriptionFile {
    /// Create a new DescriptionFile.
    #[must_use]
    pub fn new(path: PathBuf, size: u64) -> Self {
        Self { path, size }
    }
}

/// Configuration for directory walking.
#[derive(Debug, Clone)]
pub struct WalkerConfig {
    /// File extensions to include, compared case-insensitively without the dot.
    pub extensions: Vec<String>,

    /// Glob patterns to ignore (gitignore-style).
    pub ignore_patterns: Vec<String>,

    /// Follow symbolic links during traversal.
    pub follow_symlinks: bool,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            extensions: vec![DEFAULT_EXTENSION.to_string()],
            ignore_patterns: Vec::new(),
            follow_symlinks: false,
        }
    }
}

impl WalkerConfig {
    /// Replace the extension filter.
    ///
    /// Leading dots are stripped, so `.inf` and `inf` are equivalent. An
    /// empty list keeps the current filter.
    #[must_use]
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        let cleaned: Vec<String> = extensions
            .into_iter()
            .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        if !cleaned.is_empty() {
            self.extensions = cleaned;
        }
        self
    }

    /// Set the ignore patterns.
    #[must_use]
    pub fn with_ignore_patterns(mut self, patterns: Vec<String>) -> Self {
        self.ignore_patterns = patterns;
        self
    }

    /// Set symlink following.
    #[must_use]
    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }
}

/// Errors that can occur while walking or reading the driver tree.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The specified path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl ScanError {
    /// Classify an I/O error for `path`.
    #[must_use]
    pub fn from_io(path: PathBuf, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            std::io::ErrorKind::NotFound => Self::NotFound(path),
            _ => Self::Io {
                path,
                source: error,
            },
        }
    }
}
