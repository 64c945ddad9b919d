//! Directory walker for driver-description files.
//!
//! # Overview
//!
//! [`Walker`] traverses a driver tree with [`walkdir`] and yields every file
//! whose extension is in the configured set (`.inf` by default). The walk is
//! single-threaded and sorted by file name so that the file-processing order,
//! and therefore the cache order, is the same on every run.
//!
//! # Features
//!
//! - Deterministic ordering (entries sorted by file name at each level)
//! - Case-insensitive extension filtering
//! - Gitignore-style pattern matching via the `ignore` crate; ignored
//!   directories are pruned rather than descended into
//! - Optional symlink following (walkdir detects loops)
//!
//! # Example
//!
//! ```no_run
//! use drivermatch::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let config = WalkerConfig::default().with_ignore_patterns(vec!["x86/".to_string()]);
//! let walker = Walker::new(Path::new("D:/DriverStore"), config);
//! let files: Vec<_> = walker.walk().filter_map(Result::ok).collect();
//! println!("Found {} description files", files.len());
//! ```

use std::path::{Path, PathBuf};

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use walkdir::WalkDir;

use super::{DescriptionFile, ScanError, WalkerConfig};

/// Directory walker for description-file discovery.
#[derive(Debug)]
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
}

impl Walker {
    /// Create a new walker for the given path.
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        Self {
            root: path.to_path_buf(),
            config,
        }
    }

    /// Root of the walk.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Check that the root exists and is a directory.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::NotFound`], [`ScanError::PermissionDenied`] or
    /// [`ScanError::NotADirectory`] when the root cannot be walked.
    pub fn validate_root(&self) -> Result<(), ScanError> {
        let metadata = std::fs::metadata(&self.root)
            .map_err(|e| ScanError::from_io(self.root.clone(), e))?;
        if !metadata.is_dir() {
            return Err(ScanError::NotADirectory(self.root.clone()));
        }
        Ok(())
    }

    /// Build the ignore matcher from the configured patterns.
    fn build_gitignore(&self) -> Option<Gitignore> {
        if self.config.ignore_patterns.is_empty() {
            return None;
        }

        let mut builder = GitignoreBuilder::new(&self.root);
        for pattern in &self.config.ignore_patterns {
            if let Err(e) = builder.add_line(None, pattern) {
                log::warn!("Invalid ignore pattern '{}': {}", pattern, e);
            }
        }

        match builder.build() {
            Ok(gitignore) if gitignore.is_empty() => None,
            Ok(gitignore) => Some(gitignore),
            Err(e) => {
                log::warn!("Failed to build ignore patterns: {}", e);
                None
            }
        }
    }

    /// Check whether a file has one of the configured extensions.
    fn has_wanted_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                self.config
                    .extensions
                    .iter()
                    .any(|wanted| wanted.eq_ignore_ascii_case(ext))
            })
    }

    /// Walk the directory tree, yielding description files.
    ///
    /// Errors are yielded as [`ScanError`] values rather than stopping
    /// iteration, so one unreadable directory does not end the walk.
    pub fn walk(&self) -> impl Iterator<Item = Result<DescriptionFile, ScanError>> + '_ {
        let gitignore = self.build_gitignore();
        let root = self.root.clone();

        WalkDir::new(&self.root)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |entry| {
                if entry.depth() == 0 {
                    return true;
                }
                let ignored = should_ignore(
                    &root,
                    entry.path(),
                    entry.file_type().is_dir(),
                    gitignore.as_ref(),
                );
                if ignored {
                    log::trace!("Ignoring: {}", entry.path().display());
                }
                !ignored
            })
            .filter_map(move |entry_result| match entry_result {
                Ok(entry) => {
                    if !entry.file_type().is_file() {
                        return None;
                    }
                    if !self.has_wanted_extension(entry.path()) {
                        return None;
                    }
                    match entry.metadata() {
                        Ok(metadata) => Some(Ok(DescriptionFile::new(
                            entry.into_path(),
                            metadata.len(),
                        ))),
                        Err(e) => Some(Err(self.handle_walk_error(e))),
                    }
                }
                Err(e) => Some(Err(self.handle_walk_error(e))),
            })
    }

    /// Convert a walkdir error into a [`ScanError`].
    fn handle_walk_error(&self, error: walkdir::Error) -> ScanError {
        let path = error
            .path()
            .map_or_else(|| self.root.clone(), Path::to_path_buf);
        log::warn!("Walker error for {}: {}", path.display(), error);

        match error.into_io_error() {
            Some(io_error) => ScanError::from_io(path, io_error),
            None => ScanError::Io {
                path,
                source: std::io::Error::other("filesystem loop detected"),
            },
        }
    }
}

/// Check if a path matches the ignore patterns.
fn should_ignore(root: &Path, path: &Path, is_dir: bool, gitignore: Option<&Gitignore>) -> bool {
    let Some(gi) = gitignore else {
        return false;
    };

    // Gitignore matching expects paths relative to the root with forward slashes
    let relative_path = path.strip_prefix(root).unwrap_or(path);
    let path_str = relative_path.to_string_lossy();
    let normalized_path = if cfg!(windows) {
        path_str.replace('\\', "/")
    } else {
        path_str.into_owned()
    };

    gi.matched(normalized_path, is_dir).is_ignore()
}
