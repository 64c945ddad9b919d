//! Index builder: extracts hardware-ID lines from the driver tree.
//!
//! # Overview
//!
//! For every description file under the root (in walk order) and every line
//! in it that contains a hardware-ID shape, one [`CacheEntry`] is produced.
//! The shape is three letters, a backslash, three letters, an underscore,
//! four hex digits, an ampersand, and the same letter/underscore/hex group
//! again, as in `PCI\VEN_8086&DEV_A2A1`, `USB\VID_046D&PID_C52B`. Letter case is
//! ignored, matching how the matcher compares IDs.
//!
//! There is no deduplication: the same line in two files is two entries, and
//! a line repeated within one file is repeated in the cache.
//!
//! Unreadable files are skipped and counted; the cache is best-effort.
//!
//! # Example
//!
//! ```no_run
//! use drivermatch::cache::IndexBuilder;
//! use drivermatch::scanner::WalkerConfig;
//! use std::path::Path;
//!
//! let builder = IndexBuilder::new(Path::new("D:/Drivers"), WalkerConfig::default());
//! let (cache, summary) = builder.build().unwrap();
//! println!("{} entries from {} files", cache.len(), summary.files_scanned);
//! ```

use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use std::time::{Duration, Instant};

use regex::Regex;

use super::{CacheEntry, DriverCache};
use crate::progress::{ProgressCallback, PHASE_INDEXING};
use crate::scanner::{read_text, ScanError, Walker, WalkerConfig};

static HARDWARE_ID_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[A-Z]{3}\\[A-Z]{3}_[0-9A-F]{4}&[A-Z]{3}_[0-9A-F]{4}")
        .expect("hardware-ID line expression is valid")
});

/// Statistics from one index build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildSummary {
    /// Description files read successfully
    pub files_scanned: usize,
    /// Files or directories skipped because they could not be read
    pub files_skipped: usize,
    /// Lines skipped because they could not be stored unambiguously
    pub lines_skipped: usize,
    /// Total size of the files read, in bytes
    pub bytes_scanned: u64,
    /// Cache entries produced
    pub entries: usize,
    /// Wall-clock duration of the build
    pub duration: Duration,
}

/// Builds a [`DriverCache`] from a driver tree.
pub struct IndexBuilder {
    root: PathBuf,
    walker_config: WalkerConfig,
    progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for IndexBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexBuilder")
            .field("root", &self.root)
            .field("walker_config", &self.walker_config)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl IndexBuilder {
    /// Create a builder for the tree under `root`.
    #[must_use]
    pub fn new(root: &Path, walker_config: WalkerConfig) -> Self {
        Self {
            root: root.to_path_buf(),
            walker_config,
            progress_callback: None,
        }
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Walk the tree and collect every hardware-ID line.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError`] only when the root itself is missing or not a
    /// directory. Errors on individual files are logged and counted in
    /// [`BuildSummary::files_skipped`].
    pub fn build(&self) -> Result<(DriverCache, BuildSummary), ScanError> {
        let start = Instant::now();
        let walker = Walker::new(&self.root, self.walker_config.clone());
        walker.validate_root()?;

        log::info!("Indexing driver descriptions under {}", self.root.display());
        if let Some(cb) = &self.progress_callback {
            cb.on_phase_start(PHASE_INDEXING);
        }

        let mut summary = BuildSummary::default();
        let mut entries = Vec::new();

        for item in walker.walk() {
            let file = match item {
                Ok(file) => file,
                Err(e) => {
                    log::warn!("Skipping: {}", e);
                    summary.files_skipped += 1;
                    continue;
                }
            };

            if !CacheEntry::is_storable_path(&file.path) {
                log::debug!("Skipping file with unstorable path: {:?}", file.path);
                summary.files_skipped += 1;
                continue;
            }

            let text = match read_text(&file.path) {
                Ok(text) => text,
                Err(e) => {
                    log::warn!("Skipping unreadable file: {}", e);
                    summary.files_skipped += 1;
                    continue;
                }
            };

            let before = entries.len();
            for line in extract_hardware_id_lines(&text) {
                if CacheEntry::is_storable_line(line) {
                    entries.push(CacheEntry::new(line, file.path.clone()));
                } else {
                    log::debug!(
                        "Skipping line containing the cache separator in {}",
                        file.path.display()
                    );
                    summary.lines_skipped += 1;
                }
            }
            log::trace!(
                "{}: {} hardware-ID lines",
                file.path.display(),
                entries.len() - before
            );

            summary.files_scanned += 1;
            summary.bytes_scanned += file.size;
            if let Some(cb) = &self.progress_callback {
                cb.on_progress(summary.files_scanned, &file.path.to_string_lossy());
            }
        }

        if let Some(cb) = &self.progress_callback {
            cb.on_phase_end(PHASE_INDEXING);
        }

        summary.entries = entries.len();
        summary.duration = start.elapsed();
        log::info!(
            "Indexed {} files ({} skipped), {} hardware-ID lines in {:.2?}",
            summary.files_scanned,
            summary.files_skipped,
            summary.entries,
            summary.duration
        );

        Ok((DriverCache::new(self.root.clone(), entries), summary))
    }
}

/// Lines of `text` that contain a hardware-ID shape, in order.
///
/// # Examples
///
/// ```
/// use drivermatch::cache::extract_hardware_id_lines;
///
/// let inf = "[Manufacturer]\r\n%Intel% = Intel, NTamd64\r\n\
///            %Desc% = Install, PCI\\VEN_8086&DEV_A2A1\r\n";
/// let lines: Vec<_> = extract_hardware_id_lines(inf).collect();
/// assert_eq!(lines, vec!["%Desc% = Install, PCI\\VEN_8086&DEV_A2A1"]);
/// ```
pub fn extract_hardware_id_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines().filter(|line| HARDWARE_ID_LINE.is_match(line))
}
