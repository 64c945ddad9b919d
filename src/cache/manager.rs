//! Cache lifecycle: reuse the persisted cache or rebuild it.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytesize::ByteSize;

use super::{BuildSummary, CacheError, DriverCache, IndexBuilder, CACHE_FILE_NAME};
use crate::progress::ProgressCallback;
use crate::scanner::WalkerConfig;

/// Why the cache was rebuilt instead of reused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RebuildReason {
    /// A refresh was requested explicitly.
    Forced,
    /// No cache file existed.
    Missing,
    /// The persisted cache failed validation.
    Invalid(String),
    /// The persisted cache was built from another driver root.
    RootChanged {
        /// Root recorded in the persisted cache
        cached: PathBuf,
    },
}

impl fmt::Display for RebuildReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forced => write!(f, "refresh requested"),
            Self::Missing => write!(f, "no cache found"),
            Self::Invalid(reason) => write!(f, "cache invalid ({reason})"),
            Self::RootChanged { cached } => {
                write!(f, "cache was built from {}", cached.display())
            }
        }
    }
}

/// A cache ready for matching, with how it was obtained.
#[derive(Debug)]
pub struct LoadedCache {
    /// The cache contents
    pub cache: DriverCache,
    /// Set when the cache was rebuilt during this run
    pub rebuilt: Option<RebuildReason>,
    /// Build statistics when the cache was rebuilt
    pub build_summary: Option<BuildSummary>,
}

/// Owns the location of the persisted cache and the tree it indexes.
pub struct CacheManager {
    cache_path: PathBuf,
    root: PathBuf,
    walker_config: WalkerConfig,
    progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl CacheManager {
    /// Create a manager for `<cache_dir>/driver-cache.txt` indexing `root`.
    #[must_use]
    pub fn new(cache_dir: &Path, root: &Path, walker_config: WalkerConfig) -> Self {
        Self {
            cache_path: cache_dir.join(CACHE_FILE_NAME),
            root: root.to_path_buf(),
            walker_config,
            progress_callback: None,
        }
    }

    /// Set the progress callback used while rebuilding.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Path of the persisted cache file.
    #[must_use]
    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    /// Driver root being indexed.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load the persisted cache, rebuilding it when forced, missing, invalid,
    /// or built from a different root.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the cache cannot be read for reasons other
    /// than invalid content, or if a rebuild fails.
    pub fn load_or_build(&self, refresh: bool) -> Result<LoadedCache, CacheError> {
        if refresh {
            return self.rebuild(RebuildReason::Forced);
        }

        match DriverCache::load(&self.cache_path) {
            Ok(cache) if cache.root() == self.root => {
                log::info!(
                    "Using cached index {} ({} entries, built {})",
                    self.cache_path.display(),
                    cache.len(),
                    cache.header().created_at.format("%Y-%m-%d %H:%M:%S UTC")
                );
                Ok(LoadedCache {
                    cache,
                    rebuilt: None,
                    build_summary: None,
                })
            }
            Ok(cache) => self.rebuild(RebuildReason::RootChanged {
                cached: cache.root().to_path_buf(),
            }),
            Err(CacheError::NotFound(_)) => self.rebuild(RebuildReason::Missing),
            Err(e) if e.is_invalid_content() => {
                log::warn!("Discarding cache {}: {}", self.cache_path.display(), e);
                self.rebuild(RebuildReason::Invalid(e.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    /// Build the cache from the driver tree and persist it.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Scan`] if the root cannot be walked, or a write
    /// error if the cache cannot be saved.
    pub fn rebuild(&self, reason: RebuildReason) -> Result<LoadedCache, CacheError> {
        log::info!("Rebuilding driver cache: {}", reason);

        let mut builder = IndexBuilder::new(&self.root, self.walker_config.clone());
        if let Some(cb) = &self.progress_callback {
            builder = builder.with_progress_callback(Arc::clone(cb));
        }
        let (cache, summary) = builder.build()?;

        let size = cache.save(&self.cache_path)?;
        log::info!(
            "Wrote {} ({}, {} entries)",
            self.cache_path.display(),
            ByteSize::b(size),
            cache.len()
        );

        Ok(LoadedCache {
            cache,
            rebuilt: Some(reason),
            build_summary: Some(summary),
        })
    }
}
