//! Flat-file persistence for the driver cache.
//!
//! # File format
//!
//! ```text
//! #{"version":1,"root":"D:\\Drivers","created_at":"2026-10-15T08:00:00Z","entries":2,"checksum":"9f86…"}
//! %Desc% = Inst, PCI\VEN_8086&DEV_A2A1<US>D:\Drivers\chipset\a.inf
//! %Desc% = Inst, PCI\VEN_8086&DEV_A2A2<US>D:\Drivers\chipset\a.inf
//! ```
//!
//! The first line is a `#`-prefixed JSON header; every following physical
//! line is exactly one [`CacheEntry`] (`<US>` is [`super::CACHE_SEPARATOR`]).
//! The header checksum is SHA-256 over the entry lines including their `\n`,
//! so a truncated or hand-edited cache is detected on load.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{CacheEntry, CacheError};

/// Current version of the cache file format.
pub const CACHE_VERSION: u32 = 1;

/// File name of the cache inside the cache directory.
pub const CACHE_FILE_NAME: &str = "driver-cache.txt";

const HEADER_PREFIX: char = '#';

/// Metadata stored on the first line of the cache file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheHeader {
    /// Format version.
    pub version: u32,
    /// Driver root the cache was built from.
    pub root: PathBuf,
    /// When the cache was built.
    pub created_at: DateTime<Utc>,
    /// Number of entries that follow the header.
    pub entries: usize,
    /// SHA-256 (hex) of the entry lines.
    pub checksum: String,
}

#[derive(Deserialize)]
struct VersionProbe {
    version: u32,
}

/// An immutable, fully loaded driver cache.
#[derive(Debug, Clone)]
pub struct DriverCache {
    header: CacheHeader,
    entries: Vec<CacheEntry>,
}

impl DriverCache {
    /// Create a cache from entries in file-processing order.
    #[must_use]
    pub fn new(root: PathBuf, entries: Vec<CacheEntry>) -> Self {
        let header = CacheHeader {
            version: CACHE_VERSION,
            root,
            created_at: Utc::now(),
            entries: entries.len(),
            checksum: checksum(&entries),
        };
        Self { header, entries }
    }

    /// The cache header.
    #[must_use]
    pub fn header(&self) -> &CacheHeader {
        &self.header
    }

    /// Driver root the cache was built from.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.header.root
    }

    /// Entries in persisted order.
    #[must_use]
    pub fn entries(&self) -> &[CacheEntry] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write the cache to `path`, replacing any existing file.
    ///
    /// The data goes to a temporary sibling first and is renamed into place,
    /// so readers never observe a half-written cache.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the directory cannot be created or the file
    /// cannot be written.
    pub fn save(&self, path: &Path) -> Result<u64, CacheError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| CacheError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let mut tmp_name = path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        let written = self.write_file(&tmp_path).and_then(|()| {
            fs::rename(&tmp_path, path).map_err(|source| CacheError::Io {
                path: path.to_path_buf(),
                source,
            })
        });
        if let Err(err) = written {
            if fs::remove_file(&tmp_path).is_ok() {
                log::debug!("Removed partial cache {}", tmp_path.display());
            }
            return Err(err);
        }

        let size = fs::metadata(path).map(|m| m.len()).unwrap_or_default();
        Ok(size)
    }

    fn write_file(&self, path: &Path) -> Result<(), CacheError> {
        let file = File::create(path).map_err(|source| CacheError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Serialize the header and entries to `writer`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the header cannot be encoded or writing fails.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<(), CacheError> {
        let header = serde_json::to_string(&self.header)?;
        writeln!(writer, "{HEADER_PREFIX}{header}")?;
        for entry in &self.entries {
            writeln!(writer, "{}", entry.to_cache_line())?;
        }
        Ok(())
    }

    /// Load a cache from `path` and verify its integrity.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::NotFound`] if the file does not exist, or the
    /// error from [`DriverCache::read_from`].
    pub fn load(path: &Path) -> Result<Self, CacheError> {
        let file = File::open(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                CacheError::NotFound(path.to_path_buf())
            } else {
                CacheError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        Self::read_from(BufReader::new(file))
    }

    /// Parse a cache from a reader and verify its integrity.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::MissingHeader`], [`CacheError::UnsupportedVersion`],
    /// [`CacheError::MalformedEntry`], [`CacheError::CountMismatch`] or
    /// [`CacheError::ChecksumMismatch`] for invalid content.
    pub fn read_from<R: BufRead>(reader: R) -> Result<Self, CacheError> {
        let mut lines = reader.lines();

        let header_line = lines.next().transpose()?.ok_or(CacheError::MissingHeader)?;
        let header = parse_header(&header_line)?;

        let mut entries = Vec::with_capacity(header.entries);
        for (idx, line) in lines.enumerate() {
            let line = line?;
            // Header is line 1
            entries.push(CacheEntry::from_cache_line(&line, idx + 2)?);
        }

        if entries.len() != header.entries {
            return Err(CacheError::CountMismatch {
                expected: header.entries,
                found: entries.len(),
            });
        }
        if checksum(&entries) != header.checksum {
            return Err(CacheError::ChecksumMismatch);
        }

        Ok(Self { header, entries })
    }
}

fn parse_header(line: &str) -> Result<CacheHeader, CacheError> {
    let json = line
        .strip_prefix(HEADER_PREFIX)
        .ok_or(CacheError::MissingHeader)?;

    let probe: VersionProbe =
        serde_json::from_str(json).map_err(|_| CacheError::MissingHeader)?;
    if probe.version != CACHE_VERSION {
        return Err(CacheError::UnsupportedVersion {
            found: probe.version,
            expected: CACHE_VERSION,
        });
    }

    serde_json::from_str(json).map_err(|_| CacheError::MissingHeader)
}

fn checksum(entries: &[CacheEntry]) -> String {
    let mut hasher = Sha256::new();
    for entry in entries {
        hasher.update(entry.to_cache_line().as_bytes());
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}
