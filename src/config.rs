//! Application configuration management.
//!
//! Settings are layered with figment, later layers overriding earlier ones:
//!
//! 1. Built-in defaults ([`Config::default`])
//! 2. TOML file: `--config FILE`, or `config.toml` in the platform config directory
//! 3. Environment variables prefixed with `DRIVERMATCH_` (e.g. `DRIVERMATCH_DRIVER_ROOT`)
//! 4. Command-line flags ([`Config::merge_source_args`], [`Config::merge_find_args`])
//!
//! # Example
//!
//! ```toml
//! driver_root = 'D:\Drivers'
//! cache_dir = 'C:\ProgramData\drivermatch'
//! refresh = false
//! extensions = ["inf"]
//! ignore_patterns = ["x86/", "*.bak"]
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cli::{FindArgs, SourceArgs};
use crate::scanner::{WalkerConfig, DEFAULT_EXTENSION};

/// Prefix of configuration environment variables.
pub const ENV_PREFIX: &str = "DRIVERMATCH_";

/// File name of the configuration file inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Errors raised while resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested configuration file does not exist.
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    /// The layered configuration could not be extracted.
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] Box<figment::Error>),

    /// No driver root was given anywhere.
    #[error("No driver root configured (use --driver-root, DRIVERMATCH_DRIVER_ROOT or driver_root in {CONFIG_FILE_NAME})")]
    MissingDriverRoot,

    /// The platform has no home directory to derive defaults from.
    #[error("Could not determine platform directories; set cache_dir explicitly")]
    NoProjectDirs,

    /// Writing the configuration file failed.
    #[error("Failed to write configuration to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Encoding the configuration as TOML failed.
    #[error("Failed to encode configuration: {0}")]
    Encode(#[from] toml::ser::Error),
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root directory of the driver tree.
    pub driver_root: Option<PathBuf>,
    /// Directory holding the driver cache; platform cache dir when unset.
    pub cache_dir: Option<PathBuf>,
    /// Always rebuild the cache before matching.
    pub refresh: bool,
    /// Extensions of driver-description files.
    pub extensions: Vec<String>,
    /// Gitignore-style patterns excluded from the walk.
    pub ignore_patterns: Vec<String>,
    /// Follow symbolic links during the walk.
    pub follow_symlinks: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            driver_root: None,
            cache_dir: None,
            refresh: false,
            extensions: vec![DEFAULT_EXTENSION.to_string()],
            ignore_patterns: Vec::new(),
            follow_symlinks: false,
        }
    }
}

impl Config {
    /// Load the configuration from `explicit`, or from the default path.
    ///
    /// A missing default file is not an error; a missing explicit file is.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] for a missing explicit file and
    /// [`ConfigError::Invalid`] when the file or environment cannot be parsed.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => {
                if !path.is_file() {
                    return Err(ConfigError::NotFound(path.to_path_buf()));
                }
                Self::load_from_path(path)
            }
            None => match Self::default_config_path() {
                Some(path) => Self::load_from_path(&path),
                None => {
                    log::debug!("No platform config directory; using defaults and environment");
                    Self::extract(Self::base_figment())
                }
            },
        }
    }

    /// Load defaults, then `path` (if it exists), then the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when extraction fails.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        log::debug!("Loading configuration from {}", path.display());
        let figment = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX));
        Self::extract(figment)
    }

    fn base_figment() -> Figment {
        Figment::from(Serialized::defaults(Self::default())).merge(Env::prefixed(ENV_PREFIX))
    }

    fn extract(figment: Figment) -> Result<Self, ConfigError> {
        figment
            .extract()
            .map_err(|e| ConfigError::Invalid(Box::new(e)))
    }

    /// Default platform-specific configuration file path.
    #[must_use]
    pub fn default_config_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Apply walk-related command-line flags.
    pub fn merge_source_args(&mut self, args: &SourceArgs) {
        if let Some(root) = &args.driver_root {
            self.driver_root = Some(root.clone());
        }
        if let Some(dir) = &args.cache_dir {
            self.cache_dir = Some(dir.clone());
        }
        if !args.extensions.is_empty() {
            self.extensions = args.extensions.clone();
        }
        if !args.ignore_patterns.is_empty() {
            self.ignore_patterns = args.ignore_patterns.clone();
        }
        if args.follow_symlinks {
            self.follow_symlinks = true;
        }
    }

    /// Apply all `find` command-line flags.
    pub fn merge_find_args(&mut self, args: &FindArgs) {
        self.merge_source_args(&args.source);
        if args.refresh {
            self.refresh = true;
        }
    }

    /// The configured driver root.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingDriverRoot`] when none is configured.
    pub fn driver_root(&self) -> Result<&Path, ConfigError> {
        self.driver_root
            .as_deref()
            .ok_or(ConfigError::MissingDriverRoot)
    }

    /// The cache directory, falling back to the platform cache directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoProjectDirs`] if no directory is configured
    /// and the platform default cannot be determined.
    pub fn resolved_cache_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.cache_dir {
            Some(dir) => Ok(dir.clone()),
            None => project_dirs()
                .map(|dirs| dirs.cache_dir().to_path_buf())
                .ok_or(ConfigError::NoProjectDirs),
        }
    }

    /// Walker settings derived from this configuration.
    #[must_use]
    pub fn walker_config(&self) -> WalkerConfig {
        WalkerConfig::default()
            .with_extensions(self.extensions.clone())
            .with_ignore_patterns(self.ignore_patterns.clone())
            .with_follow_symlinks(self.follow_symlinks)
    }

    /// Render as TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Encode`] if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Write the configuration as TOML to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Write`] or [`ConfigError::Encode`] on failure.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = self.to_toml()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "drivermatch", "drivermatch")
}
