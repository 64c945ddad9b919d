//! Command-line interface definitions for drivermatch.
//!
//! This module defines all CLI arguments, subcommands, and options using the clap derive API.
//! Global options control verbosity, colour and error format; subcommands
//! build the driver index, match devices against it, or show the configuration.
//!
//! # Example
//!
//! ```bash
//! # Build (or rebuild) the cache for a driver share
//! drivermatch index --driver-root D:\Drivers
//!
//! # Match devices listed in a file
//! drivermatch find --devices devices.txt
//!
//! # Match a single device given on the command line, as JSON
//! drivermatch find --device "Intel LAN=PCI\VEN_8086&DEV_15BC&REV_00\3&11583659&0&FE" --output json
//!
//! # Read the device list from stdin and force a cache rebuild
//! type devices.txt | drivermatch find --devices - --refresh
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Find driver packages for devices in a tree of driver descriptions.
///
/// drivermatch indexes the hardware-ID lines of every `.inf` file under a
/// driver root into a local cache, then reports which description files
/// mention each device's hardware ID.
#[derive(Debug, Parser)]
#[command(name = "drivermatch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Print errors as JSON objects on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Configuration file to use instead of the platform default
    #[arg(long, global = true, value_name = "FILE", env = "DRIVERMATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Build the driver cache from the driver root
    Index(IndexArgs),
    /// Match devices against the driver cache
    Find(FindArgs),
    /// Show the effective configuration
    Config(ConfigArgs),
}

/// Options describing where drivers live and how they are indexed.
#[derive(Debug, Clone, Default, Args)]
pub struct SourceArgs {
    /// Root directory of the driver tree
    #[arg(short = 'r', long, value_name = "DIR")]
    pub driver_root: Option<PathBuf>,

    /// Directory holding the driver cache
    ///
    /// If not specified, a platform-specific cache directory is used.
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Glob patterns to ignore (can be specified multiple times)
    ///
    /// Patterns use gitignore syntax; a trailing slash matches directories only.
    #[arg(short, long = "ignore", value_name = "PATTERN")]
    pub ignore_patterns: Vec<String>,

    /// File extension of driver descriptions (can be specified multiple times)
    ///
    /// Defaults to `inf`. Matching is case-insensitive.
    #[arg(short = 'e', long = "extension", value_name = "EXT")]
    pub extensions: Vec<String>,

    /// Follow symbolic links during the walk
    #[arg(long)]
    pub follow_symlinks: bool,
}

/// Arguments for the index subcommand.
#[derive(Debug, Args)]
pub struct IndexArgs {
    #[command(flatten)]
    pub source: SourceArgs,
}

/// Arguments for the find subcommand.
#[derive(Debug, Args)]
pub struct FindArgs {
    /// File listing devices, one `name<TAB>instance-path` per line (`-` for stdin)
    #[arg(short, long, value_name = "FILE")]
    pub devices: Option<PathBuf>,

    /// Single device as NAME=INSTANCE_PATH (can be specified multiple times)
    #[arg(long = "device", value_name = "NAME=PATH")]
    pub device_args: Vec<String>,

    /// Rebuild the cache even if a valid one exists
    #[arg(long)]
    pub refresh: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    #[command(flatten)]
    pub source: SourceArgs,
}

impl FindArgs {
    /// Whether any device source was given.
    #[must_use]
    pub fn has_device_input(&self) -> bool {
        self.devices.is_some() || !self.device_args.is_empty()
    }
}

/// Arguments for the config subcommand.
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Write the effective configuration to the configuration file
    #[arg(long)]
    pub init: bool,
}

/// Output format for match results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// `device >>> path` lines for people
    #[default]
    Text,
    /// JSON output for scripting
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}
