//! drivermatch - find driver packages for devices
//!
//! A Rust CLI and library that indexes the hardware-ID lines of a tree of
//! Windows driver-description (`.inf`) files into a flat local cache, then
//! matches a list of devices against it and reports which description files
//! mention each device.
//!
//! # Example
//!
//! ```no_run
//! use drivermatch::cache::CacheManager;
//! use drivermatch::devices::DeviceList;
//! use drivermatch::matcher::DeviceMatcher;
//! use drivermatch::scanner::WalkerConfig;
//! use std::path::Path;
//!
//! let devices = DeviceList::parse("LAN\tPCI\\VEN_8086&DEV_15BC&REV_00\\3&11583659&0&FE")?;
//! let manager = CacheManager::new(Path::new("cache"), Path::new("D:/Drivers"), WalkerConfig::default());
//! let loaded = manager.load_or_build(false)?;
//!
//! for record in DeviceMatcher::new(&devices).find_matches(loaded.cache.entries()).records {
//!     println!("{record}");
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cache;
pub mod cli;
pub mod config;
pub mod devices;
pub mod error;
pub mod logging;
pub mod matcher;
pub mod output;
pub mod progress;
pub mod scanner;

use std::fs;
use std::io::{self, IsTerminal, Read, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};

use crate::cache::{CacheManager, LoadedCache};
use crate::cli::{Cli, Commands, ConfigArgs, FindArgs, IndexArgs, OutputFormat};
use crate::config::Config;
use crate::devices::{parse_device_arg, parse_device_lines, DeviceList, DeviceListError};
use crate::error::ExitCode;
use crate::matcher::DeviceMatcher;
use crate::output::{JsonCacheInfo, JsonOutput, TextOutput};
use crate::progress::Progress;

/// Run the command described by `cli`, writing reports to stdout.
///
/// Logging must already be initialized.
///
/// # Errors
///
/// Returns an error for invalid input, configuration problems, or cache and
/// I/O failures. [`ExitCode::for_error`] maps it to an exit code.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    let stdout = io::stdout();
    let color = !cli.no_color && stdout.is_terminal();
    let mut out = stdout.lock();
    run_app_to(&cli, &mut out, color)
}

/// Run the command described by `cli`, writing reports to `out`.
///
/// # Errors
///
/// See [`run_app`].
pub fn run_app_to<W: Write>(cli: &Cli, out: &mut W, color: bool) -> Result<ExitCode> {
    if cli.no_color {
        yansi::disable();
    }
    log::debug!("Log level: {}", log::max_level());

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match &cli.command {
        Commands::Index(args) => run_index(cli, config, args),
        Commands::Find(args) => run_find(cli, config, args, out, color),
        Commands::Config(args) => run_config(cli, &config, args, out),
    }
}

fn cache_manager(cli: &Cli, config: &Config) -> Result<CacheManager> {
    let root = config.driver_root()?;
    let cache_dir = config.resolved_cache_dir()?;
    log::debug!(
        "Driver root: {}, cache directory: {}",
        root.display(),
        cache_dir.display()
    );

    let progress = Arc::new(Progress::new(cli.quiet));
    Ok(CacheManager::new(&cache_dir, root, config.walker_config()).with_progress_callback(progress))
}

fn run_index(cli: &Cli, mut config: Config, args: &IndexArgs) -> Result<ExitCode> {
    config.merge_source_args(&args.source);
    let manager = cache_manager(cli, &config)?;

    let loaded = manager
        .rebuild(cache::RebuildReason::Forced)
        .with_context(|| format!("Failed to index {}", manager.root().display()))?;

    if let Some(summary) = &loaded.build_summary {
        log::info!(
            "Cache holds {} entries from {} files",
            summary.entries,
            summary.files_scanned
        );
    }
    Ok(ExitCode::Success)
}

fn run_find<W: Write>(
    cli: &Cli,
    mut config: Config,
    args: &FindArgs,
    out: &mut W,
    color: bool,
) -> Result<ExitCode> {
    config.merge_find_args(args);

    // Malformed input must abort before the cache is touched
    let devices = load_devices(args)?;
    log::info!("Matching {} devices", devices.len());

    let manager = cache_manager(cli, &config)?;
    let loaded = manager
        .load_or_build(config.refresh)
        .with_context(|| format!("Failed to prepare cache {}", manager.cache_path().display()))?;

    let outcome = DeviceMatcher::new(&devices).find_matches(loaded.cache.entries());
    log::debug!(
        "Scanned {} of {} entries ({} skipped as same file), {} devices saturated",
        outcome.stats.entries_scanned,
        outcome.stats.entries_total,
        outcome.stats.entries_skipped_same_file,
        outcome.stats.devices_saturated
    );

    let exit_code = if outcome.is_empty() {
        ExitCode::NoMatches
    } else {
        ExitCode::Success
    };

    let root = manager.root();
    match args.output {
        OutputFormat::Text => {
            TextOutput::new(&outcome, root, color)
                .write_to(out)
                .context("Failed to write report")?;
        }
        OutputFormat::Json => {
            JsonOutput::new(&outcome, root, exit_code)
                .with_cache(cache_info(&manager, &loaded))
                .write_to(out, true)
                .context("Failed to write JSON report")?;
        }
    }

    Ok(exit_code)
}

fn run_config<W: Write>(cli: &Cli, config: &Config, args: &ConfigArgs, out: &mut W) -> Result<ExitCode> {
    if args.init {
        let path = match &cli.config {
            Some(path) => path.clone(),
            None => Config::default_config_path().context("Could not determine config directory")?,
        };
        if path.exists() {
            bail!("Configuration file already exists: {}", path.display());
        }
        config.save(&path)?;
        log::info!("Wrote configuration to {}", path.display());
    } else {
        out.write_all(config.to_toml()?.as_bytes())?;
    }
    Ok(ExitCode::Success)
}

fn cache_info(manager: &CacheManager, loaded: &LoadedCache) -> JsonCacheInfo {
    JsonCacheInfo {
        path: manager.cache_path().to_string_lossy().into_owned(),
        entries: loaded.cache.len(),
        rebuilt: loaded.rebuilt.is_some(),
        rebuild_reason: loaded.rebuilt.as_ref().map(ToString::to_string),
    }
}

/// Collect devices from the `--devices` file (or stdin) and `--device` arguments.
///
/// # Errors
///
/// Returns [`DeviceListError`] for malformed or empty input, or an I/O error
/// if the device file cannot be read.
pub fn load_devices(args: &FindArgs) -> Result<DeviceList> {
    if !args.has_device_input() {
        return Err(DeviceListError::NoSource.into());
    }

    let mut specs = Vec::new();

    if let Some(path) = &args.devices {
        let text = read_device_source(path)?;
        specs.extend(parse_device_lines(&text)?);
    }
    for argument in &args.device_args {
        specs.push(parse_device_arg(argument)?);
    }

    if specs.is_empty() {
        return Err(DeviceListError::Empty.into());
    }
    Ok(DeviceList::new(specs)?)
}

fn read_device_source(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read device list from stdin")?;
        Ok(text)
    } else {
        let bytes = fs::read(path)
            .with_context(|| format!("Failed to read device list {}", path.display()))?;
        Ok(scanner::decode_text(&bytes))
    }
}
