//! Diagnostics for drivermatch.
//!
//! The match report is the only thing written to stdout. Everything logged
//! through the `log` macros goes to stderr via `env_logger`, so `find` output
//! can be piped while the cache build is still narrated.
//!
//! Levels follow the global flags: `-q` keeps errors only, the default shows
//! cache decisions at info, `-v` adds match statistics and per-device hits,
//! `-vv` traces every description file read. Third-party crates are held at
//! warn. A set `RUST_LOG` replaces all of this.

use std::env;
use std::io::Write;

use env_logger::{Builder, Target};
use log::LevelFilter;

const CRATE_TARGET: &str = "drivermatch";

/// Logging settings derived from the global CLI flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogOptions {
    /// Filter for this crate's own records
    pub level: LevelFilter,
    /// Prefix lines with the emitting module, e.g. `[cache::manager]`
    pub show_module: bool,
    /// Prefix lines with a millisecond timestamp
    pub show_timestamp: bool,
}

impl LogOptions {
    /// Resolve `-v`/`-q` counts. Quiet wins over verbose.
    #[must_use]
    pub fn from_flags(verbose: u8, quiet: bool) -> Self {
        let level = match (quiet, verbose) {
            (true, _) => LevelFilter::Error,
            (false, 0) => LevelFilter::Info,
            (false, 1) => LevelFilter::Debug,
            (false, _) => LevelFilter::Trace,
        };
        Self {
            level,
            show_module: level >= LevelFilter::Debug,
            show_timestamp: level >= LevelFilter::Trace,
        }
    }

    /// Filter applied to every crate other than this one.
    #[must_use]
    pub fn dependency_level(&self) -> LevelFilter {
        self.level.min(LevelFilter::Warn)
    }
}

/// Install the stderr logger for this process.
///
/// A second call leaves the first logger in place.
pub fn init_logging(verbose: u8, quiet: bool) {
    let options = LogOptions::from_flags(verbose, quiet);

    let mut builder = Builder::new();
    builder.target(Target::Stderr);

    let from_env = env::var("RUST_LOG").ok();
    match &from_env {
        Some(filters) => {
            builder.parse_filters(filters);
        }
        None => {
            builder
                .filter_level(options.dependency_level())
                .filter_module(CRATE_TARGET, options.level);
        }
    }

    builder.format(move |buf, record| {
        let level = record.level();
        let style = buf.default_level_style(level);
        let message = decorate(&record.args().to_string(), record.target(), options);
        if options.show_timestamp {
            writeln!(
                buf,
                "{} {style}{level:<5}{style:#} {message}",
                buf.timestamp_millis()
            )
        } else {
            writeln!(buf, "{style}{level:<5}{style:#} {message}")
        }
    });

    if builder.try_init().is_err() {
        return;
    }

    match from_env {
        Some(filters) => log::debug!("Log filters taken from RUST_LOG={filters}"),
        None => log::trace!("Logging at {} ({:?})", options.level, options),
    }
}

/// Module path of a record relative to this crate.
///
/// `drivermatch::cache::manager` becomes `cache::manager`; records from other
/// crates keep their full target.
#[must_use]
pub fn module_label(target: &str) -> &str {
    target
        .strip_prefix(CRATE_TARGET)
        .and_then(|rest| rest.strip_prefix("::"))
        .unwrap_or(target)
}

fn decorate(message: &str, target: &str, options: LogOptions) -> String {
    if options.show_module {
        format!("[{}] {message}", module_label(target))
    } else {
        message.to_string()
    }
}
