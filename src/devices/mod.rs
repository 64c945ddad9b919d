//! Device list parsing.
//!
//! The operator supplies the devices to look up as literal text, usually
//! copied from a system inventory. Each non-blank line names one device and
//! ends with its device-instance path:
//!
//! ```text
//! # name                         instance path
//! Intel Ethernet I219-V          PCI\VEN_8086&DEV_15BC&SUBSYS_86721043&REV_00\3&11583659&0&FE
//! Realtek Audio	HDAUDIO\FUNC_01&VEN_10EC&DEV_0887&REV_1003\4&2F3A1C&0&0001
//! ```
//!
//! The name and path are separated by a tab, or else the path is the last
//! whitespace-delimited token. Blank lines and lines starting with `#` are
//! ignored.
//!
//! Parsing is all-or-nothing: a single malformed line, or a list with no
//! devices at all, is an error. Nothing is scanned until the whole list is
//! valid.

pub mod pattern;

use std::collections::HashSet;

pub use pattern::{normalize_instance_path, regex_fragment, HardwareIdPattern, PatternError};

/// Errors produced while reading the device list.
#[derive(thiserror::Error, Debug)]
pub enum DeviceListError {
    /// A line could not be split into a name and an instance path.
    #[error("Line {line}: expected '<device name> <device-instance path>', got '{content}'")]
    Malformed {
        /// 1-based line number
        line: usize,
        /// The offending line
        content: String,
    },

    /// The instance path on a line could not be normalized.
    #[error("Line {line}: {source}")]
    InvalidPattern {
        /// 1-based line number
        line: usize,
        /// The underlying pattern error
        #[source]
        source: PatternError,
    },

    /// A `NAME=INSTANCE_PATH` argument was malformed.
    #[error("Invalid device argument '{0}': expected NAME=INSTANCE_PATH")]
    InvalidArgument(String),

    /// The instance path of a `NAME=INSTANCE_PATH` argument was invalid.
    #[error("Invalid device argument '{argument}': {source}")]
    InvalidArgumentPattern {
        /// The offending argument
        argument: String,
        /// The underlying pattern error
        #[source]
        source: PatternError,
    },

    /// No devices were supplied.
    #[error("No devices were supplied; nothing to match")]
    Empty,

    /// Neither a device file nor a device argument was given.
    #[error("No device list given; use --devices <FILE> or --device NAME=INSTANCE_PATH")]
    NoSource,
}

/// One device to look up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSpec {
    /// Display name reported in results
    pub name: String,
    /// The raw device-instance path as supplied
    pub instance_path: String,
    /// Normalized hardware-ID matcher
    pub pattern: HardwareIdPattern,
}

impl DeviceSpec {
    /// Create a device from a name and a raw device-instance path.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] if the instance path cannot be normalized.
    pub fn new(name: impl Into<String>, instance_path: impl Into<String>) -> Result<Self, PatternError> {
        let instance_path = instance_path.into();
        let pattern = HardwareIdPattern::from_instance_path(&instance_path)?;
        Ok(Self {
            name: name.into(),
            instance_path,
            pattern,
        })
    }
}

/// Ordered, non-empty set of devices, unique by name.
///
/// Order matters: for each cache line devices are tried in list order and
/// only the first one that matches is credited.
#[derive(Debug, Clone)]
pub struct DeviceList {
    devices: Vec<DeviceSpec>,
}

impl DeviceList {
    /// Build a list from parsed devices.
    ///
    /// When a name occurs more than once the first definition wins and the
    /// later ones are dropped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceListError::Empty`] if `specs` is empty.
    pub fn new(specs: Vec<DeviceSpec>) -> Result<Self, DeviceListError> {
        let mut seen = HashSet::new();
        let mut devices = Vec::with_capacity(specs.len());

        for spec in specs {
            if seen.insert(spec.name.clone()) {
                devices.push(spec);
            } else {
                log::warn!(
                    "Duplicate device name '{}' ({}) ignored; first definition wins",
                    spec.name,
                    spec.instance_path
                );
            }
        }

        if devices.is_empty() {
            return Err(DeviceListError::Empty);
        }

        Ok(Self { devices })
    }

    /// Parse a device list from text.
    ///
    /// # Errors
    ///
    /// See [`parse_device_lines`] and [`DeviceList::new`].
    pub fn parse(text: &str) -> Result<Self, DeviceListError> {
        Self::new(parse_device_lines(text)?)
    }

    /// Number of devices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Always false for a constructed list.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Devices in list order.
    pub fn iter(&self) -> std::slice::Iter<'_, DeviceSpec> {
        self.devices.iter()
    }

    /// Devices as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[DeviceSpec] {
        &self.devices
    }
}

impl<'a> IntoIterator for &'a DeviceList {
    type Item = &'a DeviceSpec;
    type IntoIter = std::slice::Iter<'a, DeviceSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.devices.iter()
    }
}

/// Parse every device line in `text`.
///
/// # Errors
///
/// Returns the first malformed line as [`DeviceListError::Malformed`] or
/// [`DeviceListError::InvalidPattern`].
pub fn parse_device_lines(text: &str) -> Result<Vec<DeviceSpec>, DeviceListError> {
    let mut specs = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (name, instance_path) =
            split_device_line(line).ok_or_else(|| DeviceListError::Malformed {
                line: idx + 1,
                content: line.to_string(),
            })?;

        let spec = DeviceSpec::new(name, instance_path).map_err(|source| {
            DeviceListError::InvalidPattern {
                line: idx + 1,
                source,
            }
        })?;
        log::trace!("Device '{}' -> {}", spec.name, spec.pattern);
        specs.push(spec);
    }

    Ok(specs)
}

/// Parse a `NAME=INSTANCE_PATH` command-line argument.
///
/// The split happens at the last `=`, since instance paths never contain one.
///
/// # Errors
///
/// Returns [`DeviceListError::InvalidArgument`] when either side is empty,
/// or [`DeviceListError::InvalidArgumentPattern`] when the path is invalid.
pub fn parse_device_arg(argument: &str) -> Result<DeviceSpec, DeviceListError> {
    let (name, instance_path) = argument
        .rsplit_once('=')
        .map(|(n, p)| (n.trim(), p.trim()))
        .filter(|(n, p)| !n.is_empty() && !p.is_empty())
        .ok_or_else(|| DeviceListError::InvalidArgument(argument.to_string()))?;

    DeviceSpec::new(name, instance_path).map_err(|source| DeviceListError::InvalidArgumentPattern {
        argument: argument.to_string(),
        source,
    })
}

/// Split a trimmed line into `(name, instance_path)`.
fn split_device_line(line: &str) -> Option<(&str, &str)> {
    let (name, instance_path) = match line.rsplit_once('\t') {
        Some((name, path)) => (name.trim(), path.trim()),
        None => {
            let idx = line.rfind(char::is_whitespace)?;
            (line[..idx].trim(), line[idx..].trim())
        }
    };

    let looks_like_id = instance_path.contains('\\') || instance_path.contains('&');
    if name.is_empty() || instance_path.is_empty() || !looks_like_id {
        return None;
    }

    Some((name, instance_path))
}
