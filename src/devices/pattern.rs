//! Hardware-ID pattern normalization.
//!
//! A device-instance path such as
//! `PCI\VEN_8086&DEV_A2A1&SUBSYS_86941043&REV_00\3&11583659&0&FC` carries the
//! hardware ID in its first two segments. The instance-specific tail and the
//! revision suffix vary between machines and never appear in driver
//! description files, so both are cut away:
//!
//! ```
//! use drivermatch::devices::HardwareIdPattern;
//!
//! let pattern = HardwareIdPattern::from_instance_path(
//!     r"PCI\VEN_8086&DEV_A2A1&SUBSYS_86941043&REV_00\3&11583659&0&FC",
//! )
//! .unwrap();
//! assert_eq!(pattern.as_str(), r"PCI\VEN_8086&DEV_A2A1&SUBSYS_86941043");
//! assert!(pattern.is_match(r"%Dev% = Install, pci\ven_8086&dev_a2a1&subsys_86941043"));
//! ```
//!
//! # Known limitation
//!
//! The normalized ID is used as a regular-expression fragment. Only
//! backslashes are escaped (doubled); any other metacharacter inside the ID
//! keeps its regex meaning. Hardware IDs are drawn from `[A-Z0-9_&\\]` in
//! practice, so this rarely matters, but a `.` or `+` typed by hand will
//! behave as a regex operator.

use std::fmt;

use regex::{Regex, RegexBuilder};

/// Marker that starts the revision suffix of a hardware ID.
const REVISION_MARKER: &str = "&REV_";

/// Errors produced while turning a device-instance path into a pattern.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    /// The instance path was empty or whitespace.
    #[error("Device-instance path is empty")]
    Empty,

    /// Nothing usable was left after normalization.
    #[error("Device-instance path has no hardware ID: '{0}'")]
    MissingHardwareId(String),

    /// The normalized ID could not be compiled as a match expression.
    #[error("Hardware ID '{pattern}' is not a valid match expression: {message}")]
    InvalidExpression {
        /// The normalized hardware ID
        pattern: String,
        /// Compiler message from the regex engine
        message: String,
    },
}

/// A normalized hardware ID compiled into a case-insensitive matcher.
#[derive(Debug, Clone)]
pub struct HardwareIdPattern {
    pattern: String,
    regex: Regex,
}

impl HardwareIdPattern {
    /// Normalize a raw device-instance path and compile it.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] if the path is empty, has no hardware ID, or
    /// the resulting fragment is not a valid regular expression.
    pub fn from_instance_path(instance_path: &str) -> Result<Self, PatternError> {
        let pattern = normalize_instance_path(instance_path)?;
        Self::compile(pattern)
    }

    /// Compile an already-normalized hardware ID.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError::InvalidExpression`] if the fragment does not
    /// compile.
    pub fn compile(pattern: String) -> Result<Self, PatternError> {
        let regex = RegexBuilder::new(&regex_fragment(&pattern))
            .case_insensitive(true)
            .build()
            .map_err(|e| PatternError::InvalidExpression {
                pattern: pattern.clone(),
                message: e.to_string(),
            })?;

        Ok(Self { pattern, regex })
    }

    /// The normalized hardware ID.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// Test whether a cache line contains this hardware ID.
    #[must_use]
    pub fn is_match(&self, line: &str) -> bool {
        self.regex.is_match(line)
    }
}

impl PartialEq for HardwareIdPattern {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
    }
}

impl Eq for HardwareIdPattern {}

impl fmt::Display for HardwareIdPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

/// Reduce a device-instance path to its hardware ID.
///
/// Keeps everything before the second `\`, then drops the `&REV_xx` suffix
/// (matched case-insensitively) and whatever follows it.
///
/// # Errors
///
/// Returns [`PatternError::Empty`] for blank input and
/// [`PatternError::MissingHardwareId`] when the ID segment is empty.
///
/// # Examples
///
/// ```
/// use drivermatch::devices::normalize_instance_path;
///
/// assert_eq!(
///     normalize_instance_path(r"HDAUDIO\FUNC_01&VEN_10EC&DEV_0887&REV_1003\4&2F3A1C&0&0001").unwrap(),
///     r"HDAUDIO\FUNC_01&VEN_10EC&DEV_0887",
/// );
/// assert_eq!(normalize_instance_path("VEN_8086&DEV_A2A1").unwrap(), "VEN_8086&DEV_A2A1");
/// ```
pub fn normalize_instance_path(instance_path: &str) -> Result<String, PatternError> {
    let trimmed = instance_path.trim();
    if trimmed.is_empty() {
        return Err(PatternError::Empty);
    }

    let mut segments = trimmed.splitn(3, '\\');
    let bus = segments.next().unwrap_or_default();
    let mut hardware_id = match segments.next() {
        Some("") => return Err(PatternError::MissingHardwareId(trimmed.to_string())),
        Some(ids) => format!("{bus}\\{ids}"),
        None => bus.to_string(),
    };

    // ASCII uppercasing keeps byte offsets stable
    if let Some(idx) = hardware_id.to_ascii_uppercase().find(REVISION_MARKER) {
        hardware_id.truncate(idx);
    }

    if hardware_id.is_empty() || hardware_id.ends_with('\\') {
        return Err(PatternError::MissingHardwareId(trimmed.to_string()));
    }

    Ok(hardware_id)
}

/// Turn a hardware ID into a regex fragment by doubling its backslashes.
#[must_use]
pub fn regex_fragment(hardware_id: &str) -> String {
    hardware_id.replace('\\', r"\\")
}
