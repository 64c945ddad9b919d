//! Structured error handling and exit codes.

use serde::Serialize;

/// Exit codes for the drivermatch application.
///
/// - 0: Success (at least one device matched a driver package)
/// - 1: General error (unexpected failure, unreadable driver root, cache I/O)
/// - 2: No matches (completed normally, nothing matched)
/// - 3: Invalid input (malformed device list or device argument)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: matching completed and records were produced.
    Success = 0,
    /// General error: an unexpected error occurred.
    GeneralError = 1,
    /// No matches: matching completed but nothing matched.
    NoMatches = 2,
    /// Invalid input: the device list could not be parsed.
    InvalidInput = 3,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "DM000",
            Self::GeneralError => "DM001",
            Self::NoMatches => "DM002",
            Self::InvalidInput => "DM003",
        }
    }

    /// Lower-case name used in JSON output.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::GeneralError => "general_error",
            Self::NoMatches => "no_matches",
            Self::InvalidInput => "invalid_input",
        }
    }

    /// Pick the exit code for an error returned by [`crate::run_app`].
    #[must_use]
    pub fn for_error(err: &anyhow::Error) -> Self {
        if err.downcast_ref::<crate::devices::DeviceListError>().is_some() {
            Self::InvalidInput
        } else {
            Self::GeneralError
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "DM001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message
    pub message: String,
    /// Underlying causes, outermost first
    pub causes: Vec<String>,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: err.to_string(),
            causes: err.chain().skip(1).map(ToString::to_string).collect(),
        }
    }
}
