//! Exit codes and structured errors for the `swapcache` binary.

use serde::Serialize;

use crate::sync::SyncError;

/// Process exit codes.
///
/// - 0: the command completed
/// - 1: general error
/// - 2: nothing to restore (the profile has no cache)
/// - 3: partial success (the pass finished, some entries failed)
/// - 130: interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// The command completed.
    Success = 0,
    /// An unexpected error occurred.
    GeneralError = 1,
    /// A restore found no cache for the profile. Not a failure.
    NothingToRestore = 2,
    /// A pass finished but some entries could not be synced.
    PartialSuccess = 3,
    /// The pass was interrupted by user (Ctrl+C).
    Interrupted = 130,
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
            Self::Success => "SC000",
            Self::GeneralError => "SC001",
            Self::NothingToRestore => "SC002",
            Self::PartialSuccess => "SC003",
            Self::Interrupted => "SC130",
        }
    }

    /// Classify an error that ended the command.
    #[must_use]
    pub fn for_error(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<SyncError>() {
            Some(SyncError::Interrupted) => Self::Interrupted,
            Some(SyncError::PartialFailure { .. }) => Self::PartialSuccess,
            Some(SyncError::SwitchAborted { source, .. })
                if matches!(**source, SyncError::Interrupted) =>
            {
                Self::Interrupted
            }
            _ => Self::GeneralError,
        }
    }
}

/// Structured error information for `--json-errors`.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "SC001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message, including its causes
    pub message: String,
    /// Whether the operation was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{:#}", err),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}
