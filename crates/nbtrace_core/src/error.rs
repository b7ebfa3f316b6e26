//! Core error types for NBTRACE.

/// Core result type
pub type CoreResult<T> = Result<T, CoreError>;

/// Core error type
///
/// `InvalidLog` and `StateLogMismatch` are the two reconstruction failures a
/// caller is expected to handle by skipping the notebook/log pair. Everything
/// else means an invariant of the snapshot model itself was broken.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// The event log is structurally inconsistent
    #[error("Invalid log: {reason}")]
    InvalidLog {
        /// What was wrong with the log
        reason: String,
    },

    /// The log is consistent but its pre-edit content is not in the current snapshot
    #[error("Notebook state does not match log ({unresolved} unresolved entries): {reason}")]
    StateLogMismatch {
        /// Number of log entries that could not be placed
        unresolved: usize,
        /// Where the mismatch happened
        reason: String,
    },

    /// Reconstruction produced nothing beyond the root state
    #[error("No progress found for {label}")]
    NoProgress {
        /// Notebook or log label
        label: String,
    },

    /// Parse error
    #[error("Parse error: {message}")]
    ParseError {
        /// Parser message
        message: String,
    },

    /// A snapshot mutation was asked to act on a cell that is not on record
    #[error("Consistency violation: {reason}")]
    Consistency {
        /// Description of the violated precondition
        reason: String,
    },

    /// Validation error
    #[error("Validation failed for {field}: {reason}")]
    Validation {
        /// Field or component being validated
        field: String,
        /// Why validation failed
        reason: String,
    },

    /// Not found
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Kind of thing looked up
        kind: String,
        /// Identifier that was looked up
        id: String,
    },

    /// I/O failure while loading or writing an artifact
    #[error("I/O error on {path}: {message}")]
    Io {
        /// Path involved
        path: String,
        /// Underlying error message
        message: String,
    },
}

impl CoreError {
    /// Build an `InvalidLog` error
    pub fn invalid_log(reason: impl Into<String>) -> Self {
        Self::InvalidLog {
            reason: reason.into(),
        }
    }

    /// Build an `Io` error from a path and an `std::io::Error`
    pub fn io(path: impl AsRef<std::path::Path>, err: &std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().display().to_string(),
            message: err.to_string(),
        }
    }

    /// True for failures that reject one notebook/log pair but say nothing
    /// about the health of the rest of a batch.
    #[must_use]
    pub fn is_log_rejection(&self) -> bool {
        matches!(
            self,
            Self::InvalidLog { .. } | Self::StateLogMismatch { .. } | Self::NoProgress { .. }
        )
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError {
            message: err.to_string(),
        }
    }
}
