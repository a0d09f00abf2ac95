//! Error types and exit codes for the tugast CLI.
//!
//! `TugastError` is the single error type the CLI renders. Library errors
//! from the cursor and visitor crates are bridged into it with `From`.
//!
//! ## Error Code Mapping
//!
//! - `2`: Invalid arguments (bad flags or values from the caller)
//! - `3`: Input errors (missing file, malformed JSON, unknown node type)
//! - `10`: Internal errors (traversal failures that indicate a defect)

use std::fmt;

use thiserror::Error;
use tugast_path::{PathError, VisitError};

// ============================================================================
// Output Error Codes
// ============================================================================

/// Error codes for JSON output and process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OutputErrorCode {
    /// Invalid arguments from caller.
    InvalidArguments = 2,
    /// The input tree could not be read or understood.
    InputError = 3,
    /// Internal errors (bugs, unexpected state).
    InternalError = 10,
}

impl OutputErrorCode {
    /// Get the numeric code value.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for OutputErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Unified error type for CLI output.
#[derive(Debug, Error)]
pub enum TugastError {
    /// Invalid arguments from caller.
    #[error("invalid arguments: {message}")]
    InvalidArguments {
        message: String,
        details: Option<serde_json::Value>,
    },

    /// Input file not found.
    #[error("file not found: {path}")]
    FileNotFound { path: String },

    /// Input file is not valid JSON.
    #[error("invalid JSON in {path}: {message}")]
    InvalidJson {
        path: String,
        message: String,
        line: usize,
        column: usize,
    },

    /// Traversal or mutation of the tree failed.
    #[error("traversal failed: {0}")]
    Visit(#[from] VisitError),

    /// Internal error (bug or unexpected state).
    #[error("internal error: {message}")]
    InternalError { message: String },
}

// ============================================================================
// Error Code Mapping
// ============================================================================

impl From<&TugastError> for OutputErrorCode {
    fn from(err: &TugastError) -> Self {
        match err {
            TugastError::InvalidArguments { .. } => OutputErrorCode::InvalidArguments,
            TugastError::FileNotFound { .. } => OutputErrorCode::InputError,
            TugastError::InvalidJson { .. } => OutputErrorCode::InputError,
            TugastError::Visit(VisitError::UnrecognizedType { .. }) => OutputErrorCode::InputError,
            TugastError::Visit(_) => OutputErrorCode::InternalError,
            TugastError::InternalError { .. } => OutputErrorCode::InternalError,
        }
    }
}

impl From<TugastError> for OutputErrorCode {
    fn from(err: TugastError) -> Self {
        OutputErrorCode::from(&err)
    }
}

// ============================================================================
// Bridge: PathError -> TugastError
// ============================================================================

impl From<PathError> for TugastError {
    fn from(err: PathError) -> Self {
        TugastError::Visit(VisitError::Path(err))
    }
}

// ============================================================================
// Convenience Constructors
// ============================================================================

impl TugastError {
    /// Create an invalid arguments error.
    pub fn invalid_args(message: impl Into<String>) -> Self {
        TugastError::InvalidArguments {
            message: message.into(),
            details: None,
        }
    }

    /// Create an invalid arguments error with JSON details.
    pub fn invalid_args_with_details(
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        TugastError::InvalidArguments {
            message: message.into(),
            details: Some(details),
        }
    }

    pub fn file_not_found(path: impl Into<String>) -> Self {
        TugastError::FileNotFound { path: path.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        TugastError::InternalError {
            message: message.into(),
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> OutputErrorCode {
        OutputErrorCode::from(self)
    }
}

// ============================================================================
// Tests
// ============================================================================
