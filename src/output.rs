//! JSON output types for the tugast CLI.
//!
//! Every command writes exactly one JSON object to stdout. Successful
//! responses carry `status: "ok"`; failures carry `status: "error"` and an
//! [`ErrorInfo`] payload whose `code` matches the process exit status.

use std::collections::BTreeMap;
use std::io::{self, Write};

use serde::Serialize;
use tugast_path::VisitError;

use crate::error::{OutputErrorCode, TugastError};

/// Current schema version for CLI output.
pub const SCHEMA_VERSION: &str = "1";

// ============================================================================
// Error Response
// ============================================================================

/// Error details for JSON output.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorInfo {
    /// Numeric error code (matches the exit status).
    pub code: u8,
    /// Human-readable error message.
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorInfo {
    /// Build error info from a CLI error.
    pub fn from_error(err: &TugastError) -> Self {
        let code = OutputErrorCode::from(err).code();
        let details = match err {
            TugastError::InvalidArguments { details, .. } => details.clone(),
            TugastError::InvalidJson { line, column, .. } => {
                Some(serde_json::json!({ "line": line, "column": column }))
            }
            TugastError::Visit(VisitError::UnrecognizedType { type_name }) => {
                Some(serde_json::json!({ "type": type_name }))
            }
            _ => None,
        };
        ErrorInfo {
            code,
            message: err.to_string(),
            details,
        }
    }
}

/// Top-level error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub status: String,
    pub schema_version: String,
    pub error: ErrorInfo,
}

impl ErrorResponse {
    pub fn from_error(err: &TugastError) -> Self {
        ErrorResponse {
            status: "error".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            error: ErrorInfo::from_error(err),
        }
    }
}

// ============================================================================
// Command Responses
// ============================================================================

/// Response for `tugast stats`.
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub status: String,
    pub schema_version: String,
    pub file: String,
    /// Number of nodes visited, comments included.
    pub total_nodes: usize,
    /// Node counts keyed by type name.
    pub by_type: BTreeMap<String, usize>,
}

impl StatsResponse {
    pub fn new(file: impl Into<String>, by_type: BTreeMap<String, usize>) -> Self {
        StatsResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            file: file.into(),
            total_nodes: by_type.values().sum(),
            by_type,
        }
    }
}

/// One expression that requires parentheses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParensEntry {
    /// Dotted field path from the root, e.g. `body.0.expression.left`.
    pub path: String,
    pub node_type: String,
}

/// Response for `tugast parens`.
#[derive(Debug, Clone, Serialize)]
pub struct ParensResponse {
    pub status: String,
    pub schema_version: String,
    pub file: String,
    pub count: usize,
    pub paths: Vec<ParensEntry>,
}

impl ParensResponse {
    pub fn new(file: impl Into<String>, paths: Vec<ParensEntry>) -> Self {
        ParensResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            file: file.into(),
            count: paths.len(),
            paths,
        }
    }
}

/// Response for `tugast prune`.
#[derive(Debug, Clone, Serialize)]
pub struct PruneResponse {
    pub status: String,
    pub schema_version: String,
    pub file: String,
    pub node_type: String,
    /// How many matching nodes were pruned.
    pub pruned: usize,
    /// The tree after pruning.
    pub tree: serde_json::Value,
}

impl PruneResponse {
    pub fn new(
        file: impl Into<String>,
        node_type: impl Into<String>,
        pruned: usize,
        tree: serde_json::Value,
    ) -> Self {
        PruneResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            file: file.into(),
            node_type: node_type.into(),
            pruned,
            tree,
        }
    }
}

// ============================================================================
// Emitters
// ============================================================================

/// Write a response as pretty-printed JSON followed by a newline.
pub fn emit_response<T: Serialize>(response: &T, writer: &mut impl Write) -> io::Result<()> {
    let json = serde_json::to_string_pretty(response).map_err(io::Error::other)?;
    writeln!(writer, "{}", json)?;
    writer.flush()
}

/// Write a response as single-line JSON followed by a newline.
pub fn emit_response_compact<T: Serialize>(
    response: &T,
    writer: &mut impl Write,
) -> io::Result<()> {
    let json = serde_json::to_string(response).map_err(io::Error::other)?;
    writeln!(writer, "{}", json)?;
    writer.flush()
}
