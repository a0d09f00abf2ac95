//! Command implementations for the tugast CLI.
//!
//! Each command loads an ESTree JSON document, runs a [`PathVisitor`] over
//! it, and returns a response ready for [`crate::output`].

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use tracing::{debug, info};
use tugast_core::{NodeType, Value};
use tugast_path::{NodePath, PathVisitor, VisitResult};

use crate::error::TugastError;
use crate::output::{ParensEntry, ParensResponse, PruneResponse, StatsResponse};

// ============================================================================
// Input
// ============================================================================

/// Reads and parses an ESTree JSON document.
pub fn load_tree(path: &Path) -> Result<Value, TugastError> {
    let shown = path.display().to_string();
    let text = fs::read_to_string(path).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => TugastError::file_not_found(&shown),
        _ => TugastError::internal(format!("failed to read {}: {}", shown, err)),
    })?;
    let json: serde_json::Value =
        serde_json::from_str(&text).map_err(|err| TugastError::InvalidJson {
            path: shown.clone(),
            message: err.to_string(),
            line: err.line(),
            column: err.column(),
        })?;
    debug!(file = %shown, bytes = text.len(), "loaded tree");
    Ok(Value::from_json(&json))
}

/// Parses a node type name given on the command line.
pub fn parse_node_type(name: &str) -> Result<NodeType, TugastError> {
    NodeType::from_name(name).ok_or_else(|| {
        TugastError::invalid_args_with_details(
            format!("unknown node type: {}", name),
            serde_json::json!({ "type": name }),
        )
    })
}

// ============================================================================
// stats
// ============================================================================

/// Counts every node and comment in the tree by type.
pub fn run_stats(path: &Path) -> Result<StatsResponse, TugastError> {
    let tree = load_tree(path)?;
    let visitor = PathVisitor::builder(BTreeMap::<String, usize>::new())
        .visit(NodeType::Printable, |ctx, path| {
            if let Some(name) = path.value().type_name() {
                *ctx.state_mut().entry(name.to_string()).or_default() += 1;
            }
            ctx.traverse(path)?;
            Ok(VisitResult::Traversed)
        })
        .build();
    visitor.visit(&NodePath::new(tree))?;
    let by_type = visitor.into_state();
    info!(types = by_type.len(), "counted nodes");
    Ok(StatsResponse::new(path.display().to_string(), by_type))
}

// ============================================================================
// parens
// ============================================================================

/// Lists every expression that must be parenthesized where it stands.
pub fn run_parens(
    path: &Path,
    assume_expression_context: bool,
) -> Result<ParensResponse, TugastError> {
    let tree = load_tree(path)?;
    let visitor = PathVisitor::builder(Vec::<ParensEntry>::new())
        .visit(NodeType::Expression, move |ctx, path| {
            if path.needs_parens(assume_expression_context) {
                let dotted = path
                    .names()
                    .iter()
                    .map(|name| name.to_string())
                    .collect::<Vec<_>>()
                    .join(".");
                let node_type = path
                    .value()
                    .type_name()
                    .map(|name| name.to_string())
                    .unwrap_or_default();
                ctx.state_mut().push(ParensEntry {
                    path: dotted,
                    node_type,
                });
            }
            ctx.traverse(path)?;
            Ok(VisitResult::Traversed)
        })
        .build();
    visitor.visit(&NodePath::new(tree))?;
    Ok(ParensResponse::new(
        path.display().to_string(),
        visitor.into_state(),
    ))
}

// ============================================================================
// prune
// ============================================================================

/// Prunes every node of `node_type` below the root, cleaning up the
/// statements left empty behind them.
///
/// Matches are pruned one at a time, each found by a fresh traversal that
/// aborts at the first match, so no cursor outlives a mutation that could
/// detach it.
pub fn run_prune(path: &Path, node_type: NodeType) -> Result<PruneResponse, TugastError> {
    let tree = load_tree(path)?;
    let holder = NodePath::new(Value::object([("root", tree)]));
    let root = holder.get("root");

    let visitor = PathVisitor::builder(None::<NodePath>)
        .visit(node_type, |ctx, path| {
            if path.parent_path().is_some_and(|parent| parent.parent_path().is_some()) {
                *ctx.state_mut() = Some(path.clone());
                return Err(ctx.abort());
            }
            ctx.traverse(path)?;
            Ok(VisitResult::Traversed)
        })
        .build();

    let mut pruned = 0;
    loop {
        visitor.visit(&root)?;
        let next = visitor.state_mut().take();
        let Some(target) = next else {
            break;
        };
        target.prune()?;
        pruned += 1;
    }
    info!(node_type = node_type.name(), pruned, "pruned matching nodes");

    Ok(PruneResponse::new(
        path.display().to_string(),
        node_type.name(),
        pruned,
        root.value().to_json(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_tree(json: serde_json::Value) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", json).unwrap();
        file
    }

    #[test]
    fn test_load_tree_missing_file() {
        let err = load_tree(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, TugastError::FileNotFound { .. }));
    }

    #[test]
    fn test_load_tree_reports_json_position() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{\n  \"type\": }}").unwrap();
        match load_tree(file.path()).unwrap_err() {
            TugastError::InvalidJson { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_node_type() {
        assert_eq!(parse_node_type("Identifier").unwrap(), NodeType::Identifier);
        let err = parse_node_type("Frobnicator").unwrap_err();
        assert_eq!(err.error_code().code(), 2);
    }

    #[test]
    fn test_prune_root_is_never_a_match() {
        let file = write_tree(serde_json::json!({"type": "Program", "body": []}));
        let response = run_prune(file.path(), NodeType::Program).unwrap();
        assert_eq!(response.pruned, 0);
        assert_eq!(response.tree, serde_json::json!({"type": "Program", "body": []}));
    }
}
