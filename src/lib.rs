//! tugast: path-based traversal and rewriting of ESTree syntax trees.
//!
//! The engine lives in two workspace crates, re-exported here:
//! - [`tugast_core`]: the shared tree model and node type vocabulary
//! - [`tugast_path`]: `Path`/`NodePath` cursors and the `PathVisitor`
//!
//! The modules below back the `tugast` command-line tool.

pub use tugast_core;
pub use tugast_path;

pub mod commands;
pub mod error;
pub mod output;
