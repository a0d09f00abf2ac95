// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Core tree model for tugast.
//!
//! This crate provides the pieces the traversal engine builds on:
//! - [`Value`]: shared, mutable tree values with handle identity
//! - [`NodeType`]: the closed node type vocabulary, its supertype
//!   linearization, and per-type field declarations with defaults
//! - [`builders`]: constructors for synthesizing nodes

pub mod builders;
pub mod error;
pub mod types;
pub mod value;

pub use error::CoreError;
pub use types::{
    field_default, field_names_of, field_value, is_expression, is_node, is_statement, some_field,
    supertype_lookup_table, type_of, FieldDef, FieldDefault, NodeType,
};
pub use value::{Array, Map, Object, Value};
