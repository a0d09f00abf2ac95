// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Error types for the tree model.

use thiserror::Error;

/// Errors raised by the type vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A `"type"` discriminant that names no known node type.
    #[error("did not recognize object of type {name}")]
    UnknownType { name: String },
}
