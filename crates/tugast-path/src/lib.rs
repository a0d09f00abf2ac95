// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Cursors and traversal over mutable syntax trees.
//!
//! - [`Path`]: a cursor into one slot of a tree, with identity-stable child
//!   cursors and splice-aware mutation (`replace`, `insert_at`, `shift`, ...).
//! - [`NodePath`]: a cursor that also knows its enclosing node, parent node
//!   and [`Scope`], and can [`prune`](NodePath::prune) itself or decide
//!   whether it [needs parentheses](NodePath::needs_parens).
//! - [`PathVisitor`]: a handler-per-type visitor with supertype fallback,
//!   replacement, cancellation and a reusable context pool.
//!
//! Everything here is single-threaded; trees are shared through `Rc`.

pub mod error;
pub mod node_path;
pub mod parens;
pub mod path;
pub mod scope;
pub mod visitor;

pub use error::{AbortRequest, PathError, VisitError};
pub use node_path::{NodePath, NodeViews};
pub use parens::{contains_call_expression, precedence};
pub use path::{Name, Path, PathViews, WeakPath};
pub use scope::{Scope, ScopeKind};
pub use visitor::{handler, Context, Handler, PathVisitor, PathVisitorBuilder, VisitResult, VisitTarget};
