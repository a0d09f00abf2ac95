// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Lexical scopes attached to node cursors.
//!
//! A scope is established by a `Program`, any function, or a `catch` clause.
//! [`NodePath::scope`](crate::NodePath::scope) resolves and caches the
//! innermost scope enclosing a cursor; this module only describes the chain.
//! Binding analysis is not performed.

use std::fmt;
use std::rc::Rc;

use tugast_core::{NodeType, Value};

use crate::node_path::{NodeViews, NodePath};
use crate::path::WeakPath;

/// The kind of node that established a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    /// The whole program.
    Program,
    /// A function declaration, expression or arrow function.
    Function,
    /// A `catch` clause binding its parameter.
    Catch,
}

impl ScopeKind {
    /// Returns the string representation used in output.
    pub fn as_str(&self) -> &'static str {
        match self {
            ScopeKind::Program => "program",
            ScopeKind::Function => "function",
            ScopeKind::Catch => "catch",
        }
    }

    /// The kind of scope `node` establishes, if any.
    pub fn of(node: &Value) -> Option<ScopeKind> {
        if NodeType::Program.check(node) {
            Some(ScopeKind::Program)
        } else if NodeType::Function.check(node) {
            Some(ScopeKind::Function)
        } else if NodeType::CatchClause.check(node) {
            Some(ScopeKind::Catch)
        } else {
            None
        }
    }
}

impl fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A scope in the chain from a cursor out to the program.
pub struct Scope {
    kind: ScopeKind,
    path: WeakPath<NodeViews>,
    node: Value,
    parent: Option<Rc<Scope>>,
    depth: usize,
}

impl Scope {
    /// True if `node` starts a new scope.
    pub fn is_established_by(node: &Value) -> bool {
        ScopeKind::of(node).is_some()
    }

    /// Creates the scope established by the node at `path`.
    ///
    /// # Panics
    ///
    /// Panics if the value at `path` does not establish a scope.
    pub fn new(path: &NodePath, parent: Option<Rc<Scope>>) -> Rc<Scope> {
        let node = path.value();
        let Some(kind) = ScopeKind::of(&node) else {
            panic!("{node} does not establish a scope");
        };
        let depth = parent.as_ref().map_or(0, |p| p.depth + 1);
        Rc::new(Scope {
            kind,
            path: path.downgrade(),
            node,
            parent,
            depth,
        })
    }

    pub fn kind(&self) -> ScopeKind {
        self.kind
    }

    /// The node that established this scope.
    pub fn node(&self) -> &Value {
        &self.node
    }

    /// The cursor that established this scope, while it is still alive.
    pub fn path(&self) -> Option<NodePath> {
        self.path.upgrade()
    }

    pub fn parent(&self) -> Option<&Rc<Scope>> {
        self.parent.as_ref()
    }

    /// Nesting depth; the outermost scope is 0.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_global(&self) -> bool {
        self.parent.is_none()
    }

    /// The outermost scope of the chain.
    pub fn global_scope(self: &Rc<Self>) -> Rc<Scope> {
        let mut scope = Rc::clone(self);
        while let Some(parent) = scope.parent.clone() {
            scope = parent;
        }
        scope
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("kind", &self.kind)
            .field("node_type", &self.node.type_name())
            .field("depth", &self.depth)
            .finish()
    }
}
