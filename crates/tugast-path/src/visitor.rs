// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Handler-table visitor over [`NodePath`] cursors.
//!
//! A [`PathVisitor`] holds one handler per declared node type. Each node is
//! dispatched to the handler of its own type or, failing that, of its
//! nearest declared supertype. Nodes with no applicable handler are walked
//! generically over their declared fields.
//!
//! A handler receives a [`Context`] and the node's cursor and must say what
//! happened to the node's children through its [`VisitResult`]:
//!
//! ```ignore
//! let visitor = PathVisitor::builder(0usize)
//!     .visit(NodeType::Identifier, |ctx, _path| {
//!         *ctx.state_mut() += 1;
//!         Ok(VisitResult::SkipChildren)
//!     })
//!     .visit(NodeType::Function, |ctx, path| {
//!         ctx.traverse(path)?;
//!         Ok(VisitResult::Traversed)
//!     })
//!     .build();
//! visitor.visit(tree)?;
//! ```
//!
//! # Cancellation
//!
//! A handler may stop the whole traversal by returning `Err(ctx.abort())`.
//! The error unwinds to the top-level [`PathVisitor::visit`] call, which
//! returns the root's current value instead of the error.

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use tracing::{debug, trace};
use tugast_core::{field_default, field_names_of, supertype_lookup_table, type_of, NodeType, Value};

use crate::error::{AbortRequest, VisitError};
use crate::node_path::NodePath;

// ============================================================================
// Handler Types
// ============================================================================

/// What a handler did with its node's children.
#[derive(Debug, Clone, PartialEq)]
pub enum VisitResult {
    /// The handler called [`Context::traverse`] or [`Context::visit`].
    ///
    /// Returning this without having done so is a protocol violation
    /// reported as [`VisitError::TraverseNotCalled`].
    Traversed,

    /// Children were handled by the handler or deliberately skipped.
    SkipChildren,

    /// Replace the node with this value. The replacement's children are
    /// traversed unless the handler already traversed.
    Replace(Value),
}

/// A node handler.
pub type Handler<S> = Rc<dyn Fn(&mut Context<'_, S>, &NodePath) -> Result<VisitResult, VisitError>>;

type ResetHook<S> = Box<dyn Fn(&mut S, &NodePath, &[Value])>;

/// Wraps a closure as a [`Handler`], fixing its signature for inference.
pub fn handler<S, F>(f: F) -> Handler<S>
where
    S: 'static,
    F: Fn(&mut Context<'_, S>, &NodePath) -> Result<VisitResult, VisitError> + 'static,
{
    Rc::new(f)
}

/// The root of a top-level visit: a bare value or an existing cursor.
pub enum VisitTarget {
    Value(Value),
    Path(NodePath),
}

impl From<Value> for VisitTarget {
    fn from(value: Value) -> Self {
        VisitTarget::Value(value)
    }
}

impl From<NodePath> for VisitTarget {
    fn from(path: NodePath) -> Self {
        VisitTarget::Path(path)
    }
}

impl From<&NodePath> for VisitTarget {
    fn from(path: &NodePath) -> Self {
        VisitTarget::Path(path.clone())
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Collects handlers and options for a [`PathVisitor`].
pub struct PathVisitorBuilder<S: 'static> {
    handlers: HashMap<NodeType, Handler<S>>,
    reset_hook: Option<ResetHook<S>>,
    state: S,
}

impl<S: 'static> PathVisitorBuilder<S> {
    /// Declares the handler for nodes of type `node_type` and its subtypes.
    /// A later declaration for the same type replaces the earlier one.
    pub fn visit<F>(mut self, node_type: NodeType, f: F) -> Self
    where
        F: Fn(&mut Context<'_, S>, &NodePath) -> Result<VisitResult, VisitError> + 'static,
    {
        self.handlers.insert(node_type, Rc::new(f));
        self
    }

    pub fn visit_handler(mut self, node_type: NodeType, handler: Handler<S>) -> Self {
        self.handlers.insert(node_type, handler);
        self
    }

    /// Installs a hook run at the start of every top-level visit with the
    /// root cursor and the extra arguments passed to
    /// [`PathVisitor::visit_with`].
    pub fn on_reset<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut S, &NodePath, &[Value]) + 'static,
    {
        self.reset_hook = Some(Box::new(hook));
        self
    }

    pub fn build(self) -> PathVisitor<S> {
        let declared: HashSet<NodeType> = self.handlers.keys().copied().collect();
        let method_table = supertype_lookup_table(&declared);
        let visit_comments =
            method_table.contains_key(&NodeType::Block) || method_table.contains_key(&NodeType::Line);
        debug!(
            handlers = self.handlers.len(),
            resolved = method_table.len(),
            visit_comments,
            "built path visitor"
        );
        PathVisitor {
            handlers: self.handlers,
            method_table,
            visit_comments,
            reset_hook: self.reset_hook,
            state: RefCell::new(self.state),
            visiting: Cell::new(false),
            change_reported: Cell::new(false),
            abort_requested: Rc::new(Cell::new(false)),
            context_pool: RefCell::new(Vec::new()),
        }
    }
}

// ============================================================================
// Visitor
// ============================================================================

/// Per-call context storage, recycled through the visitor's pool.
#[derive(Default)]
struct ContextSlot {
    current_path: Option<NodePath>,
    need_to_call_traverse: bool,
}

struct VisitingGuard<'a>(&'a Cell<bool>);

impl Drop for VisitingGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// A reusable tree visitor with per-type handlers and owned state `S`.
pub struct PathVisitor<S: 'static = ()> {
    handlers: HashMap<NodeType, Handler<S>>,
    /// Concrete type to the declared type whose handler applies.
    method_table: HashMap<NodeType, NodeType>,
    visit_comments: bool,
    reset_hook: Option<ResetHook<S>>,
    state: RefCell<S>,
    visiting: Cell<bool>,
    change_reported: Cell<bool>,
    abort_requested: Rc<Cell<bool>>,
    context_pool: RefCell<Vec<ContextSlot>>,
}

impl<S: 'static> fmt::Debug for PathVisitor<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut declared: Vec<&str> = self.handlers.keys().map(|t| t.name()).collect();
        declared.sort_unstable();
        f.debug_struct("PathVisitor")
            .field("handlers", &declared)
            .field("visit_comments", &self.visit_comments)
            .field("visiting", &self.visiting.get())
            .finish()
    }
}

impl<S: 'static> PathVisitor<S> {
    pub fn builder(state: S) -> PathVisitorBuilder<S> {
        PathVisitorBuilder {
            handlers: HashMap::new(),
            reset_hook: None,
            state,
        }
    }

    /// Builds a visitor from `("visit<TypeName>", handler)` pairs.
    pub fn from_methods<K, I>(methods: I, state: S) -> Result<Self, VisitError>
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, Handler<S>)>,
    {
        let mut builder = Self::builder(state);
        for (name, handler) in methods {
            let name = name.as_ref();
            let node_type = name
                .strip_prefix("visit")
                .and_then(NodeType::from_name)
                .ok_or_else(|| VisitError::InvalidHandlerName {
                    name: name.to_string(),
                })?;
            builder = builder.visit_handler(node_type, handler);
        }
        Ok(builder.build())
    }

    /// The declared type whose handler applies to `node_type`, if any.
    pub fn resolve(&self, node_type: NodeType) -> Option<NodeType> {
        self.method_table.get(&node_type).copied()
    }

    pub fn visits_comments(&self) -> bool {
        self.visit_comments
    }

    pub fn is_visiting(&self) -> bool {
        self.visiting.get()
    }

    pub fn state(&self) -> Ref<'_, S> {
        self.state.borrow()
    }

    pub fn state_mut(&self) -> RefMut<'_, S> {
        self.state.borrow_mut()
    }

    pub fn into_state(self) -> S {
        self.state.into_inner()
    }

    /// Records that some handler changed the tree.
    pub fn report_changed(&self) {
        self.change_reported.set(true);
    }

    pub fn was_change_reported(&self) -> bool {
        self.change_reported.get()
    }

    /// Requests that the current traversal stop. Return the result from a
    /// handler to unwind.
    pub fn abort(&self) -> VisitError {
        self.abort_requested.set(true);
        VisitError::Aborted(AbortRequest::new(Rc::clone(&self.abort_requested)))
    }

    /// Number of idle contexts waiting in the pool.
    pub fn pooled_contexts(&self) -> usize {
        self.context_pool.borrow().len()
    }

    /// Visits `root` and returns the root's resulting value.
    pub fn visit(&self, root: impl Into<VisitTarget>) -> Result<Value, VisitError> {
        self.visit_with(root, &[])
    }

    /// Visits `root`, passing `args` to the reset hook.
    pub fn visit_with(&self, root: impl Into<VisitTarget>, args: &[Value]) -> Result<Value, VisitError> {
        if self.visiting.get() {
            return Err(VisitError::Reentrant);
        }
        self.visiting.set(true);
        let _guard = VisitingGuard(&self.visiting);

        self.change_reported.set(false);
        self.abort_requested.set(false);

        let root = match root.into() {
            VisitTarget::Path(path) => path,
            VisitTarget::Value(value) => NodePath::new(Value::object([("root", value)])).get("root"),
        };

        if let Some(hook) = &self.reset_hook {
            hook(&mut self.state.borrow_mut(), &root, args);
        }

        match self.visit_without_reset(&root) {
            Err(VisitError::Aborted(request)) if !request.is_cancelled() => {
                debug!("traversal aborted; returning root value");
                Ok(root.value())
            }
            result => result,
        }
    }

    /// Visits `path` without touching visitor-level flags or state.
    fn visit_without_reset(&self, path: &NodePath) -> Result<Value, VisitError> {
        let value = path.value();
        let dispatch = type_of(&value).and_then(|t| {
            let declared = self.resolve(t)?;
            self.handlers.get(&declared).map(|h| (t, declared, Rc::clone(h)))
        });

        match dispatch {
            Some((node_type, declared, handler)) => {
                trace!(%node_type, handler = %declared, "dispatch");
                let mut context = self.acquire_context(path);
                let result = context.invoke(declared, &handler);
                self.release_context(context);
                result
            }
            None => visit_children(path, self),
        }
    }

    fn acquire_context(&self, path: &NodePath) -> Context<'_, S> {
        let mut slot = self.context_pool.borrow_mut().pop().unwrap_or_default();
        slot.current_path = Some(path.clone());
        slot.need_to_call_traverse = true;
        Context { visitor: self, slot }
    }

    fn release_context(&self, context: Context<'_, S>) {
        let mut slot = context.slot;
        slot.current_path = None;
        slot.need_to_call_traverse = false;
        self.context_pool.borrow_mut().push(slot);
    }
}

/// Walks the children of `path` with `visitor`, filling in defaulted fields
/// that are missing from typed nodes.
fn visit_children<S: 'static>(path: &NodePath, visitor: &PathVisitor<S>) -> Result<Value, VisitError> {
    let value = path.value();
    match &value {
        Value::Array(_) => {
            path.try_each(|child| {
                visitor.visit_without_reset(child)?;
                Ok::<(), VisitError>(())
            })?;
        }
        Value::Object(object) => {
            let mut child_names = field_names_of(&value)?;
            if visitor.visit_comments
                && !object.get("comments").is_null()
                && !child_names.iter().any(|name| name == "comments")
            {
                child_names.push("comments".to_string());
            }

            let child_paths: Vec<NodePath> = child_names
                .iter()
                .map(|name| {
                    if !object.contains_key(name) {
                        if let Some(default) = field_default(&value, name) {
                            object.insert(name.as_str(), default);
                        }
                    }
                    path.get(name.as_str())
                })
                .collect();

            for child in &child_paths {
                visitor.visit_without_reset(child)?;
            }
        }
        _ => {}
    }
    Ok(path.value())
}

// ============================================================================
// Context
// ============================================================================

/// The receiver of one handler invocation.
///
/// Gives handlers access to traversal helpers and to the owning visitor's
/// state and flags.
pub struct Context<'v, S: 'static> {
    visitor: &'v PathVisitor<S>,
    slot: ContextSlot,
}

impl<'v, S: 'static> Context<'v, S> {
    fn invoke(&mut self, declared: NodeType, handler: &Handler<S>) -> Result<Value, VisitError> {
        let Some(path) = self.slot.current_path.clone() else {
            return Ok(Value::Null);
        };

        match handler(self, &path)? {
            VisitResult::Traversed => {}
            VisitResult::SkipChildren => self.slot.need_to_call_traverse = false,
            VisitResult::Replace(replacement) => {
                path.replace_with(replacement)?;
                if self.slot.need_to_call_traverse {
                    self.traverse(&path)?;
                }
            }
        }

        if self.slot.need_to_call_traverse {
            return Err(VisitError::TraverseNotCalled {
                type_name: declared.name().to_string(),
            });
        }
        Ok(path.value())
    }

    /// Walks the children of `path` with this visitor.
    pub fn traverse(&mut self, path: &NodePath) -> Result<Value, VisitError> {
        self.slot.need_to_call_traverse = false;
        visit_children(path, self.visitor)
    }

    /// Walks the children of `path` with another visitor.
    pub fn traverse_with<T: 'static>(
        &mut self,
        path: &NodePath,
        visitor: &PathVisitor<T>,
    ) -> Result<Value, VisitError> {
        self.slot.need_to_call_traverse = false;
        visit_children(path, visitor)
    }

    /// Dispatches `path` itself (not just its children) with this visitor.
    pub fn visit(&mut self, path: &NodePath) -> Result<Value, VisitError> {
        self.slot.need_to_call_traverse = false;
        self.visitor.visit_without_reset(path)
    }

    /// Dispatches `path` with another visitor, without resetting it.
    pub fn visit_with<T: 'static>(
        &mut self,
        path: &NodePath,
        visitor: &PathVisitor<T>,
    ) -> Result<Value, VisitError> {
        self.slot.need_to_call_traverse = false;
        visitor.visit_without_reset(path)
    }

    pub fn abort(&self) -> VisitError {
        self.visitor.abort()
    }

    pub fn report_changed(&self) {
        self.visitor.report_changed();
    }

    pub fn was_change_reported(&self) -> bool {
        self.visitor.was_change_reported()
    }

    /// The cursor this context was created for.
    pub fn current_path(&self) -> Option<&NodePath> {
        self.slot.current_path.as_ref()
    }

    pub fn visitor(&self) -> &'v PathVisitor<S> {
        self.visitor
    }

    /// The visitor's state. Release the borrow before traversing further.
    pub fn state(&self) -> Ref<'v, S> {
        self.visitor.state.borrow()
    }

    /// The visitor's state, mutably. Release the borrow before traversing
    /// further.
    pub fn state_mut(&self) -> RefMut<'v, S> {
        self.visitor.state.borrow_mut()
    }
}
