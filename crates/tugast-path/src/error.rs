// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Error types for cursors and traversal.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use thiserror::Error;
use tugast_core::CoreError;

// ============================================================================
// Cursor Errors
// ============================================================================

/// Errors raised by structural mutation through a cursor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// The operation needs a containing slot and the cursor is a root.
    #[error("path has no parent")]
    NoParent,

    /// An array operation was applied to a non-array value.
    #[error("value at '{name}' is not an array")]
    NotAnArray { name: String },

    /// A sibling operation was applied to a slot that is not an array index.
    #[error("path '{name}' is not an array element")]
    NotAnArrayElement { name: String },

    /// An object key can hold only one value.
    #[error("cannot replace object key '{name}' with {count} values")]
    MultipleReplacementsForKey { name: String, count: usize },

    /// The parent value is a primitive.
    #[error("parent of '{name}' is neither an array nor an object")]
    ParentNotContainer { name: String },
}

// ============================================================================
// Abort Requests
// ============================================================================

/// The payload of [`VisitError::Aborted`].
///
/// Unwinding stops at the top-level `visit` call, which then returns the
/// root value. Calling [`AbortRequest::cancel`] while the error is still
/// propagating turns it back into an ordinary error that escapes `visit`.
#[derive(Clone)]
pub struct AbortRequest {
    requested: Rc<Cell<bool>>,
}

impl AbortRequest {
    pub(crate) fn new(requested: Rc<Cell<bool>>) -> Self {
        AbortRequest { requested }
    }

    /// Withdraws the request.
    pub fn cancel(&self) {
        self.requested.set(false);
    }

    pub fn is_cancelled(&self) -> bool {
        !self.requested.get()
    }
}

impl fmt::Debug for AbortRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AbortRequest")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

// ============================================================================
// Visit Errors
// ============================================================================

/// Errors raised while visiting a tree.
#[derive(Debug, Error)]
pub enum VisitError {
    #[error(transparent)]
    Path(#[from] PathError),

    /// `visit` was called on a visitor that is already visiting.
    #[error("visit() called while a visit is in progress; use Context::visit or Context::traverse")]
    Reentrant,

    /// A handler returned without traversing its node's children and without
    /// returning [`SkipChildren`](crate::VisitResult::SkipChildren).
    #[error("handler for {type_name} must either traverse or skip children")]
    TraverseNotCalled { type_name: String },

    /// A node with a `"type"` that names no known type.
    #[error("did not recognize object of type {type_name}")]
    UnrecognizedType { type_name: String },

    /// A handler name not of the form `visit<TypeName>`.
    #[error("invalid handler name '{name}': expected visit<TypeName>")]
    InvalidHandlerName { name: String },

    /// Raised through [`Context::abort`](crate::Context::abort).
    #[error("traversal aborted")]
    Aborted(AbortRequest),

    /// A failure reported by a handler.
    #[error("{message}")]
    Handler { message: String },
}

impl VisitError {
    pub fn handler(message: impl Into<String>) -> Self {
        VisitError::Handler {
            message: message.into(),
        }
    }

    pub fn as_abort(&self) -> Option<&AbortRequest> {
        match self {
            VisitError::Aborted(request) => Some(request),
            _ => None,
        }
    }
}

impl From<CoreError> for VisitError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::UnknownType { name } => VisitError::UnrecognizedType { type_name: name },
        }
    }
}
