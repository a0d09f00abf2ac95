// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Generic tree cursor.
//!
//! A [`Path`] points at one slot of a mutable tree: it remembers the value in
//! the slot, the cursor of the containing value, and the name (array index or
//! object key) of the slot within it.
//!
//! # Child identity
//!
//! Navigating with [`Path::get`] caches the child cursor under its parent, so
//! asking for the same slot twice yields the same cursor (compare with
//! [`Path::ptr_eq`] or `==`). A cached cursor is replaced as soon as the value
//! in its slot changes identity or the slot is removed.
//!
//! Ownership runs downward: a cursor owns its cached children and refers to
//! its parent weakly. Every handle also holds the root cursor, so the whole
//! cursor tree (and every cached view in it) stays alive while any handle
//! into it exists, and nothing forms a reference cycle.
//!
//! # Mutation
//!
//! All structural mutation goes through [`Path::replace`] and the array
//! helpers built around it ([`Path::insert_at`], [`Path::shift`], ...).
//! These keep cached cursors consistent: cursors after a splice point are
//! renamed to their new index instead of being recreated. Writing into the
//! tree behind the cursors' back leaves the caches stale.
//!
//! Internal consistency checks panic. They signal a defect in the calling
//! code (for example replacing through a cursor that was already removed),
//! not a recoverable condition.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use tugast_core::{Array, Value};

use crate::error::PathError;

const LENGTH: &str = "length";

// ============================================================================
// Names
// ============================================================================

/// The name of a slot within its container.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Name {
    Index(usize),
    Key(String),
}

impl Name {
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Name::Index(i) => Some(*i),
            Name::Key(_) => None,
        }
    }

    pub fn as_key(&self) -> Option<&str> {
        match self {
            Name::Key(k) => Some(k),
            Name::Index(_) => None,
        }
    }

    pub fn is_key(&self, key: &str) -> bool {
        self.as_key() == Some(key)
    }

    pub fn is_index(&self, index: usize) -> bool {
        self.as_index() == Some(index)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Name::Index(i) => write!(f, "{i}"),
            Name::Key(k) => f.write_str(k),
        }
    }
}

impl From<usize> for Name {
    fn from(i: usize) -> Self {
        Name::Index(i)
    }
}

impl From<&str> for Name {
    fn from(k: &str) -> Self {
        Name::Key(k.to_string())
    }
}

impl From<String> for Name {
    fn from(k: String) -> Self {
        Name::Key(k)
    }
}

impl From<&Name> for Name {
    fn from(name: &Name) -> Self {
        name.clone()
    }
}

/// Reads the slot `name` of `value`. Arrays also expose `length`.
pub(crate) fn value_property(value: &Value, name: &Name) -> Value {
    match (value, name) {
        (Value::Array(a), Name::Index(i)) => a.get(*i),
        (Value::Array(a), Name::Key(k)) if k == LENGTH => Value::Number(a.len() as f64),
        (Value::Object(o), Name::Key(k)) => o.get(k),
        (Value::Object(o), Name::Index(i)) => o.get(&i.to_string()),
        _ => Value::Null,
    }
}

fn splice_in(items: &mut Vec<Value>, at: usize, values: Vec<Value>) {
    let tail = items.split_off(at);
    items.extend(values);
    items.extend(tail);
}

// ============================================================================
// Derived views
// ============================================================================

/// Per-cursor derived state, cleared whenever the cursor's slot is replaced.
///
/// The plain cursor carries no views (`()`); [`NodePath`](crate::NodePath)
/// caches its enclosing node, parent and scope here.
pub trait PathViews: Default {
    fn clear(&self);
}

impl PathViews for () {
    fn clear(&self) {}
}

// ============================================================================
// Path
// ============================================================================

struct PathInner<X: PathViews> {
    value: RefCell<Value>,
    parent: Option<Weak<PathInner<X>>>,
    name: RefCell<Option<Name>>,
    children: RefCell<HashMap<Name, Rc<PathInner<X>>>>,
    views: X,
}

/// A cursor into a mutable tree slot.
pub struct Path<X: PathViews = ()> {
    inner: Rc<PathInner<X>>,
    root: Rc<PathInner<X>>,
}

/// A non-owning handle to a [`Path`].
pub struct WeakPath<X: PathViews = ()> {
    inner: Weak<PathInner<X>>,
    root: Weak<PathInner<X>>,
}

impl<X: PathViews> WeakPath<X> {
    /// The cursor, if its tree is still held somewhere.
    pub fn upgrade(&self) -> Option<Path<X>> {
        Some(Path {
            inner: self.inner.upgrade()?,
            root: self.root.upgrade()?,
        })
    }
}

impl<X: PathViews> Clone for WeakPath<X> {
    fn clone(&self) -> Self {
        WeakPath {
            inner: self.inner.clone(),
            root: self.root.clone(),
        }
    }
}

impl<X: PathViews> Clone for Path<X> {
    fn clone(&self) -> Self {
        Path {
            inner: Rc::clone(&self.inner),
            root: Rc::clone(&self.root),
        }
    }
}

/// Cursor identity.
impl<X: PathViews> PartialEq for Path<X> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<X: PathViews> Eq for Path<X> {}

impl<X: PathViews> fmt::Debug for Path<X> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Path")
            .field("name", &self.name())
            .field("value", &self.value())
            .finish()
    }
}

impl<X: PathViews> Path<X> {
    /// Creates a root cursor over `value`.
    pub fn new(value: Value) -> Self {
        let inner = Self::make_inner(value, None, None);
        Path {
            root: Rc::clone(&inner),
            inner,
        }
    }

    fn make_inner(value: Value, parent: Option<&Path<X>>, name: Option<Name>) -> Rc<PathInner<X>> {
        Rc::new(PathInner {
            value: RefCell::new(value),
            parent: parent.map(|p| Rc::downgrade(&p.inner)),
            name: RefCell::new(name),
            children: RefCell::new(HashMap::new()),
            views: X::default(),
        })
    }

    /// A handle to `inner` within this cursor's tree.
    fn sibling_handle(&self, inner: Rc<PathInner<X>>) -> Path<X> {
        Path {
            inner,
            root: Rc::clone(&self.root),
        }
    }

    /// The value in this cursor's slot. Composites are shared handles.
    pub fn value(&self) -> Value {
        self.inner.value.borrow().clone()
    }

    fn set_value(&self, value: Value) {
        *self.inner.value.borrow_mut() = value;
    }

    /// The slot name within the parent; `None` for a root cursor.
    pub fn name(&self) -> Option<Name> {
        self.inner.name.borrow().clone()
    }

    fn set_name(&self, name: Name) {
        *self.inner.name.borrow_mut() = Some(name);
    }

    /// The array index of this slot, if it is an array element.
    pub fn index(&self) -> Option<usize> {
        self.inner.name.borrow().as_ref().and_then(Name::as_index)
    }

    /// The cursor of the containing value.
    ///
    /// `None` for a root cursor, or for a removed cursor whose former parent
    /// is no longer held anywhere.
    pub fn parent_path(&self) -> Option<Path<X>> {
        let parent = self.inner.parent.as_ref()?.upgrade()?;
        Some(self.sibling_handle(parent))
    }

    /// Names from the root down to this cursor.
    pub fn names(&self) -> Vec<Name> {
        let mut names = Vec::new();
        let mut current = Some(self.clone());
        while let Some(path) = current {
            if let Some(name) = path.name() {
                names.push(name);
            }
            current = path.parent_path();
        }
        names.reverse();
        names
    }

    pub fn ptr_eq(&self, other: &Path<X>) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn downgrade(&self) -> WeakPath<X> {
        WeakPath {
            inner: Rc::downgrade(&self.inner),
            root: Rc::downgrade(&self.root),
        }
    }

    pub(crate) fn views(&self) -> &X {
        &self.inner.views
    }

    fn display_name(&self) -> String {
        self.name()
            .map_or_else(|| "<root>".to_string(), |name| name.to_string())
    }

    // ------------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------------

    /// Returns the cursor for the child slot `name`, creating and caching it
    /// on first use.
    ///
    /// An index into an object value names the key of the same spelling, so
    /// `get(0)` and `get("0")` on an object share one cursor.
    pub fn get(&self, name: impl Into<Name>) -> Path<X> {
        let name: Name = name.into();
        let value = self.value();
        let name = match (&value, name) {
            (Value::Object(_), Name::Index(i)) => Name::Key(i.to_string()),
            (_, name) => name,
        };
        let actual = value_property(&value, &name);
        let mut children = self.inner.children.borrow_mut();
        if let Some(inner) = children.get(&name) {
            if inner.value.borrow().same(&actual) {
                return self.sibling_handle(Rc::clone(inner));
            }
        }
        let inner = Self::make_inner(actual, Some(self), Some(name.clone()));
        children.insert(name, Rc::clone(&inner));
        self.sibling_handle(inner)
    }

    /// Steps through `names` in order. An empty sequence yields this cursor.
    pub fn get_in<I, N>(&self, names: I) -> Path<X>
    where
        I: IntoIterator<Item = N>,
        N: Into<Name>,
    {
        names
            .into_iter()
            .fold(self.clone(), |path, name| path.get(name))
    }

    /// Child cursors for every element of an array value, resolved before
    /// the caller sees any of them.
    fn snapshot(&self) -> Vec<Path<X>> {
        let len = match &*self.inner.value.borrow() {
            Value::Array(a) => a.len(),
            _ => 0,
        };
        (0..len).map(|i| self.get(i)).collect()
    }

    /// Calls `f` for each element cursor in ascending index order.
    ///
    /// The cursors are gathered up front, so mutations made by `f` never
    /// change which elements are visited or in what order.
    pub fn each(&self, mut f: impl FnMut(&Path<X>)) {
        for child in self.snapshot() {
            f(&child);
        }
    }

    /// Fallible [`Path::each`]; stops at the first error.
    pub fn try_each<E>(&self, mut f: impl FnMut(&Path<X>) -> Result<(), E>) -> Result<(), E> {
        for child in self.snapshot() {
            f(&child)?;
        }
        Ok(())
    }

    pub fn map<T>(&self, f: impl FnMut(&Path<X>) -> T) -> Vec<T> {
        self.snapshot().iter().map(f).collect()
    }

    pub fn filter(&self, f: impl FnMut(&Path<X>) -> bool) -> Vec<Path<X>> {
        self.snapshot().into_iter().filter(f).collect()
    }

    // ------------------------------------------------------------------------
    // Child cache bookkeeping
    // ------------------------------------------------------------------------

    fn cache_child(&self, name: Name, child: &Path<X>) {
        self.inner
            .children
            .borrow_mut()
            .insert(name, Rc::clone(&child.inner));
    }

    fn forget_child(&self, name: &Name) {
        self.inner.children.borrow_mut().remove(name);
    }

    /// Drops the cache entry `name` only if it is `child`.
    fn forget_child_if(&self, name: &Name, child: &Path<X>) {
        let mut children = self.inner.children.borrow_mut();
        if children.get(name).is_some_and(|cached| Rc::ptr_eq(cached, &child.inner)) {
            children.remove(name);
        }
    }

    fn clear_children(&self) {
        self.inner.children.borrow_mut().clear();
    }

    /// Renames cached element cursors at `start..` by `offset` and drops the
    /// cached `length`.
    fn shift_cached(&self, start: usize, offset: isize) {
        let mut children = self.inner.children.borrow_mut();
        children.remove(&Name::Key(LENGTH.to_string()));
        if offset == 0 {
            return;
        }

        let moved: Vec<(usize, Rc<PathInner<X>>)> = children
            .iter()
            .filter_map(|(name, inner)| match name {
                Name::Index(i) if *i >= start => Some((*i, Rc::clone(inner))),
                _ => None,
            })
            .collect();
        children.retain(|name, _| !matches!(name, Name::Index(i) if *i >= start));

        for (old_index, inner) in moved {
            assert_eq!(
                inner.name.borrow().as_ref().and_then(Name::as_index),
                Some(old_index),
                "cached path name disagrees with its cache slot"
            );
            let new_index = old_index
                .checked_add_signed(offset)
                .expect("moved paths never precede the splice point");
            *inner.name.borrow_mut() = Some(Name::Index(new_index));
            children.insert(Name::Index(new_index), inner);
        }
    }

    fn array(&self) -> Result<Array, PathError> {
        match self.value() {
            Value::Array(a) => Ok(a),
            _ => Err(PathError::NotAnArray {
                name: self.display_name(),
            }),
        }
    }

    // ------------------------------------------------------------------------
    // Array mutation
    // ------------------------------------------------------------------------

    /// Removes and returns the first element.
    pub fn shift(&self) -> Result<Option<Value>, PathError> {
        let array = self.array()?;
        if array.is_empty() {
            self.forget_child(&Name::Key(LENGTH.to_string()));
            return Ok(None);
        }
        let first = array.borrow_mut().remove(0);
        self.forget_child(&Name::Index(0));
        self.shift_cached(1, -1);
        Ok(Some(first))
    }

    /// Prepends `values`, returning the new length.
    pub fn unshift(&self, values: Vec<Value>) -> Result<usize, PathError> {
        let array = self.array()?;
        let count = values.len();
        splice_in(&mut array.borrow_mut(), 0, values);
        self.shift_cached(0, count as isize);
        Ok(array.len())
    }

    /// Appends `values`, returning the new length.
    pub fn push(&self, values: Vec<Value>) -> Result<usize, PathError> {
        let array = self.array()?;
        array.borrow_mut().extend(values);
        self.forget_child(&Name::Key(LENGTH.to_string()));
        Ok(array.len())
    }

    /// Removes and returns the last element.
    pub fn pop(&self) -> Result<Option<Value>, PathError> {
        let array = self.array()?;
        let popped = array.borrow_mut().pop();
        if popped.is_some() {
            self.forget_child(&Name::Index(array.len()));
        }
        self.forget_child(&Name::Key(LENGTH.to_string()));
        Ok(popped)
    }

    /// Inserts `values` before position `index` (clamped to the length).
    /// Cached cursors at or after `index` move up by the number inserted.
    pub fn insert_at(&self, index: usize, values: Vec<Value>) -> Result<(), PathError> {
        let array = self.array()?;
        if values.is_empty() {
            return Ok(());
        }
        let count = values.len();
        let index = index.min(array.len());
        splice_in(&mut array.borrow_mut(), index, values);
        self.shift_cached(index, count as isize);
        Ok(())
    }

    fn sibling_index(&self) -> Result<(Path<X>, usize), PathError> {
        let parent = self.parent_path().ok_or(PathError::NoParent)?;
        let index = self.index().ok_or_else(|| PathError::NotAnArrayElement {
            name: self.display_name(),
        })?;
        Ok((parent, index))
    }

    /// Inserts `values` into the parent array just before this element.
    pub fn insert_before(&self, values: Vec<Value>) -> Result<(), PathError> {
        let (parent, index) = self.sibling_index()?;
        parent.insert_at(index, values)
    }

    /// Inserts `values` into the parent array just after this element.
    pub fn insert_after(&self, values: Vec<Value>) -> Result<(), PathError> {
        let (parent, index) = self.sibling_index()?;
        parent.insert_at(index + 1, values)
    }

    // ------------------------------------------------------------------------
    // Replace
    // ------------------------------------------------------------------------

    /// Makes sure the parent's cache maps this cursor's name to this cursor,
    /// re-finding the cursor by identity if its array index went stale.
    fn repair_relationship_with_parent(&self, parent: &Path<X>) {
        let Some(name) = self.name() else {
            return;
        };
        let parent_value = parent.value();
        let value = self.value();

        if value_property(&parent_value, &name).same(&value) {
            parent.cache_child(name.clone(), self);
        } else if let Value::Array(array) = &parent_value {
            if let Some(i) = array.position(&value) {
                parent.forget_child_if(&name, self);
                self.set_name(Name::Index(i));
                parent.cache_child(Name::Index(i), self);
            }
        } else if let Value::Object(object) = &parent_value {
            object.insert(name.to_string(), value.clone());
            parent.cache_child(name.clone(), self);
        }

        let name = self.name().unwrap_or(name);
        assert!(
            value_property(&parent_value, &name).same(&value),
            "path value is out of sync with its parent slot"
        );
        assert!(
            parent.get(&name).ptr_eq(self),
            "parent does not resolve this path's slot to this path"
        );
    }

    /// Replaces this slot with `replacements`.
    ///
    /// - No values: removes the slot. Later array elements shift down; an
    ///   object key is deleted. The cursor is left stale with a `Null` value.
    /// - One value: replaces in place; the cursor keeps its identity.
    /// - Several values (array parent only): splices them in place of this
    ///   element and returns one cursor per value, the first being this
    ///   cursor.
    ///
    /// Clears this cursor's derived views.
    ///
    /// # Panics
    ///
    /// Panics if the cursor is out of sync with its parent in a way that
    /// cannot be repaired, such as replacing through a removed cursor.
    pub fn replace(&self, replacements: Vec<Value>) -> Result<Vec<Path<X>>, PathError> {
        let Some(parent) = self.parent_path() else {
            return Err(PathError::NoParent);
        };
        self.inner.views.clear();
        self.repair_relationship_with_parent(&parent);
        let name = self.name().ok_or(PathError::NoParent)?;
        let count = replacements.len();

        match parent.value() {
            Value::Array(array) => {
                let Name::Index(index) = name else {
                    return Err(PathError::NotAnArrayElement {
                        name: name.to_string(),
                    });
                };
                let original_len = array.len();
                assert!(index < original_len, "cannot replace a removed path");
                let first = replacements.first().cloned();

                let removed: Vec<Value> = array
                    .borrow_mut()
                    .splice(index..=index, replacements)
                    .collect();
                assert!(
                    removed.len() == 1 && removed[0].same(&self.value()),
                    "spliced-out value is not the path's value"
                );
                assert_eq!(
                    array.len() + 1,
                    original_len + count,
                    "unexpected array length after splice"
                );

                match first {
                    None => {
                        parent.forget_child(&Name::Index(index));
                        parent.shift_cached(index + 1, -1);
                        self.set_value(Value::Null);
                        self.clear_children();
                        Ok(Vec::new())
                    }
                    Some(first) => {
                        parent.shift_cached(index + 1, count as isize - 1);
                        assert!(
                            array.get(index).same(&first),
                            "parent slot does not hold the replacement"
                        );
                        if !self.value().same(&first) {
                            self.set_value(first);
                            self.clear_children();
                        }
                        let results: Vec<Path<X>> =
                            (0..count).map(|i| parent.get(index + i)).collect();
                        assert!(
                            results[0].ptr_eq(self),
                            "first replacement path is not the original path"
                        );
                        Ok(results)
                    }
                }
            }
            Value::Object(object) => {
                let key = name.to_string();
                let mut values = replacements.into_iter();
                match (values.next(), values.next()) {
                    (None, _) => {
                        object.remove(&key);
                        parent.forget_child(&name);
                        self.set_value(Value::Null);
                        self.clear_children();
                        Ok(Vec::new())
                    }
                    (Some(replacement), None) => {
                        if !self.value().same(&replacement) {
                            self.clear_children();
                        }
                        object.insert(key, replacement.clone());
                        self.set_value(replacement);
                        Ok(vec![self.clone()])
                    }
                    (Some(_), Some(_)) => Err(PathError::MultipleReplacementsForKey { name: key, count }),
                }
            }
            _ => Err(PathError::ParentNotContainer {
                name: self.display_name(),
            }),
        }
    }

    /// Replaces this slot with a single value.
    pub fn replace_with(&self, value: Value) -> Result<Path<X>, PathError> {
        let mut results = self.replace(vec![value])?;
        Ok(results.swap_remove(0))
    }

    /// Removes this slot.
    pub fn remove(&self) -> Result<(), PathError> {
        self.replace(Vec::new()).map(|_| ())
    }
}
