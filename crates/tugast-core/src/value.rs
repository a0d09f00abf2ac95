// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Shared, mutable tree values.
//!
//! A syntax tree is a nest of ordered sequences ([`Array`]) and keyed records
//! ([`Object`]) with primitive leaves. Composites are reference-counted
//! handles with interior mutability: cloning a [`Value`] that holds an array or
//! object clones the handle, not the contents, so the same composite can be
//! reached from the tree and from any number of cursors at once.
//!
//! # Identity
//!
//! [`Value::same`] is the identity relation used by every cache consistency
//! check in the cursor layer: composites are identical when they are the same
//! handle, primitives when they are equal. Structural equality is available
//! through `PartialEq`.

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

/// Ordered key/value storage backing an [`Object`].
pub type Map = IndexMap<String, Value>;

/// A tree value.
#[derive(Clone, Default)]
pub enum Value {
    /// Absent or explicitly null. Missing keys and out-of-range indices read
    /// as `Null`.
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
    Array(Array),
    Object(Object),
}

/// A shared handle to an ordered sequence of values.
#[derive(Clone, Default)]
pub struct Array(Rc<RefCell<Vec<Value>>>);

/// A shared handle to a keyed record.
#[derive(Clone, Default)]
pub struct Object(Rc<RefCell<Map>>);

// ============================================================================
// Array
// ============================================================================

impl Array {
    pub fn new(items: Vec<Value>) -> Self {
        Array(Rc::new(RefCell::new(items)))
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Returns the element at `index`, or `Null` when out of range.
    pub fn get(&self, index: usize) -> Value {
        self.0.borrow().get(index).cloned().unwrap_or_default()
    }

    /// Overwrites the element at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn set(&self, index: usize, value: Value) {
        self.0.borrow_mut()[index] = value;
    }

    /// Position of the first element identical to `value`.
    pub fn position(&self, value: &Value) -> Option<usize> {
        self.0.borrow().iter().position(|item| item.same(value))
    }

    /// Copies the element handles out, releasing the borrow.
    pub fn to_vec(&self) -> Vec<Value> {
        self.0.borrow().clone()
    }

    pub fn borrow(&self) -> Ref<'_, Vec<Value>> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, Vec<Value>> {
        self.0.borrow_mut()
    }

    /// True when both handles point at the same sequence.
    pub fn same(&self, other: &Array) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

// ============================================================================
// Object
// ============================================================================

impl Object {
    pub fn new(map: Map) -> Self {
        Object(Rc::new(RefCell::new(map)))
    }

    /// Returns the value under `key`, or `Null` when the key is missing.
    pub fn get(&self, key: &str) -> Value {
        self.0.borrow().get(key).cloned().unwrap_or_default()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.borrow().contains_key(key)
    }

    /// Inserts or overwrites `key`, keeping the original position of an
    /// existing key.
    pub fn insert(&self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.borrow_mut().insert(key.into(), value)
    }

    /// Removes `key`, preserving the order of the remaining keys.
    pub fn remove(&self, key: &str) -> Option<Value> {
        self.0.borrow_mut().shift_remove(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.0.borrow().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    pub fn borrow(&self) -> Ref<'_, Map> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, Map> {
        self.0.borrow_mut()
    }

    /// True when both handles point at the same record.
    pub fn same(&self, other: &Object) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

// ============================================================================
// Value
// ============================================================================

impl Value {
    /// Builds an object value from `(key, value)` pairs.
    pub fn object<K, I>(entries: I) -> Value
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Object(Object::new(
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    /// Builds an array value.
    pub fn array(items: impl IntoIterator<Item = Value>) -> Value {
        Value::Array(Array::new(items.into_iter().collect()))
    }

    /// Identity comparison: handle identity for composites, equality for
    /// primitives.
    pub fn same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a.same(b),
            (Value::Object(a), Value::Object(b)) => a.same(b),
            _ => false,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Reads `key` from an object; `Null` for anything else.
    pub fn get_key(&self, key: &str) -> Value {
        match self {
            Value::Object(o) => o.get(key),
            _ => Value::Null,
        }
    }

    /// Reads `index` from an array; `Null` for anything else.
    pub fn get_index(&self, index: usize) -> Value {
        match self {
            Value::Array(a) => a.get(index),
            _ => Value::Null,
        }
    }

    /// The raw `"type"` discriminant of an object, if it is a string.
    pub fn type_name(&self) -> Option<Rc<str>> {
        match self {
            Value::Object(o) => match o.borrow().get("type") {
                Some(Value::String(s)) => Some(s.clone()),
                _ => None,
            },
            _ => None,
        }
    }

    /// Copies the whole tree into fresh handles.
    pub fn deep_clone(&self) -> Value {
        match self {
            Value::Array(a) => Value::array(a.borrow().iter().map(Value::deep_clone)),
            Value::Object(o) => Value::object(
                o.borrow()
                    .iter()
                    .map(|(k, v)| (k.clone(), v.deep_clone())),
            ),
            other => other.clone(),
        }
    }

    /// Converts a JSON document into a tree value.
    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s.as_str().into()),
            serde_json::Value::Array(items) => Value::array(items.iter().map(Value::from_json)),
            serde_json::Value::Object(map) => {
                Value::object(map.iter().map(|(k, v)| (k.clone(), Value::from_json(v))))
            }
        }
    }

    /// Converts the tree into a JSON document. Integral numbers are written
    /// as integers; non-finite numbers become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => number_to_json(*n),
            Value::String(s) => serde_json::Value::String(s.to_string()),
            Value::Array(a) => serde_json::Value::Array(a.borrow().iter().map(Value::to_json).collect()),
            Value::Object(o) => serde_json::Value::Object(
                o.borrow()
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

fn number_to_json(n: f64) -> serde_json::Value {
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        return serde_json::Value::from(n as i64);
    }
    serde_json::Number::from_f64(n)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}

/// Structural equality. Use [`Value::same`] for identity.
impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Array(a), Value::Array(b)) => a.same(b) || *a.borrow() == *b.borrow(),
            (Value::Object(a), Value::Object(b)) => a.same(b) || *a.borrow() == *b.borrow(),
            _ => self.same(other),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl fmt::Debug for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.borrow().iter()).finish()
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.borrow().iter()).finish()
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s.into())
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(Array::new(items))
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Value::Object(Object::new(map))
    }
}

impl From<Array> for Value {
    fn from(a: Array) -> Self {
        Value::Array(a)
    }
}

impl From<Object> for Value {
    fn from(o: Object) -> Self {
        Value::Object(o)
    }
}

impl From<&serde_json::Value> for Value {
    fn from(json: &serde_json::Value) -> Self {
        Value::from_json(json)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        Value::from_json(&json)
    }
}
