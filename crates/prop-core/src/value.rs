//! The property-list value model.
//!
//! A [`Value`] is a closed sum over the three scalar kinds (integer, text,
//! boolean) and the two container kinds ([`Array`], [`Dictionary`]). A value's
//! kind never changes after construction: containers replace elements
//! wholesale instead of mutating scalar payloads in place.
//!
//! Cloning, comparing and dropping a value walk the tree with heap worklists,
//! so a document of any depth the decoder accepts can be copied, compared and
//! freed without exhausting the call stack.

use crate::array::Array;
use crate::container::ContainerRef;
use crate::dictionary::Dictionary;
use crate::error::{PropError, Result};
use serde::ser::{Serialize, Serializer};
use std::collections::btree_map;
use std::fmt;
use std::slice;

/// A single property-list value.
#[derive(Debug)]
pub enum Value {
    Integer(i64),
    Text(String),
    Boolean(bool),
    Array(Array),
    Dictionary(Dictionary),
}

/// Payload-free tag of a [`Value`]. Displays as the plist element name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Integer,
    Text,
    Boolean,
    Array,
    Dictionary,
}

impl ValueKind {
    /// The XML element name used for this kind. Booleans have two elements
    /// (`<true/>` and `<false/>`) and report the generic `bool`.
    pub fn tag(self) -> &'static str {
        match self {
            ValueKind::Integer => "integer",
            ValueKind::Text => "string",
            ValueKind::Boolean => "bool",
            ValueKind::Array => "array",
            ValueKind::Dictionary => "dict",
        }
    }

    pub fn is_container(self) -> bool {
        matches!(self, ValueKind::Array | ValueKind::Dictionary)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Integer(_) => ValueKind::Integer,
            Value::Text(_) => ValueKind::Text,
            Value::Boolean(_) => ValueKind::Boolean,
            Value::Array(_) => ValueKind::Array,
            Value::Dictionary(_) => ValueKind::Dictionary,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Mutable access to a nested array. Changes made through the returned
    /// reference are visible in the containing tree.
    pub fn as_array_mut(&mut self) -> Option<&mut Array> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_dictionary(&self) -> Option<&Dictionary> {
        match self {
            Value::Dictionary(d) => Some(d),
            _ => None,
        }
    }

    /// Mutable access to a nested dictionary. Changes made through the
    /// returned reference are visible in the containing tree.
    pub fn as_dictionary_mut(&mut self) -> Option<&mut Dictionary> {
        match self {
            Value::Dictionary(d) => Some(d),
            _ => None,
        }
    }

    /// Number of container levels from this value down to its deepest
    /// descendant. Scalars and empty containers count as their own level:
    /// `42` is 1, `[]` is 1, `[[7]]` is 3.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut pending = vec![(self, 1)];
        while let Some((value, level)) = pending.pop() {
            deepest = deepest.max(level);
            match value {
                Value::Array(a) => pending.extend(a.iter().map(|item| (item, level + 1))),
                Value::Dictionary(d) => pending.extend(d.iter().map(|(_, item)| (item, level + 1))),
                Value::Integer(_) | Value::Text(_) | Value::Boolean(_) => {}
            }
        }
        deepest
    }
}

impl Clone for Value {
    fn clone(&self) -> Self {
        match self {
            Value::Integer(n) => Value::Integer(*n),
            Value::Text(s) => Value::Text(s.clone()),
            Value::Boolean(b) => Value::Boolean(*b),
            Value::Array(a) => copy_tree(ContainerRef::Array(a)),
            Value::Dictionary(d) => copy_tree(ContainerRef::Dictionary(d)),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        let mut pending = vec![(self, other)];
        while let Some(pair) = pending.pop() {
            match pair {
                (Value::Integer(a), Value::Integer(b)) if a == b => {}
                (Value::Text(a), Value::Text(b)) if a == b => {}
                (Value::Boolean(a), Value::Boolean(b)) if a == b => {}
                (Value::Array(a), Value::Array(b)) if a.count() == b.count() => {
                    pending.extend(a.iter().zip(b.iter()));
                }
                (Value::Dictionary(a), Value::Dictionary(b)) if a.count() == b.count() => {
                    for ((key_a, item_a), (key_b, item_b)) in a.iter().zip(b.iter()) {
                        if key_a != key_b {
                            return false;
                        }
                        pending.push((item_a, item_b));
                    }
                }
                _ => return false,
            }
        }
        true
    }
}

impl Eq for Value {}

/// A container being copied: the source's remaining children and the copy
/// built so far.
enum CopyFrame<'a> {
    Array {
        source: slice::Iter<'a, Value>,
        copy: Array,
    },
    Dictionary {
        source: btree_map::Iter<'a, String, Value>,
        copy: Dictionary,
        /// Key of the child currently being copied.
        pending_key: Option<&'a str>,
    },
}

impl<'a> CopyFrame<'a> {
    fn open(source: ContainerRef<'a>) -> Self {
        match source {
            ContainerRef::Array(a) => CopyFrame::Array {
                source: a.iter(),
                copy: Array::new(),
            },
            ContainerRef::Dictionary(d) => CopyFrame::Dictionary {
                source: d.iter(),
                copy: Dictionary::new(),
                pending_key: None,
            },
        }
    }

    fn next_child(&mut self) -> Option<&'a Value> {
        match self {
            CopyFrame::Array { source, .. } => source.next(),
            CopyFrame::Dictionary {
                source,
                pending_key,
                ..
            } => source.next().map(|(key, value)| {
                *pending_key = Some(key.as_str());
                value
            }),
        }
    }

    fn insert(&mut self, value: Value) {
        match self {
            CopyFrame::Array { copy, .. } => copy.append(value),
            CopyFrame::Dictionary {
                copy, pending_key, ..
            } => {
                if let Some(key) = pending_key.take() {
                    copy.set(key, value);
                }
            }
        }
    }

    fn finish(self) -> Value {
        match self {
            CopyFrame::Array { copy, .. } => Value::Array(copy),
            CopyFrame::Dictionary { copy, .. } => Value::Dictionary(copy),
        }
    }
}

/// Deep-copy a container tree. Every copied container gets a fresh identity.
fn copy_tree(root: ContainerRef<'_>) -> Value {
    let mut current = CopyFrame::open(root);
    let mut parents = Vec::new();
    loop {
        match current.next_child() {
            Some(child) => match ContainerRef::from_value(child) {
                Some(nested) => {
                    let parent = std::mem::replace(&mut current, CopyFrame::open(nested));
                    parents.push(parent);
                }
                None => current.insert(child.clone()),
            },
            None => {
                let copied = current.finish();
                match parents.pop() {
                    Some(mut parent) => {
                        parent.insert(copied);
                        current = parent;
                    }
                    None => return copied,
                }
            }
        }
    }
}

/// Free a list of values without recursing: each nested container is emptied
/// onto the worklist before it drops, so every drop it runs is shallow.
pub(crate) fn dismantle(mut pending: Vec<Value>) {
    while let Some(value) = pending.pop() {
        match value {
            Value::Array(mut a) => a.drain_into(&mut pending),
            Value::Dictionary(mut d) => d.drain_into(&mut pending),
            Value::Integer(_) | Value::Text(_) | Value::Boolean(_) => {}
        }
    }
}

pub(crate) fn is_container(value: &Value) -> bool {
    matches!(value, Value::Array(_) | Value::Dictionary(_))
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(i64::from(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_owned())
    }
}

impl From<Array> for Value {
    fn from(a: Array) -> Self {
        Value::Array(a)
    }
}

impl From<Dictionary> for Value {
    fn from(d: Dictionary) -> Self {
        Value::Dictionary(d)
    }
}

/// Coerce a JSON value into the plist model.
///
/// `null`, floating-point numbers and integers outside the `i64` range have no
/// plist equivalent and fail with [`PropError::UnsupportedType`].
impl TryFrom<serde_json::Value> for Value {
    type Error = PropError;

    fn try_from(json: serde_json::Value) -> Result<Self> {
        use serde_json::Value as Json;
        match json {
            Json::Null => Err(PropError::UnsupportedType("null".to_string())),
            Json::Bool(b) => Ok(Value::Boolean(b)),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Ok(Value::Integer(i)),
                None if n.is_u64() => Err(PropError::UnsupportedType(format!(
                    "integer {} exceeds the 64-bit signed range",
                    n
                ))),
                None => Err(PropError::UnsupportedType(format!("float {}", n))),
            },
            Json::String(s) => Ok(Value::Text(s)),
            Json::Array(items) => {
                let mut array = Array::new();
                for item in items {
                    array.append(Value::try_from(item)?);
                }
                Ok(Value::Array(array))
            }
            Json::Object(map) => {
                let mut dict = Dictionary::new();
                for (key, item) in map {
                    dict.set(key, Value::try_from(item)?);
                }
                Ok(Value::Dictionary(dict))
            }
        }
    }
}

/// Values serialize untagged: integers as numbers, text as strings, booleans
/// as booleans, arrays as sequences and dictionaries as maps.
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Integer(n) => serializer.serialize_i64(*n),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Array(a) => a.serialize(serializer),
            Value::Dictionary(d) => d.serialize(serializer),
        }
    }
}
