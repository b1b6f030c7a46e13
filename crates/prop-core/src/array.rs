//! Ordered, index-addressable container.

use crate::container::ContainerId;
use crate::error::{PropError, Result};
use crate::value::{self, Value};
use serde::ser::{Serialize, SerializeSeq, Serializer};
use std::fmt;

/// An ordered sequence of [`Value`]s with contiguous indices `0..count`.
///
/// Duplicates and mixed kinds are allowed. Removing an element shifts every
/// later element down by one.
///
/// # Example
/// ```
/// use prop_core::{Array, Value};
///
/// let mut a = Array::new();
/// a.append(5);
/// a.append("x");
/// a.set(2, true).unwrap(); // one-past-the-end appends
/// assert_eq!(a.count(), 3);
/// assert_eq!(a.get(1).unwrap(), &Value::from("x"));
/// assert!(a.get(3).is_err());
/// ```
pub struct Array {
    id: ContainerId,
    items: Vec<Value>,
}

impl Array {
    pub fn new() -> Self {
        Self::from_items(Vec::new())
    }

    fn from_items(items: Vec<Value>) -> Self {
        Self {
            id: ContainerId::next(),
            items,
        }
    }

    /// Identity of this array instance. Stable while the array is moved
    /// around a tree; a clone gets a new one.
    pub fn id(&self) -> ContainerId {
        self.id
    }

    /// Number of live elements.
    pub fn count(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Borrow the element at `index`. Valid for `0..count`.
    pub fn get(&self, index: usize) -> Result<&Value> {
        self.items
            .get(index)
            .ok_or_else(|| PropError::index_out_of_range(index, self.items.len()))
    }

    /// Mutably borrow the element at `index`. Valid for `0..count`.
    ///
    /// A nested container reached this way is the live child, not a copy.
    pub fn get_mut(&mut self, index: usize) -> Result<&mut Value> {
        let count = self.items.len();
        self.items
            .get_mut(index)
            .ok_or_else(|| PropError::index_out_of_range(index, count))
    }

    /// Replace the element at `index`, or append when `index == count`.
    /// Valid for `0..=count`.
    pub fn set(&mut self, index: usize, value: impl Into<Value>) -> Result<()> {
        let count = self.items.len();
        if index < count {
            self.items[index] = value.into();
            Ok(())
        } else if index == count {
            self.items.push(value.into());
            Ok(())
        } else {
            Err(PropError::index_out_of_range(index, count))
        }
    }

    pub fn append(&mut self, value: impl Into<Value>) {
        self.items.push(value.into());
    }

    /// Remove and return the element at `index`. Valid for `0..count`.
    pub fn remove(&mut self, index: usize) -> Result<Value> {
        if index < self.items.len() {
            Ok(self.items.remove(index))
        } else {
            Err(PropError::index_out_of_range(index, self.items.len()))
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.items.iter()
    }

    pub(crate) fn drain_into(&mut self, out: &mut Vec<Value>) {
        out.append(&mut self.items);
    }
}

impl Default for Array {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Array {
    fn clone(&self) -> Self {
        Self::from_items(self.items.clone())
    }
}

/// Element-wise; identities are not compared.
impl PartialEq for Array {
    fn eq(&self, other: &Self) -> bool {
        self.items.len() == other.items.len()
            && self.items.iter().zip(&other.items).all(|(a, b)| a == b)
    }
}

impl Eq for Array {}

impl fmt::Debug for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Array").field("items", &self.items).finish()
    }
}

impl Drop for Array {
    fn drop(&mut self) {
        if self.items.iter().any(value::is_container) {
            value::dismantle(std::mem::take(&mut self.items));
        }
    }
}

impl<V: Into<Value>> FromIterator<V> for Array {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        Self::from_items(iter.into_iter().map(Into::into).collect())
    }
}

impl IntoIterator for Array {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(mut self) -> Self::IntoIter {
        std::mem::take(&mut self.items).into_iter()
    }
}

impl<'a> IntoIterator for &'a Array {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl Serialize for Array {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.items.len()))?;
        for item in &self.items {
            seq.serialize_element(item)?;
        }
        seq.end()
    }
}
