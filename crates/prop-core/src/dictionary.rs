//! Key-addressable container.

use crate::array::Array;
use crate::container::ContainerId;
use crate::value::{self, Value};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// A mapping from unique text keys to [`Value`]s.
///
/// Backed by an ordered map, so iteration (and therefore [`keys`](Self::keys)
/// and the XML encoder) visits keys in byte-wise sorted order. Callers should
/// treat that order as an implementation detail.
pub struct Dictionary {
    id: ContainerId,
    entries: BTreeMap<String, Value>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::from_entries(BTreeMap::new())
    }

    fn from_entries(entries: BTreeMap<String, Value>) -> Self {
        Self {
            id: ContainerId::next(),
            entries,
        }
    }

    /// Identity of this dictionary instance. Stable while the dictionary is
    /// moved around a tree; a clone gets a new one.
    pub fn id(&self) -> ContainerId {
        self.id
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up `key`. A missing key is `None`, never an error.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Mutable lookup. A nested container reached this way is the live child.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.entries.get_mut(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert or replace the value stored under `key`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Remove `key` if present and return its value. Removing an absent key
    /// leaves the dictionary unchanged.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.remove(key)
    }

    /// Snapshot of every key as a new [`Array`] of text values. Later changes
    /// to the dictionary do not affect the returned array.
    pub fn keys(&self) -> Array {
        self.entries.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> std::collections::btree_map::Iter<'_, String, Value> {
        self.entries.iter()
    }

    pub(crate) fn drain_into(&mut self, out: &mut Vec<Value>) {
        out.extend(std::mem::take(&mut self.entries).into_values());
    }
}

impl Default for Dictionary {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Dictionary {
    fn clone(&self) -> Self {
        Self::from_entries(self.entries.clone())
    }
}

/// Entry-wise; identities are not compared.
impl PartialEq for Dictionary {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .zip(&other.entries)
                .all(|((key_a, a), (key_b, b))| key_a == key_b && a == b)
    }
}

impl Eq for Dictionary {}

impl fmt::Debug for Dictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dictionary")
            .field("entries", &self.entries)
            .finish()
    }
}

impl Drop for Dictionary {
    fn drop(&mut self) {
        if self.entries.values().any(value::is_container) {
            let mut pending = Vec::new();
            self.drain_into(&mut pending);
            value::dismantle(pending);
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Dictionary {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_entries(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl<'a> IntoIterator for &'a Dictionary {
    type Item = (&'a String, &'a Value);
    type IntoIter = std::collections::btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl Serialize for Dictionary {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
