//! Property paths -- addresses of nested values inside a container tree.
//!
//! A path is a sequence of segments, each either a dictionary key or an array
//! index. The textual form separates segments with dots:
//!
//! - `""` -- the root itself
//! - `"host"` -- key `host` of the root dictionary
//! - `"servers.0.port"` -- key `port` of element 0 of array `servers`
//!
//! Segments parsed from text are keys; resolution interprets a key segment as
//! a decimal index when it meets an array. Paths built with
//! [`push_key`](PropPath::push_key) can address keys containing dots.

use crate::value::Value;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Key(String),
    Index(usize),
}

impl Segment {
    fn as_index(&self) -> Option<usize> {
        match self {
            Segment::Index(i) => Some(*i),
            Segment::Key(k) => k.parse().ok(),
        }
    }

    fn step<'a>(&self, value: &'a Value) -> Option<&'a Value> {
        match value {
            Value::Array(a) => a.get(self.as_index()?).ok(),
            Value::Dictionary(d) => match self {
                Segment::Key(k) => d.get(k),
                Segment::Index(i) => d.get(&i.to_string()),
            },
            Value::Integer(_) | Value::Text(_) | Value::Boolean(_) => None,
        }
    }

    fn step_mut<'a>(&self, value: &'a mut Value) -> Option<&'a mut Value> {
        match value {
            Value::Array(a) => a.get_mut(self.as_index()?).ok(),
            Value::Dictionary(d) => match self {
                Segment::Key(k) => d.get_mut(k),
                Segment::Index(i) => d.get_mut(&i.to_string()),
            },
            Value::Integer(_) | Value::Text(_) | Value::Boolean(_) => None,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(k) => f.write_str(k),
            Segment::Index(i) => write!(f, "{}", i),
        }
    }
}

/// A path from a root value to one of its descendants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PropPath {
    segments: Vec<Segment>,
}

impl PropPath {
    /// The empty path, which resolves to the root.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a dot-separated path. The empty string is the root path.
    pub fn parse(path: &str) -> Self {
        if path.is_empty() {
            return Self::root();
        }
        Self {
            segments: path.split('.').map(|s| Segment::Key(s.to_string())).collect(),
        }
    }

    pub fn push_key(&mut self, key: impl Into<String>) {
        self.segments.push(Segment::Key(key.into()));
    }

    pub fn push_index(&mut self, index: usize) {
        self.segments.push(Segment::Index(index));
    }

    /// Return a new path extended by `segment`.
    pub fn child(&self, segment: Segment) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Split into the parent path and the final segment. `None` for the root.
    pub fn split_last(&self) -> Option<(PropPath, &Segment)> {
        let (last, parent) = self.segments.split_last()?;
        Some((
            PropPath {
                segments: parent.to_vec(),
            },
            last,
        ))
    }

    /// Walk the path from `root`. Returns `None` if any step passes through a
    /// scalar, a missing key or an out-of-range index.
    pub fn resolve<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        self.segments
            .iter()
            .try_fold(root, |current, segment| segment.step(current))
    }

    /// Mutable counterpart of [`resolve`](Self::resolve). The returned
    /// reference points into the live tree.
    pub fn resolve_mut<'a>(&self, root: &'a mut Value) -> Option<&'a mut Value> {
        let mut current = root;
        for segment in &self.segments {
            current = segment.step_mut(current)?;
        }
        Some(current)
    }
}

impl fmt::Display for PropPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}
