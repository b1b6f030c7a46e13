//! Shared container trees with live handles onto nested containers.
//!
//! A tree that several owners use at once (the Python binding hands one to
//! every container object it returns) lives behind a mutex and stays singly
//! owned. A [`Handle`] names one container in it by the shared root, the
//! property path from the root and the container's [`ContainerId`]. Every
//! access walks the path again and checks the identity, so a handle reaches
//! exactly the container it was created for or fails with
//! [`HandleError::Stale`]. It never lands on a sibling that shifted into the
//! same position.

use crate::array::Array;
use crate::container::{Container, ContainerId, ContainerRef};
use crate::dictionary::Dictionary;
use crate::error::{PropError, Result};
use crate::path::{PropPath, Segment};
use crate::value::{Value, ValueKind};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HandleError {
    /// The container was removed, replaced or moved to another position.
    #[error("nested {kind} at '{path}' no longer exists in its parent")]
    Stale { kind: ValueKind, path: PropPath },

    #[error("property list lock poisoned")]
    Poisoned,
}

/// A live reference to one container inside a shared tree.
#[derive(Debug, Clone)]
pub struct Handle {
    root: Arc<Mutex<Value>>,
    path: PropPath,
    id: ContainerId,
    kind: ValueKind,
}

impl Handle {
    /// Move a top-level container into a new shared tree and return a handle
    /// onto it.
    pub fn new<C: Container + Into<Value>>(container: C) -> Self {
        let target = container.as_container();
        let (id, kind) = (target.id(), target.kind());
        Self {
            root: Arc::new(Mutex::new(container.into())),
            path: PropPath::root(),
            id,
            kind,
        }
    }

    /// Handle onto `target`, the container reached from this handle's
    /// container through `segment`. Intended for use inside
    /// [`with_array`](Self::with_array) / [`with_dictionary`](Self::with_dictionary)
    /// while `target` is borrowed from the tree.
    pub fn child(&self, segment: Segment, target: ContainerRef<'_>) -> Self {
        Self {
            root: Arc::clone(&self.root),
            path: self.path.child(segment),
            id: target.id(),
            kind: target.kind(),
        }
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn path(&self) -> &PropPath {
        &self.path
    }

    /// Whether both handles name the same container.
    pub fn same_container(&self, other: &Handle) -> bool {
        Arc::ptr_eq(&self.root, &other.root) && self.id == other.id
    }

    /// Run `f` on the array this handle names.
    pub fn with_array<R>(
        &self,
        f: impl FnOnce(&mut Array) -> R,
    ) -> std::result::Result<R, HandleError> {
        let mut root = self.lock()?;
        match self.path.resolve_mut(&mut *root).and_then(Value::as_array_mut) {
            Some(array) if array.id() == self.id => Ok(f(array)),
            _ => Err(self.stale()),
        }
    }

    /// Run `f` on the dictionary this handle names.
    pub fn with_dictionary<R>(
        &self,
        f: impl FnOnce(&mut Dictionary) -> R,
    ) -> std::result::Result<R, HandleError> {
        let mut root = self.lock()?;
        match self
            .path
            .resolve_mut(&mut *root)
            .and_then(Value::as_dictionary_mut)
        {
            Some(dict) if dict.id() == self.id => Ok(f(dict)),
            _ => Err(self.stale()),
        }
    }

    /// Independent deep copy of the named container, for storing into another
    /// tree (or back into this one).
    pub fn snapshot(&self) -> std::result::Result<Value, HandleError> {
        let root = self.lock()?;
        match self.path.resolve(&*root) {
            Some(value) if self.names(value) => Ok(value.clone()),
            _ => Err(self.stale()),
        }
    }

    fn names(&self, value: &Value) -> bool {
        ContainerRef::from_value(value).is_some_and(|container| container.id() == self.id)
    }

    fn lock(&self) -> std::result::Result<MutexGuard<'_, Value>, HandleError> {
        self.root.lock().map_err(|_| HandleError::Poisoned)
    }

    fn stale(&self) -> HandleError {
        HandleError::Stale {
            kind: self.kind,
            path: self.path.clone(),
        }
    }
}

/// Convert a signed host index into an element index. Negative indices are
/// out of range rather than counted from the end.
pub fn index_from_host(index: i64, count: usize) -> Result<usize> {
    usize::try_from(index).map_err(|_| PropError::IndexOutOfRange { index, count })
}
