//! The two container kinds as a common interface for the codec.

use crate::array::Array;
use crate::dictionary::Dictionary;
use crate::error::{PropError, Result};
use crate::value::{Value, ValueKind};
use crate::{decoder, encoder};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

mod private {
    pub trait Sealed {}
    impl Sealed for crate::Array {}
    impl Sealed for crate::Dictionary {}
}

/// Process-unique identity of one container instance.
///
/// Every `Array` and `Dictionary` gets a fresh id when it is created or
/// cloned; moving a container keeps its id. Ids take no part in equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContainerId(u64);

impl ContainerId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        ContainerId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Borrowed view of either container kind, used by the encoder.
#[derive(Debug, Clone, Copy)]
pub enum ContainerRef<'a> {
    Array(&'a Array),
    Dictionary(&'a Dictionary),
}

impl<'a> ContainerRef<'a> {
    /// View a value as a container; `None` for scalars.
    pub fn from_value(value: &'a Value) -> Option<Self> {
        match value {
            Value::Array(a) => Some(ContainerRef::Array(a)),
            Value::Dictionary(d) => Some(ContainerRef::Dictionary(d)),
            Value::Integer(_) | Value::Text(_) | Value::Boolean(_) => None,
        }
    }

    pub fn kind(self) -> ValueKind {
        match self {
            ContainerRef::Array(_) => ValueKind::Array,
            ContainerRef::Dictionary(_) => ValueKind::Dictionary,
        }
    }

    pub fn count(self) -> usize {
        match self {
            ContainerRef::Array(a) => a.count(),
            ContainerRef::Dictionary(d) => d.count(),
        }
    }

    pub fn id(self) -> ContainerId {
        match self {
            ContainerRef::Array(a) => a.id(),
            ContainerRef::Dictionary(d) => d.id(),
        }
    }
}

/// A top-level plist container: [`Array`] or [`Dictionary`].
///
/// Sealed; the provided methods are the per-type entry points into the
/// XML codec.
///
/// ```
/// use prop_core::{Container, Dictionary};
///
/// let mut d = Dictionary::new();
/// d.set("port", 8080);
/// let xml = d.to_xml();
/// assert_eq!(Dictionary::from_xml(&xml).unwrap(), d);
/// ```
pub trait Container: private::Sealed + Sized {
    const KIND: ValueKind;

    /// Unwrap a decoded top-level value, failing with
    /// [`PropError::TypeMismatch`] if it is the other container kind.
    fn from_value(value: Value) -> Result<Self>;

    fn as_container(&self) -> ContainerRef<'_>;

    fn to_xml(&self) -> String {
        encoder::externalize(self)
    }

    fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        encoder::externalize_to_file(self, path)
    }

    fn from_xml(xml: &str) -> Result<Self> {
        decoder::internalize(xml)
    }

    fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        decoder::internalize_from_file(path)
    }
}

impl Container for Array {
    const KIND: ValueKind = ValueKind::Array;

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Array(a) => Ok(a),
            other => Err(PropError::TypeMismatch {
                expected: Self::KIND,
                found: other.kind(),
            }),
        }
    }

    fn as_container(&self) -> ContainerRef<'_> {
        ContainerRef::Array(self)
    }
}

impl Container for Dictionary {
    const KIND: ValueKind = ValueKind::Dictionary;

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Dictionary(d) => Ok(d),
            other => Err(PropError::TypeMismatch {
                expected: Self::KIND,
                found: other.kind(),
            }),
        }
    }

    fn as_container(&self) -> ContainerRef<'_> {
        ContainerRef::Dictionary(self)
    }
}
