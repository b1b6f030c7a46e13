//! Error types for container operations and plist encoding/decoding.

use crate::value::ValueKind;
use thiserror::Error;

/// Errors that can occur while mutating containers or moving them in and out
/// of the XML property-list format.
///
/// A missing dictionary key is deliberately *not* an error: `Dictionary::get`
/// returns `None` for it.
#[derive(Error, Debug)]
pub enum PropError {
    /// An array index outside the bound accepted by the operation. `get` and
    /// `remove` accept `0..count`, `set` accepts `0..=count`.
    #[error("index {index} out of range for array of {count} elements")]
    IndexOutOfRange { index: i64, count: usize },

    /// A host value that has no property-list equivalent.
    #[error("unsupported value type: {0}")]
    UnsupportedType(String),

    /// The input was not a well-formed plist document.
    /// Includes the 1-based line number where the error was detected.
    #[error("malformed plist at line {line}: {message}")]
    MalformedDocument { line: usize, message: String },

    /// The document's top-level container is not the kind the caller asked for.
    #[error("expected top-level {expected}, found {found}")]
    TypeMismatch { expected: ValueKind, found: ValueKind },

    /// File-system failure while reading or writing a plist file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PropError {
    pub(crate) fn index_out_of_range(index: usize, count: usize) -> Self {
        PropError::IndexOutOfRange {
            index: i64::try_from(index).unwrap_or(i64::MAX),
            count,
        }
    }
}

/// Convenience alias used throughout prop-core.
pub type Result<T> = std::result::Result<T, PropError>;
