//! # prop-core
//!
//! Property-list containers and an XML plist codec.
//!
//! The data model is a closed set of value kinds: three scalars (integer,
//! text, boolean) and two containers ([`Array`], [`Dictionary`]). Containers
//! own their contents as a tree and are mutated in place; the codec moves a
//! container to and from the XML property-list grammar, as text or as a file.
//!
//! ## Quick start
//!
//! ```rust
//! use prop_core::{Array, Container, Dictionary, Value};
//!
//! let mut d = Dictionary::new();
//! d.set("port", 8080);
//! d.set("host", "localhost");
//!
//! let mut tags = Array::new();
//! tags.append("web");
//! tags.append(true);
//! d.set("tags", tags);
//!
//! let xml = d.to_xml();
//! assert!(xml.contains("<key>port</key>"));
//!
//! let back = Dictionary::from_xml(&xml).unwrap();
//! assert_eq!(back, d);
//! assert_eq!(back.get("port"), Some(&Value::Integer(8080)));
//! assert_eq!(back.get("missing"), None);
//! ```
//!
//! ## Modules
//!
//! - [`value`] -- `Value` sum type, `ValueKind` tag, JSON coercion
//! - [`array`] -- ordered container
//! - [`dictionary`] -- keyed container
//! - [`container`] -- `Container` trait: per-type codec entry points
//! - [`path`] -- dotted property paths into a container tree
//! - [`shared`] -- lockable shared trees and live handles onto nested containers
//! - [`encoder`] -- container → plist XML (text or file)
//! - [`decoder`] -- plist XML (text or file) → container
//! - [`error`] -- `PropError` and the crate `Result` alias

pub mod array;
pub mod container;
pub mod decoder;
pub mod dictionary;
pub mod encoder;
pub mod error;
pub mod path;
pub mod shared;
pub mod value;

pub use array::Array;
pub use container::{Container, ContainerId, ContainerRef};
pub use decoder::{
    internalize, internalize_from_file, internalize_value, internalize_value_from_file,
};
pub use dictionary::Dictionary;
pub use encoder::{externalize, externalize_ref, externalize_to_file};
pub use error::{PropError, Result};
pub use path::{PropPath, Segment};
pub use shared::{index_from_host, Handle, HandleError};
pub use value::{Value, ValueKind};
