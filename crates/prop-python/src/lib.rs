//! # prop-python
//!
//! Python bindings for the property-list containers and XML codec, built with
//! PyO3.
//!
//! Exposes the following to Python as the `proplib` module:
//!
//! - `new_array()`, `array_from_xml(text)`, `array_from_file(path)` -> `Array`
//! - `new_dict()`, `dict_from_xml(text)`, `dict_from_file(path)` -> `Dictionary`
//! - `Array`: `set(i, v)`, `get(i)`, `append(v)`, `remove(i)`, `count()`,
//!   `to_xml()`, `to_file(path)`
//! - `Dictionary`: `set(k, v)`, `get(k)`, `remove(k)`, `count()`, `keys()`,
//!   `to_xml()`, `to_file(path)`
//!
//! ## Nested containers are live handles
//!
//! `get` on an element that is itself a container returns a handle onto the
//! nested container, not a copy: mutating it mutates the parent. A handle is
//! a [`prop_core::Handle`]: the shared root, the property path from the root
//! to the child and the child's identity, so the tree stays singly owned
//! while handles keep the root alive. Once the container is no longer at that
//! path (removed, replaced, or shifted by removing an earlier sibling), using
//! the handle raises `ReferenceError`; it never reaches a different container.
//!
//! Containers passed *into* `set`/`append` are copied, since a container can
//! only have one parent.
//!
//! ## Errors
//!
//! | core error           | Python exception |
//! |----------------------|------------------|
//! | `IndexOutOfRange`    | `IndexError`     |
//! | `UnsupportedType`    | `TypeError`      |
//! | `TypeMismatch`       | `TypeError`      |
//! | `MalformedDocument`  | `ValueError`     |
//! | `Io`                 | `OSError`        |
//! | `HandleError::Stale` | `ReferenceError` |

use prop_core::{
    index_from_host, Array, Container, ContainerRef, Dictionary, Handle, HandleError, PropError,
    Segment, Value,
};
use pyo3::exceptions::{
    PyIndexError, PyOSError, PyReferenceError, PyRuntimeError, PyTypeError, PyValueError,
};
use pyo3::prelude::*;
use pyo3::types::{PyBool, PyInt, PyString};

fn to_py_err(err: PropError) -> PyErr {
    let message = err.to_string();
    match err {
        PropError::IndexOutOfRange { .. } => PyIndexError::new_err(message),
        PropError::UnsupportedType(_) | PropError::TypeMismatch { .. } => {
            PyTypeError::new_err(message)
        }
        PropError::MalformedDocument { .. } => PyValueError::new_err(message),
        PropError::Io(_) => PyOSError::new_err(message),
    }
}

fn handle_err(err: HandleError) -> PyErr {
    match err {
        HandleError::Stale { .. } => PyReferenceError::new_err(err.to_string()),
        HandleError::Poisoned => PyRuntimeError::new_err(err.to_string()),
    }
}

/// Run `f` on the array behind `handle`, flattening handle and call errors.
fn with_array<R>(handle: &Handle, f: impl FnOnce(&mut Array) -> PyResult<R>) -> PyResult<R> {
    handle.with_array(f).map_err(handle_err)?
}

fn with_dictionary<R>(
    handle: &Handle,
    f: impl FnOnce(&mut Dictionary) -> PyResult<R>,
) -> PyResult<R> {
    handle.with_dictionary(f).map_err(handle_err)?
}

/// A value handed back to Python: scalars by value, containers as handles.
#[derive(IntoPyObject)]
enum HostValue {
    Integer(i64),
    Text(String),
    Boolean(bool),
    Array(PyArray),
    Dictionary(PyDictionary),
}

impl HostValue {
    /// `value` was reached from `parent` through `segment`.
    fn from_value(value: &Value, parent: &Handle, segment: Segment) -> Self {
        match value {
            Value::Integer(n) => HostValue::Integer(*n),
            Value::Text(s) => HostValue::Text(s.clone()),
            Value::Boolean(b) => HostValue::Boolean(*b),
            Value::Array(a) => HostValue::Array(PyArray {
                handle: parent.child(segment, ContainerRef::Array(a)),
            }),
            Value::Dictionary(d) => HostValue::Dictionary(PyDictionary {
                handle: parent.child(segment, ContainerRef::Dictionary(d)),
            }),
        }
    }
}

/// Coerce a Python object into a plist value.
///
/// `bool` is checked before `int` because Python booleans are integers.
/// Containers are snapshotted (deep-copied) into the new value.
fn coerce(obj: &Bound<'_, PyAny>) -> PyResult<Value> {
    if let Ok(b) = obj.downcast::<PyBool>() {
        return Ok(Value::Boolean(b.is_true()));
    }
    if obj.is_instance_of::<PyInt>() {
        let n: i64 = obj.extract().map_err(|_| {
            to_py_err(PropError::UnsupportedType(
                "integer outside the 64-bit signed range".to_string(),
            ))
        })?;
        return Ok(Value::Integer(n));
    }
    if let Ok(s) = obj.downcast::<PyString>() {
        return Ok(Value::Text(s.to_str()?.to_owned()));
    }
    if let Ok(a) = obj.downcast::<PyArray>() {
        return a.borrow().handle.snapshot().map_err(handle_err);
    }
    if let Ok(d) = obj.downcast::<PyDictionary>() {
        return d.borrow().handle.snapshot().map_err(handle_err);
    }
    let type_name = obj
        .get_type()
        .name()
        .map(|n| n.to_string())
        .unwrap_or_else(|_| "unknown".to_string());
    Err(to_py_err(PropError::UnsupportedType(type_name)))
}

fn host_index(index: i64, count: usize) -> PyResult<usize> {
    index_from_host(index, count).map_err(to_py_err)
}

/// An ordered, index-addressable property-list container.
#[pyclass(name = "Array", module = "proplib")]
#[derive(Clone)]
struct PyArray {
    handle: Handle,
}

#[pymethods]
impl PyArray {
    #[new]
    fn py_new() -> Self {
        Self {
            handle: Handle::new(Array::new()),
        }
    }

    /// Replace element `i`, or append when `i == count()`.
    ///
    /// Raises:
    ///     IndexError: If `i` is outside `0..=count()`.
    ///     TypeError: If `v` is not an int, str, bool, Array or Dictionary.
    fn set(&self, i: i64, v: &Bound<'_, PyAny>) -> PyResult<()> {
        let value = coerce(v)?;
        with_array(&self.handle, |array| {
            let index = host_index(i, array.count())?;
            array.set(index, value).map_err(to_py_err)
        })
    }

    /// Element `i`. Nested containers come back as live handles.
    ///
    /// Raises:
    ///     IndexError: If `i` is outside `0..count()`.
    fn get(&self, i: i64) -> PyResult<HostValue> {
        with_array(&self.handle, |array| {
            let index = host_index(i, array.count())?;
            let value = array.get(index).map_err(to_py_err)?;
            Ok(HostValue::from_value(value, &self.handle, Segment::Index(index)))
        })
    }

    fn append(&self, v: &Bound<'_, PyAny>) -> PyResult<()> {
        let value = coerce(v)?;
        with_array(&self.handle, |array| {
            array.append(value);
            Ok(())
        })
    }

    /// Remove element `i`, shifting later elements down.
    ///
    /// Raises:
    ///     IndexError: If `i` is outside `0..count()`.
    fn remove(&self, i: i64) -> PyResult<()> {
        with_array(&self.handle, |array| {
            let index = host_index(i, array.count())?;
            array.remove(index).map(|_| ()).map_err(to_py_err)
        })
    }

    fn count(&self) -> PyResult<usize> {
        with_array(&self.handle, |array| Ok(array.count()))
    }

    fn __len__(&self) -> PyResult<usize> {
        self.count()
    }

    /// Externalize to a plist XML string.
    fn to_xml(&self) -> PyResult<String> {
        with_array(&self.handle, |array| Ok(array.to_xml()))
    }

    /// Externalize to the file at `path`.
    ///
    /// Raises:
    ///     OSError: If the file cannot be written.
    fn to_file(&self, path: &str) -> PyResult<()> {
        with_array(&self.handle, |array| array.to_file(path).map_err(to_py_err))
    }

    fn __repr__(&self) -> PyResult<String> {
        with_array(&self.handle, |array| {
            Ok(format!("<proplib.Array count={}>", array.count()))
        })
    }
}

/// A key-addressable property-list container.
#[pyclass(name = "Dictionary", module = "proplib")]
#[derive(Clone)]
struct PyDictionary {
    handle: Handle,
}

#[pymethods]
impl PyDictionary {
    #[new]
    fn py_new() -> Self {
        Self {
            handle: Handle::new(Dictionary::new()),
        }
    }

    /// Insert or replace the value under `k`.
    ///
    /// Raises:
    ///     TypeError: If `v` is not an int, str, bool, Array or Dictionary.
    fn set(&self, k: &str, v: &Bound<'_, PyAny>) -> PyResult<()> {
        let value = coerce(v)?;
        with_dictionary(&self.handle, |dict| {
            dict.set(k, value);
            Ok(())
        })
    }

    /// The value under `k`, or `None` if the key is absent. Nested containers
    /// come back as live handles.
    fn get(&self, k: &str) -> PyResult<Option<HostValue>> {
        with_dictionary(&self.handle, |dict| {
            let key = || Segment::Key(k.to_string());
            Ok(dict
                .get(k)
                .map(|value| HostValue::from_value(value, &self.handle, key())))
        })
    }

    /// Remove `k` if present. Absent keys are ignored.
    fn remove(&self, k: &str) -> PyResult<()> {
        with_dictionary(&self.handle, |dict| {
            dict.remove(k);
            Ok(())
        })
    }

    fn count(&self) -> PyResult<usize> {
        with_dictionary(&self.handle, |dict| Ok(dict.count()))
    }

    /// A new, independent Array holding every key as a string.
    fn keys(&self) -> PyResult<PyArray> {
        let keys = with_dictionary(&self.handle, |dict| Ok(dict.keys()))?;
        Ok(PyArray {
            handle: Handle::new(keys),
        })
    }

    fn __len__(&self) -> PyResult<usize> {
        self.count()
    }

    fn __contains__(&self, k: &str) -> PyResult<bool> {
        with_dictionary(&self.handle, |dict| Ok(dict.contains_key(k)))
    }

    /// Externalize to a plist XML string.
    fn to_xml(&self) -> PyResult<String> {
        with_dictionary(&self.handle, |dict| Ok(dict.to_xml()))
    }

    /// Externalize to the file at `path`.
    ///
    /// Raises:
    ///     OSError: If the file cannot be written.
    fn to_file(&self, path: &str) -> PyResult<()> {
        with_dictionary(&self.handle, |dict| dict.to_file(path).map_err(to_py_err))
    }

    fn __repr__(&self) -> PyResult<String> {
        with_dictionary(&self.handle, |dict| {
            Ok(format!("<proplib.Dictionary count={}>", dict.count()))
        })
    }
}

/// Create an empty Array.
#[pyfunction]
fn new_array() -> PyArray {
    PyArray::py_new()
}

/// Internalize an Array from plist XML text.
///
/// Raises:
///     ValueError: If the text is not a well-formed plist.
///     TypeError: If the document holds a dictionary.
#[pyfunction]
fn array_from_xml(text: &str) -> PyResult<PyArray> {
    let array = Array::from_xml(text).map_err(to_py_err)?;
    Ok(PyArray {
        handle: Handle::new(array),
    })
}

/// Internalize an Array from the plist file at `path`.
///
/// Raises:
///     OSError: If the file cannot be read.
///     ValueError: If the file is not a well-formed plist.
///     TypeError: If the document holds a dictionary.
#[pyfunction]
fn array_from_file(path: &str) -> PyResult<PyArray> {
    let array = Array::from_file(path).map_err(to_py_err)?;
    Ok(PyArray {
        handle: Handle::new(array),
    })
}

/// Create an empty Dictionary.
#[pyfunction]
fn new_dict() -> PyDictionary {
    PyDictionary::py_new()
}

/// Internalize a Dictionary from plist XML text.
///
/// Raises:
///     ValueError: If the text is not a well-formed plist.
///     TypeError: If the document holds an array.
#[pyfunction]
fn dict_from_xml(text: &str) -> PyResult<PyDictionary> {
    let dict = Dictionary::from_xml(text).map_err(to_py_err)?;
    Ok(PyDictionary {
        handle: Handle::new(dict),
    })
}

/// Internalize a Dictionary from the plist file at `path`.
///
/// Raises:
///     OSError: If the file cannot be read.
///     ValueError: If the file is not a well-formed plist.
///     TypeError: If the document holds an array.
#[pyfunction]
fn dict_from_file(path: &str) -> PyResult<PyDictionary> {
    let dict = Dictionary::from_file(path).map_err(to_py_err)?;
    Ok(PyDictionary {
        handle: Handle::new(dict),
    })
}

/// The `proplib` Python module, implemented in Rust via PyO3.
#[pymodule]
fn proplib(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyArray>()?;
    m.add_class::<PyDictionary>()?;
    m.add_function(wrap_pyfunction!(new_array, m)?)?;
    m.add_function(wrap_pyfunction!(array_from_xml, m)?)?;
    m.add_function(wrap_pyfunction!(array_from_file, m)?)?;
    m.add_function(wrap_pyfunction!(new_dict, m)?)?;
    m.add_function(wrap_pyfunction!(dict_from_xml, m)?)?;
    m.add_function(wrap_pyfunction!(dict_from_file, m)?)?;
    Ok(())
}
