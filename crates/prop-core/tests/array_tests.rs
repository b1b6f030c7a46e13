//! Contract tests for the ordered container: bounds, shifting, and the
//! append-via-set-at-end rule.
use prop_core::{Array, Dictionary, PropError, Value};

fn assert_out_of_range<T: std::fmt::Debug>(result: Result<T, PropError>, index: i64, count: usize) {
    match result {
        Err(PropError::IndexOutOfRange { index: i, count: c }) => {
            assert_eq!((i, c), (index, count));
        }
        other => panic!("expected IndexOutOfRange({index}, {count}), got {other:?}"),
    }
}

// ============================================================================
// Basics
// ============================================================================

#[test]
fn new_array_is_empty() {
    let a = Array::new();
    assert_eq!(a.count(), 0);
    assert!(a.is_empty());
}

#[test]
fn append_mixed_kinds() {
    let mut a = Array::new();
    a.append(5);
    a.append("x");
    assert_eq!(a.count(), 2);
    assert_eq!(a.get(0).unwrap(), &Value::Integer(5));
    assert_eq!(a.get(1).unwrap(), &Value::Text("x".to_string()));
}

#[test]
fn duplicates_are_allowed() {
    let mut a = Array::new();
    a.append(true);
    a.append(true);
    assert_eq!(a.count(), 2);
    assert_eq!(a.get(0).unwrap(), a.get(1).unwrap());
}

// ============================================================================
// Bounds
// ============================================================================

#[test]
fn get_at_count_fails() {
    let mut a = Array::new();
    a.append(1);
    assert_out_of_range(a.get(1), 1, 1);
}

#[test]
fn get_on_empty_fails() {
    assert_out_of_range(Array::new().get(0), 0, 0);
}

#[test]
fn remove_at_count_fails() {
    let mut a = Array::new();
    a.append(1);
    assert_out_of_range(a.remove(1), 1, 1);
    assert_eq!(a.count(), 1);
}

#[test]
fn set_at_count_appends() {
    let mut a = Array::new();
    a.set(0, 1).unwrap();
    assert_eq!(a.count(), 1);
    a.set(1, 2).unwrap();
    assert_eq!(a.count(), 2);
    assert_eq!(a.get(1).unwrap(), &Value::Integer(2));
}

#[test]
fn set_at_count_equals_append() {
    let mut via_set = Array::new();
    let mut via_append = Array::new();
    for i in 0..4 {
        via_set.set(via_set.count(), i).unwrap();
        via_append.append(i);
    }
    assert_eq!(via_set, via_append);
}

#[test]
fn set_past_count_fails() {
    let mut a = Array::new();
    a.set(0, 1).unwrap();
    assert_out_of_range(a.set(5, 1), 5, 1);
    assert_eq!(a.count(), 1);
}

#[test]
fn set_replaces_in_range() {
    let mut a = Array::new();
    a.append(1);
    a.append(2);
    a.set(0, "one").unwrap();
    assert_eq!(a.count(), 2);
    assert_eq!(a.get(0).unwrap(), &Value::from("one"));
    assert_eq!(a.get(1).unwrap(), &Value::Integer(2));
}

// ============================================================================
// Removal
// ============================================================================

#[test]
fn remove_shifts_later_elements() {
    let mut a: Array = (0..5).map(i64::from).collect();
    let removed = a.remove(1).unwrap();
    assert_eq!(removed, Value::Integer(1));
    assert_eq!(a.count(), 4);
    let rest: Vec<i64> = a.iter().filter_map(Value::as_integer).collect();
    assert_eq!(rest, vec![0, 2, 3, 4]);
}

#[test]
fn remove_last_then_first() {
    let mut a: Array = ["a", "b", "c"].into_iter().collect();
    a.remove(2).unwrap();
    a.remove(0).unwrap();
    assert_eq!(a.count(), 1);
    assert_eq!(a.get(0).unwrap().as_text(), Some("b"));
}

// ============================================================================
// Nesting and aliasing
// ============================================================================

#[test]
fn nested_container_mutation_through_get_mut() {
    let mut outer = Array::new();
    outer.append(Dictionary::new());
    outer
        .get_mut(0)
        .unwrap()
        .as_dictionary_mut()
        .unwrap()
        .set("k", 1);
    let inner = outer.get(0).unwrap().as_dictionary().unwrap();
    assert_eq!(inner.get("k"), Some(&Value::Integer(1)));
}

#[test]
fn extracted_scalar_copy_is_unaffected_by_later_set() {
    let mut a = Array::new();
    a.append(10);
    let copy = a.get(0).unwrap().clone();
    a.set(0, 20).unwrap();
    assert_eq!(copy, Value::Integer(10));
    assert_eq!(a.get(0).unwrap(), &Value::Integer(20));
}

#[test]
fn get_mut_respects_bounds() {
    let mut a = Array::new();
    assert_out_of_range(a.get_mut(0), 0, 0);
}
