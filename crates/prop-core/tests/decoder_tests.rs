//! Decoder tests: accepted grammar, error classes and line reporting.
use prop_core::{internalize, internalize_value, Array, Container, Dictionary, PropError, Value, ValueKind};

fn plist(body: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <!DOCTYPE plist PUBLIC \"-//Apple//DTD PLIST 1.0//EN\" \"http://www.apple.com/DTDs/PropertyList-1.0.dtd\">\n\
         <plist version=\"1.0\">\n{body}\n</plist>\n"
    )
}

fn assert_malformed<T: std::fmt::Debug>(result: Result<T, PropError>) -> (usize, String) {
    match result {
        Err(PropError::MalformedDocument { line, message }) => (line, message),
        other => panic!("expected MalformedDocument, got {other:?}"),
    }
}

// ============================================================================
// Accepted grammar
// ============================================================================

#[test]
fn decode_scalar_array() {
    let xml = plist("<array><integer>5</integer><string>x</string><true/><false/></array>");
    let a: Array = internalize(&xml).unwrap();
    assert_eq!(a.count(), 4);
    assert_eq!(a.get(0).unwrap(), &Value::Integer(5));
    assert_eq!(a.get(1).unwrap(), &Value::from("x"));
    assert_eq!(a.get(2).unwrap(), &Value::Boolean(true));
    assert_eq!(a.get(3).unwrap(), &Value::Boolean(false));
}

#[test]
fn decode_dictionary() {
    let xml = plist(
        "<dict>\n  <key>port</key>\n  <integer>8080</integer>\n  <key>host</key>\n  <string>localhost</string>\n</dict>",
    );
    let d = Dictionary::from_xml(&xml).unwrap();
    assert_eq!(d.count(), 2);
    assert_eq!(d.get("port"), Some(&Value::Integer(8080)));
    assert_eq!(d.get("host"), Some(&Value::from("localhost")));
}

#[test]
fn decode_without_prolog() {
    let d = Dictionary::from_xml("<plist><dict><key>a</key><true/></dict></plist>").unwrap();
    assert_eq!(d.get("a"), Some(&Value::Boolean(true)));
}

#[test]
fn decode_hex_and_signed_integers() {
    let xml = plist("<array><integer>0x10</integer><integer>-42</integer><integer> 7 </integer></array>");
    let a = Array::from_xml(&xml).unwrap();
    let ints: Vec<i64> = a.iter().filter_map(Value::as_integer).collect();
    assert_eq!(ints, vec![16, -42, 7]);
}

#[test]
fn decode_entities_and_cdata() {
    let xml = plist(
        "<array><string>a &lt;b&gt; &amp; &#65;&#x42;</string><string><![CDATA[<raw> & stuff]]></string></array>",
    );
    let a = Array::from_xml(&xml).unwrap();
    assert_eq!(a.get(0).unwrap().as_text(), Some("a <b> & AB"));
    assert_eq!(a.get(1).unwrap().as_text(), Some("<raw> & stuff"));
}

#[test]
fn decode_self_closing_forms() {
    let xml = plist("<dict><key/><string/><key>l</key><array/><key>d</key><dict/></dict>");
    let d = Dictionary::from_xml(&xml).unwrap();
    assert_eq!(d.get(""), Some(&Value::from("")));
    assert_eq!(d.get("l"), Some(&Value::Array(Array::new())));
    assert_eq!(d.get("d"), Some(&Value::Dictionary(Dictionary::new())));
}

#[test]
fn decode_expanded_booleans() {
    let xml = plist("<array><true></true><false>\n</false></array>");
    let a = Array::from_xml(&xml).unwrap();
    assert_eq!(a.get(0).unwrap(), &Value::Boolean(true));
    assert_eq!(a.get(1).unwrap(), &Value::Boolean(false));
}

#[test]
fn decode_preserves_whitespace_inside_strings() {
    let xml = plist("<array><string>  two spaces\n</string></array>");
    let a = Array::from_xml(&xml).unwrap();
    assert_eq!(a.get(0).unwrap().as_text(), Some("  two spaces\n"));
}

#[test]
fn decode_skips_comments() {
    let xml = plist("<!-- top --><dict><!-- inner --><key>a</key><!-- between --><integer>1</integer></dict>");
    let d = Dictionary::from_xml(&xml).unwrap();
    assert_eq!(d.get("a"), Some(&Value::Integer(1)));
}

#[test]
fn decode_value_reports_top_level_kind() {
    let value = internalize_value(&plist("<dict/>")).unwrap();
    assert_eq!(value.kind(), ValueKind::Dictionary);
}

#[test]
fn decode_duplicate_key_keeps_last() {
    let xml = plist("<dict><key>a</key><integer>1</integer><key>a</key><integer>2</integer></dict>");
    let d = Dictionary::from_xml(&xml).unwrap();
    assert_eq!(d.count(), 1);
    assert_eq!(d.get("a"), Some(&Value::Integer(2)));
}

// ============================================================================
// TypeMismatch
// ============================================================================

#[test]
fn array_requested_dictionary_found() {
    let err = Array::from_xml(&plist("<dict/>")).unwrap_err();
    assert!(matches!(
        err,
        PropError::TypeMismatch {
            expected: ValueKind::Array,
            found: ValueKind::Dictionary
        }
    ));
}

#[test]
fn dictionary_requested_array_found() {
    let err = Dictionary::from_xml(&plist("<array/>")).unwrap_err();
    assert!(matches!(
        err,
        PropError::TypeMismatch {
            expected: ValueKind::Dictionary,
            found: ValueKind::Array
        }
    ));
}

// ============================================================================
// MalformedDocument
// ============================================================================

#[test]
fn empty_input_is_malformed() {
    assert_malformed(Array::from_xml(""));
}

#[test]
fn not_xml_is_malformed() {
    assert_malformed(Array::from_xml("this is not xml"));
}

#[test]
fn missing_plist_root_is_malformed() {
    assert_malformed(Array::from_xml("<array></array>"));
}

#[test]
fn empty_plist_is_malformed() {
    assert_malformed(Array::from_xml("<plist></plist>"));
    assert_malformed(Array::from_xml("<plist/>"));
}

#[test]
fn unknown_tag_is_malformed() {
    let (_, message) = assert_malformed(Array::from_xml(&plist("<array><real>1.5</real></array>")));
    assert!(message.contains("<real>"), "message: {message}");
}

#[test]
fn mismatched_end_tag_is_malformed() {
    assert_malformed(Array::from_xml(&plist("<array><string>x</integer></array>")));
}

#[test]
fn unclosed_container_is_malformed() {
    assert_malformed(Array::from_xml("<plist><array><integer>1</integer>"));
}

#[test]
fn value_without_key_is_malformed() {
    assert_malformed(Dictionary::from_xml(&plist("<dict><integer>1</integer></dict>")));
}

#[test]
fn key_without_value_is_malformed() {
    assert_malformed(Dictionary::from_xml(&plist("<dict><key>a</key></dict>")));
}

#[test]
fn two_keys_in_a_row_is_malformed() {
    assert_malformed(Dictionary::from_xml(&plist("<dict><key>a</key><key>b</key><true/></dict>")));
}

#[test]
fn key_in_array_is_malformed() {
    assert_malformed(Array::from_xml(&plist("<array><key>a</key></array>")));
}

#[test]
fn scalar_top_level_is_malformed() {
    assert_malformed(Array::from_xml(&plist("<string>x</string>")));
}

#[test]
fn two_top_level_containers_is_malformed() {
    assert_malformed(Array::from_xml(&plist("<array/><array/>")));
}

#[test]
fn stray_text_is_malformed() {
    assert_malformed(Array::from_xml(&plist("<array>loose<integer>1</integer></array>")));
}

#[test]
fn nested_element_in_string_is_malformed() {
    assert_malformed(Array::from_xml(&plist("<array><string>a<true/></string></array>")));
}

#[test]
fn bad_integer_is_malformed() {
    assert_malformed(Array::from_xml(&plist("<array><integer>12x</integer></array>")));
    assert_malformed(Array::from_xml(&plist("<array><integer/></array>")));
}

#[test]
fn content_in_boolean_is_malformed() {
    assert_malformed(Array::from_xml(&plist("<array><true>yes</true></array>")));
}

#[test]
fn trailing_content_is_malformed() {
    assert_malformed(Array::from_xml("<plist><array/></plist><plist/>"));
}

#[test]
fn malformed_reports_line() {
    let xml = "<plist>\n<array>\n<integer>1</integer>\n<bogus/>\n</array>\n</plist>";
    let (line, _) = assert_malformed(Array::from_xml(xml));
    assert_eq!(line, 4);
}

// ============================================================================
// Depth
// ============================================================================

fn nested_arrays(depth: usize) -> String {
    format!(
        "<plist>{}{}</plist>",
        "<array>".repeat(depth),
        "</array>".repeat(depth)
    )
}

/// Run `f` on a thread whose stack is far too small for a walk that recurses
/// once per nesting level.
fn on_small_stack<F: FnOnce() + Send + 'static>(f: F) {
    std::thread::Builder::new()
        .stack_size(256 * 1024)
        .spawn(f)
        .unwrap()
        .join()
        .unwrap();
}

#[test]
fn decode_deep_nesting_without_recursion() {
    let depth = 100_000;
    let root = Array::from_xml(&nested_arrays(depth)).unwrap();
    let mut current = &root;
    let mut seen = 1;
    while let Some(Value::Array(next)) = current.iter().next() {
        current = next;
        seen += 1;
    }
    assert_eq!(seen, depth);
    drop(root);
}

#[test]
fn deep_value_reports_depth_and_drops() {
    let value = internalize_value(&nested_arrays(100_000)).unwrap();
    assert_eq!(value.depth(), 100_000);
    drop(value);
}

#[test]
fn deep_tree_reencodes_clones_and_compares_on_small_stack() {
    let xml = nested_arrays(3_000);
    on_small_stack(move || {
        let root = Array::from_xml(&xml).unwrap();
        let again = root.to_xml();
        assert!(again.starts_with("<?xml"));
        assert!(again.contains("\t\t\t<array>\n"));
        let back = Array::from_xml(&again).unwrap();
        assert!(back == root);
        let copy = root.clone();
        assert!(copy == root);
        assert_eq!(copy.to_xml(), again);
        drop(copy);
        drop(back);
        drop(root);
    });
}
