//! Plist encoder -- externalizes a container into an XML property list.
//!
//! Output layout:
//!
//! ```text
//! <?xml version="1.0" encoding="UTF-8"?>
//! <!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
//! <plist version="1.0">
//! <dict>
//! 	<key>port</key>
//! 	<integer>8080</integer>
//! </dict>
//! </plist>
//! ```
//!
//! - The top-level container sits at column 0; each nesting level adds a tab.
//! - Dictionary keys come out in sorted order (the `Dictionary` iteration order).
//! - Empty containers are self-closing (`<array/>`, `<dict/>`).
//! - Booleans are `<true/>` / `<false/>`; integers are plain decimal.
//! - Text is escaped for `&`, `<`, `>`, `'` and `"`; tabs and newlines are kept
//!   verbatim, carriage returns and other control characters become `&#N;`.

use crate::array::Array;
use crate::container::{Container, ContainerRef};
use crate::dictionary::Dictionary;
use crate::error::Result;
use crate::value::Value;
use quick_xml::escape::escape;
use std::io::Write;
use std::path::Path;
use tracing::debug;

pub(crate) const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;
pub(crate) const PLIST_DOCTYPE: &str = r#"<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">"#;

/// Externalize a container and everything it transitively holds into a
/// complete plist document, terminated by a newline.
pub fn externalize<C: Container>(container: &C) -> String {
    externalize_ref(container.as_container())
}

/// Externalize a borrowed container view. Useful when the container is a
/// nested [`Value`] rather than an owned top-level `Array`/`Dictionary`.
pub fn externalize_ref(container: ContainerRef<'_>) -> String {
    let mut out = String::new();
    out.push_str(XML_DECLARATION);
    out.push('\n');
    out.push_str(PLIST_DOCTYPE);
    out.push('\n');
    out.push_str("<plist version=\"1.0\">\n");
    encode_tree(container, &mut out);
    out.push_str("</plist>\n");
    out
}

/// Externalize a container into the file at `path`.
///
/// The document is written to a temporary file in the destination directory
/// and renamed over `path`, so readers never observe a half-written file.
pub fn externalize_to_file<C: Container>(container: &C, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let xml = externalize(container);
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(xml.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    let kind = C::KIND;
    debug!(path = %path.display(), bytes = xml.len(), %kind, "externalized plist to file");
    Ok(())
}

/// One pending piece of output. The tree is walked with an explicit stack of
/// these, so nesting depth is bounded by memory rather than by the call stack.
enum Step<'a> {
    Value(&'a Value, usize),
    Array(&'a Array, usize),
    Dictionary(&'a Dictionary, usize),
    Key(&'a str, usize),
    Close(&'static str, usize),
}

fn encode_tree(root: ContainerRef<'_>, out: &mut String) {
    let mut stack = vec![match root {
        ContainerRef::Array(a) => Step::Array(a, 0),
        ContainerRef::Dictionary(d) => Step::Dictionary(d, 0),
    }];
    while let Some(step) = stack.pop() {
        match step {
            Step::Value(value, depth) => match value {
                Value::Integer(n) => {
                    push_indent(depth, out);
                    out.push_str("<integer>");
                    out.push_str(&n.to_string());
                    out.push_str("</integer>\n");
                }
                Value::Text(s) => {
                    push_indent(depth, out);
                    encode_text_element("string", s, out);
                }
                Value::Boolean(b) => {
                    push_indent(depth, out);
                    out.push_str(if *b { "<true/>\n" } else { "<false/>\n" });
                }
                Value::Array(a) => stack.push(Step::Array(a, depth)),
                Value::Dictionary(d) => stack.push(Step::Dictionary(d, depth)),
            },
            Step::Array(array, depth) => {
                push_indent(depth, out);
                if array.is_empty() {
                    out.push_str("<array/>\n");
                    continue;
                }
                out.push_str("<array>\n");
                stack.push(Step::Close("array", depth));
                // Reversed so the first element is popped first.
                stack.extend(array.iter().rev().map(|item| Step::Value(item, depth + 1)));
            }
            Step::Dictionary(dict, depth) => {
                push_indent(depth, out);
                if dict.is_empty() {
                    out.push_str("<dict/>\n");
                    continue;
                }
                out.push_str("<dict>\n");
                stack.push(Step::Close("dict", depth));
                for (key, value) in dict.iter().rev() {
                    stack.push(Step::Value(value, depth + 1));
                    stack.push(Step::Key(key.as_str(), depth + 1));
                }
            }
            Step::Key(key, depth) => {
                push_indent(depth, out);
                encode_text_element("key", key, out);
            }
            Step::Close(tag, depth) => {
                push_indent(depth, out);
                out.push_str("</");
                out.push_str(tag);
                out.push_str(">\n");
            }
        }
    }
}

/// `<tag>escaped text</tag>` plus newline. Empty text still uses an explicit
/// open/close pair.
fn encode_text_element(tag: &str, text: &str, out: &mut String) {
    out.push('<');
    out.push_str(tag);
    out.push('>');
    push_escaped(text, out);
    out.push_str("</");
    out.push_str(tag);
    out.push_str(">\n");
}

/// Markup characters become entity references. Carriage returns and the
/// other C0 controls except tab and newline become decimal character
/// references, since XML readers normalize a raw CR and reject raw controls.
/// NUL has no character reference and is written as is.
fn push_escaped(text: &str, out: &mut String) {
    let escaped = escape(text);
    if !escaped.chars().any(needs_char_ref) {
        out.push_str(&escaped);
        return;
    }
    for ch in escaped.chars() {
        if needs_char_ref(ch) {
            out.push_str(&format!("&#{};", u32::from(ch)));
        } else {
            out.push(ch);
        }
    }
}

fn needs_char_ref(ch: char) -> bool {
    matches!(ch, '\u{1}'..='\u{1f}') && !matches!(ch, '\t' | '\n')
}

fn push_indent(depth: usize, out: &mut String) {
    for _ in 0..depth {
        out.push('\t');
    }
}
