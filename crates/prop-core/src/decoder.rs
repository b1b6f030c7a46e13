//! Plist decoder -- internalizes an XML property list into containers.
//!
//! The decoder pulls events from `quick_xml` and assembles values on an
//! explicit frame stack, so nesting depth is bounded by memory rather than by
//! the call stack. It accepts everything the encoder produces plus the wider
//! plist grammar found in the wild:
//!
//! - optional XML declaration, DOCTYPE, comments and processing instructions
//! - `<integer>` in signed decimal or `0x` hexadecimal
//! - `<string>`/`<key>` with entity references, character references and CDATA
//! - self-closing `<array/>`, `<dict/>`, `<string/>`, `<key/>`, `<true/>`, `<false/>`
//! - insignificant whitespace between elements; whitespace inside text
//!   elements is preserved
//!
//! # Error classes
//!
//! - Anything syntactically or structurally wrong is
//!   [`PropError::MalformedDocument`] with the 1-based line of the failure:
//!   bad XML, a missing `<plist>` root, an unknown element, a dictionary value
//!   without a `<key>`, a `<key>` without a value, a scalar at the top level,
//!   stray text, trailing content, an unparsable integer.
//! - A well-formed document whose top-level container is the wrong kind for
//!   the requested type is [`PropError::TypeMismatch`].

use crate::array::Array;
use crate::container::Container;
use crate::dictionary::Dictionary;
use crate::error::{PropError, Result};
use crate::value::Value;
use quick_xml::events::{BytesText, Event};
use quick_xml::Reader;
use std::path::Path;
use tracing::{debug, trace};

/// Internalize a plist document into the container type `C`.
///
/// Fails with [`PropError::TypeMismatch`] if the document holds the other
/// container kind at the top level.
pub fn internalize<C: Container>(xml: &str) -> Result<C> {
    C::from_value(internalize_value(xml)?)
}

/// Internalize a plist document whose top-level container kind is not known
/// in advance. The returned value is always an `Array` or a `Dictionary`.
pub fn internalize_value(xml: &str) -> Result<Value> {
    trace!(bytes = xml.len(), "parsing plist document");
    let value = Parser::new(xml).parse_document()?;
    trace!(kind = %value.kind(), "parsed plist document");
    Ok(value)
}

/// Read the file at `path` in full and internalize it into `C`.
///
/// File-system failures surface as [`PropError::Io`]; content that is not
/// UTF-8 is a malformed document.
pub fn internalize_from_file<C: Container>(path: impl AsRef<Path>) -> Result<C> {
    C::from_value(internalize_value_from_file(path)?)
}

/// File counterpart of [`internalize_value`].
pub fn internalize_value_from_file(path: impl AsRef<Path>) -> Result<Value> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    debug!(path = %path.display(), bytes = bytes.len(), "read plist file");
    let xml = String::from_utf8(bytes).map_err(|e| {
        let valid = &e.as_bytes()[..e.utf8_error().valid_up_to()];
        PropError::MalformedDocument {
            line: line_of(valid, valid.len()),
            message: "document is not valid UTF-8".to_string(),
        }
    })?;
    internalize_value(&xml)
}

/// A container under construction.
enum Frame {
    Array(Array),
    Dictionary {
        dict: Dictionary,
        /// A `<key>` that has been read but whose value has not.
        pending_key: Option<String>,
    },
}

struct Parser<'a> {
    xml: &'a str,
    reader: Reader<&'a [u8]>,
}

impl<'a> Parser<'a> {
    fn new(xml: &'a str) -> Self {
        Self {
            xml,
            reader: Reader::from_str(xml),
        }
    }

    /// Prolog, `<plist>`, exactly one container, `</plist>`, then nothing but
    /// whitespace, comments or processing instructions.
    fn parse_document(&mut self) -> Result<Value> {
        loop {
            match self.next()? {
                Event::Decl(_) | Event::DocType(_) | Event::Comment(_) | Event::PI(_) => {}
                Event::Text(t) if is_blank(&t) => {}
                Event::Start(e) if e.name().as_ref() == b"plist" => break,
                Event::Empty(e) if e.name().as_ref() == b"plist" => {
                    return Err(self.malformed("empty <plist> element"));
                }
                Event::Eof => return Err(self.malformed("document has no <plist> element")),
                other => {
                    return Err(self.malformed(format!(
                        "expected <plist>, found {}",
                        describe(&other)
                    )));
                }
            }
        }

        let root = self.parse_root()?;

        loop {
            match self.next()? {
                Event::Comment(_) | Event::PI(_) => {}
                Event::Text(t) if is_blank(&t) => {}
                Event::End(e) if e.name().as_ref() == b"plist" => break,
                other => {
                    return Err(self.malformed(format!(
                        "expected </plist> after the top-level container, found {}",
                        describe(&other)
                    )));
                }
            }
        }

        loop {
            match self.next()? {
                Event::Eof => return Ok(root),
                Event::Comment(_) | Event::PI(_) => {}
                Event::Text(t) if is_blank(&t) => {}
                other => {
                    return Err(self.malformed(format!(
                        "trailing {} after </plist>",
                        describe(&other)
                    )));
                }
            }
        }
    }

    /// Parse the single top-level container inside `<plist>`.
    fn parse_root(&mut self) -> Result<Value> {
        let mut stack: Vec<Frame> = Vec::new();

        loop {
            let completed = match self.next()? {
                Event::Start(e) => {
                    let name = e.name();
                    match name.as_ref() {
                        b"array" => {
                            stack.push(Frame::Array(Array::new()));
                            continue;
                        }
                        b"dict" => {
                            stack.push(Frame::Dictionary {
                                dict: Dictionary::new(),
                                pending_key: None,
                            });
                            continue;
                        }
                        b"key" => {
                            let key = self.read_text(b"key")?;
                            self.accept_key(&mut stack, key)?;
                            continue;
                        }
                        b"string" => Value::Text(self.read_text(b"string")?),
                        b"integer" => {
                            let raw = self.read_text(b"integer")?;
                            Value::Integer(self.parse_integer(&raw)?)
                        }
                        b"true" => {
                            self.expect_end(b"true")?;
                            Value::Boolean(true)
                        }
                        b"false" => {
                            self.expect_end(b"false")?;
                            Value::Boolean(false)
                        }
                        other => return Err(self.unknown_element(other)),
                    }
                }
                Event::Empty(e) => {
                    let name = e.name();
                    match name.as_ref() {
                        b"array" => Value::Array(Array::new()),
                        b"dict" => Value::Dictionary(Dictionary::new()),
                        b"string" => Value::Text(String::new()),
                        b"true" => Value::Boolean(true),
                        b"false" => Value::Boolean(false),
                        b"key" => {
                            self.accept_key(&mut stack, String::new())?;
                            continue;
                        }
                        b"integer" => return Err(self.malformed("empty <integer> element")),
                        other => return Err(self.unknown_element(other)),
                    }
                }
                Event::End(e) => {
                    let name = e.name();
                    match (stack.pop(), name.as_ref()) {
                        (Some(Frame::Array(a)), b"array") => Value::Array(a),
                        (
                            Some(Frame::Dictionary {
                                dict,
                                pending_key: None,
                            }),
                            b"dict",
                        ) => Value::Dictionary(dict),
                        (
                            Some(Frame::Dictionary {
                                pending_key: Some(key),
                                ..
                            }),
                            b"dict",
                        ) => {
                            return Err(self.malformed(format!("key {:?} has no value", key)));
                        }
                        (None, b"plist") => return Err(self.malformed("empty <plist> element")),
                        (_, other) => {
                            return Err(self.malformed(format!(
                                "unexpected </{}>",
                                String::from_utf8_lossy(other)
                            )));
                        }
                    }
                }
                Event::Comment(_) | Event::PI(_) => continue,
                Event::Text(t) if is_blank(&t) => continue,
                Event::Eof => return Err(self.malformed("unexpected end of document")),
                other => {
                    return Err(self.malformed(format!("unexpected {}", describe(&other))));
                }
            };

            match stack.last_mut() {
                None => {
                    if !completed.kind().is_container() {
                        return Err(self.malformed(format!(
                            "top-level value must be <array> or <dict>, found <{}>",
                            completed.kind()
                        )));
                    }
                    return Ok(completed);
                }
                Some(Frame::Array(a)) => a.append(completed),
                Some(Frame::Dictionary { dict, pending_key }) => match pending_key.take() {
                    Some(key) => dict.set(key, completed),
                    None => {
                        return Err(self.malformed(format!(
                            "<{}> inside <dict> is not preceded by a <key>",
                            completed.kind()
                        )));
                    }
                },
            }
        }
    }

    /// Record a `<key>` on the innermost frame, which must be a dictionary
    /// that is not already waiting for a value.
    fn accept_key(&self, stack: &mut [Frame], key: String) -> Result<()> {
        match stack.last_mut() {
            Some(Frame::Dictionary { pending_key, .. }) => {
                if let Some(previous) = pending_key.as_ref() {
                    return Err(self.malformed(format!(
                        "key {:?} follows key {:?} without a value",
                        key, previous
                    )));
                }
                *pending_key = Some(key);
                Ok(())
            }
            _ => Err(self.malformed("<key> outside of <dict>")),
        }
    }

    /// Collect the character content of a text element up to its end tag.
    /// Entity references are resolved; CDATA is taken verbatim.
    fn read_text(&mut self, tag: &[u8]) -> Result<String> {
        let mut text = String::new();
        loop {
            match self.next()? {
                Event::Text(t) => {
                    let unescaped = t.unescape().map_err(|e| self.malformed(e.to_string()))?;
                    text.push_str(&unescaped);
                }
                Event::CData(c) => {
                    let raw = std::str::from_utf8(&c)
                        .map_err(|_| self.malformed("CDATA section is not valid UTF-8"))?;
                    text.push_str(raw);
                }
                Event::Comment(_) => {}
                Event::End(e) if e.name().as_ref() == tag => return Ok(text),
                other => {
                    return Err(self.malformed(format!(
                        "unexpected {} inside <{}>",
                        describe(&other),
                        String::from_utf8_lossy(tag)
                    )));
                }
            }
        }
    }

    /// Consume the end tag of an element that carries no content.
    fn expect_end(&mut self, tag: &[u8]) -> Result<()> {
        loop {
            match self.next()? {
                Event::Comment(_) => {}
                Event::Text(t) if is_blank(&t) => {}
                Event::End(e) if e.name().as_ref() == tag => return Ok(()),
                other => {
                    return Err(self.malformed(format!(
                        "<{}> must be empty, found {}",
                        String::from_utf8_lossy(tag),
                        describe(&other)
                    )));
                }
            }
        }
    }

    fn parse_integer(&self, raw: &str) -> Result<i64> {
        let digits = raw.trim();
        let parsed = match digits
            .strip_prefix("0x")
            .or_else(|| digits.strip_prefix("0X"))
        {
            Some(hex) => u64::from_str_radix(hex, 16)
                .ok()
                .and_then(|n| i64::try_from(n).ok()),
            None => digits.parse::<i64>().ok(),
        };
        parsed.ok_or_else(|| self.malformed(format!("invalid integer {:?}", raw)))
    }

    fn next(&mut self) -> Result<Event<'a>> {
        let event = self.reader.read_event();
        event.map_err(|e| self.malformed(e.to_string()))
    }

    fn unknown_element(&self, name: &[u8]) -> PropError {
        self.malformed(format!(
            "unknown element <{}>",
            String::from_utf8_lossy(name)
        ))
    }

    fn malformed(&self, message: impl Into<String>) -> PropError {
        let position = usize::try_from(self.reader.buffer_position()).unwrap_or(usize::MAX);
        PropError::MalformedDocument {
            line: line_of(self.xml.as_bytes(), position),
            message: message.into(),
        }
    }
}

/// 1-based line number of byte offset `position` (clamped to the input).
fn line_of(input: &[u8], position: usize) -> usize {
    let end = position.min(input.len());
    input[..end].iter().filter(|&&b| b == b'\n').count() + 1
}

fn is_blank(text: &BytesText<'_>) -> bool {
    text.iter().all(u8::is_ascii_whitespace)
}

fn describe(event: &Event<'_>) -> String {
    match event {
        Event::Start(e) => format!("<{}>", String::from_utf8_lossy(e.name().as_ref())),
        Event::Empty(e) => format!("<{}/>", String::from_utf8_lossy(e.name().as_ref())),
        Event::End(e) => format!("</{}>", String::from_utf8_lossy(e.name().as_ref())),
        Event::Text(_) => "text".to_string(),
        Event::CData(_) => "CDATA section".to_string(),
        Event::Eof => "end of document".to_string(),
        _ => "markup".to_string(),
    }
}
