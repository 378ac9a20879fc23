//! Section-based document parser
//!
//! Two-level syntax: `[name]` headers open a top-level record and
//! `key = value` lines assign into the record currently open (or the root
//! before any header). `[[name]]` appends a fresh record to the list `name`.
//! Dotted headers are not resolved into deeper structure: `[a.b]` creates
//! the top-level key `"a.b"`.

use crate::coerce::{coerce_scalar, strip_inline_comment, strip_matching_quotes};
use crate::error::ParseError;
use crate::format::Format;
use crate::parsers::DocumentParser;
use crate::value::{Mapping, Value};

/// Section-based parser
#[derive(Debug, Clone, Copy, Default)]
pub struct SectionParser;

impl SectionParser {
    /// Create new parser
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

/// Record receiving `key = value` assignments
#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    Root,
    Section(String),
    ListItem(String),
}

/// Open `"""` / `'''` string spanning several lines
#[derive(Debug)]
struct MultiLine {
    key: String,
    delimiter: &'static str,
    lines: Vec<String>,
}

impl DocumentParser for SectionParser {
    fn format(&self) -> Format {
        Format::SectionBased
    }

    fn parse(&self, content: &str) -> Result<Mapping, ParseError> {
        let mut root = Mapping::new();
        let mut target = Target::Root;
        let mut multi_line: Option<MultiLine> = None;

        for (idx, raw) in content.lines().enumerate() {
            let line_no = idx + 1;

            if let Some(open) = multi_line.as_mut() {
                if let Some(last) = raw.trim_end().strip_suffix(open.delimiter) {
                    open.lines.push(last.to_string());
                    let text = open.lines.join("\n");
                    let key = open.key.clone();
                    multi_line = None;
                    assign(&mut root, &target, line_no, key, Value::String(text))?;
                } else {
                    open.lines.push(raw.to_string());
                }
                continue;
            }

            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(name) = header(line, "[[", "]]") {
                let slot = root
                    .entry(name.to_string())
                    .or_insert_with(|| Value::Sequence(Vec::new()));
                let Some(items) = slot.as_sequence_mut() else {
                    return Err(ParseError::syntax(
                        Format::SectionBased,
                        line_no,
                        format!("`[[{name}]]` conflicts with an existing non-list value"),
                    ));
                };
                items.push(Value::Mapping(Mapping::new()));
                target = Target::ListItem(name.to_string());
                continue;
            }

            if let Some(name) = header(line, "[", "]") {
                root.insert(name.to_string(), Value::Mapping(Mapping::new()));
                target = Target::Section(name.to_string());
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                return Err(ParseError::syntax(
                    Format::SectionBased,
                    line_no,
                    format!("expected `[section]` or `key = value`, found `{line}`"),
                ));
            };
            let key = key.trim();
            let key = strip_matching_quotes(key).unwrap_or(key);
            if key.is_empty() {
                return Err(ParseError::syntax(Format::SectionBased, line_no, "empty key"));
            }
            let value = strip_inline_comment(value.trim());

            if let Some(delimiter) = multi_line_opening(value) {
                let first = &value[delimiter.len()..];
                if let Some(inner) = first.strip_suffix(delimiter) {
                    assign(&mut root, &target, line_no, key.to_string(), Value::from(inner))?;
                } else {
                    let lines = if first.is_empty() {
                        Vec::new()
                    } else {
                        vec![first.to_string()]
                    };
                    multi_line = Some(MultiLine {
                        key: key.to_string(),
                        delimiter,
                        lines,
                    });
                }
                continue;
            }

            assign(&mut root, &target, line_no, key.to_string(), coerce_scalar(value))?;
        }

        if let Some(open) = multi_line {
            return Err(ParseError::syntax(
                Format::SectionBased,
                content.lines().count(),
                format!("unterminated multi-line string for `{}`", open.key),
            ));
        }
        Ok(root)
    }
}

/// Name inside `open name close`, when the line has exactly that shape
fn header<'a>(line: &'a str, open: &str, close: &str) -> Option<&'a str> {
    let inner = line.strip_prefix(open)?.strip_suffix(close)?.trim();
    if inner.is_empty() || inner.contains(['[', ']']) {
        None
    } else {
        Some(inner)
    }
}

fn multi_line_opening(value: &str) -> Option<&'static str> {
    ["\"\"\"", "'''"]
        .into_iter()
        .find(|delimiter| value.starts_with(delimiter))
}

fn assign(root: &mut Mapping, target: &Target, line_no: usize, key: String, value: Value) -> Result<(), ParseError> {
    let record = match target {
        Target::Root => Some(root),
        Target::Section(name) => root.get_mut(name).and_then(Value::as_mapping_mut),
        Target::ListItem(name) => root
            .get_mut(name)
            .and_then(Value::as_sequence_mut)
            .and_then(|items| items.last_mut())
            .and_then(Value::as_mapping_mut),
    };
    match record {
        Some(record) => {
            record.insert(key, value);
            Ok(())
        }
        None => Err(ParseError::syntax(
            Format::SectionBased,
            line_no,
            format!("cannot assign `{key}`: current section is not a record"),
        )),
    }
}
