//! Indentation-based document parser
//!
//! A line-oriented state machine over an explicit frame stack. Each frame
//! records the indentation column that opened it and the path, from the
//! root, of the container that subsequent deeper lines write into. Paths are
//! resolved from the root on every write, so the stack never holds borrows
//! into the tree.
//!
//! Supported subset:
//! - `key: value`, `key:` opening a nested record
//! - `- item` sequence entries, including `- name: a, role: b` inline records
//!   whose continuation lines extend the same record
//! - `|` / `>` block scalars
//! - inline JSON (`[..]`, `{..}`) through the shared scalar coercion
//! - quoted keys (`"a:b": c`) and trailing `# comments` after values
//!
//! Anchors, aliases, tags, flow mappings spanning lines and multi-document
//! streams are not supported.

use crate::coerce::{coerce_scalar, strip_inline_comment, strip_matching_quotes};
use crate::error::ParseError;
use crate::format::Format;
use crate::parsers::{indent_of, DocumentParser};
use crate::value::{Mapping, Value};

/// YAML-like parser
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlLikeParser;

impl YamlLikeParser {
    /// Create new parser
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl DocumentParser for YamlLikeParser {
    fn format(&self) -> Format {
        Format::YamlLike
    }

    fn parse(&self, content: &str) -> Result<Mapping, ParseError> {
        let mut state = LineState::new();
        for (idx, line) in content.lines().enumerate() {
            state.feed(idx + 1, line)?;
        }
        state.finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Index(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    Root,
    Key,
    Item,
}

#[derive(Debug)]
struct Frame {
    /// Column of the line that opened the frame; -1 for the root
    indent: isize,
    kind: FrameKind,
    path: Vec<Segment>,
}

#[derive(Debug)]
struct BlockScalar {
    parent: Vec<Segment>,
    key: String,
    key_indent: usize,
    lines: Vec<String>,
}

impl BlockScalar {
    /// Join collected lines, removing the block's own indentation
    fn text(&self) -> String {
        let block_indent = self
            .lines
            .iter()
            .find(|line| !line.trim().is_empty())
            .map_or(0, |line| indent_of(line));

        let mut lines: Vec<&str> = self
            .lines
            .iter()
            .map(|line| {
                if line.trim().is_empty() {
                    ""
                } else {
                    &line[indent_of(line).min(block_indent)..]
                }
            })
            .collect();
        while lines.last().is_some_and(|line| line.is_empty()) {
            lines.pop();
        }
        lines.join("\n")
    }
}

struct LineState {
    root: Value,
    frames: Vec<Frame>,
    block: Option<BlockScalar>,
}

impl LineState {
    fn new() -> Self {
        Self {
            root: Value::Mapping(Mapping::new()),
            frames: vec![Frame {
                indent: -1,
                kind: FrameKind::Root,
                path: Vec::new(),
            }],
            block: None,
        }
    }

    fn feed(&mut self, line_no: usize, line: &str) -> Result<(), ParseError> {
        let indent = indent_of(line);
        let trimmed = line.trim();

        if let Some(block) = self.block.as_mut() {
            if trimmed.is_empty() || indent > block.key_indent {
                block.lines.push(line.to_string());
                return Ok(());
            }
            self.flush_block(line_no)?;
        }

        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed == "---" {
            return Ok(());
        }

        if trimmed == "-" || trimmed.starts_with("- ") {
            return self.item(line_no, indent, strip_inline_comment(trimmed[1..].trim()));
        }

        match split_key(trimmed) {
            Some((key, value)) => {
                if key.is_empty() {
                    return Err(ParseError::syntax(Format::YamlLike, line_no, "empty key"));
                }
                self.entry(line_no, indent, key, strip_inline_comment(value.trim()))
            }
            None => Err(ParseError::syntax(
                Format::YamlLike,
                line_no,
                format!("expected `key: value` or `- item`, found `{trimmed}`"),
            )),
        }
    }

    fn finish(mut self) -> Result<Mapping, ParseError> {
        if self.block.is_some() {
            self.flush_block(0)?;
        }
        match std::mem::take(&mut self.root) {
            Value::Mapping(root) => Ok(root),
            _ => Err(ParseError::RootNotMapping {
                format: Format::YamlLike,
            }),
        }
    }

    fn pop_frames(&mut self, indent: usize) {
        let indent = indent as isize;
        while self.frames.len() > 1 && self.frames.last().is_some_and(|f| f.indent >= indent) {
            self.frames.pop();
        }
    }

    fn top(&self) -> &Frame {
        // the root frame is never popped
        &self.frames[self.frames.len() - 1]
    }

    fn entry(&mut self, line_no: usize, indent: usize, key: &str, value: &str) -> Result<(), ParseError> {
        self.pop_frames(indent);
        let parent = self.top().path.clone();

        if is_block_indicator(value) {
            self.insert(line_no, &parent, key, Value::String(String::new()))?;
            self.block = Some(BlockScalar {
                parent,
                key: key.to_string(),
                key_indent: indent,
                lines: Vec::new(),
            });
            return Ok(());
        }

        if value.is_empty() {
            self.insert(line_no, &parent, key, Value::Mapping(Mapping::new()))?;
            let mut path = parent;
            path.push(Segment::Key(key.to_string()));
            self.frames.push(Frame {
                indent: indent as isize,
                kind: FrameKind::Key,
                path,
            });
            return Ok(());
        }

        self.insert(line_no, &parent, key, coerce_scalar(value))
    }

    fn item(&mut self, line_no: usize, indent: usize, text: &str) -> Result<(), ParseError> {
        let indent_col = indent as isize;
        // Items may sit at the same column as their key (`key:` / `- a`), so a
        // key frame at this exact column stays; an earlier item frame does not.
        while self.frames.len() > 1 {
            let top = self.top();
            let same_column_item = top.indent == indent_col && top.kind == FrameKind::Item;
            if top.indent > indent_col || same_column_item {
                self.frames.pop();
            } else {
                break;
            }
        }

        let owner = self.top().path.clone();
        if owner.is_empty() {
            return Err(ParseError::syntax(
                Format::YamlLike,
                line_no,
                "sequence item has no enclosing key",
            ));
        }

        let slot = resolve_mut(&mut self.root, &owner)
            .ok_or_else(|| ParseError::syntax(Format::YamlLike, line_no, "sequence owner not found"))?;
        let convert = match &*slot {
            Value::Sequence(_) => false,
            Value::Null => true,
            Value::Mapping(map) if map.is_empty() => true,
            _ => {
                return Err(ParseError::syntax(
                    Format::YamlLike,
                    line_no,
                    "sequence item inside a record",
                ))
            }
        };
        if convert {
            *slot = Value::Sequence(Vec::new());
        }
        let Value::Sequence(items) = slot else {
            unreachable!("slot was just made a sequence");
        };

        let record = if text.is_empty() {
            Some(Mapping::new())
        } else if is_inline_record(text) {
            Some(parse_inline_record(text))
        } else {
            None
        };

        match record {
            Some(record) => {
                items.push(Value::Mapping(record));
                let mut path = owner;
                path.push(Segment::Index(items.len() - 1));
                self.frames.push(Frame {
                    indent: indent_col,
                    kind: FrameKind::Item,
                    path,
                });
            }
            None => items.push(coerce_scalar(text)),
        }
        Ok(())
    }

    fn flush_block(&mut self, line_no: usize) -> Result<(), ParseError> {
        if let Some(block) = self.block.take() {
            let text = block.text();
            self.insert(line_no, &block.parent, &block.key, Value::String(text))?;
        }
        Ok(())
    }

    fn insert(&mut self, line_no: usize, parent: &[Segment], key: &str, value: Value) -> Result<(), ParseError> {
        let target = resolve_mut(&mut self.root, parent).and_then(Value::as_mapping_mut);
        match target {
            Some(map) => {
                map.insert(key.to_string(), value);
                Ok(())
            }
            None => Err(ParseError::syntax(
                Format::YamlLike,
                line_no,
                format!("cannot assign `{key}`: enclosing value is not a mapping"),
            )),
        }
    }
}

fn resolve_mut<'a>(root: &'a mut Value, path: &[Segment]) -> Option<&'a mut Value> {
    path.iter().try_fold(root, |current, segment| match segment {
        Segment::Key(key) => current.as_mapping_mut()?.get_mut(key),
        Segment::Index(index) => current.as_sequence_mut()?.get_mut(*index),
    })
}

/// `key: value` split at the colon that ends the key; a quoted key may
/// itself contain colons
fn split_key(trimmed: &str) -> Option<(&str, &str)> {
    if let Some(quote) = trimmed.chars().next().filter(|c| matches!(c, '"' | '\'')) {
        let close = trimmed[1..].find(quote)? + 1;
        let value = trimmed[close + 1..].trim_start().strip_prefix(':')?;
        return Some((&trimmed[1..close], value));
    }
    trimmed.split_once(':').map(|(key, value)| (key.trim(), value))
}

fn is_block_indicator(value: &str) -> bool {
    matches!(value, "|" | ">" | "|-" | ">-" | "|+" | ">+")
}

/// An item is a record when a mapping colon (followed by space or end of
/// text) comes before any comma. Quoted and bracketed items are scalars.
fn is_inline_record(text: &str) -> bool {
    if text.starts_with(['"', '\'', '[', '{']) {
        return false;
    }
    let colon = text
        .char_indices()
        .find(|&(i, c)| c == ':' && text[i + 1..].chars().next().map_or(true, char::is_whitespace))
        .map(|(i, _)| i);
    match (colon, text.find(',')) {
        (Some(colon), Some(comma)) => colon < comma,
        (Some(_), None) => true,
        _ => false,
    }
}

/// `name: a, description: b` → record; a segment without a colon continues
/// the previous value (`description: search, summarize`).
fn parse_inline_record(text: &str) -> Mapping {
    let mut pairs: Vec<(String, String)> = Vec::new();
    for segment in text.split(',') {
        match segment.split_once(':') {
            Some((key, value)) => {
                let key = key.trim();
                let key = strip_matching_quotes(key).unwrap_or(key);
                pairs.push((key.to_string(), value.trim().to_string()));
            }
            None => {
                if let Some((_, value)) = pairs.last_mut() {
                    value.push(',');
                    value.push_str(segment);
                }
            }
        }
    }
    pairs
        .into_iter()
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (key, coerce_scalar(value.trim())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(content: &str) -> Mapping {
        YamlLikeParser.parse(content).unwrap()
    }

    #[test]
    fn simple_sequence() {
        let root = parse("items:\n  - item1\n  - item2\n  - item3");
        let items = root.get("items").and_then(Value::as_sequence).unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0], Value::from("item1"));
    }

    #[test]
    fn nested_mappings_and_scalars() {
        let root = parse(
            "meta:\n  version: \"1.0\"\n  created: 2025-01-12T10:30:00Z\npersona:\n  temperature: 0.7\n  verbose: true\n",
        );
        let meta = root.get("meta").unwrap();
        assert_eq!(meta.get("version"), Some(&Value::from("1.0")));
        assert_eq!(meta.get("created"), Some(&Value::from("2025-01-12T10:30:00Z")));
        let persona = root.get("persona").unwrap();
        assert_eq!(persona.get("temperature").and_then(Value::as_f64), Some(0.7));
        assert_eq!(persona.get("verbose"), Some(&Value::Bool(true)));
    }

    #[test]
    fn dedent_returns_to_parent() {
        let root = parse("a:\n  b:\n    c: 1\n  d: 2\ne: 3");
        assert_eq!(root.get("a").and_then(|a| a.get_path("b.c")).and_then(Value::as_f64), Some(1.0));
        assert_eq!(root.get("a").and_then(|a| a.get("d")).and_then(Value::as_f64), Some(2.0));
        assert_eq!(root.get("e").and_then(Value::as_f64), Some(3.0));
    }

    #[test]
    fn comments_and_blank_lines_skipped() {
        let root = parse("# header\n\nmeta:\n  # inner\n\n  name: x\n");
        assert_eq!(root.get("meta").and_then(|m| m.get("name")), Some(&Value::from("x")));
    }

    #[test]
    fn inline_record_items() {
        let root = parse("skills:\n  - name: search, description: Web search\n  - name: calc, description: Math");
        let skills = root.get("skills").and_then(Value::as_sequence).unwrap();
        assert_eq!(skills.len(), 2);
        assert_eq!(skills[0].get("name"), Some(&Value::from("search")));
        assert_eq!(skills[1].get("description"), Some(&Value::from("Math")));
    }

    #[test]
    fn record_items_with_continuation_lines() {
        let root = parse(
            "skills:\n  - name: search\n    description: Find things, fast\n    enabled: false\n  - name: calc\n    description: Math\nafter: 1",
        );
        let skills = root.get("skills").and_then(Value::as_sequence).unwrap();
        assert_eq!(skills.len(), 2);
        assert_eq!(skills[0].get("description"), Some(&Value::from("Find things, fast")));
        assert_eq!(skills[0].get("enabled"), Some(&Value::Bool(false)));
        assert_eq!(skills[1].get("name"), Some(&Value::from("calc")));
        assert_eq!(root.get("after").and_then(Value::as_f64), Some(1.0));
    }

    #[test]
    fn items_at_key_column() {
        let root = parse("servers:\n- name: fs\n  command: npx\n- name: git\n  command: uvx\nnext: x");
        let servers = root.get("servers").and_then(Value::as_sequence).unwrap();
        assert_eq!(servers.len(), 2);
        assert_eq!(servers[1].get("command"), Some(&Value::from("uvx")));
        assert_eq!(root.get("next"), Some(&Value::from("x")));
    }

    #[test]
    fn nested_sequence_inside_item() {
        let root = parse("mcp:\n  servers:\n    - name: fs\n      args:\n        - --root\n        - /tmp\n");
        let server = root.get("mcp").and_then(|m| m.get("servers")).and_then(Value::as_sequence).unwrap();
        assert_eq!(server[0].get("args").unwrap().string_items(), vec!["--root", "/tmp"]);
    }

    #[test]
    fn urls_in_items_are_scalars() {
        let root = parse("allowed:\n  - https://example.com/a\n  - \"quoted: text\"");
        let allowed = root.get("allowed").unwrap().string_items();
        assert_eq!(allowed, vec!["https://example.com/a", "quoted: text"]);
    }

    #[test]
    fn comma_before_colon_is_scalar() {
        let root = parse("notes:\n  - first, then: second");
        assert_eq!(root.get("notes").unwrap().string_items(), vec!["first, then: second"]);
    }

    #[test]
    fn block_scalar_literal() {
        let root = parse("persona:\n  instructions: |\n    Line one\n\n      indented\n    Line three\n\n  role: helper\n");
        let persona = root.get("persona").unwrap();
        assert_eq!(
            persona.get("instructions"),
            Some(&Value::from("Line one\n\n  indented\nLine three"))
        );
        assert_eq!(persona.get("role"), Some(&Value::from("helper")));
    }

    #[test]
    fn block_scalar_at_end_of_input() {
        let root = parse("notes: >\n  folded text\n  # not a comment");
        assert_eq!(root.get("notes"), Some(&Value::from("folded text\n# not a comment")));
    }

    #[test]
    fn inline_json_values() {
        let root = parse("tags: [\"a\", \"b\"]\nchecksum: {\"algorithm\": \"sha256\"}\nloose: [a, b]");
        assert_eq!(root.get("tags").unwrap().string_items(), vec!["a", "b"]);
        assert_eq!(root.get("checksum").and_then(|c| c.get("algorithm")), Some(&Value::from("sha256")));
        assert_eq!(root.get("loose"), Some(&Value::from("[a, b]")));
    }

    #[test]
    fn quoted_keys_and_values() {
        let root = parse("\"key\": 'value'\nnum: \"123\"");
        assert_eq!(root.get("key"), Some(&Value::from("value")));
        assert_eq!(root.get("num"), Some(&Value::from("123")));
    }

    #[test]
    fn empty_document_is_empty_mapping() {
        assert!(parse("").is_empty());
        assert!(parse("# only a comment\n\n").is_empty());
    }

    #[test]
    fn line_without_colon_is_syntax_error() {
        let err = YamlLikeParser.parse("meta:\n  just words").unwrap_err();
        assert!(matches!(err, ParseError::Syntax { line: 2, .. }));
    }

    #[test]
    fn top_level_item_is_syntax_error() {
        let err = YamlLikeParser.parse("- a\n- b").unwrap_err();
        assert!(matches!(err, ParseError::Syntax { line: 1, .. }));
    }

    #[test]
    fn key_inside_scalar_sequence_is_syntax_error() {
        let err = YamlLikeParser.parse("list:\n  - a\n  key: b").unwrap_err();
        assert!(matches!(err, ParseError::Syntax { line: 3, .. }));
    }

    #[test]
    fn item_inside_record_is_syntax_error() {
        let err = YamlLikeParser
            .parse("persona:\n  role: x\n  instructions: y\n  - stray\n")
            .unwrap_err();
        assert!(matches!(err, ParseError::Syntax { line: 4, .. }), "{err}");

        let err = YamlLikeParser.parse("meta:\n  name: x\n- stray").unwrap_err();
        assert!(matches!(err, ParseError::Syntax { line: 3, .. }), "{err}");
    }

    #[test]
    fn items_fill_empty_and_null_keys() {
        let root = parse("tools:\n  - a\nextra: null\n");
        assert_eq!(root.get("tools").unwrap().string_items(), vec!["a"]);
        let root = parse("outer:\n  tools:\n  - a\n  - b\n");
        let tools = root.get("outer").and_then(|outer| outer.get("tools")).unwrap();
        assert_eq!(tools.string_items(), vec!["a", "b"]);
    }

    #[test]
    fn quoted_key_with_colon() {
        let root = parse("\"a:b\": c\n'x: y':\n  z: 1\n");
        assert_eq!(root.get("a:b"), Some(&Value::from("c")));
        assert_eq!(root.get("x: y").and_then(|v| v.get("z")).and_then(Value::as_f64), Some(1.0));
    }

    #[test]
    fn trailing_comments_after_values() {
        let root = parse(
            "persona:\n  temperature: 0.7 # warm\n  role: 'helper # bot'\n  nested: # opens a record\n    a: 1\ntags:\n  - x # first\n",
        );
        let persona = root.get("persona").unwrap();
        assert_eq!(persona.get("temperature").and_then(Value::as_f64), Some(0.7));
        assert_eq!(persona.get("role"), Some(&Value::from("helper # bot")));
        assert_eq!(persona.get_path("nested.a").and_then(Value::as_f64), Some(1.0));
        assert_eq!(root.get("tags").unwrap().string_items(), vec!["x"]);
    }

    #[test]
    fn crlf_line_endings() {
        let root = parse("meta:\r\n  name: x\r\n");
        assert_eq!(root.get("meta").and_then(|m| m.get("name")), Some(&Value::from("x")));
    }
}
