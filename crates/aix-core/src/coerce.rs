//! Scalar coercion shared by the text parsers
//!
//! Interpretation order is fixed: booleans, `null`, inline JSON structures,
//! quoted strings, numbers, and finally the raw text. Quote stripping is
//! checked before numeric detection so that `"123"` stays a string.

use crate::value::{Number, Value};
use once_cell::sync::Lazy;
use regex::Regex;

static NUMERIC_LITERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?$").expect("static pattern")
});

/// Interpret a raw scalar token
///
/// `raw` is expected to be trimmed by the caller.
#[must_use]
pub fn coerce_scalar(raw: &str) -> Value {
    match raw {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        "null" => return Value::Null,
        _ => {}
    }

    if is_delimited(raw, '[', ']') || is_delimited(raw, '{', '}') {
        if let Some(value) = parse_inline_json(raw) {
            return value;
        }
        return Value::String(raw.to_string());
    }

    if let Some(inner) = strip_matching_quotes(raw) {
        return Value::String(inner.to_string());
    }

    parse_number(raw).map_or_else(|| Value::String(raw.to_string()), Value::Number)
}

/// Parse a bracketed literal as JSON
///
/// Returns `None` for malformed input; callers keep the literal text in that
/// case instead of failing the whole document.
#[must_use]
pub fn parse_inline_json(raw: &str) -> Option<Value> {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(json) => Some(Value::from(&json)),
        Err(e) => {
            tracing::debug!(literal = raw, error = %e, "inline literal is not JSON, keeping text");
            None
        }
    }
}

/// Strip one layer of matching single or double quotes
#[must_use]
pub fn strip_matching_quotes(raw: &str) -> Option<&str> {
    ['"', '\''].into_iter().find_map(|quote| {
        if raw.len() >= 2 && raw.starts_with(quote) && raw.ends_with(quote) {
            Some(&raw[1..raw.len() - 1])
        } else {
            None
        }
    })
}

/// Value text with any trailing `# comment` removed
///
/// A `#` opens a comment only outside quotes and after whitespace, so
/// `https://host/#anchor` and `"a # b"` are kept whole. A quote opens only at
/// the start of a token, so apostrophes inside words are plain text.
#[must_use]
pub fn strip_inline_comment(raw: &str) -> &str {
    let mut quote: Option<char> = None;
    let mut previous = ' ';
    for (i, c) in raw.char_indices() {
        match quote {
            Some(open) if c == open => quote = None,
            Some(_) => {}
            None if matches!(c, '"' | '\'') && (previous.is_whitespace() || matches!(previous, '[' | '{' | ',' | ':')) => {
                quote = Some(c);
            }
            None if c == '#' && previous.is_whitespace() => return raw[..i].trim_end(),
            None => {}
        }
        previous = c;
    }
    raw
}

/// Parse a complete numeric literal
#[must_use]
pub fn parse_number(raw: &str) -> Option<Number> {
    if !NUMERIC_LITERAL.is_match(raw) {
        return None;
    }
    raw.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .map(|value| Number::from_parts(value, raw))
}

fn is_delimited(raw: &str, open: char, close: char) -> bool {
    raw.len() >= 2 && raw.starts_with(open) && raw.ends_with(close)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn booleans_and_null() {
        assert_eq!(coerce_scalar("true"), Value::Bool(true));
        assert_eq!(coerce_scalar("false"), Value::Bool(false));
        assert_eq!(coerce_scalar("null"), Value::Null);
        assert_eq!(coerce_scalar("True"), Value::from("True"));
    }

    #[test]
    fn quoted_numerals_stay_strings() {
        assert_eq!(coerce_scalar(r#""123""#), Value::from("123"));
        assert_eq!(coerce_scalar("'1.0'"), Value::from("1.0"));
        assert_eq!(coerce_scalar(r#""true""#), Value::from("true"));
    }

    #[test]
    fn trailing_comments() {
        assert_eq!(strip_inline_comment("0.7 # warm"), "0.7");
        assert_eq!(strip_inline_comment("# only comment"), "");
        assert_eq!(strip_inline_comment("\"a # b\" # note"), "\"a # b\"");
        assert_eq!(strip_inline_comment("[\"#x\", 'y # z']"), "[\"#x\", 'y # z']");
        assert_eq!(strip_inline_comment("https://host/#anchor"), "https://host/#anchor");
        assert_eq!(strip_inline_comment("it's fine # really"), "it's fine");
        assert_eq!(strip_inline_comment("C# developer"), "C# developer");
    }

    #[test]
    fn numbers() {
        assert_eq!(coerce_scalar("42").as_f64(), Some(42.0));
        assert_eq!(coerce_scalar("-0.5").as_f64(), Some(-0.5));
        assert_eq!(coerce_scalar("1e3").as_f64(), Some(1000.0));
        assert_eq!(coerce_scalar(".25").as_f64(), Some(0.25));
        assert_eq!(coerce_scalar("1.0").as_text().as_deref(), Some("1.0"));
    }

    #[test]
    fn non_numbers_stay_text() {
        assert_eq!(coerce_scalar("inf"), Value::from("inf"));
        assert_eq!(coerce_scalar("NaN"), Value::from("NaN"));
        assert_eq!(coerce_scalar("1.0.0"), Value::from("1.0.0"));
        assert_eq!(coerce_scalar("0x10"), Value::from("0x10"));
        assert_eq!(coerce_scalar(""), Value::from(""));
    }

    #[test]
    fn inline_json() {
        let seq = coerce_scalar(r#"["a", "b"]"#);
        assert_eq!(seq.string_items(), vec!["a", "b"]);

        let map = coerce_scalar(r#"{"algorithm": "sha256"}"#);
        assert_eq!(map.get("algorithm"), Some(&Value::from("sha256")));
    }

    #[test]
    fn malformed_inline_json_is_literal() {
        assert_eq!(coerce_scalar("[a, b]"), Value::from("[a, b]"));
        assert_eq!(coerce_scalar("{broken"), Value::from("{broken"));
        assert_eq!(parse_inline_json("{oops}"), None);
    }

    #[test]
    fn quote_stripping_is_single_layer() {
        assert_eq!(strip_matching_quotes(r#"""x"""#), Some(r#""x""#));
        assert_eq!(strip_matching_quotes(r#""x'"#), None);
        assert_eq!(strip_matching_quotes("\""), None);
    }
}
