//! Strict JSON documents
//!
//! Decoding is delegated to serde_json; this adapter only converts the result
//! into the document tree and insists on an object at the root.

use crate::error::ParseError;
use crate::format::Format;
use crate::parsers::DocumentParser;
use crate::value::{Mapping, Value};

/// JSON parser
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonParser;

impl DocumentParser for JsonParser {
    fn format(&self) -> Format {
        Format::Json
    }

    fn parse(&self, content: &str) -> Result<Mapping, ParseError> {
        let json: serde_json::Value = serde_json::from_str(content)?;
        match Value::from(&json) {
            Value::Mapping(root) => Ok(root),
            _ => Err(ParseError::RootNotMapping {
                format: Format::Json,
            }),
        }
    }
}
