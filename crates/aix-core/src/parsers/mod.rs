//! Document parsers for the supported syntaxes
//!
//! Provides parsing from document text into a [`Document`] tree:
//! - YAML-like indentation syntax (hand-written line state machine)
//! - Section-based `[section]` / `key = value` syntax (hand-written)
//! - Strict JSON via serde_json

use crate::error::ParseError;
use crate::format::Format;
use crate::value::{Document, Mapping};

mod json;
mod section;
mod yaml;

pub use json::JsonParser;
pub use section::SectionParser;
pub use yaml::YamlLikeParser;

/// Parser trait for turning document text into a tree
///
/// Implement this trait to add support for new syntaxes. Parsers hold no
/// per-call state, so one instance can serve any number of threads.
pub trait DocumentParser: Send + Sync + 'static {
    /// Syntax handled by this parser
    fn format(&self) -> Format;

    /// Parse content into the root record
    ///
    /// # Errors
    /// Returns [`ParseError`] when the text is malformed for this syntax.
    fn parse(&self, content: &str) -> Result<Mapping, ParseError>;

    /// Parse content into a [`Document`] tagged with this parser's format
    ///
    /// # Errors
    /// Returns [`ParseError`] when the text is malformed for this syntax.
    fn parse_document(&self, content: &str) -> Result<Document, ParseError> {
        Ok(Document::new(self.parse(content)?, self.format()))
    }

    /// Supported file extensions (without dot)
    fn extensions(&self) -> &[&str] {
        self.format().extensions()
    }
}

/// Parser lookup by format
pub struct ParserRegistry {
    parsers: Vec<Box<dyn DocumentParser>>,
}

impl Default for ParserRegistry {
    fn default() -> Self {
        default_parsers()
    }
}

impl std::fmt::Debug for ParserRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParserRegistry")
            .field("parser_count", &self.parsers.len())
            .field("extensions", &self.all_extensions())
            .finish()
    }
}

impl ParserRegistry {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            parsers: Vec::new(),
        }
    }

    /// Register a parser, replacing any parser already registered for its format
    pub fn register<P: DocumentParser>(&mut self, parser: P) {
        self.parsers.retain(|p| p.format() != parser.format());
        self.parsers.push(Box::new(parser));
    }

    /// Find parser for a format
    #[must_use]
    pub fn find(&self, format: Format) -> Option<&dyn DocumentParser> {
        self.parsers
            .iter()
            .find(|p| p.format() == format)
            .map(|p| &**p)
    }

    /// Get all registered extensions
    #[must_use]
    pub fn all_extensions(&self) -> Vec<&str> {
        self.parsers
            .iter()
            .flat_map(|p| p.extensions())
            .copied()
            .collect()
    }
}

/// Create registry with the three built-in parsers
#[must_use]
pub fn default_parsers() -> ParserRegistry {
    let mut registry = ParserRegistry::new();
    registry.register(JsonParser);
    registry.register(YamlLikeParser);
    registry.register(SectionParser);
    registry
}

/// Count of leading spaces/tabs, in bytes
pub(crate) fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start_matches([' ', '\t']).len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_finds_every_format() {
        let registry = default_parsers();
        for format in Format::ALL {
            let parser = registry.find(format).expect("built-in parser");
            assert_eq!(parser.format(), format);
        }
    }

    #[test]
    fn register_replaces_same_format() {
        let mut registry = default_parsers();
        registry.register(JsonParser);
        assert_eq!(registry.all_extensions().len(), 4);
    }

    #[test]
    fn extensions_follow_format() {
        let registry = default_parsers();
        for format in Format::ALL {
            let parser = registry.find(format).expect("built-in parser");
            assert_eq!(parser.extensions(), format.extensions());
        }
        assert_eq!(registry.all_extensions(), vec!["json", "yaml", "yml", "toml"]);
    }

    #[test]
    fn registry_debug() {
        let debug_str = format!("{:?}", default_parsers());
        assert!(debug_str.contains("ParserRegistry"));
        assert!(debug_str.contains("toml"));
    }

    #[test]
    fn indent_counts_spaces_and_tabs() {
        assert_eq!(indent_of("    a: 1"), 4);
        assert_eq!(indent_of("\ta"), 1);
        assert_eq!(indent_of("a"), 0);
        assert_eq!(indent_of(""), 0);
    }
}
