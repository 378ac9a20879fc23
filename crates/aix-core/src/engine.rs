//! Document pipeline - main entry point
//!
//! Runs, in strict sequence:
//! - format detection (filename hint, then content sniffing)
//! - parsing into a document tree (fatal on malformed input)
//! - structural and per-section validation
//! - checksum verification against the canonical text
//!
//! Diagnostics are collected into a fresh value on every call and returned to
//! the caller, so one [`AixParser`] can serve many threads at once.

use crate::agent::Agent;
use crate::config::EngineConfig;
use crate::diagnostic::{Diagnostic, Diagnostics};
use crate::error::{AixError, ParseError, ValidationFailure};
use crate::format::{detect_format, Format};
use crate::integrity::verify_checksum;
use crate::parsers::{default_parsers, DocumentParser, ParserRegistry};
use crate::validation::{SectionValidator, ValidationEngine};
use crate::value::Document;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info, warn};

/// Outcome of running the whole pipeline without failing on diagnostics
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    /// Parsed document
    pub document: Document,
    /// Every diagnostic, in pipeline order
    pub diagnostics: Diagnostics,
}

impl ValidationReport {
    /// No blocking diagnostics
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.diagnostics.has_errors()
    }

    /// Blocking diagnostics
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.errors()
    }

    /// Non-blocking diagnostics
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.warnings()
    }

    /// Project into an [`Agent`] when nothing blocks it
    ///
    /// # Errors
    /// Returns [`ValidationFailure`] carrying every diagnostic when at least
    /// one of them is an error.
    pub fn into_agent(self) -> Result<Agent, ValidationFailure> {
        if self.diagnostics.has_errors() {
            return Err(ValidationFailure::new(self.diagnostics));
        }
        Ok(Agent::new(self.document, self.diagnostics))
    }
}

/// Agent document parser
///
/// Stateless between calls: configuration, parsers and validators are fixed
/// at construction.
#[derive(Debug)]
pub struct AixParser {
    config: EngineConfig,
    parsers: ParserRegistry,
    validation: ValidationEngine,
}

impl Default for AixParser {
    fn default() -> Self {
        Self::new()
    }
}

impl AixParser {
    /// Create parser with default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Create parser with specific configuration
    #[must_use]
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            parsers: default_parsers(),
            validation: ValidationEngine::default(),
        }
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Replace the parser for a syntax
    pub fn register_parser<P: DocumentParser>(&mut self, parser: P) {
        self.parsers.register(parser);
    }

    /// Add or replace the validator for a section
    pub fn register_validator<V: SectionValidator>(&mut self, validator: V) {
        self.validation.register(validator);
    }

    /// Parse, validate and verify a document
    ///
    /// Warnings (a checksum mismatch under the default policy, for example)
    /// do not block success; they are available from [`Agent::warnings`].
    ///
    /// # Errors
    /// - [`AixError::Parse`] when the text is malformed for its syntax
    /// - [`AixError::Validation`] carrying every diagnostic when at least one
    ///   is an error
    pub fn parse(&self, content: &str, filename_hint: Option<&str>) -> Result<Agent, AixError> {
        let report = self.check(content, filename_hint)?;
        let agent = report.into_agent().map_err(|failure| {
            warn!(
                errors = failure.diagnostics.errors().count(),
                warnings = failure.diagnostics.warnings().count(),
                "Document rejected"
            );
            failure
        })?;
        info!(
            id = agent.id().unwrap_or_default(),
            format = %agent.format(),
            warnings = agent.warnings().len(),
            "Agent document accepted"
        );
        Ok(agent)
    }

    /// Read and parse a file, using its name as the format hint
    ///
    /// # Errors
    /// [`ParseError::Io`] when the file cannot be read, otherwise as
    /// [`parse`](Self::parse).
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<Agent, AixError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ParseError::io_error(path, e))?;
        let hint = path.file_name().and_then(|name| name.to_str());
        self.parse(&content, hint)
    }

    /// Run the full pipeline and report every diagnostic without failing on them
    ///
    /// # Errors
    /// Returns [`ParseError`] only when the text cannot be parsed at all.
    pub fn check(&self, content: &str, filename_hint: Option<&str>) -> Result<ValidationReport, ParseError> {
        let format = detect_format(content, filename_hint);
        let document = self.parse_document(content, format)?;

        let mut diagnostics = self.validation.validate(&document);
        if self.config.verify_integrity {
            if let Some(mismatch) = verify_checksum(content, &document, self.config.checksum_policy) {
                diagnostics.push(mismatch);
            }
        }
        if self.config.strict {
            diagnostics.promote_warnings();
        }
        debug!(
            format = %format,
            errors = diagnostics.errors().count(),
            warnings = diagnostics.warnings().count(),
            "Pipeline finished"
        );

        Ok(ValidationReport { document, diagnostics })
    }

    /// Parse text of a known syntax into a document tree, without validation
    ///
    /// # Errors
    /// Returns [`ParseError`] when the text is malformed for `format`.
    pub fn parse_document(&self, content: &str, format: Format) -> Result<Document, ParseError> {
        let parser = self.parsers.find(format).ok_or(ParseError::NoParser { format })?;
        debug!(format = %format, bytes = content.len(), "Parsing document");
        parser.parse_document(content)
    }
}
