//! `memory` section: memory sub-records

use super::{check_range, expect_mapping, SectionValidator};
use crate::diagnostic::{Diagnostic, DiagnosticCode, Diagnostics};
use crate::value::Value;

const SECTION: &str = "memory";

/// Validator for the `memory` section
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryValidator;

impl SectionValidator for MemoryValidator {
    fn section(&self) -> &'static str {
        SECTION
    }

    fn validate(&self, value: &Value, diagnostics: &mut Diagnostics) {
        let Some(memory) = expect_mapping(SECTION, value, diagnostics) else {
            return;
        };
        let Some(semantic) = memory.get("semantic").filter(|v| !v.is_null()) else {
            return;
        };
        if semantic.as_mapping().is_none() {
            diagnostics.push(
                Diagnostic::error(
                    DiagnosticCode::InvalidType,
                    SECTION,
                    format!("'semantic' must be a mapping, found {}", semantic.type_name()),
                )
                .with_field("semantic"),
            );
            return;
        }
        check_range(
            SECTION,
            "semantic.similarity_threshold",
            semantic.get("similarity_threshold"),
            (0.0, 1.0),
            diagnostics,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::{DocumentParser, SectionParser};

    fn run(toml: &str) -> Diagnostics {
        let document = SectionParser.parse_document(toml).unwrap();
        let mut diagnostics = Diagnostics::new();
        MemoryValidator.validate(document.get("memory").unwrap(), &mut diagnostics);
        diagnostics
    }

    #[test]
    fn threshold_bounds() {
        assert!(run("[memory]\nsemantic = {\"similarity_threshold\": 0.8}").is_empty());
        assert!(run("[memory]\nsemantic = {\"similarity_threshold\": 1}").is_empty());
        let diagnostics = run("[memory]\nsemantic = {\"similarity_threshold\": 1.5}");
        assert_eq!(diagnostics.count(DiagnosticCode::InvalidRange), 1);
        assert_eq!(
            diagnostics.iter().next().map(Diagnostic::location).as_deref(),
            Some("memory.semantic.similarity_threshold")
        );
    }

    #[test]
    fn other_memory_records_are_free_form() {
        assert!(run("[memory]\nepisodic = {\"enabled\": true}").is_empty());
    }

    #[test]
    fn semantic_must_be_mapping() {
        assert_eq!(run("[memory]\nsemantic = \"on\"").count(DiagnosticCode::InvalidType), 1);
    }
}
