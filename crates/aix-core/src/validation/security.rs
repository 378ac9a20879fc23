//! `security` section: checksum declaration and capability lists

use super::{expect_mapping, SectionValidator};
use crate::diagnostic::{Diagnostic, DiagnosticCode, Diagnostics};
use crate::integrity::ChecksumAlgorithm;
use crate::value::{Mapping, Value};

const SECTION: &str = "security";

/// Operation lists under `security.capabilities`
pub const CAPABILITY_LISTS: [&str; 3] =
    ["allowed_operations", "restricted_operations", "require_confirmation"];

/// Validator for the `security` section
#[derive(Debug, Clone, Copy, Default)]
pub struct SecurityValidator;

impl SectionValidator for SecurityValidator {
    fn section(&self) -> &'static str {
        SECTION
    }

    fn validate(&self, value: &Value, diagnostics: &mut Diagnostics) {
        let Some(security) = expect_mapping(SECTION, value, diagnostics) else {
            return;
        };
        check_checksum(security, diagnostics);
        if let Some(capabilities) = security.get("capabilities") {
            check_capabilities(capabilities, diagnostics);
        }
    }
}

fn missing(field: &str) -> Diagnostic {
    Diagnostic::error(
        DiagnosticCode::MissingField,
        SECTION,
        format!("required field '{field}' is missing or empty"),
    )
    .with_field(field)
}

fn check_checksum(security: &Mapping, diagnostics: &mut Diagnostics) {
    let Some(checksum) = security.get("checksum").filter(|v| !v.is_blank()) else {
        diagnostics.push(missing("checksum"));
        return;
    };
    let Some(checksum) = checksum.as_mapping() else {
        diagnostics.push(
            Diagnostic::error(
                DiagnosticCode::InvalidType,
                SECTION,
                format!("'checksum' must be a mapping, found {}", checksum.type_name()),
            )
            .with_field("checksum"),
        );
        return;
    };

    match checksum.get("algorithm").filter(|v| !v.is_blank()) {
        None => diagnostics.push(missing("checksum.algorithm")),
        Some(algorithm) => {
            let name = algorithm.as_text().unwrap_or_default();
            if name.parse::<ChecksumAlgorithm>().is_err() {
                diagnostics.push(
                    Diagnostic::error(
                        DiagnosticCode::InvalidAlgorithm,
                        SECTION,
                        format!("unsupported checksum algorithm '{name}' (expected sha256, sha512 or blake3)"),
                    )
                    .with_field("checksum.algorithm"),
                );
            }
        }
    }

    if checksum.get("value").map_or(true, Value::is_blank) {
        diagnostics.push(missing("checksum.value"));
    }
}

fn check_capabilities(capabilities: &Value, diagnostics: &mut Diagnostics) {
    let Some(capabilities) = capabilities.as_mapping() else {
        diagnostics.push(
            Diagnostic::error(
                DiagnosticCode::InvalidType,
                SECTION,
                format!("'capabilities' must be a mapping, found {}", capabilities.type_name()),
            )
            .with_field("capabilities"),
        );
        return;
    };

    for list in CAPABILITY_LISTS {
        let Some(value) = capabilities.get(list).filter(|v| !v.is_null()) else {
            continue;
        };
        let all_strings = value
            .as_sequence()
            .is_some_and(|items| items.iter().all(|item| item.as_str().is_some()));
        if !all_strings {
            diagnostics.push(
                Diagnostic::error(
                    DiagnosticCode::InvalidType,
                    SECTION,
                    format!("'capabilities.{list}' must be a sequence of strings"),
                )
                .with_field(format!("capabilities.{list}")),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::{DocumentParser, YamlLikeParser};

    fn run(yaml: &str) -> Diagnostics {
        let document = YamlLikeParser.parse_document(yaml).unwrap();
        let mut diagnostics = Diagnostics::new();
        SecurityValidator.validate(document.get("security").unwrap(), &mut diagnostics);
        diagnostics
    }

    #[test]
    fn well_formed_security() {
        let diagnostics = run(
            "security:\n  checksum:\n    algorithm: blake3\n    value: abc\n  capabilities:\n    allowed_operations: [\"read\", \"write\"]\n    require_confirmation:\n      - delete\n",
        );
        assert!(diagnostics.is_empty(), "{diagnostics}");
    }

    #[test]
    fn missing_checksum() {
        let diagnostics = run("security:\n  level: high\n");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics.iter().next().and_then(|d| d.field.as_deref()), Some("checksum"));
    }

    #[test]
    fn incomplete_checksum() {
        let diagnostics = run("security:\n  checksum:\n    note: none\n");
        assert_eq!(diagnostics.count(DiagnosticCode::MissingField), 2);
    }

    #[test]
    fn unsupported_algorithm() {
        let diagnostics = run("security:\n  checksum:\n    algorithm: md5\n    value: abc\n");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics.count(DiagnosticCode::InvalidAlgorithm), 1);
    }

    #[test]
    fn checksum_must_be_mapping() {
        let diagnostics = run("security:\n  checksum: abc\n");
        assert_eq!(diagnostics.count(DiagnosticCode::InvalidType), 1);
    }

    #[test]
    fn capability_lists_hold_strings() {
        let diagnostics = run(
            "security:\n  checksum:\n    algorithm: sha256\n    value: abc\n  capabilities:\n    allowed_operations: read\n    restricted_operations: [1, 2]\n",
        );
        assert_eq!(diagnostics.count(DiagnosticCode::InvalidType), 2);
    }
}
