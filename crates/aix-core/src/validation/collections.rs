//! List sections: `skills`, `apis` and `mcp.servers`
//!
//! Entry diagnostics carry the zero-based index of the offending entry.

use super::{expect_mapping, expect_sequence, require_fields, SectionValidator};
use crate::diagnostic::{Diagnostic, DiagnosticCode, Diagnostics};
use crate::value::{Mapping, Value};
use std::collections::HashSet;
use url::Url;

/// Entry as a record, or one `INVALID_TYPE` diagnostic
fn as_record<'v>(
    section: &str,
    index: usize,
    item: &'v Value,
    diagnostics: &mut Diagnostics,
) -> Option<&'v Mapping> {
    let record = item.as_mapping();
    if record.is_none() {
        diagnostics.push(
            Diagnostic::error(
                DiagnosticCode::InvalidType,
                section,
                format!("entry must be a mapping, found {}", item.type_name()),
            )
            .with_index(index),
        );
    }
    record
}

/// Validator for the `skills` list
#[derive(Debug, Clone, Copy, Default)]
pub struct SkillsValidator;

impl SectionValidator for SkillsValidator {
    fn section(&self) -> &'static str {
        "skills"
    }

    fn validate(&self, value: &Value, diagnostics: &mut Diagnostics) {
        let section = self.section();
        let Some(items) = expect_sequence(section, value, diagnostics) else {
            return;
        };

        let mut seen = HashSet::new();
        for (index, item) in items.iter().enumerate() {
            let Some(skill) = as_record(section, index, item, diagnostics) else {
                continue;
            };
            require_fields(section, Some(index), skill, &["name", "description"], diagnostics);
            let Some(name) = skill.get("name").and_then(Value::as_text) else {
                continue;
            };
            if name.trim().is_empty() {
                continue;
            }
            if !seen.insert(name.clone()) {
                diagnostics.push(
                    Diagnostic::error(
                        DiagnosticCode::DuplicateName,
                        section,
                        format!("skill name '{name}' is already used by an earlier entry"),
                    )
                    .with_index(index)
                    .with_field("name"),
                );
            }
        }
    }
}

/// Validator for the `apis` list
#[derive(Debug, Clone, Copy, Default)]
pub struct ApisValidator;

/// Check `base_url` is an absolute URL with a host
#[must_use]
pub fn is_absolute_url(raw: &str) -> bool {
    Url::parse(raw).is_ok_and(|url| url.has_host())
}

impl SectionValidator for ApisValidator {
    fn section(&self) -> &'static str {
        "apis"
    }

    fn validate(&self, value: &Value, diagnostics: &mut Diagnostics) {
        let section = self.section();
        let Some(items) = expect_sequence(section, value, diagnostics) else {
            return;
        };

        for (index, item) in items.iter().enumerate() {
            let Some(api) = as_record(section, index, item, diagnostics) else {
                continue;
            };
            require_fields(section, Some(index), api, &["name", "base_url"], diagnostics);
            let Some(base_url) = api.get("base_url").filter(|v| !v.is_blank()) else {
                continue;
            };
            let valid = base_url.as_str().is_some_and(is_absolute_url);
            if !valid {
                let shown = base_url.as_text().unwrap_or_default();
                diagnostics.push(
                    Diagnostic::error(
                        DiagnosticCode::InvalidUrl,
                        section,
                        format!("'base_url' must be an absolute URL, found '{shown}'"),
                    )
                    .with_index(index)
                    .with_field("base_url"),
                );
            }
        }
    }
}

/// Validator for the `mcp` record and its `servers` list
#[derive(Debug, Clone, Copy, Default)]
pub struct McpValidator;

impl SectionValidator for McpValidator {
    fn section(&self) -> &'static str {
        "mcp"
    }

    fn validate(&self, value: &Value, diagnostics: &mut Diagnostics) {
        let section = self.section();
        let Some(mcp) = expect_mapping(section, value, diagnostics) else {
            return;
        };
        let Some(servers) = mcp.get("servers").filter(|v| !v.is_null()) else {
            diagnostics.push(
                Diagnostic::error(
                    DiagnosticCode::MissingField,
                    section,
                    "required field 'servers' is missing",
                )
                .with_field("servers"),
            );
            return;
        };
        let Some(items) = servers.as_sequence() else {
            diagnostics.push(
                Diagnostic::error(
                    DiagnosticCode::InvalidType,
                    section,
                    format!("'servers' must be a sequence, found {}", servers.type_name()),
                )
                .with_field("servers"),
            );
            return;
        };

        for (index, item) in items.iter().enumerate() {
            if let Some(server) = as_record(section, index, item, diagnostics) {
                require_fields(section, Some(index), server, &["name", "command"], diagnostics);
            }
        }
    }
}
