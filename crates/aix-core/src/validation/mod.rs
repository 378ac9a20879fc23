//! Validation pipeline for parsed agent documents
//!
//! Structural checks run first (are the required sections present), then
//! every registered [`SectionValidator`] runs on its section when the
//! document contains it. Validators only read the tree; every problem found
//! becomes a [`Diagnostic`] and nothing is fatal at this stage.

use crate::diagnostic::{Diagnostic, DiagnosticCode, Diagnostics};
use crate::value::{Document, Mapping, Value};
use tracing::debug;

mod collections;
mod memory;
mod meta;
mod persona;
mod security;

pub use collections::{is_absolute_url, ApisValidator, McpValidator, SkillsValidator};
pub use memory::MemoryValidator;
pub use meta::{is_timestamp, is_uuid_v4, is_version, MetaValidator};
pub use persona::{PersonaValidator, TEMPERATURE_RANGE};
pub use security::{SecurityValidator, CAPABILITY_LISTS};

/// Top-level sections every document must contain
pub const REQUIRED_SECTIONS: [&str; 3] = ["meta", "persona", "security"];

/// Rule set for one top-level section
///
/// Implement this trait to add checks for a new section. The engine calls
/// [`validate`](SectionValidator::validate) only when the section is present.
pub trait SectionValidator: Send + Sync + 'static {
    /// Top-level key this validator checks
    fn section(&self) -> &'static str;

    /// Check the section's value, appending diagnostics
    fn validate(&self, value: &Value, diagnostics: &mut Diagnostics);
}

/// Ordered set of section validators
pub struct ValidationEngine {
    validators: Vec<Box<dyn SectionValidator>>,
}

impl Default for ValidationEngine {
    fn default() -> Self {
        let mut engine = Self::new();
        engine.register(MetaValidator);
        engine.register(PersonaValidator);
        engine.register(SecurityValidator);
        engine.register(SkillsValidator);
        engine.register(ApisValidator);
        engine.register(McpValidator);
        engine.register(MemoryValidator);
        engine
    }
}

impl std::fmt::Debug for ValidationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationEngine")
            .field("sections", &self.sections())
            .finish()
    }
}

impl ValidationEngine {
    /// Create engine with no section validators
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            validators: Vec::new(),
        }
    }

    /// Register a validator, replacing any validator for the same section
    pub fn register<V: SectionValidator>(&mut self, validator: V) {
        self.validators.retain(|v| v.section() != validator.section());
        self.validators.push(Box::new(validator));
    }

    /// Sections with a registered validator, in run order
    #[must_use]
    pub fn sections(&self) -> Vec<&'static str> {
        self.validators.iter().map(|v| v.section()).collect()
    }

    /// Run structural and per-section checks on a document
    #[must_use]
    pub fn validate(&self, document: &Document) -> Diagnostics {
        let mut diagnostics = check_required_sections(document);

        for validator in &self.validators {
            let Some(value) = document.get(validator.section()) else {
                continue;
            };
            let before = diagnostics.len();
            validator.validate(value, &mut diagnostics);
            debug!(
                section = validator.section(),
                diagnostics = diagnostics.len() - before,
                "Section validated"
            );
        }

        diagnostics
    }
}

/// One `MISSING_SECTION` per absent required section
#[must_use]
pub fn check_required_sections(document: &Document) -> Diagnostics {
    REQUIRED_SECTIONS
        .iter()
        .filter(|section| !document.contains(section))
        .map(|section| {
            Diagnostic::error(
                DiagnosticCode::MissingSection,
                *section,
                format!("required section '{section}' is missing"),
            )
        })
        .collect()
}

/// Section as a mapping, or one `INVALID_TYPE` diagnostic
pub(crate) fn expect_mapping<'a>(
    section: &str,
    value: &'a Value,
    diagnostics: &mut Diagnostics,
) -> Option<&'a Mapping> {
    let map = value.as_mapping();
    if map.is_none() {
        diagnostics.push(Diagnostic::error(
            DiagnosticCode::InvalidType,
            section,
            format!("section '{section}' must be a mapping, found {}", value.type_name()),
        ));
    }
    map
}

/// Section as a sequence, or one `INVALID_TYPE` diagnostic
pub(crate) fn expect_sequence<'a>(
    section: &str,
    value: &'a Value,
    diagnostics: &mut Diagnostics,
) -> Option<&'a [Value]> {
    let items = value.as_sequence();
    if items.is_none() {
        diagnostics.push(Diagnostic::error(
            DiagnosticCode::InvalidType,
            section,
            format!("section '{section}' must be a sequence, found {}", value.type_name()),
        ));
    }
    items
}

/// `MISSING_FIELD` for every listed field that is absent or blank
pub(crate) fn require_fields(
    section: &str,
    index: Option<usize>,
    record: &Mapping,
    fields: &[&str],
    diagnostics: &mut Diagnostics,
) {
    for field in fields {
        if record.get(*field).map_or(true, Value::is_blank) {
            let mut diagnostic = Diagnostic::error(
                DiagnosticCode::MissingField,
                section,
                format!("required field '{field}' is missing or empty"),
            )
            .with_field(*field);
            if let Some(index) = index {
                diagnostic = diagnostic.with_index(index);
            }
            diagnostics.push(diagnostic);
        }
    }
}

/// Check an optional numeric field lies within `[min, max]`
///
/// Absent values pass. A non-numeric value yields `INVALID_TYPE`, an
/// out-of-range one `INVALID_RANGE`.
pub(crate) fn check_range(
    section: &str,
    field: &str,
    value: Option<&Value>,
    (min, max): (f64, f64),
    diagnostics: &mut Diagnostics,
) {
    let Some(value) = value.filter(|v| !v.is_null()) else {
        return;
    };
    match value.as_f64() {
        Some(number) if (min..=max).contains(&number) => {}
        Some(number) => diagnostics.push(
            Diagnostic::error(
                DiagnosticCode::InvalidRange,
                section,
                format!("'{field}' must be between {min:.1} and {max:.1}, found {number}"),
            )
            .with_field(field),
        ),
        None => diagnostics.push(
            Diagnostic::error(
                DiagnosticCode::InvalidType,
                section,
                format!("'{field}' must be a number, found {}", value.type_name()),
            )
            .with_field(field),
        ),
    }
}
