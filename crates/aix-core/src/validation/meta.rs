//! `meta` section: identity fields and their formats

use super::{expect_mapping, require_fields, SectionValidator};
use crate::diagnostic::{Diagnostic, DiagnosticCode, Diagnostics};
use crate::value::{Mapping, Value};
use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;

const SECTION: &str = "meta";
const REQUIRED: [&str; 5] = ["version", "id", "name", "created", "author"];

static UUID_V4: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-4[0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}$")
        .expect("static pattern")
});

static TIMESTAMP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d{3})?Z?$").expect("static pattern")
});

static VERSION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d+\.\d+(\.\d+)?(-[0-9A-Za-z.-]+)?(\+[0-9A-Za-z.-]+)?$").expect("static pattern")
});

/// Check `id` is a UUID v4 (any hex case)
#[must_use]
pub fn is_uuid_v4(id: &str) -> bool {
    UUID_V4.is_match(id)
}

/// Check `created` has the timestamp shape and names a real date and time
#[must_use]
pub fn is_timestamp(created: &str) -> bool {
    if !TIMESTAMP.is_match(created) {
        return false;
    }
    let naive = created.trim_end_matches('Z');
    NaiveDateTime::parse_from_str(naive, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
}

/// Check `version` is `major.minor[.patch][-pre][+build]`
#[must_use]
pub fn is_version(version: &str) -> bool {
    VERSION.is_match(version)
}

/// Validator for the `meta` section
#[derive(Debug, Clone, Copy, Default)]
pub struct MetaValidator;

impl SectionValidator for MetaValidator {
    fn section(&self) -> &'static str {
        SECTION
    }

    fn validate(&self, value: &Value, diagnostics: &mut Diagnostics) {
        let Some(meta) = expect_mapping(SECTION, value, diagnostics) else {
            return;
        };
        require_fields(SECTION, None, meta, &REQUIRED, diagnostics);

        check_format(meta, "id", DiagnosticCode::InvalidUuid, is_uuid_v4, "a UUID v4", diagnostics);
        check_format(
            meta,
            "created",
            DiagnosticCode::InvalidTimestamp,
            is_timestamp,
            "a timestamp (YYYY-MM-DDThh:mm:ss[.mmm]Z)",
            diagnostics,
        );
        check_format(
            meta,
            "version",
            DiagnosticCode::InvalidVersion,
            is_version,
            "a version (major.minor[.patch])",
            diagnostics,
        );
    }
}

/// Present, non-blank field must satisfy `accept`; blank fields are left to
/// the required-field check
fn check_format(
    meta: &Mapping,
    field: &str,
    code: DiagnosticCode,
    accept: fn(&str) -> bool,
    expected: &str,
    diagnostics: &mut Diagnostics,
) {
    let Some(value) = meta.get(field).filter(|v| !v.is_blank()) else {
        return;
    };
    let valid = value.as_text().is_some_and(|text| accept(&text));
    if !valid {
        let shown = value.as_text().map_or_else(|| value.type_name().to_string(), |t| t.into_owned());
        diagnostics.push(
            Diagnostic::error(code, SECTION, format!("'{field}' must be {expected}, found '{shown}'"))
                .with_field(field),
        );
    }
}
