//! Structured validation diagnostics
//!
//! Every violated rule becomes one [`Diagnostic`] with a stable
//! [`DiagnosticCode`], so callers can filter, count and render problems
//! programmatically instead of matching on message text.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Stable identifier of a validation rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticCode {
    /// Required top-level section absent
    MissingSection,
    /// Required field absent or empty
    MissingField,
    /// Value has the wrong shape (e.g. mapping expected)
    InvalidType,
    /// `meta.id` is not a UUID v4
    InvalidUuid,
    /// `meta.created` is not a valid timestamp
    InvalidTimestamp,
    /// `meta.version` is not a version string
    InvalidVersion,
    /// Numeric value outside its allowed interval
    InvalidRange,
    /// Unsupported checksum algorithm
    InvalidAlgorithm,
    /// Name repeated within a list section
    DuplicateName,
    /// Not an absolute URL
    InvalidUrl,
    /// Declared checksum does not match the document content
    ChecksumMismatch,
}

impl DiagnosticCode {
    /// Code as written in reports (`MISSING_FIELD`)
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingSection => "MISSING_SECTION",
            Self::MissingField => "MISSING_FIELD",
            Self::InvalidType => "INVALID_TYPE",
            Self::InvalidUuid => "INVALID_UUID",
            Self::InvalidTimestamp => "INVALID_TIMESTAMP",
            Self::InvalidVersion => "INVALID_VERSION",
            Self::InvalidRange => "INVALID_RANGE",
            Self::InvalidAlgorithm => "INVALID_ALGORITHM",
            Self::DuplicateName => "DUPLICATE_NAME",
            Self::InvalidUrl => "INVALID_URL",
            Self::ChecksumMismatch => "CHECKSUM_MISMATCH",
        }
    }
}

impl Display for DiagnosticCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a diagnostic blocks a successful parse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Reported, but the document is still accepted
    Warning,
    /// The document is rejected
    Error,
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Warning => "warning",
            Self::Error => "error",
        })
    }
}

/// One violated rule, addressed by section, field and list index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Rule identifier
    pub code: DiagnosticCode,
    /// Blocking or not
    pub severity: Severity,
    /// Top-level section the rule belongs to
    pub section: String,
    /// Field within the section (dotted for nested fields)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Zero-based position for list sections
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    /// Human-readable description
    pub message: String,
}

impl Diagnostic {
    /// Create an error-severity diagnostic for a section
    #[inline]
    #[must_use]
    pub fn error(code: DiagnosticCode, section: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            severity: Severity::Error,
            section: section.into(),
            field: None,
            index: None,
            message: message.into(),
        }
    }

    /// Create a warning-severity diagnostic for a section
    #[inline]
    #[must_use]
    pub fn warning(code: DiagnosticCode, section: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(code, section, message)
        }
    }

    /// Attach the field name
    #[inline]
    #[must_use]
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Attach the list index
    #[inline]
    #[must_use]
    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    /// Override the severity
    #[inline]
    #[must_use]
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Check for error severity
    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Location rendered as `section[index].field`
    #[must_use]
    pub fn location(&self) -> String {
        let mut out = self.section.clone();
        if let Some(index) = self.index {
            out.push_str(&format!("[{index}]"));
        }
        if let Some(field) = &self.field {
            out.push('.');
            out.push_str(field);
        }
        out
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}] {}: {}",
            self.severity,
            self.code,
            self.location(),
            self.message
        )
    }
}

/// Ordered diagnostics produced by one parse call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Create empty collection
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a diagnostic
    #[inline]
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    /// Append every diagnostic of another collection
    #[inline]
    pub fn extend(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
    }

    /// Number of diagnostics
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check whether nothing was reported
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate in report order
    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.items.iter()
    }

    /// Check for any error-severity diagnostic
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.items.iter().any(Diagnostic::is_error)
    }

    /// Error-severity diagnostics
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(|d| d.is_error())
    }

    /// Warning-severity diagnostics
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(|d| !d.is_error())
    }

    /// Diagnostics with a given code
    pub fn with_code(&self, code: DiagnosticCode) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(move |d| d.code == code)
    }

    /// Count of diagnostics with a given code
    #[must_use]
    pub fn count(&self, code: DiagnosticCode) -> usize {
        self.with_code(code).count()
    }

    /// Promote every warning to an error
    pub fn promote_warnings(&mut self) {
        for diagnostic in &mut self.items {
            diagnostic.severity = Severity::Error;
        }
    }

    /// Borrow as slice
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[Diagnostic] {
        &self.items
    }

    /// Consume into the underlying vector
    #[inline]
    #[must_use]
    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl FromIterator<Diagnostic> for Diagnostics {
    fn from_iter<I: IntoIterator<Item = Diagnostic>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl Display for Diagnostics {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, diagnostic) in self.items.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{diagnostic}")?;
        }
        Ok(())
    }
}
