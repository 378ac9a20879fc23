//! Content integrity for agent documents
//!
//! A document declares its own checksum under `security.checksum`. The digest
//! is taken over the *canonical* text: the raw source with the `security`
//! section cut out, line endings normalised and outer whitespace trimmed.
//! The section boundary is found by scanning lines, never by re-serialising
//! the tree, so the digest covers exactly what the author wrote.

use crate::diagnostic::{Diagnostic, DiagnosticCode, Severity};
use crate::parsers::indent_of;
use crate::value::{Document, Value};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha512};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use tracing::{debug, warn};

/// Supported digest algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumAlgorithm {
    /// SHA-256 (64 hex chars)
    #[default]
    Sha256,
    /// SHA-512 (128 hex chars)
    Sha512,
    /// BLAKE3 (64 hex chars)
    Blake3,
}

impl ChecksumAlgorithm {
    /// All supported algorithms
    pub const ALL: [ChecksumAlgorithm; 3] = [Self::Sha256, Self::Sha512, Self::Blake3];

    /// Name as written in documents
    #[inline]
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
            Self::Blake3 => "blake3",
        }
    }

    /// Lowercase hex digest of raw bytes
    #[must_use]
    pub fn hex_digest(self, data: &[u8]) -> String {
        match self {
            Self::Sha256 => hex::encode(Sha256::digest(data)),
            Self::Sha512 => hex::encode(Sha512::digest(data)),
            Self::Blake3 => hex::encode(blake3::hash(data).as_bytes()),
        }
    }
}

impl Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Algorithm name outside the supported set
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported checksum algorithm `{0}` (expected sha256, sha512 or blake3)")]
pub struct UnknownAlgorithm(pub String);

impl FromStr for ChecksumAlgorithm {
    type Err = UnknownAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|algorithm| algorithm.name() == s)
            .ok_or_else(|| UnknownAlgorithm(s.to_string()))
    }
}

/// Declared checksum, read from `security.checksum`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecksumRecord {
    /// Digest algorithm
    pub algorithm: ChecksumAlgorithm,
    /// Declared hex digest
    pub value: String,
}

impl ChecksumRecord {
    /// Read a well-formed record from a `checksum` value
    ///
    /// Returns `None` when the algorithm is missing or unsupported, or the
    /// value is missing; those cases are reported by validation instead.
    #[must_use]
    pub fn from_value(checksum: &Value) -> Option<Self> {
        let algorithm = checksum.get("algorithm")?.as_str()?.parse().ok()?;
        let value = checksum.get("value")?.as_text()?;
        if value.trim().is_empty() {
            return None;
        }
        Some(Self {
            algorithm,
            value: value.into_owned(),
        })
    }

    /// Read the record declared by a document
    #[must_use]
    pub fn from_document(document: &Document) -> Option<Self> {
        document
            .get_path("security.checksum")
            .and_then(Self::from_value)
    }
}

/// How a checksum mismatch is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumPolicy {
    /// Non-blocking diagnostic attached to the agent
    #[default]
    Warning,
    /// Blocking diagnostic, the parse fails
    Error,
    /// Checksums are not compared
    Ignore,
}

impl ChecksumPolicy {
    /// Severity of a mismatch under this policy, `None` when ignored
    #[inline]
    #[must_use]
    pub const fn severity(self) -> Option<Severity> {
        match self {
            Self::Warning => Some(Severity::Warning),
            Self::Error => Some(Severity::Error),
            Self::Ignore => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeaderKind {
    /// `security:`, `security =`, `"security":`: ends at a shallower line
    Indented,
    /// `[security]`: ends at the next non-security table header
    Bracketed,
}

const MULTI_LINE_DELIMITERS: [&str; 2] = ["\"\"\"", "'''"];

fn security_header(trimmed: &str) -> Option<HeaderKind> {
    if let Some(name) = table_header(trimmed) {
        return is_security_table(name).then_some(HeaderKind::Bracketed);
    }
    let rest = ["security", "\"security\"", "'security'"]
        .into_iter()
        .find_map(|key| trimmed.strip_prefix(key))?
        .trim_start();
    (rest.starts_with(':') || rest.starts_with('=')).then_some(HeaderKind::Indented)
}

/// Name inside a `[name]` or `[[name]]` table header
fn table_header(trimmed: &str) -> Option<&str> {
    let inner = trimmed.strip_prefix('[')?.strip_suffix(']')?;
    let name = inner
        .strip_prefix('[')
        .and_then(|inner| inner.strip_suffix(']'))
        .unwrap_or(inner)
        .trim();
    let bare = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    bare.then_some(name)
}

fn is_security_table(name: &str) -> bool {
    name == "security" || name.starts_with("security.")
}

/// Column of the shallowest key or table header; `None` when no line starts
/// with one (single-line JSON, empty text)
fn top_level_column(content: &str) -> Option<usize> {
    content
        .lines()
        .filter(|line| {
            let trimmed = line.trim();
            table_header(trimmed).is_some()
                || trimmed.starts_with(|c: char| c.is_alphanumeric() || matches!(c, '_' | '"' | '\''))
        })
        .map(indent_of)
        .min()
}

/// Delimiter of a `key = """` string still open after this line
fn open_multi_line(trimmed: &str, open: Option<&'static str>) -> Option<&'static str> {
    if let Some(delimiter) = open {
        return (!trimmed.ends_with(delimiter)).then_some(delimiter);
    }
    let (key, value) = trimmed.split_once('=')?;
    if key.contains(':') {
        return None;
    }
    let value = value.trim_start();
    MULTI_LINE_DELIMITERS
        .into_iter()
        .find(|delimiter| value.starts_with(delimiter) && !value[delimiter.len()..].ends_with(delimiter))
}

#[derive(Debug, Clone, Copy)]
enum Scan {
    Before { in_table: bool },
    Excluding { kind: HeaderKind, column: usize },
    After,
}

impl Scan {
    fn next(self, line: &str, top: Option<usize>) -> Self {
        let trimmed = line.trim();
        let column = indent_of(line);
        match self {
            Self::Before { in_table } => {
                let top_level = top == Some(column);
                match security_header(trimmed) {
                    Some(kind @ HeaderKind::Bracketed) if top_level => Self::Excluding { kind, column },
                    Some(kind @ HeaderKind::Indented) if top_level && !in_table => {
                        Self::Excluding { kind, column }
                    }
                    _ => Self::Before {
                        in_table: in_table || (top_level && table_header(trimmed).is_some()),
                    },
                }
            }
            Self::Excluding { kind, column: start } => {
                let ends = match kind {
                    HeaderKind::Indented => !trimmed.is_empty() && column <= start,
                    HeaderKind::Bracketed => table_header(trimmed).is_some_and(|name| !is_security_table(name)),
                };
                if ends {
                    Self::After
                } else {
                    self
                }
            }
            Self::After => Self::After,
        }
    }
}

/// Canonical text of a document: the `security` section removed, lines
/// joined with `\n`, surrounding whitespace trimmed
///
/// Only a top-level header opens the section: a bare or quoted `security`
/// key at the column of the document's shallowest keys and before any table
/// header, or a `[security]` table. Lines inside `key = """` strings are
/// never headers.
#[must_use]
pub fn canonicalize(content: &str) -> String {
    let top = top_level_column(content);
    let mut retained = Vec::new();
    let mut scan = Scan::Before { in_table: false };
    let mut multi_line = None;

    for line in content.lines() {
        let in_string = multi_line.is_some();
        multi_line = open_multi_line(line.trim(), multi_line);
        if !in_string {
            scan = scan.next(line, top);
        }
        if !matches!(scan, Scan::Excluding { .. }) {
            retained.push(line);
        }
    }

    retained.join("\n").trim().to_string()
}

/// Lowercase hex digest of the canonical form of `content`
#[must_use]
pub fn compute_digest(content: &str, algorithm: ChecksumAlgorithm) -> String {
    let canonical = canonicalize(content);
    let digest = algorithm.hex_digest(canonical.as_bytes());
    debug!(
        algorithm = %algorithm,
        canonical_bytes = canonical.len(),
        digest = %digest,
        "Computed document digest"
    );
    digest
}

/// Compare the declared checksum with the content
///
/// Nothing is reported when the policy is [`ChecksumPolicy::Ignore`] or the
/// document has no well-formed checksum record (validation covers that).
/// The comparison is case-sensitive.
#[must_use]
pub fn verify_checksum(content: &str, document: &Document, policy: ChecksumPolicy) -> Option<Diagnostic> {
    let severity = policy.severity()?;
    let record = ChecksumRecord::from_document(document)?;
    let computed = compute_digest(content, record.algorithm);
    if computed == record.value {
        return None;
    }

    warn!(
        algorithm = %record.algorithm,
        declared = %record.value,
        computed = %computed,
        "Checksum mismatch"
    );
    Some(
        Diagnostic::error(
            DiagnosticCode::ChecksumMismatch,
            "security",
            format!(
                "declared {} checksum does not match content (computed {computed})",
                record.algorithm
            ),
        )
        .with_field("checksum.value")
        .with_severity(severity),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Format;
    use crate::value::Mapping;
    use pretty_assertions::assert_eq;

    const YAML: &str = "meta:\n  name: demo\nsecurity:\n  checksum:\n    algorithm: sha256\n    value: abc\n\npersona:\n  role: helper\n";

    fn document_with_checksum(algorithm: &str, value: &str) -> Document {
        let mut checksum = Mapping::new();
        checksum.insert("algorithm".into(), Value::from(algorithm));
        checksum.insert("value".into(), Value::from(value));
        let mut security = Mapping::new();
        security.insert("checksum".into(), Value::from(checksum));
        let mut root = Mapping::new();
        root.insert("security".into(), Value::from(security));
        Document::new(root, Format::YamlLike)
    }

    #[test]
    fn algorithm_names_round_trip() {
        for algorithm in ChecksumAlgorithm::ALL {
            assert_eq!(algorithm.name().parse::<ChecksumAlgorithm>(), Ok(algorithm));
        }
        assert!("md5".parse::<ChecksumAlgorithm>().is_err());
        assert!("SHA256".parse::<ChecksumAlgorithm>().is_err());
    }

    #[test]
    fn known_digests() {
        assert_eq!(
            compute_digest("", ChecksumAlgorithm::Sha256),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            compute_digest("  abc\n\n", ChecksumAlgorithm::Sha256),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(compute_digest("abc", ChecksumAlgorithm::Sha512).len(), 128);
        assert_eq!(compute_digest("abc", ChecksumAlgorithm::Blake3).len(), 64);
    }

    #[test]
    fn canonical_form_drops_indented_security_section() {
        assert_eq!(canonicalize(YAML), "meta:\n  name: demo\npersona:\n  role: helper");
    }

    #[test]
    fn security_section_at_end() {
        let content = "meta:\n  name: demo\nsecurity:\n  checksum:\n    value: abc\n";
        assert_eq!(canonicalize(content), "meta:\n  name: demo");
    }

    #[test]
    fn line_endings_do_not_change_digest() {
        let crlf = YAML.replace('\n', "\r\n");
        for algorithm in ChecksumAlgorithm::ALL {
            assert_eq!(compute_digest(YAML, algorithm), compute_digest(&crlf, algorithm));
        }
    }

    #[test]
    fn checksum_value_does_not_affect_digest() {
        let resealed = YAML.replace("value: abc", "value: def");
        assert_eq!(
            compute_digest(YAML, ChecksumAlgorithm::Sha256),
            compute_digest(&resealed, ChecksumAlgorithm::Sha256)
        );
        let edited = YAML.replace("role: helper", "role: other");
        assert_ne!(
            compute_digest(YAML, ChecksumAlgorithm::Sha256),
            compute_digest(&edited, ChecksumAlgorithm::Sha256)
        );
    }

    #[test]
    fn bracketed_security_sections() {
        let content = "[meta]\nname = \"demo\"\n\n[security]\nlevel = 1\n\n[security.checksum]\nalgorithm = \"sha256\"\n\n[persona]\nrole = \"x\"\n";
        assert_eq!(canonicalize(content), "[meta]\nname = \"demo\"\n\n[persona]\nrole = \"x\"");
    }

    #[test]
    fn quoted_security_key() {
        let content = "{\n  \"meta\": {\"name\": \"demo\"},\n  \"security\": {\n    \"checksum\": {}\n  }\n}";
        assert_eq!(canonicalize(content), "{\n  \"meta\": {\"name\": \"demo\"},\n  }\n}");
    }

    #[test]
    fn similar_keys_are_not_headers() {
        let content = "security_level: high\nsecurityx: 1\n";
        assert_eq!(canonicalize(content), "security_level: high\nsecurityx: 1");
    }

    #[test]
    fn nested_security_keys_are_not_headers() {
        let content = "apis:\n  - name: weather\n    security: oauth2\npersona:\n  instructions: |\n    security: never share keys\nsecurity:\n  checksum:\n    value: abc\n";
        assert_eq!(
            canonicalize(content),
            "apis:\n  - name: weather\n    security: oauth2\npersona:\n  instructions: |\n    security: never share keys"
        );
    }

    #[test]
    fn nested_quoted_security_keys_are_not_headers() {
        let content = "{\n  \"tags\": [\n    \"security\",\n    \"audit\"\n  ],\n  \"apis\": [{\n    \"security\": \"oauth2\"\n  }],\n  \"security\": {\n    \"checksum\": {}\n  }\n}";
        assert_eq!(
            canonicalize(content),
            "{\n  \"tags\": [\n    \"security\",\n    \"audit\"\n  ],\n  \"apis\": [{\n    \"security\": \"oauth2\"\n  }],\n  }\n}"
        );
    }

    #[test]
    fn table_keys_named_security_stay() {
        let content = "[[apis]]\nname = \"weather\"\nsecurity = \"oauth2\"\n\n[security]\nchecksum = {}\n\n[persona]\nrole = \"x\"\n";
        assert_eq!(
            canonicalize(content),
            "[[apis]]\nname = \"weather\"\nsecurity = \"oauth2\"\n\n[persona]\nrole = \"x\""
        );
    }

    #[test]
    fn multi_line_strings_hide_headers() {
        let content = "[persona]\ninstructions = \"\"\"\n[security]\n\"\"\"\n\n[security]\nchecksum = {}\n";
        assert_eq!(canonicalize(content), "[persona]\ninstructions = \"\"\"\n[security]\n\"\"\"");
    }

    #[test]
    fn verify_matching_checksum() {
        let digest = compute_digest(YAML, ChecksumAlgorithm::Sha256);
        let document = document_with_checksum("sha256", &digest);
        assert_eq!(verify_checksum(YAML, &document, ChecksumPolicy::Error), None);
    }

    #[test]
    fn mismatch_severity_follows_policy() {
        let document = document_with_checksum("sha256", "abc123");

        let warning = verify_checksum(YAML, &document, ChecksumPolicy::Warning).unwrap();
        assert_eq!(warning.code, DiagnosticCode::ChecksumMismatch);
        assert_eq!(warning.severity, Severity::Warning);
        assert_eq!(warning.field.as_deref(), Some("checksum.value"));

        let error = verify_checksum(YAML, &document, ChecksumPolicy::Error).unwrap();
        assert!(error.is_error());

        assert_eq!(verify_checksum(YAML, &document, ChecksumPolicy::Ignore), None);
    }

    #[test]
    fn comparison_is_case_sensitive() {
        let digest = compute_digest(YAML, ChecksumAlgorithm::Sha256).to_uppercase();
        let document = document_with_checksum("sha256", &digest);
        assert!(verify_checksum(YAML, &document, ChecksumPolicy::Warning).is_some());
    }

    #[test]
    fn malformed_record_is_not_compared() {
        let document = document_with_checksum("md5", "abc");
        assert_eq!(verify_checksum(YAML, &document, ChecksumPolicy::Error), None);
        assert!(ChecksumRecord::from_document(&document).is_none());
    }
}
