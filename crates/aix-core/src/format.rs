//! Document syntax detection
//!
//! Decides which of the three supported syntaxes a document is written in,
//! first from the filename extension and then by sniffing the content.
//! Detection is total: anything unrecognised goes to the YAML-like parser.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::path::Path;
use std::str::FromStr;

static BARE_ASSIGNMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\w+\s*=").expect("static pattern"));

/// Supported document syntaxes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    /// Strict JSON
    Json,
    /// Indentation-significant `key: value` syntax
    #[serde(alias = "yaml")]
    YamlLike,
    /// `[section]` headers with `key = value` lines
    #[serde(alias = "toml")]
    SectionBased,
}

impl Format {
    /// All formats, in detection-priority order of their extensions
    pub const ALL: [Format; 3] = [Format::Json, Format::YamlLike, Format::SectionBased];

    /// Short name, also accepted by [`FromStr`]
    #[inline]
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::YamlLike => "yaml",
            Self::SectionBased => "toml",
        }
    }

    /// File extensions that select this format (without dot)
    #[inline]
    #[must_use]
    pub const fn extensions(self) -> &'static [&'static str] {
        match self {
            Self::Json => &["json"],
            Self::YamlLike => &["yaml", "yml"],
            Self::SectionBased => &["toml"],
        }
    }

    /// Format selected by a file extension, if the extension is format-specific
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|format| format.extensions().contains(&ext.as_str()))
    }
}

impl Display for Format {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error for unrecognised format names
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown document format: '{0}' (expected json, yaml or toml)")]
pub struct UnknownFormat(pub String);

impl FromStr for Format {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" | "yaml_like" => Ok(Self::YamlLike),
            "toml" | "section_based" => Ok(Self::SectionBased),
            other => Err(UnknownFormat(other.to_string())),
        }
    }
}

/// Detect the syntax of `content`
///
/// A format-specific extension on `filename_hint` wins. Otherwise (generic
/// `.aix`, unknown extension, or no hint) the trimmed content decides:
/// `{` → JSON, `[` or a leading `ident =` → section-based, anything else →
/// YAML-like.
#[must_use]
pub fn detect_format(content: &str, filename_hint: Option<&str>) -> Format {
    if let Some(format) = filename_hint
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .and_then(Format::from_extension)
    {
        tracing::debug!(%format, "format selected by filename extension");
        return format;
    }

    let trimmed = content.trim();
    let format = if trimmed.starts_with('{') {
        Format::Json
    } else if trimmed.starts_with('[') || BARE_ASSIGNMENT.is_match(trimmed) {
        Format::SectionBased
    } else {
        Format::YamlLike
    };
    tracing::debug!(%format, "format selected by content");
    format
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_wins_over_content() {
        assert_eq!(detect_format("a = 1", Some("agent.json")), Format::Json);
        assert_eq!(detect_format("{}", Some("agent.yaml")), Format::YamlLike);
        assert_eq!(detect_format("{}", Some("agent.YML")), Format::YamlLike);
        assert_eq!(detect_format("a: 1", Some("dir/agent.toml")), Format::SectionBased);
    }

    #[test]
    fn generic_extension_sniffs_content() {
        assert_eq!(detect_format(r#"{ "a": 1 }"#, Some("x.aix")), Format::Json);
        assert_eq!(detect_format("a = 1", Some("x.aix")), Format::SectionBased);
        assert_eq!(detect_format("a: 1", Some("x.aix")), Format::YamlLike);
        assert_eq!(detect_format("[meta]\nname = 'x'", Some("x.aix")), Format::SectionBased);
    }

    #[test]
    fn no_hint_sniffs_content() {
        assert_eq!(detect_format("\n\n  {\"a\": 1}", None), Format::Json);
        assert_eq!(detect_format("key_1   = true", None), Format::SectionBased);
        assert_eq!(detect_format("", None), Format::YamlLike);
        assert_eq!(detect_format("# comment\nmeta:", None), Format::YamlLike);
    }

    #[test]
    fn format_names_roundtrip() {
        for format in Format::ALL {
            assert_eq!(format.name().parse::<Format>().unwrap(), format);
        }
        assert!("xml".parse::<Format>().is_err());
    }
}
