//! Error types for the document engine
//!
//! Provides error handling for:
//! - Parse operations (text → document tree), fatal on the first problem
//! - Validation (document tree → diagnostics), carrying every diagnostic
//! - Engine configuration loading

use crate::diagnostic::Diagnostics;
use crate::format::Format;
use std::path::PathBuf;

/// Errors while turning text into a document tree
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Malformed line for the detected syntax
    #[error("{format} syntax error at line {line}: {message}")]
    Syntax {
        /// Syntax being parsed
        format: Format,
        /// 1-based line number
        line: usize,
        /// What was wrong
        message: String,
    },

    /// Strict JSON decoding failed
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Document parsed, but its root is not a record
    #[error("{format} document root must be a mapping")]
    RootNotMapping {
        /// Syntax being parsed
        format: Format,
    },

    /// No parser registered for the detected syntax
    #[error("no parser registered for {format} documents")]
    NoParser {
        /// Detected syntax
        format: Format,
    },

    /// IO error during file read
    #[error("io error reading {path}: {source}")]
    Io {
        /// File being read
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

impl ParseError {
    /// Create syntax error for a line
    pub fn syntax(format: Format, line: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            format,
            line,
            message: message.into(),
        }
    }

    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Document parsed but rejected by validation
#[derive(Debug, Clone, thiserror::Error)]
#[error("validation failed with {} error(s):\n{diagnostics}", .diagnostics.errors().count())]
pub struct ValidationFailure {
    /// Every diagnostic produced, warnings included
    pub diagnostics: Diagnostics,
}

impl ValidationFailure {
    /// Wrap a diagnostic set
    #[inline]
    #[must_use]
    pub fn new(diagnostics: Diagnostics) -> Self {
        Self { diagnostics }
    }
}

/// Errors while loading engine configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Configuration text is not valid TOML for [`crate::EngineConfig`]
    #[error("invalid configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// IO error during config read
    #[error("io error reading config {path}: {source}")]
    Io {
        /// File being read
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

/// Combined engine error
#[derive(Debug, thiserror::Error)]
pub enum AixError {
    /// Fatal syntax or read failure
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Accumulated rule violations
    #[error(transparent)]
    Validation(#[from] ValidationFailure),

    /// Engine configuration problem
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

impl AixError {
    /// Diagnostics carried by a validation failure
    #[must_use]
    pub fn diagnostics(&self) -> Option<&Diagnostics> {
        match self {
            Self::Validation(failure) => Some(&failure.diagnostics),
            _ => None,
        }
    }
}

/// Result type alias for engine operations
pub type AixResult<T> = Result<T, AixError>;
