//! Engine configuration

use crate::error::ConfigError;
use crate::integrity::ChecksumPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Pipeline settings
///
/// Loadable from TOML; every key is optional:
///
/// ```toml
/// checksum_policy = "warning"   # warning | error | ignore
/// verify_integrity = true
/// strict = false
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// How a checksum mismatch is reported
    pub checksum_policy: ChecksumPolicy,
    /// Run the integrity stage at all
    pub verify_integrity: bool,
    /// Treat every warning as a blocking error
    pub strict: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            checksum_policy: ChecksumPolicy::Warning,
            verify_integrity: true,
            strict: false,
        }
    }
}

impl EngineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    /// Returns [`ConfigError::Toml`] for malformed TOML or unknown keys.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a TOML file
    ///
    /// # Errors
    /// Returns [`ConfigError::Io`] when the file cannot be read, or
    /// [`ConfigError::Toml`] when its content is invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// With checksum mismatch policy
    #[inline]
    #[must_use]
    pub fn with_checksum_policy(mut self, policy: ChecksumPolicy) -> Self {
        self.checksum_policy = policy;
        self
    }

    /// With strict mode
    #[inline]
    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// With or without the integrity stage
    #[inline]
    #[must_use]
    pub fn with_integrity(mut self, verify: bool) -> Self {
        self.verify_integrity = verify;
        self
    }
}
