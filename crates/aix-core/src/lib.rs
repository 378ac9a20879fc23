//! AIX document engine
//!
//! Parses agent definition documents, validates their structure and checks
//! their self-declared content checksum.
//!
//! # Pipeline
//!
//! ```text
//! text → detect_format → {YAML-like | section-based | JSON} parser → Document
//!      → ValidationEngine → verify_checksum → Agent (or every diagnostic)
//! ```
//!
//! # Example
//!
//! ```rust
//! use aix_core::prelude::*;
//!
//! let content = r#"
//! meta:
//!   version: "1.0"
//!   id: 550e8400-e29b-41d4-a716-446655440000
//!   name: Demo
//!   created: 2025-01-12T10:30:00Z
//!   author: Docs
//! persona:
//!   role: assistant
//!   instructions: Be helpful.
//! security:
//!   checksum:
//!     algorithm: sha256
//!     value: 0000
//! "#;
//!
//! let agent = AixParser::new().parse(content, Some("demo.yaml"))?;
//! assert_eq!(agent.name(), Some("Demo"));
//! // The declared checksum is stale: reported, but not blocking by default.
//! assert_eq!(agent.warnings().count(DiagnosticCode::ChecksumMismatch), 1);
//! # Ok::<(), AixError>(())
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod agent;
pub mod coerce;
pub mod config;
pub mod diagnostic;
pub mod engine;
pub mod error;
pub mod format;
pub mod integrity;
pub mod parsers;
pub mod validation;
pub mod value;

// Re-exports for convenience
pub use agent::{Agent, ApiView, Capability, McpServerView, SkillView};
pub use config::EngineConfig;
pub use diagnostic::{Diagnostic, DiagnosticCode, Diagnostics, Severity};
pub use engine::{AixParser, ValidationReport};
pub use error::{AixError, AixResult, ConfigError, ParseError, ValidationFailure};
pub use format::{detect_format, Format};
pub use integrity::{canonicalize, compute_digest, ChecksumAlgorithm, ChecksumPolicy, ChecksumRecord};
pub use value::{Document, Mapping, Number, Value};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Parse a document with the default configuration
///
/// # Errors
/// See [`AixParser::parse`].
pub fn parse(content: &str, filename_hint: Option<&str>) -> AixResult<Agent> {
    AixParser::new().parse(content, filename_hint)
}

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with agent documents
    pub use crate::agent::{Agent, Capability};
    pub use crate::config::EngineConfig;
    pub use crate::diagnostic::{Diagnostic, DiagnosticCode, Diagnostics, Severity};
    pub use crate::engine::{AixParser, ValidationReport};
    pub use crate::error::{AixError, AixResult, ParseError};
    pub use crate::format::{detect_format, Format};
    pub use crate::integrity::{compute_digest, ChecksumAlgorithm, ChecksumPolicy};
    pub use crate::value::{Document, Value};
}
