//! Testing utilities for the AIX workspace
//!
//! Shared fixtures (sample documents in every syntax, sealed with a correct
//! checksum) and test-side tracing setup.

#![allow(missing_docs)]

use aix_core::{compute_digest, ChecksumAlgorithm};
use std::sync::Once;
use tracing_subscriber::EnvFilter;

/// Marker replaced by [`seal`] with the document's digest
pub const CHECKSUM_PLACEHOLDER: &str = "{{checksum}}";

/// Stable id used by the fixtures
pub const FIXTURE_ID: &str = "550e8400-e29b-41d4-a716-446655440000";

pub const YAML_TEMPLATE: &str = r#"meta:
  version: "1.0.0"
  id: {{id}}
  name: Research Assistant
  description: Finds and summarises sources
  created: 2025-01-12T10:30:00Z
  author: AIX Team

persona:
  role: researcher
  tone: neutral
  instructions: |
    Search before answering.

    Always cite sources.
  temperature: 0.7

skills:
  - name: web_search
    description: Search the web
  - name: summarize
    description: Summarise documents
    enabled: false

apis:
  - name: weather
    base_url: https://api.weather.example.com/v1

mcp:
  servers:
    - name: filesystem
      command: npx
      args: ["-y", "@modelcontextprotocol/server-filesystem"]

security:
  checksum:
    algorithm: sha256
    value: {{checksum}}
  capabilities:
    allowed_operations:
      - read
      - search
      - write
    restricted_operations: ["delete"]
    require_confirmation: ["write"]

memory:
  episodic:
    enabled: true
  semantic:
    similarity_threshold: 0.75
"#;

pub const JSON_TEMPLATE: &str = r#"{
  "meta": {
    "version": "1.0.0",
    "id": "{{id}}",
    "name": "Research Assistant",
    "created": "2025-01-12T10:30:00.000Z",
    "author": "AIX Team"
  },
  "persona": {
    "role": "researcher",
    "instructions": "Search before answering.",
    "temperature": 0.7
  },
  "skills": [
    {"name": "web_search", "description": "Search the web"}
  ],
  "security": {
    "checksum": {"algorithm": "sha512", "value": "{{checksum}}"}
  }
}"#;

pub const TOML_TEMPLATE: &str = r#"[meta]
version = "1.0.0"
id = "{{id}}"
name = "Research Assistant"
created = "2025-01-12T10:30:00Z"
author = "AIX Team"

[persona]
role = "researcher"
instructions = """
Search before answering.
Always cite sources.
"""
temperature = 0.7

[[skills]]
name = "web_search"
description = "Search the web"

[[skills]]
name = "summarize"
description = "Summarise documents"

[security]
checksum = {"algorithm": "blake3", "value": "{{checksum}}"}
capabilities = {"allowed_operations": ["*"], "restricted_operations": ["delete"]}

[memory]
semantic = {"similarity_threshold": 0.5}
"#;

/// Replace [`CHECKSUM_PLACEHOLDER`] with the digest of `template`
///
/// The placeholder must sit inside the `security` section, which the digest
/// does not cover, so the sealed text hashes to the value it declares.
pub fn seal(template: &str, algorithm: ChecksumAlgorithm) -> String {
    let digest = compute_digest(template, algorithm);
    template.replace(CHECKSUM_PLACEHOLDER, &digest)
}

fn with_id(template: &str, id: &str) -> String {
    template.replace("{{id}}", id)
}

/// Sealed YAML-like document (sha256)
pub fn valid_yaml() -> String {
    seal(&with_id(YAML_TEMPLATE, FIXTURE_ID), ChecksumAlgorithm::Sha256)
}

/// Sealed JSON document (sha512)
pub fn valid_json() -> String {
    seal(&with_id(JSON_TEMPLATE, FIXTURE_ID), ChecksumAlgorithm::Sha512)
}

/// Sealed section-based document (blake3)
pub fn valid_toml() -> String {
    seal(&with_id(TOML_TEMPLATE, FIXTURE_ID), ChecksumAlgorithm::Blake3)
}

/// Sealed YAML-like document with a fresh random v4 id
pub fn random_yaml() -> (String, String) {
    let id = uuid::Uuid::new_v4().to_string();
    let content = seal(&with_id(YAML_TEMPLATE, &id), ChecksumAlgorithm::Sha256);
    (id, content)
}

/// Unsealed YAML-like document with the given id
pub fn unsealed_yaml(id: &str) -> String {
    with_id(YAML_TEMPLATE, id).replace(CHECKSUM_PLACEHOLDER, "0000")
}

static TRACING: Once = Once::new();

/// Install a test-friendly tracing subscriber once per process
///
/// Honors `RUST_LOG`; defaults to `warn`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}
