//! Validated agent projection
//!
//! An [`Agent`] is only handed out by the pipeline once validation reported
//! no blocking diagnostics. It is read-only: accessors borrow from the
//! underlying [`Document`], and the derived views (capabilities,
//! authorization) are computed on demand.

use crate::diagnostic::Diagnostics;
use crate::format::Format;
use crate::integrity::ChecksumRecord;
use crate::value::{Document, Mapping, Value};
use serde::Serialize;
use std::fmt::{self, Display, Formatter};

/// Entry of the `skills` list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkillView {
    /// Skill name
    pub name: String,
    /// What the skill does
    pub description: String,
    /// `enabled` flag, `true` when absent
    pub enabled: bool,
}

/// Entry of the `apis` list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiView {
    /// API name
    pub name: String,
    /// Absolute base URL
    pub base_url: String,
}

/// Entry of `mcp.servers`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct McpServerView {
    /// Server name
    pub name: String,
    /// Launch command
    pub command: String,
    /// Command arguments
    pub args: Vec<String>,
}

/// Something the agent can use, derived from its list sections
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "lowercase")]
pub enum Capability {
    /// Enabled skill
    Skill(String),
    /// Declared API
    Api(String),
    /// MCP server
    Mcp(String),
}

impl Capability {
    /// Name without the kind prefix
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Skill(name) | Self::Api(name) | Self::Mcp(name) => name,
        }
    }

    /// Kind prefix (`skill`, `api`, `mcp`)
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Skill(_) => "skill",
            Self::Api(_) => "api",
            Self::Mcp(_) => "mcp",
        }
    }
}

impl Display for Capability {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.name())
    }
}

fn text(record: &Mapping, key: &str) -> String {
    record
        .get(key)
        .and_then(Value::as_text)
        .map(|t| t.into_owned())
        .unwrap_or_default()
}

fn records(value: Option<&Value>) -> impl Iterator<Item = &Mapping> {
    value
        .and_then(Value::as_sequence)
        .unwrap_or_default()
        .iter()
        .filter_map(Value::as_mapping)
}

/// Validated, read-only agent document
#[derive(Debug, Clone)]
pub struct Agent {
    document: Document,
    warnings: Diagnostics,
}

impl Agent {
    /// Wrap a document that passed validation
    pub(crate) fn new(document: Document, warnings: Diagnostics) -> Self {
        Self { document, warnings }
    }

    /// Underlying document tree
    #[inline]
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Syntax the document was written in
    #[inline]
    #[must_use]
    pub fn format(&self) -> Format {
        self.document.format()
    }

    /// Any top-level section
    #[inline]
    #[must_use]
    pub fn section(&self, name: &str) -> Option<&Value> {
        self.document.get(name)
    }

    /// `meta` section
    #[must_use]
    pub fn meta(&self) -> Option<&Mapping> {
        self.section("meta").and_then(Value::as_mapping)
    }

    /// `persona` section
    #[must_use]
    pub fn persona(&self) -> Option<&Mapping> {
        self.section("persona").and_then(Value::as_mapping)
    }

    /// `security` section
    #[must_use]
    pub fn security(&self) -> Option<&Mapping> {
        self.section("security").and_then(Value::as_mapping)
    }

    fn meta_str(&self, field: &str) -> Option<&str> {
        self.meta()?.get(field)?.as_str()
    }

    /// `meta.id`
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.meta_str("id")
    }

    /// `meta.name`
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.meta_str("name")
    }

    /// `meta.version` as written (unquoted versions parse as numbers)
    #[must_use]
    pub fn version(&self) -> Option<String> {
        self.meta()?.get("version")?.as_text().map(|t| t.into_owned())
    }

    /// `meta.author`
    #[must_use]
    pub fn author(&self) -> Option<&str> {
        self.meta_str("author")
    }

    /// `meta.created`
    #[must_use]
    pub fn created(&self) -> Option<&str> {
        self.meta_str("created")
    }

    /// `meta.description`
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.meta_str("description")
    }

    /// `persona.role`
    #[must_use]
    pub fn role(&self) -> Option<&str> {
        self.persona()?.get("role")?.as_str()
    }

    /// `persona.instructions`
    #[must_use]
    pub fn instructions(&self) -> Option<&str> {
        self.persona()?.get("instructions")?.as_str()
    }

    /// `persona.temperature`
    #[must_use]
    pub fn temperature(&self) -> Option<f64> {
        self.persona()?.get("temperature")?.as_f64()
    }

    /// Declared checksum
    #[must_use]
    pub fn checksum(&self) -> Option<ChecksumRecord> {
        ChecksumRecord::from_document(&self.document)
    }

    /// Entries of `skills`
    #[must_use]
    pub fn skills(&self) -> Vec<SkillView> {
        records(self.section("skills"))
            .map(|skill| SkillView {
                name: text(skill, "name"),
                description: text(skill, "description"),
                enabled: skill.get("enabled").and_then(Value::as_bool).unwrap_or(true),
            })
            .collect()
    }

    /// Entries of `apis`
    #[must_use]
    pub fn apis(&self) -> Vec<ApiView> {
        records(self.section("apis"))
            .map(|api| ApiView {
                name: text(api, "name"),
                base_url: text(api, "base_url"),
            })
            .collect()
    }

    /// Entries of `mcp.servers`
    #[must_use]
    pub fn mcp_servers(&self) -> Vec<McpServerView> {
        records(self.document.get_path("mcp.servers"))
            .map(|server| McpServerView {
                name: text(server, "name"),
                command: text(server, "command"),
                args: server
                    .get("args")
                    .map(|args| args.string_items().into_iter().map(str::to_string).collect())
                    .unwrap_or_default(),
            })
            .collect()
    }

    /// Enabled skills, then APIs, then MCP servers
    #[must_use]
    pub fn capabilities(&self) -> Vec<Capability> {
        let skills = self
            .skills()
            .into_iter()
            .filter(|skill| skill.enabled)
            .map(|skill| Capability::Skill(skill.name));
        let apis = self.apis().into_iter().map(|api| Capability::Api(api.name));
        let servers = self
            .mcp_servers()
            .into_iter()
            .map(|server| Capability::Mcp(server.name));
        skills.chain(apis).chain(servers).collect()
    }

    /// Check for a capability by display form (`skill:search`) or bare name
    #[must_use]
    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities()
            .iter()
            .any(|c| c.name() == capability || c.to_string() == capability)
    }

    fn operations(&self, list: &str) -> Option<Vec<&str>> {
        self.security()?
            .get("capabilities")?
            .get(list)
            .map(Value::string_items)
    }

    /// Whether the agent may perform `operation`
    ///
    /// Restricted operations are always denied. Otherwise the operation is
    /// allowed when no allow-list is declared, or the allow-list names it or
    /// contains `*`.
    #[must_use]
    pub fn is_authorized(&self, operation: &str) -> bool {
        let restricted = self.operations("restricted_operations").unwrap_or_default();
        if restricted.contains(&operation) {
            return false;
        }
        self.operations("allowed_operations")
            .map_or(true, |allowed| allowed.iter().any(|op| *op == operation || *op == "*"))
    }

    /// Whether `operation` needs user confirmation
    #[must_use]
    pub fn requires_confirmation(&self, operation: &str) -> bool {
        self.operations("require_confirmation")
            .is_some_and(|ops| ops.iter().any(|op| *op == operation || *op == "*"))
    }

    /// Non-blocking diagnostics found while parsing
    #[inline]
    #[must_use]
    pub fn warnings(&self) -> &Diagnostics {
        &self.warnings
    }

    /// Document as JSON
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        self.document.to_json()
    }

    /// Give up the projection and keep the tree
    #[must_use]
    pub fn into_document(self) -> Document {
        self.document
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::{DocumentParser, YamlLikeParser};
    use pretty_assertions::assert_eq;

    const AGENT: &str = r#"meta:
  version: 1.0
  id: 550e8400-e29b-41d4-a716-446655440000
  name: Research Assistant
  created: 2025-01-12T10:30:00Z
  author: Test
persona:
  role: researcher
  instructions: |
    Find sources.
    Cite them.
  temperature: 0.3
skills:
  - name: search
    description: Web search
  - name: draft
    description: Writing
    enabled: false
apis:
  - name: weather, base_url: https://api.example.com
mcp:
  servers:
    - name: fs
      command: npx
      args: ["-y", "server-fs"]
security:
  checksum:
    algorithm: sha256
    value: abc
  capabilities:
    allowed_operations:
      - read
      - write
      - delete
    restricted_operations:
      - delete
    require_confirmation: ["write"]
"#;

    fn agent(content: &str) -> Agent {
        Agent::new(YamlLikeParser.parse_document(content).unwrap(), Diagnostics::new())
    }

    #[test]
    fn identity_and_persona() {
        let agent = agent(AGENT);
        assert_eq!(agent.id(), Some("550e8400-e29b-41d4-a716-446655440000"));
        assert_eq!(agent.name(), Some("Research Assistant"));
        assert_eq!(agent.version().as_deref(), Some("1.0"));
        assert_eq!(agent.created(), Some("2025-01-12T10:30:00Z"));
        assert_eq!(agent.description(), None);
        assert_eq!(agent.role(), Some("researcher"));
        assert_eq!(agent.instructions(), Some("Find sources.\nCite them."));
        assert_eq!(agent.temperature(), Some(0.3));
        assert_eq!(agent.format(), Format::YamlLike);
    }

    #[test]
    fn list_views() {
        let agent = agent(AGENT);
        let skills = agent.skills();
        assert_eq!(skills.len(), 2);
        assert!(skills[0].enabled);
        assert!(!skills[1].enabled);
        assert_eq!(
            agent.apis(),
            vec![ApiView {
                name: "weather".into(),
                base_url: "https://api.example.com".into(),
            }]
        );
        assert_eq!(agent.mcp_servers()[0].args, vec!["-y", "server-fs"]);
    }

    #[test]
    fn capabilities_in_order() {
        let agent = agent(AGENT);
        let names: Vec<String> = agent.capabilities().iter().map(ToString::to_string).collect();
        assert_eq!(names, vec!["skill:search", "api:weather", "mcp:fs"]);
        assert!(agent.has_capability("skill:search"));
        assert!(agent.has_capability("fs"));
        assert!(!agent.has_capability("skill:draft"));
    }

    #[test]
    fn authorization() {
        let agent = agent(AGENT);
        assert!(agent.is_authorized("read"));
        assert!(!agent.is_authorized("delete"));
        assert!(!agent.is_authorized("execute"));
        assert!(agent.requires_confirmation("write"));
        assert!(!agent.requires_confirmation("read"));
    }

    #[test]
    fn authorization_without_allow_list() {
        let restricted = agent("security:\n  capabilities:\n    restricted_operations: [\"shutdown\"]\n");
        assert!(restricted.is_authorized("anything"));
        assert!(!restricted.is_authorized("shutdown"));

        let wildcard = agent("security:\n  capabilities:\n    allowed_operations: [\"*\"]\n");
        assert!(wildcard.is_authorized("anything"));
    }

    #[test]
    fn checksum_record() {
        let record = agent(AGENT).checksum().unwrap();
        assert_eq!(record.algorithm.name(), "sha256");
        assert_eq!(record.value, "abc");
    }

    #[test]
    fn json_export_keeps_order() {
        let json = agent(AGENT).to_json();
        let keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["meta", "persona", "skills", "apis", "mcp", "security"]);
    }
}
