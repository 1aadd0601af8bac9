use crate::error::{AuditError, Result};
use crate::parser::reference::format_label;
use crate::parser::workflow::Step;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The `runs:` block of an action manifest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Runs {
    #[serde(default)]
    pub using: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<Step>,
}

/// An action manifest, plus where it was fetched from and what it depends on.
///
/// Manifests carry no repository identity of their own; the fetcher fills in
/// `repository`, `path` and `git_ref`, and the resolver fills `dependents`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Action {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub runs: Option<Runs>,
    #[serde(default, skip_deserializing)]
    pub repository: String,
    #[serde(default, skip_deserializing)]
    pub path: String,
    #[serde(default, skip_deserializing)]
    pub git_ref: String,
    #[serde(default, skip_deserializing, skip_serializing_if = "Vec::is_empty")]
    pub dependents: Vec<Action>,
}

impl Action {
    pub fn parse(content: &str) -> std::result::Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    pub fn parse_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::parse(&content)?)
    }

    fn using(&self) -> &str {
        self.runs.as_ref().map(|r| r.using.as_str()).unwrap_or("")
    }

    pub fn is_composite(&self) -> bool {
        self.using() == "composite"
    }

    pub fn is_javascript(&self) -> bool {
        self.using().starts_with("node")
    }

    pub fn is_docker(&self) -> bool {
        self.using() == "docker"
    }

    /// Node.js major version for javascript actions, `None` for anything else.
    pub fn node_version(&self) -> Result<Option<u32>> {
        let Some(version) = self.using().strip_prefix("node") else {
            return Ok(None);
        };
        version
            .parse::<u32>()
            .map(Some)
            .map_err(|_| AuditError::InvalidRuntime(self.using().to_string()))
    }

    /// Steps of a composite action; empty for every other kind.
    pub fn steps(&self) -> &[Step] {
        match &self.runs {
            Some(runs) if self.is_composite() => &runs.steps,
            _ => &[],
        }
    }

    /// `repository[/path]@ref`
    pub fn label(&self) -> String {
        format_label(&self.repository, &self.path, &self.git_ref)
    }

    /// Total number of actions beneath this one.
    pub fn descendant_count(&self) -> usize {
        self.dependents
            .iter()
            .map(|d| 1 + d.descendant_count())
            .sum()
    }
}
