use crate::error::AuditError;
use crate::parser::reference::{parse_reference, ActionRef};
use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A single step of a job or of a composite action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Step {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uses: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl Step {
    /// Parse the `uses:` reference. `None` means the step runs inline code.
    pub fn action_ref(&self) -> Option<crate::error::Result<ActionRef>> {
        match parse_reference(self.uses.as_deref().unwrap_or_default()) {
            Err(AuditError::BlankReference) => None,
            other => Some(other),
        }
    }

    /// Human-readable label: the reference, else the name, else the id.
    pub fn label(&self) -> String {
        self.uses
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .or(self.name.as_deref())
            .or(self.id.as_deref())
            .unwrap_or("Unnamed step")
            .to_string()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Job {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// A workflow file: job name to job, in file order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Workflow {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub jobs: IndexMap<String, Job>,
}

impl Workflow {
    pub fn parse_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read workflow file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse workflow file: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let workflow: Workflow = serde_yaml::from_str(content).context("Failed to parse YAML")?;
        Ok(workflow)
    }

    pub fn step_count(&self) -> usize {
        self.jobs.values().map(|j| j.steps.len()).sum()
    }
}
