use crate::config::ChecksConfig;
use crate::security::CheckKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Verdict of a single check for a single action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "true")]
    Yes,
    #[serde(rename = "false")]
    No,
    #[serde(rename = "Not Applicable")]
    NotApplicable,
    #[serde(rename = "unknown")]
    Unknown,
    #[serde(rename = "Not Scanned")]
    NotScanned,
}

impl Verdict {
    pub fn from_bool(value: bool) -> Self {
        if value {
            Verdict::Yes
        } else {
            Verdict::No
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Verdict::Yes => "true",
            Verdict::No => "false",
            Verdict::NotApplicable => "Not Applicable",
            Verdict::Unknown => "unknown",
            Verdict::NotScanned => "Not Scanned",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check results for one resolved action occurrence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    /// `repository[/path]@ref`
    pub action: String,
    /// 0 for actions called directly by the workflow
    pub depth: usize,
    pub node_version_eol: Verdict,
    pub repo_jacking_possible: Verdict,
    pub repo_jacking_comment: Option<String>,
    pub latest_release: Verdict,
    pub is_latest_release: bool,
    pub latest_release_tag: Option<String>,
    pub latest_release_error: Option<String>,
}

/// A check that failed for reasons other than not applying.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckError {
    pub action: String,
    pub check: CheckKind,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobReport {
    pub job: String,
    pub results: Vec<ScanResult>,
}

/// The complete audit of one workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    pub workflow: String,
    pub source_file: String,
    pub generated_at: DateTime<Utc>,
    pub checks: ChecksConfig,
    pub jobs: Vec<JobReport>,
    pub errors: Vec<CheckError>,
}

impl AuditReport {
    pub fn results(&self) -> impl Iterator<Item = &ScanResult> {
        self.jobs.iter().flat_map(|j| j.results.iter())
    }

    pub fn action_count(&self) -> usize {
        self.results().count()
    }

    pub fn eol_count(&self) -> usize {
        self.results()
            .filter(|r| r.node_version_eol == Verdict::Yes)
            .count()
    }

    pub fn repo_jacking_count(&self) -> usize {
        self.results()
            .filter(|r| r.repo_jacking_possible == Verdict::Yes)
            .count()
    }

    /// Actions whose ref was compared and found behind the latest release.
    pub fn outdated_count(&self) -> usize {
        self.results()
            .filter(|r| r.latest_release == Verdict::No)
            .count()
    }

    pub fn has_findings(&self) -> bool {
        self.eol_count() + self.repo_jacking_count() + self.outdated_count() > 0
    }
}
