pub mod latest_release;
pub mod node_runtime;
pub mod repo_jacking;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a check had nothing to say about an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// The runtime check only applies to `node<N>` actions.
    NotJavascript,
    /// No git ref to compare against.
    LocalAction,
    /// The ref is already a full commit SHA.
    LikelySha,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SkipReason::NotJavascript => "scanner is not applicable to this action",
            SkipReason::LocalAction => "action is local, and so is not referred to by a git ref",
            SkipReason::LikelySha => "reference is likely a sha-1 sum",
        })
    }
}

/// Result of a single check that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome<T> {
    Applicable(T),
    NotApplicable(SkipReason),
}

impl<T> CheckOutcome<T> {
    pub fn applicable(self) -> Option<T> {
        match self {
            CheckOutcome::Applicable(value) => Some(value),
            CheckOutcome::NotApplicable(_) => None,
        }
    }
}

/// Identifies a check in reports and error listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CheckKind {
    NodeVersionEol,
    RepoJacking,
    LatestRelease,
}

impl CheckKind {
    pub fn label(&self) -> &str {
        match self {
            CheckKind::NodeVersionEol => "Node Version EOL",
            CheckKind::RepoJacking => "Repo Jacking Possible",
            CheckKind::LatestRelease => "Is Referencing Latest Tag",
        }
    }
}
