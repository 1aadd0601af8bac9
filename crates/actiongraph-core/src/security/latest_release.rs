use super::{CheckOutcome, SkipReason};
use crate::error::Result;
use crate::parser::manifest::Action;
use crate::providers::github_api::GitHubClient;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static LIKELY_SHA1: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9A-Fa-f]{40}$").expect("sha-1 pattern is valid"));

/// Pinned ref versus the latest published release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseComparison {
    pub is_latest: bool,
    pub latest_tag: String,
    pub pinned_sha: String,
    pub latest_sha: String,
}

/// A 40 character hex string is taken to be a full commit SHA.
pub fn is_likely_sha(text: &str) -> bool {
    LIKELY_SHA1.is_match(text)
}

/// Check whether the action's ref points at the same commit as the latest release.
///
/// Commits are compared rather than tag names so a floating tag such as `v4`
/// counts as current while it resolves to the latest release's commit.
pub async fn check_latest_release(
    client: &GitHubClient,
    action: &Action,
) -> Result<CheckOutcome<ReleaseComparison>> {
    if action.git_ref.is_empty() {
        return Ok(CheckOutcome::NotApplicable(SkipReason::LocalAction));
    }
    if is_likely_sha(&action.git_ref) {
        return Ok(CheckOutcome::NotApplicable(SkipReason::LikelySha));
    }

    let pinned_sha = client.commit_sha(&action.repository, &action.git_ref).await?;
    let release = client.latest_release(&action.repository).await?;
    let latest_sha = client.commit_sha(&action.repository, &release.tag_name).await?;

    Ok(CheckOutcome::Applicable(ReleaseComparison {
        is_latest: pinned_sha == latest_sha,
        latest_tag: release.tag_name,
        pinned_sha,
        latest_sha,
    }))
}
