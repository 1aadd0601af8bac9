//! Repo-jacking detection.
//!
//! When an owner renames their account or transfers a repository, GitHub
//! redirects the old `owner/name` to the new location. Anyone can then
//! register the old owner name, recreate the repository, and every workflow
//! still pointing at the old path silently runs their code instead.

use crate::error::Result;
use crate::providers::github_api::{GitHubClient, RepositoryRecord};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoJackingStatus {
    /// Repository as referenced by the workflow
    pub declared: String,
    /// Repository as GitHub currently names it
    pub canonical: String,
    pub susceptible: bool,
}

/// Look up the canonical record for `repository` and compare owners.
pub async fn check_repo_jacking(client: &GitHubClient, repository: &str) -> Result<RepoJackingStatus> {
    let record = client.fetch_repository(repository).await?;
    Ok(RepoJackingStatus {
        declared: repository.to_string(),
        canonical: record.full_name.clone(),
        susceptible: is_susceptible(repository, &record),
    })
}

/// True when the declared owner no longer owns the repository.
pub fn is_susceptible(repository: &str, record: &RepositoryRecord) -> bool {
    let declared_owner = repository.split('/').next().unwrap_or(repository);
    !declared_owner.eq_ignore_ascii_case(&record.owner.login)
}
