use crate::error::{AuditError, Result};
use crate::parser::manifest::Action;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
const API_VERSION: &str = "2022-11-28";

/// Manifest filenames in the order they are tried.
pub const MANIFEST_FILENAMES: [&str; 2] = ["action.yml", "action.yaml"];

/// GitHub API client for action manifests and repository metadata
pub struct GitHubClient {
    client: reqwest::Client,
    base_url: String,
}

/// Canonical repository record from `GET /repos/{owner}/{repo}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryRecord {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    pub owner: RepositoryOwner,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryOwner {
    pub login: String,
}

/// Latest published release of a repository
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Release {
    pub tag_name: String,
}

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    download_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommitResponse {
    sha: String,
}

impl GitHubClient {
    /// Create a client against the public GitHub API
    pub fn new(token: Option<String>) -> Result<Self> {
        Self::with_base_url(DEFAULT_API_URL, token, Duration::from_secs(30))
    }

    /// Create a client against an arbitrary API root (GHES, or a mock server in tests)
    pub fn with_base_url(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert(
            HeaderName::from_static("x-github-api-version"),
            HeaderValue::from_static(API_VERSION),
        );
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("actiongraph/", env!("CARGO_PKG_VERSION"))),
        );

        if let Some(ref t) = token {
            let value = HeaderValue::from_str(&format!("Bearer {}", t))
                .map_err(|_| AuditError::InvalidToken)?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch and decode the manifest of the action at `repository[/path]@git_ref`.
    ///
    /// `action.yml` is tried first; `action.yaml` only when the first is absent.
    /// Any other failure on either attempt is returned as-is.
    pub async fn fetch_action(&self, repository: &str, git_ref: &str, path: &str) -> Result<Action> {
        let primary = manifest_path(path, MANIFEST_FILENAMES[0]);
        let download_url = match self.locate_manifest(repository, git_ref, &primary).await {
            Ok(url) => url,
            Err(primary_cause) if primary_cause.is_not_found() => {
                let secondary = manifest_path(path, MANIFEST_FILENAMES[1]);
                match self.locate_manifest(repository, git_ref, &secondary).await {
                    Ok(url) => url,
                    Err(secondary_cause) if secondary_cause.is_not_found() => {
                        return Err(AuditError::ManifestMissing {
                            repository: repository.to_string(),
                            git_ref: git_ref.to_string(),
                            primary,
                            secondary,
                            primary_cause: Box::new(primary_cause),
                            secondary_cause: Box::new(secondary_cause),
                        })
                    }
                    Err(e) => return Err(e),
                }
            }
            Err(e) => return Err(e),
        };

        debug!(%repository, %git_ref, url = %download_url, "downloading action manifest");
        let content = self
            .client
            .get(&download_url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let mut action = Action::parse(&content).map_err(|source| AuditError::Manifest {
            source_url: download_url.clone(),
            source,
        })?;
        action.repository = repository.to_string();
        action.path = path.trim_matches('/').to_string();
        action.git_ref = git_ref.to_string();
        Ok(action)
    }

    /// Resolve a manifest file to its raw download URL via the contents API.
    async fn locate_manifest(&self, repository: &str, git_ref: &str, file: &str) -> Result<String> {
        let url = format!("{}/repos/{}/contents/{}", self.base_url, repository, file);
        debug!(%repository, %git_ref, %file, "locating action manifest");

        let mut request = self.client.get(&url);
        if !git_ref.is_empty() {
            request = request.query(&[("ref", git_ref)]);
        }
        let response = request.send().await?;

        let not_found = || AuditError::NotFound {
            repository: repository.to_string(),
            path: file.to_string(),
            git_ref: git_ref.to_string(),
        };
        if response.status() == StatusCode::NOT_FOUND {
            return Err(not_found());
        }
        let contents: ContentsResponse = expect_success(response, &url)?.json().await?;

        // Directories and submodules come back without a download URL.
        contents.download_url.ok_or_else(not_found)
    }

    /// Fetch the canonical repository record, following any rename or transfer.
    pub async fn fetch_repository(&self, repository: &str) -> Result<RepositoryRecord> {
        let url = format!("{}/repos/{}", self.base_url, repository);
        debug!(%repository, "fetching repository record");
        let response = self.client.get(&url).send().await?;
        Ok(expect_success(response, &url)?.json().await?)
    }

    /// Commit SHA that `git_ref` currently points at.
    pub async fn commit_sha(&self, repository: &str, git_ref: &str) -> Result<String> {
        let url = format!("{}/repos/{}/commits/{}", self.base_url, repository, git_ref);
        debug!(%repository, %git_ref, "resolving commit sha");
        let response = self.client.get(&url).send().await?;
        let commit: CommitResponse = expect_success(response, &url)?.json().await?;
        Ok(commit.sha)
    }

    /// Latest published (non-draft, non-prerelease) release.
    pub async fn latest_release(&self, repository: &str) -> Result<Release> {
        let url = format!("{}/repos/{}/releases/latest", self.base_url, repository);
        debug!(%repository, "fetching latest release");
        let response = self.client.get(&url).send().await?;
        Ok(expect_success(response, &url)?.json().await?)
    }
}

fn expect_success(response: Response, url: &str) -> Result<Response> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(AuditError::UnexpectedStatus {
            status: response.status().as_u16(),
            url: url.to_string(),
        })
    }
}

fn manifest_path(path: &str, filename: &str) -> String {
    let path = path.trim_matches('/');
    if path.is_empty() {
        filename.to_string()
    } else {
        format!("{}/{}", path, filename)
    }
}
