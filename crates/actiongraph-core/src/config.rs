use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::providers::github_api::{GitHubClient, DEFAULT_API_URL};

/// Node.js majors below this are end-of-life.
pub const DEFAULT_NODE_EOL_THRESHOLD: u32 = 20;

/// Configuration file structure, loaded from `actiongraph.{toml,json,yaml,yml}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(default)]
    pub github: GitHubConfig,

    #[serde(default)]
    pub resolver: ResolverConfig,

    #[serde(default)]
    pub checks: ChecksConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GitHubConfig {
    /// Personal access token; unauthenticated requests are heavily rate limited
    pub token: Option<String>,

    /// API root, override for GitHub Enterprise Server
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ResolverConfig {
    /// Top-level steps of a job resolved at once
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Reuse subtrees already resolved during this run
    #[serde(default = "default_true")]
    pub dedupe: bool,
}

/// Which security checks run, and their thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ChecksConfig {
    #[serde(default = "default_true")]
    pub node_version_eol: bool,

    #[serde(default = "default_true")]
    pub repo_jacking: bool,

    #[serde(default = "default_true")]
    pub latest_release: bool,

    #[serde(default = "default_node_eol_threshold")]
    pub node_eol_threshold: u32,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            dedupe: true,
        }
    }
}

impl Default for ChecksConfig {
    fn default() -> Self {
        Self {
            node_version_eol: true,
            repo_jacking: true,
            latest_release: true,
            node_eol_threshold: DEFAULT_NODE_EOL_THRESHOLD,
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_concurrency() -> usize {
    4
}

fn default_node_eol_threshold() -> u32 {
    DEFAULT_NODE_EOL_THRESHOLD
}

fn default_true() -> bool {
    true
}

impl GitHubConfig {
    pub fn client(&self) -> Result<GitHubClient> {
        GitHubClient::with_base_url(
            &self.base_url,
            self.token.clone(),
            Duration::from_secs(self.timeout_secs),
        )
        .context("Failed to build GitHub API client")
    }
}

impl Config {
    /// Load configuration from `path`, or from the first candidate file in the
    /// working directory. Falls back to defaults when nothing is found.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }

        let candidates = [
            "actiongraph.toml",
            "actiongraph.json",
            "actiongraph.yaml",
            "actiongraph.yml",
        ];

        for candidate in &candidates {
            let path = Path::new(candidate);
            if path.exists() {
                return Self::load_from_path(path);
            }
        }

        Ok(Self::default())
    }

    fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        let mut config: Config = match extension {
            "json" => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))?,
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?,
            _ => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display()))?,
        };

        config.resolver.concurrency = config.resolver.concurrency.max(1);
        Ok(config)
    }
}
