pub mod report;

use crate::config::ChecksConfig;
use crate::parser::manifest::Action;
use crate::providers::github_api::GitHubClient;
use crate::resolver::ResolvedWorkflow;
use crate::security::latest_release::check_latest_release;
use crate::security::node_runtime::is_node_version_eol;
use crate::security::repo_jacking::{check_repo_jacking, RepoJackingStatus};
use crate::security::{CheckKind, CheckOutcome};
use chrono::Utc;
use report::{AuditReport, CheckError, JobReport, ScanResult, Verdict};
use std::collections::HashMap;
use tracing::{info, warn};

/// Runs the enabled checks over resolved actions.
///
/// A failing check marks its own field unknown and is recorded as a
/// [`CheckError`]; sibling checks and sibling actions still run.
pub struct Scanner<'a> {
    client: &'a GitHubClient,
    checks: &'a ChecksConfig,
    repositories: HashMap<String, Result<RepoJackingStatus, String>>,
}

impl<'a> Scanner<'a> {
    pub fn new(client: &'a GitHubClient, checks: &'a ChecksConfig) -> Self {
        Self {
            client,
            checks,
            repositories: HashMap::new(),
        }
    }

    /// Run every enabled check against one action.
    pub async fn scan(&mut self, action: &Action, depth: usize) -> (ScanResult, Vec<CheckError>) {
        let label = action.label();
        let mut errors = Vec::new();
        let mut fail = |check: CheckKind, message: String| {
            warn!(action = %label, check = check.label(), %message, "check failed");
            errors.push(CheckError {
                action: label.clone(),
                check,
                message,
            });
        };

        let node_version_eol = if !self.checks.node_version_eol {
            Verdict::NotScanned
        } else {
            match is_node_version_eol(action, self.checks.node_eol_threshold) {
                Ok(CheckOutcome::Applicable(eol)) => Verdict::from_bool(eol),
                Ok(CheckOutcome::NotApplicable(_)) => Verdict::NotApplicable,
                Err(e) => {
                    fail(
                        CheckKind::NodeVersionEol,
                        format!("failed to determine if node version is EOL for {}: {}", label, e),
                    );
                    Verdict::Unknown
                }
            }
        };

        let (repo_jacking_possible, repo_jacking_comment) = if !self.checks.repo_jacking {
            (Verdict::NotScanned, None)
        } else {
            match self.repo_jacking(&action.repository).await {
                Ok(status) if status.susceptible => (
                    Verdict::Yes,
                    Some(format!(
                        "Repo jacking possible. {} has been moved and is now accessible via {}",
                        status.declared, status.canonical
                    )),
                ),
                Ok(_) => (Verdict::No, None),
                Err(message) => {
                    fail(CheckKind::RepoJacking, message.clone());
                    (Verdict::Unknown, Some(message))
                }
            }
        };

        let mut latest = LatestRelease {
            verdict: Verdict::NotScanned,
            is_latest: false,
            tag: None,
            error: None,
        };
        if self.checks.latest_release {
            match check_latest_release(self.client, action).await {
                Ok(CheckOutcome::Applicable(comparison)) => {
                    latest.verdict = Verdict::from_bool(comparison.is_latest);
                    latest.is_latest = comparison.is_latest;
                    latest.tag = Some(comparison.latest_tag);
                }
                Ok(CheckOutcome::NotApplicable(reason)) => {
                    latest.verdict = Verdict::NotApplicable;
                    latest.error = Some(reason.to_string());
                }
                Err(e) => {
                    fail(CheckKind::LatestRelease, e.to_string());
                    latest.verdict = Verdict::Unknown;
                    latest.error = Some(e.to_string());
                }
            }
        }

        let result = ScanResult {
            action: label,
            depth,
            node_version_eol,
            repo_jacking_possible,
            repo_jacking_comment,
            latest_release: latest.verdict,
            is_latest_release: latest.is_latest,
            latest_release_tag: latest.tag,
            latest_release_error: latest.error,
        };
        (result, errors)
    }

    /// Ownership lookups are made once per repository per scan.
    async fn repo_jacking(&mut self, repository: &str) -> Result<RepoJackingStatus, String> {
        if let Some(cached) = self.repositories.get(repository) {
            return cached.clone();
        }
        let status = check_repo_jacking(self.client, repository)
            .await
            .map_err(|e| format!("error looking up repo {}: {}", repository, e));
        self.repositories.insert(repository.to_string(), status.clone());
        status
    }
}

struct LatestRelease {
    verdict: Verdict,
    is_latest: bool,
    tag: Option<String>,
    error: Option<String>,
}

/// Scan every action reachable from a resolved workflow, depth-first.
pub async fn audit(client: &GitHubClient, checks: &ChecksConfig, resolved: &ResolvedWorkflow) -> AuditReport {
    let mut scanner = Scanner::new(client, checks);
    let mut jobs = Vec::with_capacity(resolved.jobs.len());
    let mut errors = Vec::new();

    for job in &resolved.jobs {
        let mut results = Vec::new();
        for step in &job.steps {
            let Some(root) = &step.action else {
                continue;
            };
            let mut pending = vec![(root, 0usize)];
            while let Some((action, depth)) = pending.pop() {
                let (result, check_errors) = scanner.scan(action, depth).await;
                results.push(result);
                errors.extend(check_errors);
                pending.extend(action.dependents.iter().rev().map(|d| (d, depth + 1)));
            }
        }
        jobs.push(JobReport {
            job: job.name.clone(),
            results,
        });
    }

    let report = AuditReport {
        workflow: resolved.name.clone(),
        source_file: resolved.source_file.clone(),
        generated_at: Utc::now(),
        checks: checks.clone(),
        jobs,
        errors,
    };
    info!(
        workflow = %report.workflow,
        actions = report.action_count(),
        errors = report.errors.len(),
        "scan complete"
    );
    report
}
