use crate::config::ResolverConfig;
use crate::error::{AuditError, Result};
use crate::parser::manifest::Action;
use crate::parser::reference::{format_label, ActionRef};
use crate::parser::workflow::{Step, Workflow};
use crate::providers::github_api::GitHubClient;
use futures::stream::{self, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Outcome of expanding an action into its dependents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Composite action; the number of direct dependents found.
    Dependents(usize),
    /// Not a composite action, so there is nothing beneath it.
    NoDependencies,
}

/// Identity of a remote action: repository, sub-path and ref.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActionKey {
    pub repository: String,
    pub path: String,
    pub git_ref: String,
}

impl ActionKey {
    pub fn of(action: &Action) -> Self {
        Self {
            repository: action.repository.clone(),
            path: action.path.clone(),
            git_ref: action.git_ref.clone(),
        }
    }
}

impl fmt::Display for ActionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_label(&self.repository, &self.path, &self.git_ref))
    }
}

/// A workflow step after resolution. `action` is `None` for inline,
/// local and container steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedStep {
    pub label: String,
    pub reference: Option<ActionRef>,
    pub action: Option<Action>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedJob {
    pub name: String,
    pub steps: Vec<ResolvedStep>,
}

/// Every job of a workflow with its full action dependency trees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedWorkflow {
    pub name: String,
    pub source_file: String,
    pub jobs: Vec<ResolvedJob>,
}

impl ResolvedWorkflow {
    /// Top-level actions, in job then step order.
    pub fn actions(&self) -> impl Iterator<Item = (&str, &Action)> {
        self.jobs.iter().flat_map(|job| {
            job.steps
                .iter()
                .filter_map(move |step| step.action.as_ref().map(|a| (job.name.as_str(), a)))
        })
    }

    /// All resolved actions, counting every occurrence in every tree.
    pub fn action_count(&self) -> usize {
        self.actions().map(|(_, a)| 1 + a.descendant_count()).sum()
    }
}

/// Recursively expands composite actions into trees of the actions they call.
///
/// Resolution is depth-first and fail-fast: any error other than reaching a
/// leaf aborts the whole workflow. A reference that reappears on its own
/// ancestry yields [`AuditError::CycleDetected`].
pub struct DependencyResolver<'a> {
    client: &'a GitHubClient,
    options: ResolverConfig,
    cache: Mutex<HashMap<ActionKey, Action>>,
    fetches: AtomicUsize,
}

impl<'a> DependencyResolver<'a> {
    pub fn new(client: &'a GitHubClient, options: ResolverConfig) -> Self {
        Self {
            client,
            options,
            cache: Mutex::new(HashMap::new()),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Number of manifests fetched from the API so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }

    pub async fn resolve_workflow(&self, workflow: &Workflow, source_file: &str) -> Result<ResolvedWorkflow> {
        let mut jobs = Vec::with_capacity(workflow.jobs.len());

        for (job_name, job) in &workflow.jobs {
            debug!(job = %job_name, steps = job.steps.len(), "resolving job");
            let steps = stream::iter(job.steps.iter())
                .map(|step| self.resolve_step(step))
                .buffered(self.options.concurrency.max(1))
                .try_collect::<Vec<_>>()
                .await?;
            jobs.push(ResolvedJob {
                name: job_name.clone(),
                steps,
            });
        }

        let resolved = ResolvedWorkflow {
            name: workflow.name.clone().unwrap_or_else(|| source_file.to_string()),
            source_file: source_file.to_string(),
            jobs,
        };
        info!(
            workflow = %resolved.name,
            actions = resolved.action_count(),
            fetches = self.fetch_count(),
            "workflow resolved"
        );
        Ok(resolved)
    }

    /// Resolve one workflow step. Inline code steps resolve to no action.
    pub async fn resolve_step(&self, step: &Step) -> Result<ResolvedStep> {
        let label = step.label();
        let reference = match step.action_ref() {
            None => {
                return Ok(ResolvedStep {
                    label,
                    reference: None,
                    action: None,
                })
            }
            Some(reference) => reference?,
        };

        let action = self.resolve_reference(&reference, &mut Vec::new()).await?;
        Ok(ResolvedStep {
            label,
            reference: Some(reference),
            action,
        })
    }

    /// Expand an already fetched action in place, appending its dependents.
    pub async fn resolve(&self, action: &mut Action) -> Result<Resolution> {
        let mut ancestry = vec![ActionKey::of(action)];
        self.expand(action, &mut ancestry).await
    }

    async fn resolve_reference(
        &self,
        reference: &ActionRef,
        ancestry: &mut Vec<ActionKey>,
    ) -> Result<Option<Action>> {
        let ActionRef::Remote {
            repository,
            path,
            git_ref,
        } = reference
        else {
            debug!(%reference, "skipping action outside remote resolution");
            return Ok(None);
        };

        let key = ActionKey {
            repository: repository.clone(),
            path: path.clone(),
            git_ref: git_ref.clone(),
        };

        if ancestry.contains(&key) {
            let mut chain: Vec<String> = ancestry.iter().map(ToString::to_string).collect();
            chain.push(key.to_string());
            return Err(AuditError::CycleDetected { chain });
        }

        if self.options.dedupe {
            if let Some(cached) = self.cache.lock().await.get(&key) {
                debug!(action = %key, "reusing resolved action");
                return Ok(Some(cached.clone()));
            }
        }

        self.fetches.fetch_add(1, Ordering::Relaxed);
        let mut action = self.client.fetch_action(repository, git_ref, path).await?;

        ancestry.push(key.clone());
        let expanded = Box::pin(self.expand(&mut action, ancestry)).await;
        ancestry.pop();
        expanded?;

        if self.options.dedupe {
            self.cache.lock().await.insert(key, action.clone());
        }
        Ok(Some(action))
    }

    async fn expand(&self, action: &mut Action, ancestry: &mut Vec<ActionKey>) -> Result<Resolution> {
        if !action.is_composite() {
            return Ok(Resolution::NoDependencies);
        }

        let mut dependents = Vec::new();
        for step in action.steps() {
            let Some(reference) = step.action_ref() else {
                continue;
            };
            if let Some(child) = self.resolve_reference(&reference?, ancestry).await? {
                dependents.push(child);
            }
        }

        let count = dependents.len();
        action.dependents = dependents;
        Ok(Resolution::Dependents(count))
    }
}
