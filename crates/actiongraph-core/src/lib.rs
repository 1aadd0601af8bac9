pub mod analyzer;
pub mod config;
pub mod error;
pub mod graph;
pub mod parser;
pub mod providers;
pub mod resolver;
pub mod security;

#[cfg(test)]
mod testing;

pub use analyzer::report::{AuditReport, ScanResult, Verdict};
pub use analyzer::{audit, Scanner};
pub use config::Config;
pub use error::{AuditError, Result};
pub use parser::manifest::Action;
pub use parser::reference::{parse_reference, ActionRef};
pub use parser::workflow::Workflow;
pub use providers::github_api::GitHubClient;
pub use resolver::{DependencyResolver, Resolution, ResolvedWorkflow};
