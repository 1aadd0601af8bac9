mod display;

use actiongraph_core::analyzer;
use actiongraph_core::config::Config;
use actiongraph_core::graph::{self, DependencyGraph};
use actiongraph_core::parser::workflow::Workflow;
use actiongraph_core::providers::github_api::GitHubClient;
use actiongraph_core::resolver::{DependencyResolver, ResolvedWorkflow};
use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "actiongraph",
    version,
    about = "Map and audit the actions your GitHub workflows depend on",
    long_about = "Recursively walks the actions used by a workflow, including the actions that \
composite actions call in turn, so you can see exactly what you are running.\n\n\
The scan command flags end-of-life Node.js runtimes, repositories open to repo-jacking, \
and references that lag behind the latest release."
)]
struct Cli {
    /// Configuration file (defaults to actiongraph.{toml,json,yaml,yml} in the working directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// GitHub token used for API requests
    #[arg(long, env = "GITHUB_TOKEN", global = true, hide_env_values = true)]
    token: Option<String>,

    /// GitHub API root, for GitHub Enterprise Server
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the actions each job depends on, including nested dependencies
    ListDeps {
        /// Path to workflow file or directory containing workflow files
        #[arg(default_value = ".github/workflows/")]
        path: PathBuf,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Write a graph of a workflow's action dependencies
    GraphDeps {
        /// Path to the workflow file to graph
        path: PathBuf,

        /// Output file
        #[arg(short, long, default_value = "deps.dot")]
        output: PathBuf,

        /// Graph format (dot, mermaid)
        #[arg(short, long, default_value = "dot")]
        format: String,
    },

    /// Scan every resolved action for security and maintenance issues
    Scan {
        /// Path to workflow file or directory containing workflow files
        #[arg(default_value = ".github/workflows/")]
        path: PathBuf,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Skip the end-of-life Node.js runtime check
        #[arg(long)]
        no_node_eol: bool,

        /// Skip the repo-jacking check
        #[arg(long)]
        no_repo_jacking: bool,

        /// Skip comparing references with the latest release
        #[arg(long)]
        no_latest_tag: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(token) = cli.token {
        config.github.token = Some(token);
    }
    if let Some(api_url) = cli.api_url {
        config.github.base_url = api_url;
    }
    tracing::debug!(api = %config.github.base_url, checks = ?config.checks, "configuration loaded");
    let client = config.github.client()?;

    match cli.command {
        Commands::ListDeps { path, format } => cmd_list_deps(&client, &config, &path, &format).await,
        Commands::GraphDeps { path, output, format } => {
            cmd_graph_deps(&client, &config, &path, &output, &format).await
        }
        Commands::Scan {
            path,
            format,
            no_node_eol,
            no_repo_jacking,
            no_latest_tag,
        } => {
            config.checks.node_version_eol &= !no_node_eol;
            config.checks.repo_jacking &= !no_repo_jacking;
            config.checks.latest_release &= !no_latest_tag;
            cmd_scan(&client, &config, &path, &format).await
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn discover_workflow_files(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    if path.is_dir() {
        let mut files: Vec<PathBuf> = Vec::new();
        for extension in ["yml", "yaml"] {
            let pattern = format!("{}/**/*.{}", path.display(), extension);
            files.extend(
                glob::glob(&pattern)
                    .context("Failed to read glob pattern")?
                    .filter_map(|r| r.ok()),
            );
        }
        files.sort();
        if files.is_empty() {
            anyhow::bail!(
                "No workflow files found at '{}'. \
                Make sure the path points to a YAML workflow file or directory.",
                path.display()
            );
        }
        return Ok(files);
    }

    anyhow::bail!("Path '{}' does not exist", path.display());
}

async fn resolve_file(resolver: &DependencyResolver<'_>, file: &Path) -> Result<ResolvedWorkflow> {
    let workflow = Workflow::parse_file(file)?;
    let source = file.display().to_string();
    resolver
        .resolve_workflow(&workflow, &source)
        .await
        .with_context(|| format!("Failed to resolve the dependencies of {}", source))
}

async fn cmd_list_deps(client: &GitHubClient, config: &Config, path: &Path, format: &str) -> Result<()> {
    let files = discover_workflow_files(path)?;
    let resolver = DependencyResolver::new(client, config.resolver.clone());

    let mut resolved = Vec::with_capacity(files.len());
    for file in &files {
        resolved.push(resolve_file(&resolver, file).await?);
    }

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&resolved)?),
        _ => resolved.iter().for_each(display::print_dependencies),
    }
    Ok(())
}

async fn cmd_graph_deps(
    client: &GitHubClient,
    config: &Config,
    path: &Path,
    output: &Path,
    format: &str,
) -> Result<()> {
    if !path.is_file() {
        anyhow::bail!("'{}' is not a file. graph-deps requires a single workflow file.", path.display());
    }

    let resolver = DependencyResolver::new(client, config.resolver.clone());
    let resolved = resolve_file(&resolver, path).await?;
    let deps = DependencyGraph::from_workflow(&resolved);

    let rendered = match format {
        "dot" => graph::to_dot(&deps),
        "mermaid" => graph::to_mermaid(&deps),
        other => anyhow::bail!("Unknown graph format '{}'. Expected dot or mermaid.", other),
    };
    std::fs::write(output, rendered)
        .with_context(|| format!("Failed to write graph to {}", output.display()))?;
    println!(
        "Graph of {} actions written to {}",
        deps.graph.node_count(),
        output.display()
    );
    Ok(())
}

async fn cmd_scan(client: &GitHubClient, config: &Config, path: &Path, format: &str) -> Result<()> {
    let files = discover_workflow_files(path)?;
    let resolver = DependencyResolver::new(client, config.resolver.clone());

    let mut reports = Vec::with_capacity(files.len());
    for file in &files {
        let resolved = resolve_file(&resolver, file).await?;
        if format != "json" {
            display::print_scan_progress(&resolved);
        }
        reports.push(analyzer::audit(client, &config.checks, &resolved).await);
    }

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&reports)?),
        _ => reports.iter().for_each(display::print_scan_report),
    }
    Ok(())
}
