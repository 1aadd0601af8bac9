use actiongraph_core::analyzer::{self, report::Verdict};
use actiongraph_core::config::{ChecksConfig, ResolverConfig};
use actiongraph_core::error::AuditError;
use actiongraph_core::graph::{self, DependencyGraph};
use actiongraph_core::parser::manifest::Action;
use actiongraph_core::parser::reference::ActionRef;
use actiongraph_core::parser::workflow::Workflow;
use actiongraph_core::providers::github_api::GitHubClient;
use actiongraph_core::resolver::{DependencyResolver, ResolvedWorkflow};
use mockito::{Matcher, Mock, ServerGuard};
use std::path::{Path, PathBuf};
use std::time::Duration;

const NODE20: &str = "name: Node 20 action\nruns:\n  using: node20\n  main: index.js\n";

/// Get the workspace root (two levels up from CARGO_MANIFEST_DIR of actiongraph-core).
fn fixtures_dir() -> PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    Path::new(manifest_dir)
        .parent()
        .unwrap() // crates/
        .parent()
        .unwrap() // workspace root
        .join("tests/fixtures")
}

fn workflow_fixture(name: &str) -> PathBuf {
    fixtures_dir().join("workflows").join(name)
}

fn action_fixture(name: &str) -> String {
    std::fs::read_to_string(fixtures_dir().join("actions").join(name).join("action.yml")).unwrap()
}

fn client(server: &ServerGuard) -> GitHubClient {
    GitHubClient::with_base_url(&server.url(), None, Duration::from_secs(5)).unwrap()
}

/// Serve `file` of `repository@git_ref` through the contents API and a raw URL.
async fn serve_manifest(
    server: &mut ServerGuard,
    repository: &str,
    file: &str,
    git_ref: &str,
    body: &str,
) -> Vec<Mock> {
    let raw_path = format!("/raw/{}/{}/{}", repository, git_ref, file);
    let contents = server
        .mock("GET", format!("/repos/{}/contents/{}", repository, file).as_str())
        .match_query(Matcher::UrlEncoded("ref".into(), git_ref.into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(format!(r#"{{"download_url":"{}{}"}}"#, server.url(), raw_path))
        .create_async()
        .await;
    let raw = server
        .mock("GET", raw_path.as_str())
        .with_status(200)
        .with_body(body)
        .create_async()
        .await;
    vec![contents, raw]
}

async fn serve_missing(server: &mut ServerGuard, repository: &str, file: &str) -> Mock {
    server
        .mock("GET", format!("/repos/{}/contents/{}", repository, file).as_str())
        .match_query(Matcher::Any)
        .with_status(404)
        .with_body(r#"{"message":"Not Found"}"#)
        .create_async()
        .await
}

async fn serve_repository(server: &mut ServerGuard, declared: &str, canonical: &str) -> Mock {
    let (owner, name) = canonical.split_once('/').unwrap();
    server
        .mock("GET", format!("/repos/{}", declared).as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(format!(
            r#"{{"id":7,"name":"{}","full_name":"{}","owner":{{"login":"{}"}}}}"#,
            name, canonical, owner
        ))
        .create_async()
        .await
}

/// Every manifest reachable from `ci.yml`. `actions/cache` only ships `action.yaml`.
async fn serve_ci_actions(server: &mut ServerGuard) -> Vec<Mock> {
    let mut mocks = Vec::new();
    mocks.extend(serve_manifest(server, "actions/checkout", "action.yml", "v4", NODE20).await);
    mocks.extend(
        serve_manifest(
            server,
            "org/setup-toolchain",
            "action.yml",
            "v2",
            &action_fixture("setup-toolchain"),
        )
        .await,
    );
    mocks.push(serve_missing(server, "actions/cache", "action.yml").await);
    mocks.extend(serve_manifest(server, "actions/cache", "action.yaml", "v4", NODE20).await);
    mocks.extend(
        serve_manifest(
            server,
            "org/setup-toolchain",
            "download/action.yml",
            "v2",
            &action_fixture("node16"),
        )
        .await,
    );
    mocks.extend(serve_manifest(server, "org/setup-toolchain", "publish/action.yml", "v2", NODE20).await);
    mocks
}

async fn resolve_ci(client: &GitHubClient) -> ResolvedWorkflow {
    let path = workflow_fixture("ci.yml");
    let workflow = Workflow::parse_file(&path).unwrap();
    let resolver = DependencyResolver::new(client, ResolverConfig::default());
    resolver.resolve_workflow(&workflow, "ci.yml").await.unwrap()
}

fn labels(action: &Action) -> Vec<String> {
    let mut out = vec![action.label()];
    for dependent in &action.dependents {
        out.extend(labels(dependent));
    }
    out
}

// ─── Workflow parsing ───

#[test]
fn test_parse_ci_workflow() {
    let workflow = Workflow::parse_file(&workflow_fixture("ci.yml")).unwrap();

    assert_eq!(workflow.name.as_deref(), Some("CI"));
    let jobs: Vec<&str> = workflow.jobs.keys().map(String::as_str).collect();
    assert_eq!(jobs, ["build", "package"]);
    assert_eq!(workflow.step_count(), 6);

    let build = &workflow.jobs["build"];
    assert_eq!(build.steps[1].label(), "org/setup-toolchain@v2");
    assert_eq!(build.steps[2].label(), "Build");
    assert!(build.steps[2].action_ref().is_none());

    let package = &workflow.jobs["package"];
    assert!(matches!(
        package.steps[0].action_ref(),
        Some(Ok(ActionRef::Local { .. }))
    ));
    assert!(matches!(
        package.steps[1].action_ref(),
        Some(Ok(ActionRef::Docker { .. }))
    ));
    let publish = package.steps[2].action_ref().unwrap().unwrap();
    assert_eq!(publish.repository(), "org/setup-toolchain");
    assert_eq!(publish.path(), "publish");
    assert_eq!(publish.git_ref(), "v2");
}

#[test]
fn test_parse_composite_manifest_fixture() {
    let action = Action::parse(&action_fixture("setup-toolchain")).unwrap();
    assert!(action.is_composite());
    assert_eq!(action.steps().len(), 3);
    assert_eq!(action.node_version().unwrap(), None);

    let download = Action::parse(&action_fixture("node16")).unwrap();
    assert!(download.is_javascript());
    assert_eq!(download.node_version().unwrap(), Some(16));
}

// ─── Resolution ───

#[tokio::test]
async fn test_resolve_ci_workflow() {
    let mut server = mockito::Server::new_async().await;
    let _mocks = serve_ci_actions(&mut server).await;
    let client = client(&server);

    let resolved = resolve_ci(&client).await;

    assert_eq!(resolved.name, "CI");
    assert_eq!(resolved.jobs.len(), 2);
    assert_eq!(resolved.action_count(), 5);

    let build = &resolved.jobs[0];
    assert_eq!(build.name, "build");
    assert_eq!(build.steps.len(), 3);
    let checkout = build.steps[0].action.as_ref().unwrap();
    assert!(checkout.dependents.is_empty());
    let setup = build.steps[1].action.as_ref().unwrap();
    assert_eq!(
        labels(setup),
        [
            "org/setup-toolchain@v2",
            "actions/cache@v4",
            "org/setup-toolchain/download@v2"
        ]
    );
    assert!(build.steps[2].reference.is_none());
    assert!(build.steps[2].action.is_none());

    let package = &resolved.jobs[1];
    assert!(package.steps[0].reference.is_some());
    assert!(package.steps[0].action.is_none());
    assert!(package.steps[1].action.is_none());
    assert_eq!(
        package.steps[2].action.as_ref().unwrap().label(),
        "org/setup-toolchain/publish@v2"
    );
}

#[tokio::test]
async fn test_missing_manifest_aborts_resolution() {
    let mut server = mockito::Server::new_async().await;
    let _yml = serve_missing(&mut server, "org/gone", "action.yml").await;
    let _yaml = serve_missing(&mut server, "org/gone", "action.yaml").await;
    let client = client(&server);

    let workflow = Workflow::parse("jobs:\n  build:\n    steps:\n      - uses: org/gone@v1\n").unwrap();
    let resolver = DependencyResolver::new(&client, ResolverConfig::default());
    let err = resolver.resolve_workflow(&workflow, "gone.yml").await.unwrap_err();

    match err {
        AuditError::ManifestMissing {
            primary, secondary, ..
        } => {
            assert_eq!(primary, "action.yml");
            assert_eq!(secondary, "action.yaml");
        }
        other => panic!("expected ManifestMissing, got {other:?}"),
    }
}

#[tokio::test]
async fn test_inline_only_workflow_makes_no_requests() {
    let mut server = mockito::Server::new_async().await;
    let untouched = server
        .mock("GET", Matcher::Any)
        .expect(0)
        .create_async()
        .await;
    let client = client(&server);

    let workflow = Workflow::parse_file(&workflow_fixture("inline-only.yaml")).unwrap();
    let resolver = DependencyResolver::new(&client, ResolverConfig::default());
    let resolved = resolver.resolve_workflow(&workflow, "inline-only.yaml").await.unwrap();

    assert_eq!(resolved.action_count(), 0);
    assert_eq!(resolved.jobs[0].steps[1].label, "clippy");
    untouched.assert_async().await;
}

// ─── Scanning ───

#[tokio::test]
async fn test_scan_ci_workflow() {
    let mut server = mockito::Server::new_async().await;
    let _mocks = serve_ci_actions(&mut server).await;
    let _checkout = serve_repository(&mut server, "actions/checkout", "actions/checkout").await;
    let _cache = serve_repository(&mut server, "actions/cache", "actions/cache").await;
    let toolchain = server
        .mock("GET", "/repos/org/setup-toolchain")
        .with_status(200)
        .with_body(r#"{"id":9,"name":"setup-toolchain","full_name":"new-org/setup-toolchain","owner":{"login":"new-org"}}"#)
        .expect(1)
        .create_async()
        .await;
    let client = client(&server);

    let resolved = resolve_ci(&client).await;
    let checks = ChecksConfig {
        latest_release: false,
        ..Default::default()
    };
    let report = analyzer::audit(&client, &checks, &resolved).await;

    assert_eq!(report.jobs.len(), 2);
    assert_eq!(report.action_count(), 5);
    assert_eq!(report.eol_count(), 1);
    assert_eq!(report.repo_jacking_count(), 3);
    assert_eq!(report.outdated_count(), 0);
    assert!(report.errors.is_empty());

    let build: Vec<(&str, usize)> = report.jobs[0]
        .results
        .iter()
        .map(|r| (r.action.as_str(), r.depth))
        .collect();
    assert_eq!(
        build,
        [
            ("actions/checkout@v4", 0),
            ("org/setup-toolchain@v2", 0),
            ("actions/cache@v4", 1),
            ("org/setup-toolchain/download@v2", 1),
        ]
    );

    let download = &report.jobs[0].results[3];
    assert_eq!(download.node_version_eol, Verdict::Yes);
    assert_eq!(download.repo_jacking_possible, Verdict::Yes);
    assert!(download
        .repo_jacking_comment
        .as_deref()
        .unwrap()
        .contains("new-org/setup-toolchain"));
    assert_eq!(download.latest_release, Verdict::NotScanned);

    let setup = &report.jobs[0].results[1];
    assert_eq!(setup.node_version_eol, Verdict::NotApplicable);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["jobs"][0]["results"][0]["node_version_eol"], "false");
    assert_eq!(json["jobs"][0]["results"][0]["latest_release"], "Not Scanned");

    toolchain.assert_async().await;
}

// ─── Graph export ───

#[tokio::test]
async fn test_graph_ci_workflow() {
    let mut server = mockito::Server::new_async().await;
    let _mocks = serve_ci_actions(&mut server).await;
    let client = client(&server);

    let resolved = resolve_ci(&client).await;
    let deps = DependencyGraph::from_workflow(&resolved);

    assert_eq!(deps.graph.node_count(), 5);
    assert_eq!(deps.graph.edge_count(), 2);
    assert_eq!(deps.clusters[1].0, "package");
    assert_eq!(deps.clusters[1].1.len(), 1);

    let dot = graph::to_dot(&deps);
    assert!(dot.contains("subgraph cluster_1 {"));
    assert!(dot.contains("n1 -> n2;"));
    assert!(dot.contains("label=\"org/setup-toolchain/download@v2\""));

    let mermaid = graph::to_mermaid(&deps);
    assert!(mermaid.contains("subgraph job0[\"build\"]"));
    assert!(mermaid.contains("n1 --> n3"));
}
