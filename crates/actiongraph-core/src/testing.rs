//! Mock GitHub API helpers shared by unit tests.

use crate::providers::github_api::GitHubClient;
use mockito::{Matcher, Mock, ServerGuard};
use std::time::Duration;

pub(crate) const NODE20_MANIFEST: &str = "name: Leaf\nruns:\n  using: node20\n  main: index.js\n";
pub(crate) const NODE16_MANIFEST: &str = "name: Old Leaf\nruns:\n  using: node16\n  main: index.js\n";

pub(crate) fn mock_client(server: &ServerGuard) -> GitHubClient {
    GitHubClient::with_base_url(&server.url(), None, Duration::from_secs(5)).unwrap()
}

/// Composite manifest whose steps call each of `uses` in order, with one inline step first.
pub(crate) fn composite_manifest(uses: &[&str]) -> String {
    let mut manifest = String::from(
        "name: Composite\nruns:\n  using: composite\n  steps:\n    - run: echo start\n      shell: bash\n",
    );
    for reference in uses {
        manifest.push_str(&format!("    - uses: {}\n", reference));
    }
    manifest
}

/// Serve a manifest through the contents API and a raw download URL.
/// The returned mocks must be kept alive for as long as they should answer.
pub(crate) async fn mock_manifest(
    server: &mut ServerGuard,
    repository: &str,
    path: &str,
    git_ref: &str,
    filename: &str,
    body: &str,
) -> Vec<Mock> {
    let file = if path.is_empty() {
        filename.to_string()
    } else {
        format!("{}/{}", path, filename)
    };
    let commitish = if git_ref.is_empty() { "HEAD" } else { git_ref };
    let raw_path = format!("/raw/{}/{}/{}", repository, commitish, file);
    let query = if git_ref.is_empty() {
        Matcher::Any
    } else {
        Matcher::UrlEncoded("ref".into(), git_ref.into())
    };

    let contents = server
        .mock("GET", format!("/repos/{}/contents/{}", repository, file).as_str())
        .match_query(query)
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

pub(crate) async fn mock_missing(server: &mut ServerGuard, repository: &str, file: &str) -> Mock {
    server
        .mock("GET", format!("/repos/{}/contents/{}", repository, file).as_str())
        .match_query(Matcher::Any)
        .with_status(404)
        .with_body(r#"{"message":"Not Found"}"#)
        .create_async()
        .await
}

pub(crate) async fn mock_json(server: &mut ServerGuard, path: &str, status: usize, body: &str) -> Mock {
    server
        .mock("GET", path)
        .with_status(status)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create_async()
        .await
}
