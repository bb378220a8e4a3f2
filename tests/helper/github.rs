//! Mock GitHub and chart repository endpoints

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use mockito::{Matcher, Mock, ServerGuard};
use serde_json::json;

use chart_updater::config::{ChartSettings, UpdaterConfig};
use chart_updater::reconcile::ReconcileSettings;
use chart_updater::remote::store::Repository;
use chart_updater::targets::TargetSettings;

/// Config pointing every endpoint at `server`
pub fn test_config(server: &ServerGuard, baseline: &str) -> UpdaterConfig {
    UpdaterConfig {
        api_url: server.url(),
        token: "secret".to_string(),
        auth_user: "octo".to_string(),
        source: Repository::new("grafana", "loki"),
        chart: ChartSettings {
            index_url: format!("{}/index.yaml", server.url()),
            name: "loki".to_string(),
            baseline_version: baseline.to_string(),
        },
        reconcile: ReconcileSettings::default(),
        targets: TargetSettings {
            owner: "octo".to_string(),
            homelab_repo: "homelab".to_string(),
            values_repo: "homelab-updater".to_string(),
            helm_charts_repo: "helm-charts".to_string(),
            image_repo_prefix: "docker-".to_string(),
            branch: "main".to_string(),
            argocd_app_dir: "apps".to_string(),
            values_file: "values-optional.yaml".to_string(),
            values_chart_name: "loki".to_string(),
            chart_name: "loki".to_string(),
        },
        committer: None,
        output_file: None,
        dry_run: false,
    }
}

pub async fn mock_chart_index(server: &mut ServerGuard, body: &str) -> Mock {
    server
        .mock("GET", "/index.yaml")
        .with_status(200)
        .with_header("content-type", "application/x-yaml")
        .with_body(body)
        .create_async()
        .await
}

pub async fn mock_latest_release(server: &mut ServerGuard, tag: &str) -> Mock {
    server
        .mock("GET", "/repos/grafana/loki/releases/latest")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "tag_name": tag }).to_string())
        .create_async()
        .await
}

pub async fn mock_contents_get(
    server: &mut ServerGuard,
    repo: &str,
    path: &str,
    content: &str,
    sha: &str,
) -> Mock {
    server
        .mock("GET", format!("/repos/octo/{}/contents/{}", repo, path).as_str())
        .match_query(Matcher::UrlEncoded("ref".into(), "main".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "path": path,
                "sha": sha,
                "content": STANDARD.encode(content),
                "encoding": "base64",
            })
            .to_string(),
        )
        .create_async()
        .await
}

pub async fn mock_contents_put(
    server: &mut ServerGuard,
    repo: &str,
    path: &str,
    sha: &str,
) -> Mock {
    server
        .mock("PUT", format!("/repos/octo/{}/contents/{}", repo, path).as_str())
        .match_body(Matcher::PartialJson(json!({ "sha": sha, "branch": "main" })))
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await
}

/// Blob, ref, commit, tree, branch and pull request endpoints for one repository
pub async fn mock_pull_request_flow(
    server: &mut ServerGuard,
    repo: &str,
    branch: &str,
    blob_contains: &str,
    pr_number: u32,
) -> Vec<Mock> {
    let base = format!("/repos/octo/{}", repo);
    vec![
        server
            .mock("POST", format!("{}/git/blobs", base).as_str())
            .match_body(Matcher::Regex(regex::escape(blob_contains)))
            .with_status(201)
            .with_body(json!({ "sha": format!("{}-blob", repo) }).to_string())
            .create_async()
            .await,
        server
            .mock("GET", format!("{}/git/ref/heads/main", base).as_str())
            .with_status(200)
            .with_body(json!({ "object": { "sha": format!("{}-tip", repo) } }).to_string())
            .create_async()
            .await,
        server
            .mock("GET", format!("{}/git/commits/{}-tip", base, repo).as_str())
            .with_status(200)
            .with_body(json!({ "tree": { "sha": format!("{}-tree", repo) } }).to_string())
            .create_async()
            .await,
        server
            .mock("POST", format!("{}/git/trees", base).as_str())
            .match_body(Matcher::PartialJson(
                json!({ "base_tree": format!("{}-tree", repo) }),
            ))
            .with_status(201)
            .with_body(json!({ "sha": format!("{}-new-tree", repo) }).to_string())
            .create_async()
            .await,
        server
            .mock("POST", format!("{}/git/commits", base).as_str())
            .match_body(Matcher::PartialJson(json!({
                "tree": format!("{}-new-tree", repo),
                "parents": [format!("{}-tip", repo)],
            })))
            .with_status(201)
            .with_body(json!({ "sha": format!("{}-commit", repo) }).to_string())
            .create_async()
            .await,
        server
            .mock("POST", format!("{}/git/refs", base).as_str())
            .match_body(Matcher::PartialJson(json!({
                "ref": format!("refs/heads/{}", branch),
                "sha": format!("{}-commit", repo),
            })))
            .with_status(201)
            .with_body("{}")
            .create_async()
            .await,
        server
            .mock("POST", format!("{}/pulls", base).as_str())
            .match_body(Matcher::PartialJson(json!({ "head": branch, "base": "main" })))
            .with_status(201)
            .with_body(
                json!({
                    "html_url": format!("https://github.com/octo/{}/pull/{}", repo, pr_number)
                })
                .to_string(),
            )
            .create_async()
            .await,
    ]
}
