//! GitHub Contents and Git Data API implementation of [`RemoteStore`]

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, warn};

use crate::remote::error::EditError;
use crate::remote::store::{
    BranchTip, FileCommit, FileLocation, PullRequest, RemoteFile, RemoteStore, Repository,
};

/// GitHub REST API version sent with every request
const API_VERSION: &str = "2022-11-28";

#[derive(Debug, Deserialize)]
struct ContentResponse {
    path: String,
    sha: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    encoding: String,
}

#[derive(Debug, Deserialize)]
struct ShaResponse {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct RefResponse {
    object: ShaResponse,
}

#[derive(Debug, Deserialize)]
struct CommitResponse {
    tree: ShaResponse,
}

#[derive(Debug, Deserialize)]
struct PullRequestResponse {
    html_url: String,
}

/// Remote store backed by the GitHub REST API
pub struct GitHubStore {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl GitHubStore {
    /// Creates a new GitHubStore with a custom base URL
    pub fn new(base_url: &str, token: &str) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("chart-updater")
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    fn repo_url(&self, repository: &Repository, rest: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.base_url, repository.owner, repository.name, rest
        )
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
            .bearer_auth(&self.token)
    }

    /// Turn a non-success response into an `Api` error for `step`.
    async fn check(
        step: &'static str,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, EditError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        warn!("GitHub {} failed with {}: {}", step, status, message);
        Err(EditError::Api {
            step,
            status,
            message,
        })
    }

    async fn post<T: DeserializeOwned>(
        &self,
        step: &'static str,
        url: &str,
        body: serde_json::Value,
    ) -> Result<T, EditError> {
        let response = self
            .request(reqwest::Method::POST, url)
            .json(&body)
            .send()
            .await?;
        let response = Self::check(step, response).await?;
        Ok(response.json().await?)
    }
}

fn decode_content(response: &ContentResponse) -> Result<String, EditError> {
    if !response.encoding.is_empty() && response.encoding != "base64" {
        return Err(EditError::Encoding(format!(
            "unsupported encoding {} for {}",
            response.encoding, response.path
        )));
    }

    // GitHub wraps base64 content at 60 columns
    let compact: String = response
        .content
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let bytes = STANDARD
        .decode(compact)
        .map_err(|e| EditError::Encoding(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| EditError::Encoding(e.to_string()))
}

#[async_trait::async_trait]
impl RemoteStore for GitHubStore {
    async fn get_file(
        &self,
        location: &FileLocation,
    ) -> Result<RemoteFile, EditError> {
        let url = format!(
            "{}?ref={}",
            self.repo_url(&location.repository, &format!("contents/{}", location.path)),
            location.branch
        );
        debug!("GET {}", url);

        let response = self.request(reqwest::Method::GET, &url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(EditError::NotFound(location.to_string()));
        }

        if !status.is_success() {
            let reason = response.text().await.unwrap_or_default();
            return Err(EditError::Read {
                path: location.to_string(),
                reason: format!("{}: {}", status, reason),
            });
        }

        let body: ContentResponse = response.json().await.map_err(|e| EditError::Read {
            path: location.to_string(),
            reason: e.to_string(),
        })?;

        Ok(RemoteFile {
            content: decode_content(&body)?,
            path: body.path,
            sha: body.sha,
        })
    }

    async fn put_file(
        &self,
        location: &FileLocation,
        commit: &FileCommit,
    ) -> Result<(), EditError> {
        let url = self.repo_url(&location.repository, &format!("contents/{}", location.path));
        let mut body = json!({
            "message": commit.message,
            "content": STANDARD.encode(commit.content.as_bytes()),
            "branch": location.branch,
            "sha": commit.sha,
        });
        if let Some(committer) = &commit.committer {
            body["committer"] = json!({
                "name": committer.name,
                "email": committer.email,
            });
        }

        let response = self
            .request(reqwest::Method::PUT, &url)
            .json(&body)
            .send()
            .await?;

        match response.status() {
            reqwest::StatusCode::CONFLICT | reqwest::StatusCode::PRECONDITION_FAILED => {
                Err(EditError::WriteConflict(location.to_string()))
            }
            reqwest::StatusCode::UNPROCESSABLE_ENTITY => {
                let status = response.status();
                let message = response.text().await.unwrap_or_default();
                if message.contains("does not match") {
                    return Err(EditError::WriteConflict(location.to_string()));
                }
                warn!("GitHub contents update failed with {}: {}", status, message);
                Err(EditError::Api {
                    step: "contents update",
                    status,
                    message,
                })
            }
            _ => Self::check("contents update", response).await.map(|_| ()),
        }
    }

    async fn create_blob(
        &self,
        repository: &Repository,
        content: &str,
    ) -> Result<String, EditError> {
        let url = self.repo_url(repository, "git/blobs");
        let blob: ShaResponse = self
            .post(
                "blob creation",
                &url,
                json!({ "content": content, "encoding": "utf-8" }),
            )
            .await?;
        Ok(blob.sha)
    }

    async fn branch_tip(
        &self,
        repository: &Repository,
        branch: &str,
    ) -> Result<BranchTip, EditError> {
        let ref_url = self.repo_url(repository, &format!("git/ref/heads/{}", branch));
        let response = self.request(reqwest::Method::GET, &ref_url).send().await?;
        let git_ref: RefResponse = Self::check("ref lookup", response).await?.json().await?;

        let commit_url = self.repo_url(repository, &format!("git/commits/{}", git_ref.object.sha));
        let response = self.request(reqwest::Method::GET, &commit_url).send().await?;
        let commit: CommitResponse = Self::check("commit lookup", response).await?.json().await?;

        Ok(BranchTip {
            commit_sha: git_ref.object.sha,
            tree_sha: commit.tree.sha,
        })
    }

    async fn create_tree(
        &self,
        repository: &Repository,
        base_tree: &str,
        path: &str,
        blob_sha: &str,
    ) -> Result<String, EditError> {
        let url = self.repo_url(repository, "git/trees");
        let tree: ShaResponse = self
            .post(
                "tree creation",
                &url,
                json!({
                    "base_tree": base_tree,
                    "tree": [{
                        "path": path,
                        "mode": "100644",
                        "type": "blob",
                        "sha": blob_sha,
                    }],
                }),
            )
            .await?;
        Ok(tree.sha)
    }

    async fn create_commit(
        &self,
        repository: &Repository,
        message: &str,
        tree_sha: &str,
        parent_sha: &str,
    ) -> Result<String, EditError> {
        let url = self.repo_url(repository, "git/commits");
        let commit: ShaResponse = self
            .post(
                "commit creation",
                &url,
                json!({
                    "message": message,
                    "tree": tree_sha,
                    "parents": [parent_sha],
                }),
            )
            .await?;
        Ok(commit.sha)
    }

    async fn create_branch(
        &self,
        repository: &Repository,
        branch: &str,
        commit_sha: &str,
    ) -> Result<(), EditError> {
        let url = self.repo_url(repository, "git/refs");
        let _: serde_json::Value = self
            .post(
                "branch creation",
                &url,
                json!({
                    "ref": format!("refs/heads/{}", branch),
                    "sha": commit_sha,
                }),
            )
            .await?;
        Ok(())
    }

    async fn create_pull_request(
        &self,
        repository: &Repository,
        pull_request: &PullRequest,
    ) -> Result<String, EditError> {
        let url = self.repo_url(repository, "pulls");
        let created: PullRequestResponse = self
            .post(
                "pull request creation",
                &url,
                json!({
                    "title": pull_request.title,
                    "body": pull_request.body,
                    "head": pull_request.head,
                    "base": pull_request.base,
                }),
            )
            .await?;
        Ok(created.html_url)
    }
}
