//! GitHub Releases/Tags API lookup of the latest source tag

use crate::version::error::RegistryError;
use crate::version::registry::ReleaseSource;
use serde::Deserialize;
use tracing::{debug, warn};

/// Default base URL for GitHub API
pub const DEFAULT_BASE_URL: &str = "https://api.github.com";

/// Response from the GitHub "latest release" endpoint
#[derive(Debug, Deserialize)]
struct Release {
    tag_name: String,
}

/// One entry of the GitHub tag list
#[derive(Debug, Deserialize)]
struct Tag {
    name: String,
}

/// Release lookup against the GitHub REST API
///
/// Requests carry basic-auth credentials so they count against the
/// authenticated rate limit.
pub struct GitHubReleases {
    client: reqwest::Client,
    base_url: String,
    username: String,
    token: String,
}

impl GitHubReleases {
    /// Creates a new GitHubReleases client with a custom base URL
    pub fn new(base_url: &str, username: &str, token: &str) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("chart-updater")
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
            username: username.to_string(),
            token: token.to_string(),
        }
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, RegistryError> {
        let response = self
            .client
            .get(url)
            .header("Accept", "application/vnd.github+json")
            .basic_auth(&self.username, Some(&self.token))
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            return Err(RegistryError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        Ok(response)
    }

    /// Falls back to the tag list when a repository publishes no releases.
    ///
    /// The first tag as ordered by GitHub is taken; no sorting is applied.
    async fn first_tag(&self, owner: &str, repo: &str) -> Result<String, RegistryError> {
        let url = format!("{}/repos/{}/{}/tags", self.base_url, owner, repo);
        let response = self.get(&url).await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(RegistryError::NotFound(format!("{}/{}", owner, repo)));
        }

        if !status.is_success() {
            warn!("GitHub API returned status {}: {}", status, url);
            return Err(RegistryError::Http(status));
        }

        let tags: Vec<Tag> = response.json().await.map_err(|e| {
            warn!("Failed to parse GitHub tags response: {}", e);
            RegistryError::InvalidResponse(e.to_string())
        })?;

        tags.into_iter()
            .next()
            .map(|tag| strip_v(&tag.name))
            .ok_or_else(|| RegistryError::NotFound(format!("{}/{} has no tags", owner, repo)))
    }
}

fn strip_v(tag: &str) -> String {
    tag.strip_prefix('v').unwrap_or(tag).to_string()
}

#[async_trait::async_trait]
impl ReleaseSource for GitHubReleases {
    async fn latest_tag(&self, owner: &str, repo: &str) -> Result<String, RegistryError> {
        let url = format!("{}/repos/{}/{}/releases/latest", self.base_url, owner, repo);
        let response = self.get(&url).await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            debug!("{}/{} has no releases, falling back to tags", owner, repo);
            return self.first_tag(owner, repo).await;
        }

        if !status.is_success() {
            warn!("GitHub API returned status {}: {}", status, url);
            return Err(RegistryError::Http(status));
        }

        let release: Release = response.json().await.map_err(|e| {
            warn!("Failed to parse GitHub release response: {}", e);
            RegistryError::InvalidResponse(e.to_string())
        })?;

        Ok(strip_v(&release.tag_name))
    }
}
