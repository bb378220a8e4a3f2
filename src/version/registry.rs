//! Source traits for resolving upstream versions

#[cfg(test)]
use mockall::automock;

use crate::version::error::RegistryError;

/// Latest stable entry of a chart in a chart index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartRelease {
    /// Chart version, normalized to at most three components without a `v` prefix
    pub version: String,
    /// Application version bundled by that chart version, as published
    pub app_version: String,
}

/// Trait for looking up the newest release identifier of a source repository
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait ReleaseSource: Send + Sync {
    /// Fetches the latest tag of `owner/repo` with any leading `v` removed
    ///
    /// # Returns
    /// * `Ok(String)` - The tag of the latest release, or of the first listed tag
    /// * `Err(RegistryError::NotFound)` - If the repository has neither releases nor tags
    async fn latest_tag(&self, owner: &str, repo: &str) -> Result<String, RegistryError>;
}

/// Trait for reading a Helm chart repository index
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait ChartSource: Send + Sync {
    /// Fetches the index at `index_url` and picks the first stable entry of `chart_name`
    async fn latest_stable_version(
        &self,
        index_url: &str,
        chart_name: &str,
    ) -> Result<ChartRelease, RegistryError>;
}
