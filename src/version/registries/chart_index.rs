//! Helm chart repository index (`index.yaml`) lookup

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use tracing::{debug, warn};

use crate::version::dotted::normalize_version;
use crate::version::error::RegistryError;
use crate::version::registry::{ChartRelease, ChartSource};

/// Substrings that mark a chart version as a pre-release
const UNSTABLE_MARKERS: [&str; 2] = ["alpha", "beta"];

/// The parts of a chart index this crate reads
#[derive(Debug, Deserialize)]
struct ChartIndex {
    #[serde(default)]
    entries: IndexMap<String, Vec<ChartEntry>>,
}

/// One published release of a chart
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartEntry {
    #[serde(default, deserialize_with = "scalar_string")]
    pub version: String,
    #[serde(default, deserialize_with = "scalar_string")]
    pub app_version: String,
}

/// Accepts unquoted numeric scalars such as `appVersion: 2.0` as strings.
fn scalar_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_yaml::Value::deserialize(deserializer)? {
        serde_yaml::Value::String(s) => s,
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        _ => String::new(),
    })
}

/// Select the first stable entry of `chart_name` in document order.
///
/// Chart indexes list entries newest first, so no version comparison is done here.
pub fn select_latest_stable(
    index_yaml: &str,
    chart_name: &str,
) -> Result<ChartRelease, RegistryError> {
    let index: ChartIndex = serde_yaml::from_str(index_yaml)?;

    let entries = index
        .entries
        .get(chart_name)
        .ok_or_else(|| RegistryError::NotFound(format!("chart {}", chart_name)))?;

    let stable = entries
        .iter()
        .find(|entry| {
            !UNSTABLE_MARKERS
                .iter()
                .any(|marker| entry.version.contains(marker))
        })
        .ok_or_else(|| RegistryError::NoStableVersion(chart_name.to_string()))?;

    debug!(
        chart = chart_name,
        version = %stable.version,
        app_version = %stable.app_version,
        "selected latest stable chart entry"
    );

    Ok(ChartRelease {
        version: normalize_version(&stable.version),
        app_version: stable.app_version.clone(),
    })
}

/// Chart index lookup over plain, unauthenticated HTTP
pub struct ChartIndexRegistry {
    client: reqwest::Client,
}

impl ChartIndexRegistry {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("chart-updater")
                .build()
                .expect("Failed to create HTTP client"),
        }
    }
}

impl Default for ChartIndexRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ChartSource for ChartIndexRegistry {
    async fn latest_stable_version(
        &self,
        index_url: &str,
        chart_name: &str,
    ) -> Result<ChartRelease, RegistryError> {
        let response = self.client.get(index_url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(RegistryError::NotFound(index_url.to_string()));
        }

        if !status.is_success() {
            warn!("Chart index returned status {}: {}", status, index_url);
            return Err(RegistryError::Http(status));
        }

        let body = response.text().await?;
        select_latest_stable(&body, chart_name)
    }
}
