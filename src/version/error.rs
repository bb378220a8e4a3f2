use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Rate limited: retry after {retry_after_secs:?} seconds")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("No stable version found for chart {0}")]
    NoStableVersion(String),

    #[error("Unexpected status: {0}")]
    Http(reqwest::StatusCode),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Failed to parse chart index: {0}")]
    Parse(#[from] serde_yaml::Error),
}

impl RegistryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RegistryError::NotFound(_))
    }
}
