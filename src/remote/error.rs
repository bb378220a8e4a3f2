use thiserror::Error;

#[derive(Debug, Error)]
pub enum EditError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Failed to read {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Failed to parse YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Template wrapper not found in {0}")]
    TemplateNotFound(String),

    #[error("Field not found: {0}")]
    FieldNotFound(String),

    #[error("Field {path} is not a mapping (found {found})")]
    TypeMismatch { path: String, found: &'static str },

    #[error("Write conflict on {0}: file changed since it was read")]
    WriteConflict(String),

    #[error("GitHub API {step} failed with {status}: {message}")]
    Api {
        step: &'static str,
        status: reqwest::StatusCode,
        message: String,
    },

    #[error("Invalid file encoding: {0}")]
    Encoding(String),
}
