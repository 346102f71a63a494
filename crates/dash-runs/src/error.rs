use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid label filter '{0}': expected key=value")]
    InvalidLabelFilter(String),

    #[error("unknown status filter '{0}': expected all|cancelled|failed|running|succeeded")]
    UnknownStatusFilter(String),
}

pub type Result<T> = std::result::Result<T, DashError>;
