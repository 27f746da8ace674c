//! Error types for tfplug

/// Errors raised by the framework itself; provider errors are reported as diagnostics
#[derive(Debug, thiserror::Error)]
pub enum TfplugError {
    #[error("no resource type named {0}")]
    ResourceNotFound(String),

    #[error("no data source type named {0}")]
    DataSourceNotFound(String),

    #[error("provider has not been configured")]
    ProviderNotConfigured,

    #[error("invalid provider configuration: {0}")]
    InvalidConfiguration(String),

    #[error("attribute {0} is not set")]
    AttributeNotFound(String),

    #[error("attribute {path} is {actual}, expected {expected}")]
    TypeMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    #[error("cannot address {path}: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TfplugError>;
