//! Error types for Berth

use thiserror::Error;

/// Result type for Berth operations
pub type Result<T> = std::result::Result<T, BerthError>;

/// Berth error types
#[derive(Error, Debug)]
pub enum BerthError {
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Compose file parse error: {0}")]
    ComposeParse(String),

    #[error("Invalid definition: {0}")]
    InvalidDefinition(String),

    #[error("Unknown service type: {0}")]
    UnknownService(String),

    #[error("Deployment of {service_id} failed: {message}")]
    Deployment { service_id: String, message: String },

    #[error("Destruction of {service_id} failed: {message}")]
    Destruction { service_id: String, message: String },

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Lock error: {0}")]
    Lock(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(String),
}

impl BerthError {
    /// Build a deployment error for a service id
    pub fn deployment(service_id: &str, message: impl Into<String>) -> Self {
        BerthError::Deployment {
            service_id: service_id.to_string(),
            message: message.into(),
        }
    }

    /// Build a destruction error for a service id
    pub fn destruction(service_id: &str, message: impl Into<String>) -> Self {
        BerthError::Destruction {
            service_id: service_id.to_string(),
            message: message.into(),
        }
    }
}
