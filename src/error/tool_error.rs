use thiserror::Error;

/// Capability-level errors
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Missing input: {0}")]
    MissingInput(String),
    #[error("Input validation error: {0}")]
    InputValidationError(String),
    #[error("HTTP error: {0}")]
    HttpError(String),
    #[error("Provider error: {0}")]
    ProviderError(String),
    #[error("Transport error: {0}")]
    TransportError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("No executor registered for tool type: {0}")]
    ExecutorNotRegistered(String),
}

impl From<serde_json::Error> for ToolError {
    fn from(e: serde_json::Error) -> Self {
        ToolError::SerializationError(e.to_string())
    }
}

impl From<reqwest::Error> for ToolError {
    fn from(e: reqwest::Error) -> Self {
        ToolError::HttpError(e.to_string())
    }
}
