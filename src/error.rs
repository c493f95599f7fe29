//! Error types for fetching and decoding flow metrics.

use thiserror::Error;

/// Errors that can occur while fetching a flow snapshot from the backend.
#[derive(Debug, Error)]
pub enum FlowError {
    /// HTTP request failed or the backend answered with a non-success status.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Could not reach the backend.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The response did not match the expected result-set schema.
    #[error("Invalid response: {0}")]
    Schema(String),

    /// Reading a local result-set file failed.
    #[error("Read error: {0}")]
    Io(#[from] std::io::Error),

    /// Client configuration is unusable (bad URL, bad header value).
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<reqwest::Error> for FlowError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() {
            FlowError::Connection(err.to_string())
        } else if err.is_decode() {
            FlowError::Schema(err.to_string())
        } else {
            FlowError::Http(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FlowError {
    fn from(err: serde_json::Error) -> Self {
        FlowError::Schema(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_errors_become_schema_errors() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let flow: FlowError = err.into();
        assert!(matches!(flow, FlowError::Schema(_)));
        assert!(flow.to_string().starts_with("Invalid response"));
    }
}
