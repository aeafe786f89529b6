//! Nekokai error types

use std::time::Duration;

/// Nekokai error types
#[derive(Debug, thiserror::Error)]
pub enum NekokaiError {
    // Upstream/network errors
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("upstream request timed out after {0:?}")]
    Timeout(Duration),

    /// The upstream answered 2xx but the body did not contain the expected
    /// payload (e.g. a GraphQL `errors` array with no `data`).
    #[error("malformed upstream payload: {0}")]
    Payload(String),

    // Data errors
    #[error("invalid selection key: {0}")]
    InvalidSelectionKey(String),

    // Cache backend errors. These never escape the store layer; they exist so
    // backends can use `?` internally before logging and failing open.
    #[error("cache backend error: {0}")]
    Cache(String),

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("missing credentials for {0}")]
    MissingCredentials(&'static str),
}

impl NekokaiError {
    /// Whether this error belongs to the "upstream fetch failed" class.
    ///
    /// Timeouts, non-2xx statuses, transport failures and undecodable bodies
    /// all collapse into this one outcome at the orchestrator boundary.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            NekokaiError::Http(_)
                | NekokaiError::Api { .. }
                | NekokaiError::Timeout(_)
                | NekokaiError::Payload(_)
        )
    }
}

impl From<reqwest::Error> for NekokaiError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            NekokaiError::Api {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else if err.is_decode() {
            NekokaiError::Payload(err.to_string())
        } else {
            NekokaiError::Http(err.to_string())
        }
    }
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for NekokaiError {
    fn from(err: redis::RedisError) -> Self {
        NekokaiError::Cache(err.to_string())
    }
}

/// Result type alias for Nekokai operations
pub type Result<T> = std::result::Result<T, NekokaiError>;
