//! Error types for the completion boundary.

use thiserror::Error;

/// Errors a completion backend can produce.
///
/// None of these are fatal to the extraction pipeline; the orchestrator
/// treats every variant as a trigger for the regex fallback tier.
#[derive(Error, Debug)]
pub enum CompletionError {
    /// Transport-level failure (DNS, connect, TLS, broken stream).
    #[error("network error: {0}")]
    Network(String),

    /// The service answered with a non-success status.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The request exceeded the configured deadline.
    #[error("completion request timed out")]
    Timeout,

    /// The backend is not usable as configured (missing key, bad endpoint).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The service answered but the payload was not usable.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for CompletionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CompletionError::Timeout
        } else {
            CompletionError::Network(err.to_string())
        }
    }
}
