//! Transport errors raised by HTTP backends.
//!
//! These never leave the crate: the prober classifies every one of them into
//! a `ProbeOutcome`.

use thiserror::Error;

/// Result type alias for HTTP backend operations.
pub type ProbeHttpResult<T> = Result<T, ProbeHttpError>;

/// Failures below the HTTP status layer.
#[derive(Debug, Error)]
pub enum ProbeHttpError {
    /// No response within the request deadline.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// TCP/TLS connection could not be established.
    #[error("connection failed: {0}")]
    Connect(String),

    /// Response body could not be read to the end.
    #[error("failed to read response body: {0}")]
    Body(String),

    /// Any other client-side failure.
    #[error("HTTP client error: {0}")]
    Client(String),

    /// The provider base URL could not be joined with an endpoint path.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl From<reqwest::Error> for ProbeHttpError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e.to_string())
        } else if e.is_connect() {
            Self::Connect(e.to_string())
        } else if e.is_body() || e.is_decode() {
            Self::Body(e.to_string())
        } else {
            Self::Client(e.to_string())
        }
    }
}
