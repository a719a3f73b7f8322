//! Errors raised by the token-exchange calls.
//!
//! Discovery and publishing never surface these as `Err`; they fold them into
//! partial listings or [`crate::PublishResult::Failure`].

use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("Facebook app id/secret not configured")]
    NotConfigured,

    /// Connection failure, timeout or other transport problem
    #[error("Graph API request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Graph API error {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("Failed to decode Graph API response: {0}")]
    Decode(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl GraphError {
    /// HTTP status when the server answered at all
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            GraphError::Status { status, .. } => Some(*status),
            GraphError::Request(e) => e.status(),
            _ => None,
        }
    }
}
