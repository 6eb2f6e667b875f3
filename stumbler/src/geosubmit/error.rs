use thiserror::Error;

use super::TransportError;

/// Errors from the geosubmit client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    /// The HTTP exchange failed.
    #[error(transparent)]
    Transport(TransportError),

    /// The server rejected the request or sent a malformed answer.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The request could not be encoded.
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// The configured endpoint is not a valid URL.
    #[error("Invalid endpoint URL '{url}': {reason}")]
    InvalidEndpoint { url: String, reason: String },
}

impl SubmitError {
    /// Whether the caller may retry the same call later.
    pub fn is_retryable(&self) -> bool {
        match self {
            SubmitError::Transport(e) => e.is_retryable(),
            SubmitError::Protocol(_)
            | SubmitError::Serialization(_)
            | SubmitError::InvalidEndpoint { .. } => false,
        }
    }
}

impl From<TransportError> for SubmitError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Status { status, body } => {
                SubmitError::Protocol(format!("HTTP {}: {}", status, body))
            }
            other => SubmitError::Transport(other),
        }
    }
}
