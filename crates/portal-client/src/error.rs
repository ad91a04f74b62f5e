//! Error types for the authentication negotiator.

use reqwest::StatusCode;
use thiserror::Error;

/// Failure modes of a login attempt.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The exchange never completed, or the server answered with a
    /// non-success status.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server established a session for a different user than the one
    /// submitted. Application-level, not a network failure.
    #[error("auth failure: server returned user `{returned}` for submitted user `{submitted}`")]
    UserMismatch { submitted: String, returned: String },

    /// Username not usable with the mock strategy.
    #[error("username `{0}` is not supported by mock login")]
    UnsupportedUser(String),

    /// The CAS response was neither layout JSON nor a recognizable login form.
    #[error("CAS login form not recognized")]
    FormNotRecognized,

    /// The response body could not be decoded as a layout payload.
    #[error("layout payload could not be decoded: {0}")]
    Payload(#[from] serde_json::Error),
}

impl AuthError {
    /// HTTP status carried by the failure, when there is one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            AuthError::Transport(e) => e.status(),
            _ => None,
        }
    }
}
