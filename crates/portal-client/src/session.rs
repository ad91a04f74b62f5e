//! Session payload and the credential model.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// Server-returned session payload: the authenticated user plus whatever
/// layout data the portal responded with. The negotiator hands the whole
/// payload to the caller and retains nothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// The user the portal established the session for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// Layout payload, untyped: module lists, folders, per-user preferences.
    #[serde(flatten)]
    pub layout: serde_json::Map<String, serde_json::Value>,
}

impl Session {
    /// Whether the session belongs to `username`.
    pub fn is_for(&self, username: &str) -> bool {
        self.user.as_deref() == Some(username)
    }
}

/// A username/password pair held in memory for the duration of a login
/// attempt. An incomplete pair denotes a guest-session request.
///
/// The password is a [`SecretString`] so `Debug` output and tracing fields
/// stay redacted.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    username: Option<String>,
    password: Option<SecretString>,
}

impl Credentials {
    /// Guest credentials: no username, no password.
    pub fn guest() -> Self {
        Self::default()
    }

    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            password: Some(SecretString::from(password.into())),
        }
    }

    /// The submitted username, when present and non-empty.
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref().filter(|u| !u.is_empty())
    }

    pub(crate) fn password(&self) -> Option<&str> {
        self.password
            .as_ref()
            .map(|p| p.expose_secret())
            .filter(|p| !p.is_empty())
    }

    /// Both fields present and non-empty. Anything less requests a guest
    /// session.
    pub fn is_complete(&self) -> bool {
        self.username().is_some() && self.password().is_some()
    }
}
