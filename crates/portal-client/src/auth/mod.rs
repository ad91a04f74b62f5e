//! Authentication negotiation for the portal session.
//!
//! Three strategies establish a session: a mock fixture endpoint, the
//! portal's local login servlet, and a CAS ticket flow that falls back to
//! the local servlet when credential submission fails.
//! [`Authenticator::establish_session`] is the unified entry point: it
//! dispatches on the configured strategy and broadcasts the outcome.

mod cas;
mod form;
mod local;
mod mock;

pub use form::{contains_login_form, parse_login_form, CasLoginForm};

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::Instrument;
use uuid::Uuid;

use crate::config::{LoginStrategy, PortalConfig};
use crate::error::AuthError;
use crate::events::{EventBus, Notification};
use crate::session::{Credentials, Session};

/// Negotiates portal sessions over HTTP.
///
/// Owns the HTTP client and the loaded configuration. The client keeps a
/// cookie store: the CAS credential submission must ride on the session
/// cookie set when the login page is fetched. Cheap to clone.
#[derive(Clone)]
pub struct Authenticator {
    client: reqwest::Client,
    config: Arc<PortalConfig>,
    events: EventBus,
}

impl Authenticator {
    /// Build an authenticator and its HTTP client from configuration.
    pub fn new(config: Arc<PortalConfig>, events: EventBus) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.login.timeout_secs))
            .cookie_store(true)
            .build()?;
        Ok(Self {
            client,
            config,
            events,
        })
    }

    /// Log in with the configured strategy.
    pub async fn login(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        match self.config.login.strategy {
            LoginStrategy::Mock => self.mock_login(credentials).await,
            LoginStrategy::Local => self.local_login(credentials).await,
            LoginStrategy::Cas => self.cas_login(credentials).await,
        }
    }

    /// Establish a session and broadcast the outcome.
    ///
    /// The one place all strategies share an observable contract: success
    /// publishes [`Notification::SessionEstablished`], failure
    /// [`Notification::SessionFailure`]. The result is also returned so
    /// callers that don't subscribe can branch directly.
    pub async fn establish_session(
        &self,
        credentials: &Credentials,
    ) -> Result<Session, AuthError> {
        let attempt_id = Uuid::new_v4();
        let strategy = self.config.login.strategy;
        let username = credentials.username().unwrap_or("guest");
        tracing::info!(
            strategy = %strategy.as_str(),
            username = %username,
            "establishing session"
        );

        let span = portal_tracing::login_attempt_span!(attempt_id, strategy.as_str(), username);
        let result = self.login(credentials).instrument(span.clone()).await;

        match &result {
            Ok(session) => {
                span.record("outcome", "established");
                if let Some(user) = session.user.as_deref() {
                    span.record("user", user);
                }
                tracing::info!(user = ?session.user, "session established");
                self.events.publish(Notification::SessionEstablished {
                    session: session.clone(),
                });
            }
            Err(err) => {
                span.record("outcome", "failed");
                tracing::error!(error = %err, username = %username, "login failed");
                self.events.publish(Notification::SessionFailure {
                    status: err.status().map(|s| s.as_u16()),
                    reason: err.to_string(),
                });
            }
        }

        result
    }

    /// Log the current user out, then log in as `credentials` with the
    /// configured strategy. A failed logout surfaces without a login
    /// attempt.
    pub async fn switch_user(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        let url = self.config.logout_servlet_url();
        tracing::info!(url = %url, "logging out");
        self.exchange(self.client.get(&url), &url).await?;
        self.login(credentials).await
    }

    /// Check the returned session against the submitted username. Guest
    /// requests (no username) accept whatever the server returns.
    fn validate_user(
        &self,
        credentials: &Credentials,
        session: Session,
    ) -> Result<Session, AuthError> {
        match credentials.username() {
            Some(username) if !session.is_for(username) => Err(AuthError::UserMismatch {
                submitted: username.to_string(),
                returned: session.user.clone().unwrap_or_default(),
            }),
            _ => Ok(session),
        }
    }

    /// Execute one HTTP exchange and return the response body, recording
    /// status and latency on an exchange span. Non-success statuses are
    /// errors.
    async fn exchange(
        &self,
        request: reqwest::RequestBuilder,
        target: &str,
    ) -> Result<String, AuthError> {
        let span = portal_tracing::servlet_exchange_span!(target);
        let start = Instant::now();

        async move {
            let response = request.send().await?;
            let span = tracing::Span::current();
            span.record("status", response.status().as_u16());
            span.record("latency_ms", start.elapsed().as_millis() as u64);
            Ok(response.error_for_status()?.text().await?)
        }
        .instrument(span)
        .await
    }
}
