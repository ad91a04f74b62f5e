//! CAS ticket-based SSO flow.
//!
//! One GET fetches the login page (or, when CAS already holds a session
//! for this client, the layout JSON straight away). The scraped flow
//! tokens are then POSTed back together with the credentials. A failed
//! credential submission retries once through the local servlet; a failed
//! initial GET surfaces directly.

use crate::error::AuthError;
use crate::session::{Credentials, Session};

use super::form::{self, CasLoginForm};
use super::Authenticator;

impl Authenticator {
    pub(crate) async fn cas_login(
        &self,
        credentials: &Credentials,
    ) -> Result<Session, AuthError> {
        // Guest access bypasses SSO entirely.
        let (Some(username), Some(password)) = (credentials.username(), credentials.password())
        else {
            return self.local_login(credentials).await;
        };

        let cas_url = self.config.cas_login_url();
        let service_url = self.config.cas_service_url();
        tracing::info!(url = %cas_url, service = %service_url, "attempting CAS authentication");

        // Nothing to fall back to until CAS has been reached at least once.
        let html = self
            .exchange(
                self.client
                    .get(&cas_url)
                    .query(&[("service", service_url.as_str())]),
                &cas_url,
            )
            .await?;

        // No login form means the CAS redirect already established the
        // session and the body is the layout payload itself.
        if !form::contains_login_form(&html) {
            let session: Session = serde_json::from_str(&html)?;
            return self.validate_user(credentials, session);
        }

        let tokens = form::parse_login_form(&html)?;

        match self
            .submit_cas_credentials(&cas_url, &service_url, username, password, &tokens)
            .await
        {
            Ok(session) => self.validate_user(credentials, session),
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    "CAS credential submission failed, retrying via local login"
                );
                self.local_login(credentials).await
            }
        }
    }

    /// POST the credentials and flow tokens back to CAS.
    async fn submit_cas_credentials(
        &self,
        cas_url: &str,
        service_url: &str,
        username: &str,
        password: &str,
        tokens: &CasLoginForm,
    ) -> Result<Session, AuthError> {
        tracing::info!("submitting credentials to CAS");
        let submission = [
            ("service", service_url),
            ("username", username),
            ("password", password),
            ("lt", tokens.login_ticket.as_str()),
            ("execution", tokens.execution_id.as_str()),
            ("_eventId", "submit"),
            ("submit", "LOGIN"),
        ];

        let body = self
            .exchange(self.client.post(cas_url).form(&submission), cas_url)
            .await?;
        Ok(serde_json::from_str(&body)?)
    }
}
