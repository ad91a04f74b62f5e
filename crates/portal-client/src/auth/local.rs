//! Login through the portal's local authentication servlet.

use crate::error::AuthError;
use crate::session::{Credentials, Session};

use super::Authenticator;

impl Authenticator {
    /// POST credentials (when present) to the login servlet. An incomplete
    /// pair requests a guest session, and the guest path accepts whatever
    /// user the server returns; a credentialed login must come back as the
    /// submitted user.
    pub(crate) async fn local_login(
        &self,
        credentials: &Credentials,
    ) -> Result<Session, AuthError> {
        let url = self.config.login_servlet_url();
        let mut form = vec![("refUrl".to_string(), self.config.layout_ref_url())];

        let submitted = match (credentials.username(), credentials.password()) {
            (Some(username), Some(password)) => {
                form.push(("userName".to_string(), username.to_string()));
                form.push(("password".to_string(), password.to_string()));
                tracing::info!(url = %url, username = %username, "attempting local login");
                Some(username.to_string())
            }
            _ => {
                tracing::info!(url = %url, "establishing guest session");
                None
            }
        };

        let body = self.exchange(self.client.post(&url).form(&form), &url).await?;
        let session: Session = serde_json::from_str(&body)?;

        match submitted {
            None => {
                tracing::debug!("guest session established");
                Ok(session)
            }
            Some(username) if session.is_for(&username) => {
                tracing::debug!(username = %username, "local authentication succeeded");
                Ok(session)
            }
            Some(username) => Err(AuthError::UserMismatch {
                submitted: username,
                returned: session.user.unwrap_or_default(),
            }),
        }
    }
}
