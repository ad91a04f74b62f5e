//! Mock login against static layout fixtures, for development setups where
//! no portal server is running. The portal ships `layout-guest.json` and
//! `layout-student.json`; nothing else exists.

use crate::error::AuthError;
use crate::session::{Credentials, Session};

use super::Authenticator;

const SUPPORTED_USERS: &[&str] = &["guest", "student"];

impl Authenticator {
    /// Fetch the static layout fixture for the submitted user. An absent
    /// username resolves to `guest`; anything outside the fixture set is
    /// rejected before any network traffic.
    pub(crate) async fn mock_login(
        &self,
        credentials: &Credentials,
    ) -> Result<Session, AuthError> {
        let username = credentials.username().unwrap_or("guest");

        if !SUPPORTED_USERS.contains(&username) {
            return Err(AuthError::UnsupportedUser(username.to_string()));
        }

        let url = self.config.layout_fixture_url(username);
        tracing::info!(url = %url, "attempting mock login");

        let body = self.exchange(self.client.get(&url), &url).await?;
        Ok(serde_json::from_str(&body)?)
    }
}
