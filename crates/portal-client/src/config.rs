//! Configuration types and loading logic.

use std::path::PathBuf;

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use portal_tracing::TracingConfig;
use secrecy::SecretString;
use serde::Deserialize;

/// Top-level client configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    pub server: ServerConfig,
    pub cas: CasConfig,
    pub login: LoginConfig,
    pub vault: VaultConfig,
    pub tracing: TracingConfig,
}

/// Portal server location.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Scheme, host and port of the portal server.
    pub base_url: String,

    /// Context path the portal is deployed under.
    pub context: String,
}

/// CAS server location.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CasConfig {
    /// Scheme, host and port of the CAS server. The login endpoint lives
    /// at `{server_url}/cas/login`.
    pub server_url: String,
}

/// Login negotiation settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoginConfig {
    /// Which strategy [`crate::Authenticator::login`] dispatches to.
    pub strategy: LoginStrategy,

    /// Client-level timeout applied to every exchange.
    pub timeout_secs: u64,
}

/// Credential store settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Where sealed credentials are kept.
    pub path: PathBuf,

    /// Passphrase the sealing key is derived from.
    pub encryption_key: SecretString,
}

/// The available login strategies. Selection happens by configuration; the
/// dispatch table is the `match` in [`crate::Authenticator::login`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoginStrategy {
    Mock,
    #[default]
    Local,
    Cas,
}

impl LoginStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            LoginStrategy::Mock => "mock",
            LoginStrategy::Local => "local",
            LoginStrategy::Cas => "cas",
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            context: "/umobile".to_string(),
        }
    }
}

impl Default for CasConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8080".to_string(),
        }
    }
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            strategy: LoginStrategy::default(),
            timeout_secs: 30,
        }
    }
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("portal-credentials.json"),
            encryption_key: SecretString::from("changeit"),
        }
    }
}

impl PortalConfig {
    /// Load configuration from a TOML file and environment variables.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (PORTAL_ prefix, __ for nesting)
    /// 2. TOML config file
    /// 3. Defaults
    pub fn load(config_path: &str) -> anyhow::Result<Self> {
        let mut config: PortalConfig = Figment::new()
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("PORTAL_").split("__"))
            .extract()?;

        // Direct env var override for the sensitive value
        if let Ok(key) = std::env::var("PORTAL_VAULT_KEY") {
            config.vault.encryption_key = SecretString::from(key);
        }

        Ok(config)
    }

    /// URL of the local login servlet.
    pub fn login_servlet_url(&self) -> String {
        format!("{}{}/Login", self.server.base_url, self.server.context)
    }

    /// URL of the local logout servlet.
    pub fn logout_servlet_url(&self) -> String {
        format!("{}{}/Logout", self.server.base_url, self.server.context)
    }

    /// URL of the mock layout fixture for `username`.
    pub fn layout_fixture_url(&self, username: &str) -> String {
        format!(
            "{}{}/layout-{}.json",
            self.server.base_url, self.server.context, username
        )
    }

    /// URL of the CAS login endpoint.
    pub fn cas_login_url(&self) -> String {
        format!("{}/cas/login", self.cas.server_url)
    }

    /// Service callback CAS sends the browser back to after authentication:
    /// the login servlet, carrying the layout reference.
    pub fn cas_service_url(&self) -> String {
        format!(
            "{}?refUrl={}/layout.json",
            self.login_servlet_url(),
            self.server.context
        )
    }

    /// Relative layout reference submitted to the login servlet.
    pub fn layout_ref_url(&self) -> String {
        format!("{}/layout.json", self.server.context)
    }
}
