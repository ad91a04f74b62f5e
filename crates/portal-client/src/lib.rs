//! Headless client for the mobile portal.
//!
//! Two collaborating units: a fragment [`router`] that maps URL fragments to
//! views and keeps the content surface's class list in sync, and an [`auth`]
//! negotiator that establishes a portal session against a mock fixture
//! endpoint, the portal's local login servlet, or a CAS ticket-based SSO
//! flow. Credentials can be cached on disk through the [`vault`], and both
//! units broadcast their outcomes on the [`events`] bus for decoupled view
//! components to consume.

pub mod auth;
pub mod config;
pub mod error;
pub mod events;
pub mod router;
pub mod session;
pub mod vault;

pub use auth::Authenticator;
pub use config::{LoginStrategy, PortalConfig};
pub use error::AuthError;
pub use events::{EventBus, Notification};
pub use router::{Router, View, ViewManager};
pub use session::{Credentials, Session};
pub use vault::{CredentialVault, VaultError};
