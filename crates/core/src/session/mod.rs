//! Session lifecycle
//!
//! ```text
//! SessionProvider (single writer)
//!     ├── SessionGuard      initialize the identity client exactly once
//!     ├── SessionPublisher  settle / clear the shared SessionState
//!     └── RefresherHandle   periodic update_token while authenticated
//!
//! SessionReader (many, cloneable) ◄── SessionScope::current()
//! ```

pub mod guard;
pub mod provider;
pub mod refresher;
pub mod scope;
pub mod store;

use std::sync::Arc;

use dictators_domain::DictatorsError;
use serde::Serialize;
use thiserror::Error;

use crate::auth::{Claims, IdentityError};

pub use guard::{GuardStatus, SessionGuard};
pub use provider::SessionProvider;
pub use refresher::{RefresherHandle, TokenRefresher};
pub use scope::SessionScope;
pub use store::{SessionPublisher, SessionReader, SessionStore};

/// Session errors
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    /// The initialization handshake failed; terminal for the application root
    #[error("session initialization failed: {0}")]
    Initialization(Arc<IdentityError>),

    /// Session state was read outside a provider scope
    #[error("session state accessed outside of a session provider scope")]
    OutsideProvider,
}

impl From<SessionError> for DictatorsError {
    fn from(err: SessionError) -> Self {
        match &err {
            SessionError::Initialization(e) => Self::from(IdentityError::clone(e)),
            SessionError::OutsideProvider => Self::Internal(err.to_string()),
        }
    }
}

/// Read model of the current session
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub is_authenticated: bool,
    pub is_loading: bool,
    pub username: Option<String>,
    pub claims: Option<Claims>,
}

impl SessionState {
    /// State before initialization has settled
    #[must_use]
    pub fn loading() -> Self {
        Self { is_authenticated: false, is_loading: true, username: None, claims: None }
    }

    /// Settled state without a session
    #[must_use]
    pub fn unauthenticated() -> Self {
        Self { is_loading: false, ..Self::loading() }
    }

    /// Settled state for an authenticated subject
    #[must_use]
    pub fn authenticated(username: Option<String>, claims: Option<Claims>) -> Self {
        Self { is_authenticated: true, is_loading: false, username, claims }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::loading()
    }
}
