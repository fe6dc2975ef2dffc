//! Port interfaces for the identity provider
//!
//! These traits define the boundary between session logic and the
//! identity-provider client. The provider's protocol internals stay on the
//! infrastructure side; the core only consumes this client-visible contract.

use std::time::Duration;

use async_trait::async_trait;
use dictators_common::auth::AuthError;
pub use dictators_common::auth::{username_from_claims, Claims};
use dictators_domain::{DictatorsError, IdentityConfig, OnLoad};
use thiserror::Error;

/// PKCE method requested at initialization
pub const PKCE_METHOD_S256: &str = "S256";

/// Errors reported by an identity client
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// Operation requires `init` to have completed
    #[error("identity client is not initialized")]
    NotInitialized,

    /// Provider could not be reached
    #[error("identity provider unreachable: {0}")]
    Unreachable(String),

    /// Token could not be refreshed
    #[error("token refresh failed: {0}")]
    Refresh(String),

    /// There is no session to operate on
    #[error("no active session")]
    NoSession,

    /// Provider rejected the request or is misconfigured
    #[error("identity provider error: {0}")]
    Provider(String),
}

impl From<AuthError> for IdentityError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::RequestFailed(e) => Self::Unreachable(e.to_string()),
            AuthError::NoRefreshToken => Self::NoSession,
            other => Self::Provider(other.to_string()),
        }
    }
}

impl From<IdentityError> for DictatorsError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::Unreachable(msg) => Self::Network(msg),
            other => Self::Auth(other.to_string()),
        }
    }
}

/// Options for the initialization handshake
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitOptions {
    /// What to do when no session exists
    pub on_load: OnLoad,
    /// PKCE code challenge method
    pub pkce_method: String,
    /// Page used for a silent session check, if the adapter supports one
    pub silent_check_sso_redirect_uri: Option<String>,
}

impl Default for InitOptions {
    fn default() -> Self {
        Self {
            on_load: OnLoad::CheckSso,
            pkce_method: PKCE_METHOD_S256.to_string(),
            silent_check_sso_redirect_uri: None,
        }
    }
}

impl From<&IdentityConfig> for InitOptions {
    fn from(config: &IdentityConfig) -> Self {
        Self { on_load: config.on_load, ..Self::default() }
    }
}

/// Client of an OpenID-Connect style identity provider
///
/// One instance is shared by everything in an application root. Token
/// state lives inside the implementation; callers only ask for the current
/// value.
#[async_trait]
pub trait IdentityClient: Send + Sync {
    /// Run the initialization handshake
    ///
    /// Resolves to whether a session exists.
    async fn init(&self, options: &InitOptions) -> Result<bool, IdentityError>;

    /// Start the login redirect
    async fn login(&self);

    /// Start the logout redirect and drop local tokens
    async fn logout(&self);

    /// Refresh the access token if it expires within `min_validity`
    ///
    /// Returns `Ok(true)` if a refresh happened, `Ok(false)` if the token
    /// was still valid.
    ///
    /// # Errors
    /// Returns error if there is no session or the refresh is rejected.
    async fn update_token(&self, min_validity: Duration) -> Result<bool, IdentityError>;

    /// Current access token
    fn token(&self) -> Option<String>;

    /// Whether a session exists
    fn authenticated(&self) -> bool;

    /// Decoded access-token claims
    fn token_parsed(&self) -> Option<Claims>;

    /// Display name of the session subject
    fn username(&self) -> Option<String> {
        self.token_parsed().as_ref().and_then(username_from_claims)
    }
}

/// Receives login and logout redirects
///
/// Navigation is the host's business: a browser shell would open the URL,
/// a CLI prints it.
pub trait Redirector: Send + Sync {
    /// Navigate to `url`
    fn redirect(&self, url: &str);
}
