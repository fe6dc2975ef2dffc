//! Authentication debug snapshot
//!
//! A loggable summary of the identity client's state. The token itself is
//! never included, only whether one exists and its length.

use chrono::Utc;
use dictators_common::auth::expiry_from_claims;
use serde::Serialize;
use tracing::debug;

use crate::auth::{Claims, IdentityClient};

/// Identity client state at one point in time
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthDebugInfo {
    pub authenticated: bool,
    pub has_token: bool,
    pub token_length: usize,
    /// `None` when the token carries no `exp` claim
    pub token_expired: Option<bool>,
    pub claims: Option<Claims>,
}

impl AuthDebugInfo {
    /// Capture the current state of `identity`
    pub fn capture(identity: &dyn IdentityClient) -> Self {
        let token = identity.token();
        let claims = identity.token_parsed();
        let token_expired =
            claims.as_ref().and_then(expiry_from_claims).map(|expires_at| expires_at <= Utc::now());

        Self {
            authenticated: identity.authenticated(),
            has_token: token.is_some(),
            token_length: token.as_deref().map_or(0, str::len),
            token_expired,
            claims,
        }
    }
}

/// Log the identity client's state at `debug`
pub fn log_auth_state(identity: &dyn IdentityClient) -> AuthDebugInfo {
    let info = AuthDebugInfo::capture(identity);
    debug!(
        authenticated = info.authenticated,
        has_token = info.has_token,
        token_length = info.token_length,
        token_expired = ?info.token_expired,
        claims = ?info.claims.as_ref().map(|c| c.keys().cloned().collect::<Vec<_>>()),
        "auth state"
    );
    info
}
