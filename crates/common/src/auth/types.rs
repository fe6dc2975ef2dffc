//! OpenID-Connect types and structures
//!
//! Token sets as issued by the provider's token endpoint, and the realm
//! configuration that locates that endpoint.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Access, refresh and ID tokens with expiry metadata
///
/// Keycloak issues short-lived access tokens together with a longer-lived
/// refresh token; both expiries are tracked so the caller can tell a token
/// that needs refreshing from a session that can no longer be refreshed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    /// Bearer credential for API calls
    pub access_token: String,

    /// Refresh token for obtaining new access tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// ID token (JWT), used as logout hint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,

    /// Token type (always "Bearer")
    pub token_type: String,

    /// Absolute access-token expiry (UTC)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    /// Absolute refresh-token expiry (UTC), if the provider reports one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_expires_at: Option<DateTime<Utc>>,

    /// Granted scopes (space-separated)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl TokenSet {
    /// Create a token set whose expiry is `expires_in` seconds from now
    ///
    /// A non-positive `expires_in` means the provider did not report an
    /// expiry.
    #[must_use]
    pub fn new(access_token: String, refresh_token: Option<String>, expires_in: i64) -> Self {
        Self {
            access_token,
            refresh_token,
            id_token: None,
            token_type: "Bearer".to_string(),
            expires_at: expiry_from_now(expires_in),
            refresh_expires_at: None,
            scope: None,
        }
    }

    /// Check whether the access token expires within `min_validity`
    ///
    /// Tokens without an expiry are treated as valid. A window too large to
    /// represent counts as expiring.
    #[must_use]
    pub fn expires_within(&self, min_validity: Duration) -> bool {
        self.expires_within_at(min_validity, Utc::now())
    }

    fn expires_within_at(&self, min_validity: Duration, now: DateTime<Utc>) -> bool {
        let Some(expires_at) = self.expires_at else {
            return false;
        };
        match chrono::Duration::from_std(min_validity).ok().and_then(|w| now.checked_add_signed(w))
        {
            Some(deadline) => deadline >= expires_at,
            None => true,
        }
    }

    /// Check whether the access token is already expired
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_within(Duration::ZERO)
    }

    /// Check whether the refresh token can still be used
    #[must_use]
    pub fn can_refresh(&self) -> bool {
        let has_token = self.refresh_token.as_deref().is_some_and(|t| !t.is_empty());
        let still_valid = self.refresh_expires_at.map_or(true, |at| at > Utc::now());
        has_token && still_valid
    }

    /// Seconds until the access token expires
    #[must_use]
    pub fn seconds_until_expiry(&self) -> Option<i64> {
        self.expires_at.map(|expires_at| (expires_at - Utc::now()).num_seconds())
    }
}

fn expiry_from_now(seconds: i64) -> Option<DateTime<Utc>> {
    (seconds > 0).then(|| Utc::now() + chrono::Duration::seconds(seconds))
}

/// Token endpoint response (RFC 6749 §5.1 plus Keycloak extensions)
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub id_token: Option<String>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: i64,
    #[serde(default)]
    pub refresh_expires_in: i64,
    pub scope: Option<String>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl From<TokenResponse> for TokenSet {
    fn from(response: TokenResponse) -> Self {
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            id_token: response.id_token,
            token_type: response.token_type,
            expires_at: expiry_from_now(response.expires_in),
            refresh_expires_at: expiry_from_now(response.refresh_expires_in),
            scope: response.scope,
        }
    }
}

/// Realm coordinates of a Keycloak-style provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OidcConfig {
    /// Provider base URL (e.g. `https://auth.kneo.io/`)
    pub base_url: String,
    /// Realm identifier
    pub realm: String,
    /// Public client identifier
    pub client_id: String,
    /// Redirect URI registered for the client
    pub redirect_uri: String,
    /// Scopes to request
    pub scopes: Vec<String>,
}

impl OidcConfig {
    /// Create a configuration requesting the `openid` scope
    #[must_use]
    pub fn new(base_url: String, realm: String, client_id: String, redirect_uri: String) -> Self {
        Self { base_url, realm, client_id, redirect_uri, scopes: vec!["openid".to_string()] }
    }

    /// Realm issuer URL, `{base}/realms/{realm}`
    #[must_use]
    pub fn issuer(&self) -> String {
        format!("{}/realms/{}", self.base_url.trim_end_matches('/'), self.realm)
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/protocol/openid-connect/{name}", self.issuer())
    }

    /// Authorization endpoint (browser redirect target for login)
    #[must_use]
    pub fn authorization_url(&self) -> String {
        self.endpoint("auth")
    }

    /// Token endpoint
    #[must_use]
    pub fn token_url(&self) -> String {
        self.endpoint("token")
    }

    /// End-session endpoint (browser redirect target for logout)
    #[must_use]
    pub fn logout_url(&self) -> String {
        self.endpoint("logout")
    }

    /// Get scopes as space-separated string
    #[must_use]
    pub fn scope_string(&self) -> String {
        self.scopes.join(" ")
    }
}

/// Error body returned by the token endpoint (RFC 6749 §5.2)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProviderError {
    pub error: String,
    pub error_description: Option<String>,
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error_description {
            Some(desc) => write!(f, "{}: {}", self.error, desc),
            None => write!(f, "{}", self.error),
        }
    }
}

impl std::error::Error for ProviderError {}
