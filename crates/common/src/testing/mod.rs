//! Testing utilities
//!
//! Unsigned JWT builders and token endpoint fixtures for tests that need a
//! provider session without a real identity provider.
//!
//! ## Usage
//!
//! ```rust
//! # #[cfg(feature = "test-utils")]
//! # {
//! use dictators_common::auth::{decode_claims, username_from_claims};
//! use dictators_common::testing::FakeJwt;
//!
//! let token = FakeJwt::new().username("stalin").expires_in(300).build();
//! let claims = decode_claims(&token).unwrap();
//! assert_eq!(username_from_claims(&claims).as_deref(), Some("stalin"));
//! # }
//! ```

// Builders are infallible in test contexts; a panic means broken test setup.
#![allow(clippy::missing_panics_doc)]

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use serde_json::{json, Map, Value};

use crate::auth::TokenSet;

/// Builder for unsigned compact JWTs
///
/// The signature segment is a fixed placeholder; nothing in the client
/// verifies signatures.
#[derive(Debug, Clone, Default)]
pub struct FakeJwt {
    claims: Map<String, Value>,
}

impl FakeJwt {
    /// Empty claim set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an arbitrary claim
    #[must_use]
    pub fn claim(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.claims.insert(key.into(), value.into());
        self
    }

    /// Set `preferred_username`
    #[must_use]
    pub fn username(self, username: &str) -> Self {
        self.claim("preferred_username", username)
    }

    /// Set `sub`
    #[must_use]
    pub fn subject(self, subject: &str) -> Self {
        self.claim("sub", subject)
    }

    /// Set `exp` relative to now
    #[must_use]
    pub fn expires_in(self, seconds: i64) -> Self {
        self.claim("exp", Utc::now().timestamp() + seconds)
    }

    /// Encode as `header.payload.signature`
    #[must_use]
    pub fn build(&self) -> String {
        let header = URL_SAFE_NO_PAD.encode(json!({"alg": "none", "typ": "JWT"}).to_string());
        let payload = URL_SAFE_NO_PAD.encode(Value::Object(self.claims.clone()).to_string());
        format!("{header}.{payload}.c2lnbmF0dXJl")
    }
}

/// Access token for `username` expiring in `expires_in` seconds
#[must_use]
pub fn fake_access_token(username: &str, expires_in: i64) -> String {
    FakeJwt::new().username(username).subject(username).expires_in(expires_in).build()
}

/// Token set whose access token expires in `expires_in` seconds
#[must_use]
pub fn fake_token_set(username: &str, expires_in: i64) -> TokenSet {
    TokenSet::new(
        fake_access_token(username, expires_in),
        Some(format!("refresh-{username}")),
        expires_in,
    )
}

/// Body of a successful token endpoint response
#[must_use]
pub fn token_response_body(access_token: &str, refresh_token: &str, expires_in: i64) -> Value {
    json!({
        "access_token": access_token,
        "refresh_token": refresh_token,
        "token_type": "Bearer",
        "expires_in": expires_in,
        "refresh_expires_in": 1800,
        "scope": "openid profile email"
    })
}
