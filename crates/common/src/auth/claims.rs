//! Access-token claims
//!
//! Claims are read from the JWT payload without verifying the signature.
//! The client only uses them for display (username) and expiry hints; the
//! backend is the party that verifies tokens.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use super::client::AuthError;

/// Decoded token payload
pub type Claims = Map<String, Value>;

/// Decode the payload segment of a compact JWT
///
/// # Errors
/// Returns [`AuthError::InvalidToken`] if the token does not have three
/// segments or the payload is not a base64url-encoded JSON object.
pub fn decode_claims(token: &str) -> Result<Claims, AuthError> {
    let mut segments = token.split('.');
    let payload = match (segments.next(), segments.next(), segments.next(), segments.next()) {
        (Some(_), Some(payload), Some(_), None) => payload,
        _ => return Err(AuthError::InvalidToken("expected three segments".to_string())),
    };

    // Some issuers pad their segments even though RFC 7515 says not to.
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| AuthError::InvalidToken(format!("payload is not base64url: {e}")))?;

    match serde_json::from_slice(&bytes) {
        Ok(Value::Object(claims)) => Ok(claims),
        Ok(_) => Err(AuthError::InvalidToken("payload is not a JSON object".to_string())),
        Err(e) => Err(AuthError::InvalidToken(format!("payload is not JSON: {e}"))),
    }
}

/// Display name of the token subject: `preferred_username`, else `sub`
#[must_use]
pub fn username_from_claims(claims: &Claims) -> Option<String> {
    ["preferred_username", "sub"]
        .iter()
        .find_map(|key| claims.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

/// The `exp` claim as a timestamp
#[must_use]
pub fn expiry_from_claims(claims: &Claims) -> Option<DateTime<Utc>> {
    claims.get("exp").and_then(Value::as_i64).and_then(|exp| DateTime::from_timestamp(exp, 0))
}
