//! Configuration management
//!
//! Every field has a documented default so a bare environment still yields a
//! usable configuration that points at the public identity realm.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_API_BASE_URL, DEFAULT_API_TIMEOUT_SECS, DEFAULT_KEYCLOAK_CLIENT_ID,
    DEFAULT_KEYCLOAK_REALM, DEFAULT_KEYCLOAK_URL, DEFAULT_REDIRECT_URI,
    DEFAULT_REFRESH_INTERVAL_SECS, DEFAULT_REFRESH_MIN_VALIDITY_SECS,
    DEFAULT_RETRY_MIN_VALIDITY_SECS,
};
use crate::impl_str_enum_conversions;

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub identity: IdentityConfig,
    pub api: ApiConfig,
    pub refresh: RefreshConfig,
}

/// Identity provider configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Provider base URL (e.g. `https://auth.kneo.io/`)
    pub url: String,
    /// Realm (tenant) identifier
    pub realm: String,
    /// Public client identifier
    pub client_id: String,
    /// Where the provider sends the browser back after login/logout
    pub redirect_uri: String,
    /// What `init` does when no session exists
    pub on_load: OnLoad,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_KEYCLOAK_URL.to_string(),
            realm: DEFAULT_KEYCLOAK_REALM.to_string(),
            client_id: DEFAULT_KEYCLOAK_CLIENT_ID.to_string(),
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            on_load: OnLoad::CheckSso,
        }
    }
}

/// REST backend configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { base_url: DEFAULT_API_BASE_URL.to_string(), timeout_seconds: DEFAULT_API_TIMEOUT_SECS }
    }
}

/// Token freshness configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// Period of the background refresher
    pub interval_seconds: u64,
    /// Lookahead window used by the background refresher and the request phase
    pub min_validity_seconds: u64,
    /// Freshness tolerance used when recovering from a 401
    pub retry_min_validity_seconds: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_seconds: DEFAULT_REFRESH_INTERVAL_SECS,
            min_validity_seconds: DEFAULT_REFRESH_MIN_VALIDITY_SECS,
            retry_min_validity_seconds: DEFAULT_RETRY_MIN_VALIDITY_SECS,
        }
    }
}

/// Identity client behaviour on page load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OnLoad {
    /// Silently detect an existing session, stay anonymous otherwise
    #[default]
    CheckSso,
    /// Redirect to login when no session exists
    LoginRequired,
}

impl_str_enum_conversions!(OnLoad {
    CheckSso => "check-sso",
    LoginRequired => "login-required",
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let config = Config::default();

        assert_eq!(config.identity.url, "https://auth.kneo.io/");
        assert_eq!(config.identity.realm, "zona-x");
        assert_eq!(config.identity.client_id, "useless");
        assert_eq!(config.identity.on_load, OnLoad::CheckSso);
        assert_eq!(config.refresh.interval_seconds, 60);
        assert_eq!(config.refresh.min_validity_seconds, 30);
        assert_eq!(config.refresh.retry_min_validity_seconds, 5);
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"identity": {"realm": "staging"}, "api": {"timeout_seconds": 5}}"#)
                .unwrap();

        assert_eq!(config.identity.realm, "staging");
        assert_eq!(config.identity.client_id, "useless");
        assert_eq!(config.api.timeout_seconds, 5);
        assert_eq!(config.api.base_url, DEFAULT_API_BASE_URL);
    }

    #[test]
    fn test_on_load_serde_uses_kebab_case() {
        let json = serde_json::to_string(&OnLoad::LoginRequired).unwrap();
        assert_eq!(json, "\"login-required\"");
        assert_eq!("check-sso".parse::<OnLoad>().unwrap(), OnLoad::CheckSso);
    }
}
