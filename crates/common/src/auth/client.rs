//! OpenID-Connect client for a single realm
//!
//! Builds the browser redirect URLs and performs the two token endpoint
//! grants a public client needs:
//! - authorization code (with PKCE verifier) after the login redirect
//! - refresh token, to keep the access token fresh

use std::time::Duration;

use reqwest::Client;
use thiserror::Error;
use tracing::debug;

use super::pkce::{PkceChallenge, CHALLENGE_METHOD};
use super::types::{OidcConfig, ProviderError, TokenResponse, TokenSet};

/// Error type for OIDC client operations
#[derive(Debug, Error)]
pub enum AuthError {
    /// HTTP request to the provider failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Provider rejected the grant
    #[error("Provider error: {0}")]
    Provider(ProviderError),

    /// Provider answered with something that is not a token response
    #[error("Parse error: {0}")]
    Parse(String),

    /// Callback state does not match the pending authorization request
    #[error("State mismatch (CSRF): expected {expected}, received {received}")]
    StateMismatch { expected: String, received: String },

    /// No refresh token available
    #[error("No refresh token available")]
    NoRefreshToken,

    /// Token is not a decodable JWT
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Local token storage failed
    #[error("Token storage error: {0}")]
    Storage(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

/// OIDC client bound to one realm and client id
#[derive(Debug, Clone)]
pub struct OidcClient {
    config: OidcConfig,
    http: Client,
}

impl OidcClient {
    /// Create a client with a request timeout for token endpoint calls
    ///
    /// # Errors
    /// Returns [`AuthError::Config`] if the HTTP client cannot be built.
    pub fn new(config: OidcConfig, timeout: Duration) -> Result<Self, AuthError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AuthError::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { config, http })
    }

    /// Get a reference to the realm configuration
    #[must_use]
    pub fn config(&self) -> &OidcConfig {
        &self.config
    }

    /// Authorization URL for a login redirect
    ///
    /// `extra` carries provider-specific parameters such as `prompt=none`.
    #[must_use]
    pub fn authorization_url(&self, challenge: &PkceChallenge, extra: &[(&str, &str)]) -> String {
        let scope = self.config.scope_string();
        let mut params: Vec<(&str, &str)> = vec![
            ("client_id", self.config.client_id.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("response_type", "code"),
            ("response_mode", "query"),
            ("scope", scope.as_str()),
            ("state", challenge.state.as_str()),
            ("code_challenge", challenge.code_challenge.as_str()),
            ("code_challenge_method", CHALLENGE_METHOD),
        ];
        params.extend_from_slice(extra);

        format!("{}?{}", self.config.authorization_url(), encode_query(&params))
    }

    /// End-session URL for a logout redirect
    #[must_use]
    pub fn logout_url(&self, id_token_hint: Option<&str>) -> String {
        let mut params: Vec<(&str, &str)> = vec![
            ("client_id", self.config.client_id.as_str()),
            ("post_logout_redirect_uri", self.config.redirect_uri.as_str()),
        ];
        if let Some(hint) = id_token_hint {
            params.push(("id_token_hint", hint));
        }

        format!("{}?{}", self.config.logout_url(), encode_query(&params))
    }

    /// Exchange an authorization code for tokens
    ///
    /// # Errors
    /// Returns error if the request fails or the provider rejects the code.
    pub async fn exchange_code(&self, code: &str, verifier: &str) -> Result<TokenSet, AuthError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("client_id", self.config.client_id.as_str()),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("code_verifier", verifier),
        ];
        self.token_request(&params).await
    }

    /// Obtain a new access token with a refresh token
    ///
    /// # Errors
    /// Returns [`AuthError::NoRefreshToken`] for an empty token, otherwise
    /// error if the request fails or the provider rejects the grant (for
    /// example because the SSO session ended).
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenSet, AuthError> {
        if refresh_token.is_empty() {
            return Err(AuthError::NoRefreshToken);
        }

        let params = [
            ("grant_type", "refresh_token"),
            ("client_id", self.config.client_id.as_str()),
            ("refresh_token", refresh_token),
        ];
        self.token_request(&params).await
    }

    async fn token_request(&self, params: &[(&str, &str)]) -> Result<TokenSet, AuthError> {
        let url = self.config.token_url();
        debug!(url = %url, grant = params[0].1, "token endpoint request");

        let response = self.http.post(&url).form(params).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match serde_json::from_str::<ProviderError>(&body) {
                Ok(error) => AuthError::Provider(error),
                Err(_) => AuthError::Parse(format!("token endpoint returned {status}: {body}")),
            });
        }

        let token_response: TokenResponse =
            response.json().await.map_err(|e| AuthError::Parse(e.to_string()))?;

        Ok(token_response.into())
    }
}

fn encode_query(params: &[(&str, &str)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    //! Unit tests for auth::client.
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn create_test_client(base_url: &str) -> OidcClient {
        let config = OidcConfig::new(
            base_url.to_string(),
            "zona-x".to_string(),
            "useless".to_string(),
            "http://localhost:5173/".to_string(),
        );
        OidcClient::new(config, Duration::from_secs(5)).unwrap()
    }

    const TOKEN_PATH: &str = "/realms/zona-x/protocol/openid-connect/token";

    #[test]
    fn test_authorization_url_carries_pkce_parameters() {
        let client = create_test_client("https://auth.kneo.io/");
        let challenge = PkceChallenge::generate();

        let url = client.authorization_url(&challenge, &[("prompt", "none")]);

        assert!(url.starts_with("https://auth.kneo.io/realms/zona-x/protocol/openid-connect/auth?"));
        assert!(url.contains("client_id=useless"));
        assert!(url.contains("code_challenge_method=S256"));
        assert!(url.contains(&format!("state={}", challenge.state)));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A5173%2F"));
        assert!(url.ends_with("prompt=none"));
    }

    #[test]
    fn test_logout_url_includes_hint_when_present() {
        let client = create_test_client("https://auth.kneo.io");

        assert!(!client.logout_url(None).contains("id_token_hint"));
        assert!(client.logout_url(Some("idt")).contains("id_token_hint=idt"));
    }

    #[tokio::test]
    async fn test_refresh_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=r1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "fresh",
                "refresh_token": "r2",
                "expires_in": 300,
                "refresh_expires_in": 1800,
                "token_type": "Bearer"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = create_test_client(&server.uri());
        let tokens = client.refresh("r1").await.unwrap();

        assert_eq!(tokens.access_token, "fresh");
        assert_eq!(tokens.refresh_token.as_deref(), Some("r2"));
    }

    #[tokio::test]
    async fn test_refresh_rejected_by_provider() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_grant",
                "error_description": "Session not active"
            })))
            .mount(&server)
            .await;

        let client = create_test_client(&server.uri());
        let result = client.refresh("stale").await;

        match result {
            Err(AuthError::Provider(error)) => assert_eq!(error.error, "invalid_grant"),
            other => panic!("expected provider error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_refresh_with_non_json_error_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&server)
            .await;

        let client = create_test_client(&server.uri());
        assert!(matches!(client.refresh("r1").await, Err(AuthError::Parse(_))));
    }

    #[tokio::test]
    async fn test_refresh_empty_token_short_circuits() {
        let client = create_test_client("http://127.0.0.1:9");
        assert!(matches!(client.refresh("").await, Err(AuthError::NoRefreshToken)));
    }

    #[tokio::test]
    async fn test_exchange_code_sends_verifier() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code_verifier=verifier123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "a",
                "refresh_token": "r",
                "id_token": "i",
                "expires_in": 300
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = create_test_client(&server.uri());
        let tokens = client.exchange_code("code-1", "verifier123").await.unwrap();

        assert_eq!(tokens.id_token.as_deref(), Some("i"));
        assert_eq!(tokens.token_type, "Bearer");
    }
}
