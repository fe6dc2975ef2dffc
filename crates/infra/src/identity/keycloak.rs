//! Keycloak adapter for the identity port
//!
//! Holds the session a browser-side Keycloak client would: the current
//! token set, the pending PKCE login and the local token store standing in
//! for the provider's session cookie.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dictators_common::auth::{
    decode_claims, AuthError, Claims, OidcClient, OidcConfig, PkceChallenge, TokenSet, TokenStore,
};
use dictators_core::auth::{IdentityClient, IdentityError, InitOptions, Redirector};
use dictators_domain::{IdentityConfig, OnLoad};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, instrument, warn};

/// Keycloak OpenID-Connect client for one realm
pub struct KeycloakClient {
    oidc: OidcClient,
    store: Arc<dyn TokenStore>,
    redirector: Arc<dyn Redirector>,
    tokens: RwLock<Option<TokenSet>>,
    pending_login: Mutex<Option<PkceChallenge>>,
    initialized: AtomicBool,
    refresh_lock: tokio::sync::Mutex<()>,
}

impl KeycloakClient {
    /// Create a client for the realm in `config`
    ///
    /// # Errors
    /// Returns [`IdentityError::Provider`] if the HTTP client cannot be
    /// built.
    pub fn new(
        config: &IdentityConfig,
        timeout: Duration,
        store: Arc<dyn TokenStore>,
        redirector: Arc<dyn Redirector>,
    ) -> Result<Self, IdentityError> {
        let oidc_config = OidcConfig::new(
            config.url.clone(),
            config.realm.clone(),
            config.client_id.clone(),
            config.redirect_uri.clone(),
        );
        let oidc = OidcClient::new(oidc_config, timeout)?;

        Ok(Self {
            oidc,
            store,
            redirector,
            tokens: RwLock::new(None),
            pending_login: Mutex::new(None),
            initialized: AtomicBool::new(false),
            refresh_lock: tokio::sync::Mutex::new(()),
        })
    }

    /// The underlying OIDC client
    pub fn oidc(&self) -> &OidcClient {
        &self.oidc
    }

    /// Finish a login redirect with the callback's `code` and `state`
    ///
    /// # Errors
    /// Returns error if no login is pending, the state does not match, or
    /// the provider rejects the code.
    #[instrument(skip(self, code, state))]
    pub async fn complete_login(&self, code: &str, state: &str) -> Result<(), IdentityError> {
        let challenge = self
            .pending_login
            .lock()
            .take()
            .ok_or_else(|| IdentityError::Provider("no login in progress".to_string()))?;

        if !challenge.matches_state(state) {
            warn!("login callback state mismatch");
            return Err(AuthError::StateMismatch {
                expected: challenge.state,
                received: state.to_string(),
            }
            .into());
        }

        let tokens = self.oidc.exchange_code(code, &challenge.code_verifier).await?;
        self.persist(&tokens).await;
        *self.tokens.write() = Some(tokens);
        info!(username = self.username().as_deref().unwrap_or("-"), "login completed");
        Ok(())
    }

    async fn restore_session(&self) -> Result<bool, IdentityError> {
        let Some(stored) = self.store.load().await? else {
            debug!("no stored session");
            return Ok(false);
        };

        if !stored.is_expired() {
            *self.tokens.write() = Some(stored);
            return Ok(true);
        }

        if !stored.can_refresh() {
            debug!("stored session expired");
            self.forget().await;
            return Ok(false);
        }

        let refresh_token = stored.refresh_token.clone().unwrap_or_default();
        match self.oidc.refresh(&refresh_token).await {
            Ok(fresh) => {
                let tokens = merge(stored, fresh);
                self.persist(&tokens).await;
                *self.tokens.write() = Some(tokens);
                Ok(true)
            }
            Err(AuthError::Provider(e)) => {
                debug!(error = %e, "stored session no longer active");
                self.forget().await;
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn persist(&self, tokens: &TokenSet) {
        if let Err(e) = self.store.save(tokens).await {
            warn!(error = %e, "failed to persist session");
        }
    }

    async fn forget(&self) {
        if let Err(e) = self.store.clear().await {
            warn!(error = %e, "failed to clear stored session");
        }
    }
}

/// Keep the refresh and id tokens when the provider omits them
fn merge(previous: TokenSet, fresh: TokenSet) -> TokenSet {
    TokenSet {
        refresh_token: fresh.refresh_token.or(previous.refresh_token),
        id_token: fresh.id_token.or(previous.id_token),
        ..fresh
    }
}

#[async_trait]
impl IdentityClient for KeycloakClient {
    #[instrument(skip(self, options), fields(on_load = %options.on_load))]
    async fn init(&self, options: &InitOptions) -> Result<bool, IdentityError> {
        let authenticated = self.restore_session().await?;
        self.initialized.store(true, Ordering::SeqCst);

        if !authenticated && options.on_load == OnLoad::LoginRequired {
            self.login().await;
        }
        Ok(authenticated)
    }

    async fn login(&self) {
        let challenge = PkceChallenge::generate();
        let url = self.oidc.authorization_url(&challenge, &[]);
        *self.pending_login.lock() = Some(challenge);

        info!("redirecting to login");
        self.redirector.redirect(&url);
    }

    async fn logout(&self) {
        let previous = self.tokens.write().take();
        self.forget().await;

        let hint = previous.as_ref().and_then(|t| t.id_token.as_deref());
        let url = self.oidc.logout_url(hint);
        info!("redirecting to logout");
        self.redirector.redirect(&url);
    }

    async fn update_token(&self, min_validity: Duration) -> Result<bool, IdentityError> {
        if !self.initialized.load(Ordering::SeqCst) {
            return Err(IdentityError::NotInitialized);
        }

        // One refresh grant at a time; later callers see its result.
        let _refreshing = self.refresh_lock.lock().await;

        let current = self.tokens.read().clone().ok_or(IdentityError::NoSession)?;
        if !current.expires_within(min_validity) {
            return Ok(false);
        }
        if !current.can_refresh() {
            return Err(IdentityError::Refresh("refresh token expired".to_string()));
        }

        let refresh_token = current.refresh_token.clone().unwrap_or_default();
        let fresh = self.oidc.refresh(&refresh_token).await.map_err(|e| match e {
            AuthError::RequestFailed(e) => IdentityError::Unreachable(e.to_string()),
            other => IdentityError::Refresh(other.to_string()),
        })?;

        let tokens = merge(current, fresh);
        self.persist(&tokens).await;
        debug!(expires_in = ?tokens.seconds_until_expiry(), "access token refreshed");
        *self.tokens.write() = Some(tokens);
        Ok(true)
    }

    fn token(&self) -> Option<String> {
        self.tokens.read().as_ref().map(|t| t.access_token.clone())
    }

    fn authenticated(&self) -> bool {
        self.tokens.read().is_some()
    }

    fn token_parsed(&self) -> Option<Claims> {
        let token = self.token()?;
        decode_claims(&token).ok()
    }
}

impl std::fmt::Debug for KeycloakClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeycloakClient")
            .field("issuer", &self.oidc.config().issuer())
            .field("authenticated", &self.authenticated())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use dictators_common::auth::MemoryTokenStore;
    use dictators_common::testing::{fake_access_token, fake_token_set, token_response_body};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    const TOKEN_PATH: &str = "/realms/zona-x/protocol/openid-connect/token";

    #[derive(Default)]
    struct RecordingRedirector {
        urls: Mutex<Vec<String>>,
    }

    impl Redirector for RecordingRedirector {
        fn redirect(&self, url: &str) {
            self.urls.lock().push(url.to_string());
        }
    }

    fn client(
        server: &MockServer,
        store: Arc<MemoryTokenStore>,
        redirector: Arc<RecordingRedirector>,
    ) -> KeycloakClient {
        let config = IdentityConfig { url: server.uri(), ..IdentityConfig::default() };
        KeycloakClient::new(&config, Duration::from_secs(5), store, redirector).unwrap()
    }

    #[tokio::test]
    async fn test_init_restores_valid_session_without_network() {
        let server = MockServer::start().await;
        let store = Arc::new(MemoryTokenStore::with_tokens(fake_token_set("idi", 300)));
        let keycloak = client(&server, store, Arc::default());

        assert!(keycloak.init(&InitOptions::default()).await.unwrap());
        assert!(keycloak.authenticated());
        assert_eq!(keycloak.username().as_deref(), Some("idi"));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_init_without_session_check_sso_stays_anonymous() {
        let server = MockServer::start().await;
        let redirector = Arc::new(RecordingRedirector::default());
        let keycloak = client(&server, Arc::default(), redirector.clone());

        assert!(!keycloak.init(&InitOptions::default()).await.unwrap());
        assert!(redirector.urls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_init_login_required_redirects() {
        let server = MockServer::start().await;
        let redirector = Arc::new(RecordingRedirector::default());
        let keycloak = client(&server, Arc::default(), redirector.clone());
        let options = InitOptions { on_load: OnLoad::LoginRequired, ..InitOptions::default() };

        assert!(!keycloak.init(&options).await.unwrap());

        let urls = redirector.urls.lock();
        assert_eq!(urls.len(), 1);
        assert!(urls[0].contains("/realms/zona-x/protocol/openid-connect/auth?"));
        assert!(urls[0].contains("code_challenge_method=S256"));
    }

    #[tokio::test]
    async fn test_init_with_ended_session_clears_store() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_grant"
            })))
            .expect(1)
            .mount(&server)
            .await;
        let mut expired = fake_token_set("idi", 1);
        expired.expires_at = Some(chrono::Utc::now() - chrono::Duration::seconds(5));
        let store = Arc::new(MemoryTokenStore::with_tokens(expired));
        let keycloak = client(&server, store.clone(), Arc::default());

        assert!(!keycloak.init(&InitOptions::default()).await.unwrap());
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_token_before_init_fails() {
        let server = MockServer::start().await;
        let keycloak = client(&server, Arc::default(), Arc::default());

        let result = keycloak.update_token(Duration::from_secs(30)).await;

        assert_eq!(result, Err(IdentityError::NotInitialized));
    }

    #[tokio::test]
    async fn test_update_token_refreshes_only_inside_window() {
        let server = MockServer::start().await;
        let fresh = fake_access_token("idi", 300);
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(token_response_body(&fresh, "r-2", 300)),
            )
            .expect(1)
            .mount(&server)
            .await;
        let store = Arc::new(MemoryTokenStore::with_tokens(fake_token_set("idi", 10)));
        let keycloak = client(&server, store.clone(), Arc::default());
        keycloak.init(&InitOptions::default()).await.unwrap();

        assert!(!keycloak.update_token(Duration::from_secs(5)).await.unwrap());
        assert!(keycloak.update_token(Duration::from_secs(30)).await.unwrap());
        assert!(!keycloak.update_token(Duration::from_secs(30)).await.unwrap());

        assert_eq!(keycloak.token().as_deref(), Some(fresh.as_str()));
        let saved = store.load().await.unwrap().unwrap();
        assert_eq!(saved.refresh_token.as_deref(), Some("r-2"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_refreshes_share_one_grant() {
        let server = MockServer::start().await;
        let fresh = fake_access_token("idi", 300);
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(token_response_body(&fresh, "r-2", 300))
                    .set_delay(Duration::from_millis(50)),
            )
            .expect(1)
            .mount(&server)
            .await;
        let store = Arc::new(MemoryTokenStore::with_tokens(fake_token_set("idi", 10)));
        let keycloak = Arc::new(client(&server, store, Arc::default()));
        keycloak.init(&InitOptions::default()).await.unwrap();

        let calls: Vec<_> = (0..5)
            .map(|_| {
                let keycloak = Arc::clone(&keycloak);
                tokio::spawn(async move { keycloak.update_token(Duration::from_secs(30)).await })
            })
            .collect();
        let mut refreshed = 0;
        for call in calls {
            if call.await.unwrap().unwrap() {
                refreshed += 1;
            }
        }

        assert_eq!(refreshed, 1);
    }

    #[tokio::test]
    async fn test_logout_clears_session_and_redirects() {
        let server = MockServer::start().await;
        let store = Arc::new(MemoryTokenStore::with_tokens(fake_token_set("idi", 300)));
        let redirector = Arc::new(RecordingRedirector::default());
        let keycloak = client(&server, store.clone(), redirector.clone());
        keycloak.init(&InitOptions::default()).await.unwrap();

        keycloak.logout().await;

        assert!(!keycloak.authenticated());
        assert!(keycloak.token_parsed().is_none());
        assert!(store.load().await.unwrap().is_none());
        assert!(redirector.urls.lock()[0].contains("/protocol/openid-connect/logout?"));
    }

    #[tokio::test]
    async fn test_complete_login_rejects_foreign_state() {
        let server = MockServer::start().await;
        let keycloak = client(&server, Arc::default(), Arc::default());
        keycloak.init(&InitOptions::default()).await.unwrap();
        keycloak.login().await;

        let result = keycloak.complete_login("code", "forged").await;

        assert!(matches!(result, Err(IdentityError::Provider(_))));
        assert!(!keycloak.authenticated());
    }
}
