//! Application context - dependency injection container

use std::sync::Arc;
use std::time::Duration;

use dictators_common::auth::{MemoryTokenStore, TokenStore};
use dictators_core::{IdentityClient, InitOptions, Redirector, SessionProvider, SessionState};
use dictators_domain::{Config, Result};
use dictators_infra::{AuthorizedClient, DictatorsApi, KeycloakClient};
use tracing::{info, instrument};

/// Application context - holds the session and API services of one root
///
/// Every service shares the same identity client, so the session state,
/// the background refresher and authorized requests all see one token.
pub struct AppContext {
    pub config: Config,
    keycloak: Arc<KeycloakClient>,
    session: SessionProvider,
    api: DictatorsApi,
}

impl AppContext {
    /// Create a context that keeps the session in memory only
    ///
    /// # Errors
    /// Returns `DictatorsError` if an HTTP client cannot be built.
    pub fn new(config: Config, redirector: Arc<dyn Redirector>) -> Result<Self> {
        Self::with_token_store(config, redirector, Arc::new(MemoryTokenStore::new()))
    }

    /// Create a context persisting the session in `store`
    ///
    /// # Errors
    /// Returns `DictatorsError` if an HTTP client cannot be built.
    pub fn with_token_store(
        config: Config,
        redirector: Arc<dyn Redirector>,
        store: Arc<dyn TokenStore>,
    ) -> Result<Self> {
        let timeout = Duration::from_secs(config.api.timeout_seconds.max(1));
        let keycloak = Arc::new(KeycloakClient::new(&config.identity, timeout, store, redirector)?);
        let identity: Arc<dyn IdentityClient> = keycloak.clone();

        let session = SessionProvider::new(
            Arc::clone(&identity),
            InitOptions::from(&config.identity),
            config.refresh.clone(),
        );
        let client = AuthorizedClient::new(&config.api, &config.refresh, identity)?;
        let api = DictatorsApi::new(Arc::new(client));

        info!(realm = %config.identity.realm, api = %config.api.base_url, "application context created");
        Ok(Self { config, keycloak, session, api })
    }

    /// Mount the session and wait for it to settle
    pub async fn start(&self) -> SessionState {
        self.session.mount().await
    }

    /// Finish a login redirect and publish the signed-in identity
    ///
    /// # Errors
    /// Returns `DictatorsError::Auth` if no login is pending, the state does
    /// not match or the provider rejects the code, and
    /// `DictatorsError::Network` if the provider is unreachable.
    #[instrument(skip(self, code, state))]
    pub async fn complete_login(&self, code: &str, state: &str) -> Result<SessionState> {
        self.keycloak.complete_login(code, state).await?;
        Ok(self.session.sync_identity())
    }

    /// Log out and clear the identity from session state
    pub async fn logout(&self) {
        self.session.logout().await;
    }

    /// Session provider of this root
    #[must_use]
    pub fn session(&self) -> &SessionProvider {
        &self.session
    }

    /// Backend client of this root
    #[must_use]
    pub fn api(&self) -> &DictatorsApi {
        &self.api
    }

    /// Identity client of this root
    #[must_use]
    pub fn keycloak(&self) -> &Arc<KeycloakClient> {
        &self.keycloak
    }

    /// Gracefully shut down the context
    ///
    /// Stops the background refresher. Dropping the context has the same
    /// effect; calling this more than once is harmless.
    ///
    /// # Errors
    /// Currently infallible; the `Result` leaves room for cleanup that can
    /// fail.
    pub async fn shutdown(&self) -> Result<()> {
        info!("shutdown called on AppContext");
        self.session.unmount();
        info!(component = "TokenRefresher", cleanup_method = "CancellationToken", "refresher_cleanup");
        Ok(())
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("config", &self.config)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

/// Redirector for a terminal: logs the URL for the user to open
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingRedirector;

impl Redirector for LoggingRedirector {
    fn redirect(&self, url: &str) {
        info!(%url, "open this URL in a browser to continue");
    }
}
