//! Session provider
//!
//! The single writer of session state for an application root. Owns the
//! initialization guard, the store publisher and the background refresher.

use std::future::Future;
use std::sync::Arc;

use dictators_domain::RefreshConfig;
use parking_lot::Mutex;
use tracing::{info, instrument, warn};

use super::{
    RefresherHandle, SessionGuard, SessionPublisher, SessionReader, SessionScope, SessionState,
    SessionStore, TokenRefresher,
};
use crate::auth::{IdentityClient, InitOptions};

/// Owner of the session lifecycle
pub struct SessionProvider {
    identity: Arc<dyn IdentityClient>,
    guard: SessionGuard,
    publisher: SessionPublisher,
    refresh: RefreshConfig,
    refresher: Mutex<Option<RefresherHandle>>,
}

impl SessionProvider {
    /// Create a provider; nothing happens until [`SessionProvider::mount`]
    pub fn new(
        identity: Arc<dyn IdentityClient>,
        options: InitOptions,
        refresh: RefreshConfig,
    ) -> Self {
        let guard = SessionGuard::new(Arc::clone(&identity), options);
        let (publisher, _) = SessionStore::new();
        Self { identity, guard, publisher, refresh, refresher: Mutex::new(None) }
    }

    /// Start the refresher, initialize the session and publish the result
    ///
    /// Calling it again reuses the settled guard and republishes the
    /// current identity. A failed initialization settles to an anonymous
    /// session; public views stay usable.
    #[instrument(skip(self))]
    pub async fn mount(&self) -> SessionState {
        self.start_refresher();

        let state = match self.guard.ensure_initialized().await {
            Ok(true) => self.current_identity(),
            Ok(false) => SessionState::unauthenticated(),
            Err(e) => {
                warn!(error = %e, "session settled without identity");
                SessionState::unauthenticated()
            }
        };

        info!(
            authenticated = state.is_authenticated,
            username = state.username.as_deref().unwrap_or("-"),
            "session mounted"
        );
        self.publisher.settle(state.clone());
        state
    }

    /// Republish whatever identity the client holds right now
    ///
    /// Used after an out-of-band sign-in such as completing a login
    /// redirect, when the settled guard would otherwise keep reporting the
    /// anonymous startup result.
    pub fn sync_identity(&self) -> SessionState {
        let state = self.current_identity();
        info!(authenticated = state.is_authenticated, "session identity synced");
        self.publisher.settle(state.clone());
        state
    }

    /// Stop the background refresher
    ///
    /// Dropping the provider has the same effect.
    pub fn unmount(&self) {
        if let Some(handle) = self.refresher.lock().take() {
            handle.stop();
            info!("session unmounted");
        }
    }

    /// Start the login redirect
    pub async fn login(&self) {
        self.identity.login().await;
    }

    /// Log out and drop the identity from session state
    pub async fn logout(&self) {
        self.identity.logout().await;
        self.publisher.clear_identity();
    }

    /// A new reader of session state
    #[must_use]
    pub fn reader(&self) -> SessionReader {
        self.publisher.reader()
    }

    /// Run `future` inside this provider's scope
    pub async fn scope<F: Future>(&self, future: F) -> F::Output {
        SessionScope::scope(self.reader(), future).await
    }

    /// The initialization guard
    #[must_use]
    pub fn guard(&self) -> &SessionGuard {
        &self.guard
    }

    /// The identity client shared by this application root
    #[must_use]
    pub fn identity(&self) -> &Arc<dyn IdentityClient> {
        &self.identity
    }

    /// Whether the background refresher is running
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.refresher.lock().as_ref().is_some_and(|handle| !handle.is_stopped())
    }

    fn current_identity(&self) -> SessionState {
        if self.identity.authenticated() {
            SessionState::authenticated(self.identity.username(), self.identity.token_parsed())
        } else {
            SessionState::unauthenticated()
        }
    }

    fn start_refresher(&self) {
        let mut refresher = self.refresher.lock();
        if refresher.is_none() {
            *refresher = Some(TokenRefresher::spawn(Arc::clone(&self.identity), &self.refresh));
        }
    }
}

impl std::fmt::Debug for SessionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionProvider")
            .field("guard", &self.guard)
            .field("state", &self.publisher.snapshot())
            .field("mounted", &self.is_mounted())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::auth::IdentityError;
    use crate::testing::MockIdentityClient;

    fn provider_for(mock: &Arc<MockIdentityClient>) -> SessionProvider {
        SessionProvider::new(mock.clone(), InitOptions::default(), RefreshConfig::default())
    }

    #[tokio::test]
    async fn test_mount_settles_authenticated_session() {
        let mock = Arc::new(MockIdentityClient::signed_in("token-1", "pinochet"));
        let provider = provider_for(&mock);
        let reader = provider.reader();
        assert!(reader.snapshot().is_loading);

        let state = provider.mount().await;

        assert!(state.is_authenticated);
        assert_eq!(state.username.as_deref(), Some("pinochet"));
        assert!(state.claims.is_some());
        assert_eq!(reader.snapshot(), state);
        assert!(provider.is_mounted());
    }

    #[tokio::test]
    async fn test_failed_initialization_settles_anonymous() {
        let mock = Arc::new(
            MockIdentityClient::signed_out()
                .with_init_result(Err(IdentityError::Provider("bad realm".into()))),
        );
        let provider = provider_for(&mock);

        let state = provider.mount().await;

        assert_eq!(state, SessionState::unauthenticated());
    }

    #[tokio::test]
    async fn test_remount_reuses_guard() {
        let mock = Arc::new(MockIdentityClient::signed_in("token-1", "pinochet"));
        let provider = provider_for(&mock);

        provider.mount().await;
        provider.mount().await;

        assert_eq!(mock.init_calls(), 1);
    }

    #[tokio::test]
    async fn test_logout_clears_identity_without_loading() {
        let mock = Arc::new(MockIdentityClient::signed_in("token-1", "pinochet"));
        let provider = provider_for(&mock);
        provider.mount().await;

        provider.logout().await;

        assert_eq!(provider.reader().snapshot(), SessionState::unauthenticated());
        assert_eq!(mock.logout_calls(), 1);
        assert_eq!(provider.mount().await, SessionState::unauthenticated());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmount_stops_refresh_attempts() {
        let mock = Arc::new(MockIdentityClient::signed_in("token-1", "pinochet"));
        let provider = provider_for(&mock);
        provider.mount().await;

        tokio::time::sleep(Duration::from_secs(61)).await;
        tokio::task::yield_now().await;
        assert_eq!(mock.update_calls(), 1);

        provider.unmount();
        assert!(!provider.is_mounted());
        tokio::time::sleep(Duration::from_secs(600)).await;

        assert_eq!(mock.update_calls(), 1);
    }

    #[tokio::test]
    async fn test_sync_identity_publishes_later_sign_in() {
        let mock = Arc::new(MockIdentityClient::signed_out());
        let provider = provider_for(&mock);
        assert_eq!(provider.mount().await, SessionState::unauthenticated());

        mock.set_signed_in("token-9", "franco");
        let state = provider.sync_identity();

        assert!(state.is_authenticated);
        assert_eq!(state.username.as_deref(), Some("franco"));
        assert_eq!(provider.reader().snapshot(), state);
        assert_eq!(mock.init_calls(), 1);
    }

    #[tokio::test]
    async fn test_scope_exposes_reader() {
        let mock = Arc::new(MockIdentityClient::signed_out());
        let provider = provider_for(&mock);
        provider.mount().await;

        let state = provider.scope(async { SessionScope::current().map(|r| r.snapshot()) }).await;

        assert!(!state.unwrap().is_loading);
    }
}
