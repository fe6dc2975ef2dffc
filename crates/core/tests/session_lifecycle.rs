//! Integration tests for the session lifecycle
//!
//! Walks an application root through load, initialization, route guarding
//! and logout using the scriptable identity client.

use std::sync::Arc;

use dictators_core::auth::{IdentityClient, InitOptions};
use dictators_core::routing::{guard, Route, RouteDecision};
use dictators_core::session::{GuardStatus, SessionProvider, SessionScope, SessionState};
use dictators_core::testing::MockIdentityClient;
use dictators_domain::RefreshConfig;

fn provider(mock: &Arc<MockIdentityClient>) -> Arc<SessionProvider> {
    let identity: Arc<dyn IdentityClient> = mock.clone();
    Arc::new(SessionProvider::new(identity, InitOptions::default(), RefreshConfig::default()))
}

/// Load without an existing provider session.
///
/// # Test Steps
/// 1. Reader starts in the loading state; protected route shows loading
/// 2. Handshake resolves `false`
/// 3. State settles anonymous; protected route redirects home
#[tokio::test]
async fn test_anonymous_load_redirects_protected_routes() {
    let mock = Arc::new(MockIdentityClient::signed_out());
    let gate = mock.gate_init();
    let provider = provider(&mock);
    let mut reader = provider.reader();

    assert!(reader.snapshot().is_loading);
    assert_eq!(guard(&Route::Profile, &reader.snapshot()), RouteDecision::Loading);

    let mounting = tokio::spawn({
        let provider = Arc::clone(&provider);
        async move { provider.mount().await }
    });
    tokio::task::yield_now().await;
    assert_eq!(provider.guard().status(), GuardStatus::InFlight);

    gate.notify_one();
    let settled = reader.settled().await;
    mounting.await.expect("mount task");

    assert_eq!(settled, SessionState::unauthenticated());
    assert_eq!(guard(&Route::parse("/profile"), &settled), RouteDecision::Redirect(Route::Home));
    assert_eq!(guard(&Route::parse("/dictators/3"), &settled), RouteDecision::Render);
}

/// Concurrent mounts of the same root share one handshake and one outcome.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_mounts_initialize_once() {
    let mock = Arc::new(MockIdentityClient::signed_in("token-1", "bokassa"));
    let gate = mock.gate_init();
    let provider = provider(&mock);

    let mounts: Vec<_> = (0..16)
        .map(|_| {
            let provider = Arc::clone(&provider);
            tokio::spawn(async move { provider.mount().await })
        })
        .collect();

    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    gate.notify_one();

    for mount in mounts {
        let state = mount.await.expect("mount task");
        assert!(state.is_authenticated);
        assert_eq!(state.username.as_deref(), Some("bokassa"));
    }
    assert_eq!(mock.init_calls(), 1);

    // Settled roots answer from the cache.
    assert!(provider.guard().ensure_initialized().await.expect("cached"));
    assert_eq!(mock.init_calls(), 1);
}

/// Readers inside the provider scope follow login state through logout.
#[tokio::test]
async fn test_scoped_reader_observes_logout() {
    let mock = Arc::new(MockIdentityClient::signed_in("token-1", "bokassa"));
    let provider = provider(&mock);
    provider.mount().await;

    let observed = provider
        .scope(async {
            let mut reader = SessionScope::current().expect("inside scope");
            assert!(reader.snapshot().is_authenticated);

            provider.logout().await;
            reader.changed().await
        })
        .await
        .expect("state change");

    assert_eq!(observed, SessionState::unauthenticated());
    assert_eq!(guard(&Route::CreateProfile, &observed), RouteDecision::Redirect(Route::Home));
    assert!(SessionScope::current().is_err());
}
