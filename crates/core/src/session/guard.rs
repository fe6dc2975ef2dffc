//! Session initialization guard
//!
//! Runs the identity provider handshake exactly once per application root.
//! The first caller starts it, callers arriving while it is in flight await
//! the same shared future, and callers after it settled read the cached
//! outcome. A failed handshake is cached too: it is terminal for this guard
//! and the provider is never asked again.

use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tracing::{debug, error, info};

use super::SessionError;
use crate::auth::{IdentityClient, IdentityError, InitOptions};

type InitOutcome = Result<bool, Arc<IdentityError>>;
type InitFuture = Shared<BoxFuture<'static, InitOutcome>>;

enum Status {
    NotStarted,
    InFlight(InitFuture),
    Settled(InitOutcome),
}

/// Observable guard status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardStatus {
    NotStarted,
    InFlight,
    /// Handshake completed; whether a session exists
    Settled(bool),
    Failed,
}

/// Exactly-once initialization of an identity client
pub struct SessionGuard {
    identity: Arc<dyn IdentityClient>,
    options: InitOptions,
    status: Mutex<Status>,
}

impl SessionGuard {
    /// Create a guard that has not started the handshake yet
    pub fn new(identity: Arc<dyn IdentityClient>, options: InitOptions) -> Self {
        Self { identity, options, status: Mutex::new(Status::NotStarted) }
    }

    /// Make sure the handshake ran, and return whether a session exists
    ///
    /// Safe to call from any number of concurrent call sites; only the first
    /// one reaches the identity provider.
    ///
    /// # Errors
    /// Returns [`SessionError::Initialization`] if the handshake failed,
    /// now or on an earlier call.
    pub async fn ensure_initialized(&self) -> Result<bool, SessionError> {
        let handshake = {
            let mut status = self.status.lock();
            match &*status {
                Status::Settled(outcome) => {
                    debug!("session already initialized");
                    return outcome.clone().map_err(SessionError::Initialization);
                }
                Status::InFlight(handshake) => handshake.clone(),
                Status::NotStarted => {
                    let handshake = self.start_handshake();
                    *status = Status::InFlight(handshake.clone());
                    handshake
                }
            }
        };

        let outcome = handshake.await;
        {
            let mut status = self.status.lock();
            if matches!(*status, Status::InFlight(_)) {
                *status = Status::Settled(outcome.clone());
            }
        }
        outcome.map_err(SessionError::Initialization)
    }

    /// Current status
    pub fn status(&self) -> GuardStatus {
        match &*self.status.lock() {
            Status::NotStarted => GuardStatus::NotStarted,
            Status::InFlight(_) => GuardStatus::InFlight,
            Status::Settled(Ok(authenticated)) => GuardStatus::Settled(*authenticated),
            Status::Settled(Err(_)) => GuardStatus::Failed,
        }
    }

    fn start_handshake(&self) -> InitFuture {
        let identity = Arc::clone(&self.identity);
        let options = self.options.clone();

        async move {
            info!(on_load = %options.on_load, "starting identity provider handshake");
            match identity.init(&options).await {
                Ok(authenticated) => {
                    info!(authenticated, "identity provider handshake completed");
                    Ok(authenticated)
                }
                Err(e) => {
                    error!(error = %e, "identity provider initialization failed");
                    Err(Arc::new(e))
                }
            }
        }
        .boxed()
        .shared()
    }
}

impl std::fmt::Debug for SessionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionGuard").field("status", &self.status()).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockIdentityClient;

    fn guard_for(mock: &Arc<MockIdentityClient>) -> SessionGuard {
        SessionGuard::new(Arc::clone(mock) as Arc<dyn IdentityClient>, InitOptions::default())
    }

    #[tokio::test]
    async fn test_fresh_guard_is_not_started() {
        let mock = Arc::new(MockIdentityClient::signed_out());
        let guard = guard_for(&mock);

        assert_eq!(guard.status(), GuardStatus::NotStarted);
        assert_eq!(mock.init_calls(), 0);
    }

    #[tokio::test]
    async fn test_settled_guard_serves_cached_outcome() {
        let mock = Arc::new(MockIdentityClient::signed_in("token-1", "idi"));
        let guard = guard_for(&mock);

        assert!(guard.ensure_initialized().await.unwrap());
        assert!(guard.ensure_initialized().await.unwrap());
        assert!(guard.ensure_initialized().await.unwrap());

        assert_eq!(mock.init_calls(), 1);
        assert_eq!(guard.status(), GuardStatus::Settled(true));
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_handshake() {
        let mock = Arc::new(MockIdentityClient::signed_out());
        let gate = mock.gate_init();
        let guard = Arc::new(guard_for(&mock));

        let callers: Vec<_> = (0..8)
            .map(|_| {
                let guard = Arc::clone(&guard);
                tokio::spawn(async move { guard.ensure_initialized().await })
            })
            .collect();

        tokio::task::yield_now().await;
        gate.notify_one();

        for caller in callers {
            assert!(!caller.await.unwrap().unwrap());
        }
        assert_eq!(mock.init_calls(), 1);
    }

    #[tokio::test]
    async fn test_failure_is_terminal_and_not_retried() {
        let mock = Arc::new(
            MockIdentityClient::signed_out()
                .with_init_result(Err(IdentityError::Unreachable("connection refused".into()))),
        );
        let guard = guard_for(&mock);

        let first = guard.ensure_initialized().await;
        let second = guard.ensure_initialized().await;

        assert!(matches!(first, Err(SessionError::Initialization(_))));
        match second {
            Err(SessionError::Initialization(e)) => {
                assert_eq!(*e, IdentityError::Unreachable("connection refused".into()));
            }
            other => panic!("expected cached failure, got {other:?}"),
        }
        assert_eq!(mock.init_calls(), 1);
        assert_eq!(guard.status(), GuardStatus::Failed);
    }

    #[tokio::test]
    async fn test_abandoned_caller_does_not_restart_handshake() {
        let mock = Arc::new(MockIdentityClient::signed_in("token-1", "idi"));
        let gate = mock.gate_init();
        let guard = guard_for(&mock);

        let abandoned =
            tokio::time::timeout(std::time::Duration::from_millis(10), guard.ensure_initialized())
                .await;
        assert!(abandoned.is_err());
        assert_eq!(guard.status(), GuardStatus::InFlight);

        gate.notify_one();
        assert!(guard.ensure_initialized().await.unwrap());
        assert_eq!(mock.init_calls(), 1);
    }
}
