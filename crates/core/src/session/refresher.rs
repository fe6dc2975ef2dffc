//! Background token refresher
//!
//! Keeps the access token fresh for as long as its handle lives. Every
//! interval, if a session exists, it asks the identity client to refresh a
//! token that expires within the lookahead window. Failures are logged and
//! swallowed: the next tick, or the next outgoing request, tries again.

use std::sync::Arc;
use std::time::Duration;

use dictators_domain::RefreshConfig;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::auth::IdentityClient;

/// Spawner for the refresh task
#[derive(Debug)]
pub struct TokenRefresher;

impl TokenRefresher {
    /// Spawn the refresh loop on the current runtime
    ///
    /// The first attempt happens one interval after spawning.
    #[must_use]
    pub fn spawn(identity: Arc<dyn IdentityClient>, config: &RefreshConfig) -> RefresherHandle {
        let interval = Duration::from_secs(config.interval_seconds.max(1));
        let min_validity = Duration::from_secs(config.min_validity_seconds);
        let cancel = CancellationToken::new();

        info!(
            interval_secs = interval.as_secs(),
            min_validity_secs = min_validity.as_secs(),
            "starting token refresher"
        );

        let task = tokio::spawn(refresh_loop(identity, interval, min_validity, cancel.clone()));

        RefresherHandle { cancel, task: Some(task) }
    }
}

async fn refresh_loop(
    identity: Arc<dyn IdentityClient>,
    interval: Duration,
    min_validity: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!("token refresher cancelled");
                break;
            }
            _ = ticker.tick() => {
                if !identity.authenticated() {
                    trace!("no session, skipping token refresh");
                    continue;
                }
                match identity.update_token(min_validity).await {
                    Ok(true) => debug!("access token refreshed in background"),
                    Ok(false) => trace!("access token still valid"),
                    Err(e) => warn!(error = %e, "background token refresh failed"),
                }
            }
        }
    }
}

/// Owner of a running refresh task
///
/// Stopping or dropping the handle cancels the task.
#[derive(Debug)]
pub struct RefresherHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl RefresherHandle {
    /// Cancel the task; no attempt starts after this returns
    pub fn stop(&self) {
        if !self.cancel.is_cancelled() {
            info!("stopping token refresher");
            self.cancel.cancel();
        }
    }

    /// Whether the task was cancelled
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Cancel the task and wait for it to exit
    pub async fn shutdown(mut self) {
        self.stop();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "token refresher task ended abnormally");
            }
        }
    }
}

impl Drop for RefresherHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::IdentityError;
    use crate::testing::{MockIdentityClient, UpdateBehavior};

    fn config() -> RefreshConfig {
        RefreshConfig::default()
    }

    async fn advance(secs: u64) {
        tokio::time::sleep(Duration::from_secs(secs)).await;
        tokio::task::yield_now().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_attempt_after_one_interval() {
        let mock = Arc::new(MockIdentityClient::signed_in("token-1", "idi"));
        let _handle = TokenRefresher::spawn(mock.clone(), &config());

        advance(59).await;
        assert_eq!(mock.update_calls(), 0);

        advance(2).await;
        assert_eq!(mock.update_calls(), 1);
        assert_eq!(mock.update_windows(), vec![Duration::from_secs(30)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_skips_ticks_without_session() {
        let mock = Arc::new(MockIdentityClient::signed_out());
        let _handle = TokenRefresher::spawn(mock.clone(), &config());

        advance(300).await;

        assert_eq!(mock.update_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_are_swallowed() {
        let mock = Arc::new(MockIdentityClient::signed_in("token-1", "idi"));
        mock.set_default_update(UpdateBehavior::Fail(IdentityError::Refresh("boom".into())));
        let handle = TokenRefresher::spawn(mock.clone(), &config());

        advance(181).await;

        assert_eq!(mock.update_calls(), 3);
        assert!(mock.authenticated());
        assert!(!handle.is_stopped());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_task() {
        let mock = Arc::new(MockIdentityClient::signed_in("token-1", "idi"));
        let handle = TokenRefresher::spawn(mock.clone(), &config());

        advance(61).await;
        drop(handle);
        advance(600).await;

        assert_eq!(mock.update_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_waits_for_exit() {
        let mock = Arc::new(MockIdentityClient::signed_in("token-1", "idi"));
        let handle = TokenRefresher::spawn(mock.clone(), &config());

        handle.shutdown().await;
        advance(600).await;

        assert_eq!(mock.update_calls(), 0);
    }
}
