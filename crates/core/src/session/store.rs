//! Session state distributor
//!
//! One [`SessionPublisher`] writes, any number of [`SessionReader`]s read.
//! Built on a `watch` channel so readers see a write as soon as it returns
//! and can await the next change.

use tokio::sync::watch;
use tracing::debug;

use super::SessionState;

/// Constructor for the publisher/reader pair
#[derive(Debug)]
pub struct SessionStore;

impl SessionStore {
    /// Create a store in the loading state
    #[allow(clippy::new_ret_no_self)]
    #[must_use]
    pub fn new() -> (SessionPublisher, SessionReader) {
        let (tx, rx) = watch::channel(SessionState::loading());
        (SessionPublisher { tx }, SessionReader { rx })
    }
}

/// The only writer of session state
///
/// Not `Clone`. No operation can put the state back into loading.
#[derive(Debug)]
pub struct SessionPublisher {
    tx: watch::Sender<SessionState>,
}

impl SessionPublisher {
    /// Publish the settled session
    ///
    /// `is_loading` is forced to `false` whatever the caller passes.
    pub fn settle(&self, state: SessionState) {
        let state = SessionState { is_loading: false, ..state };
        debug!(
            authenticated = state.is_authenticated,
            username = state.username.as_deref().unwrap_or("-"),
            "session settled"
        );
        self.tx.send_replace(state);
    }

    /// Drop the identity after logout, keeping the loading flag as is
    pub fn clear_identity(&self) {
        self.tx.send_modify(|state| {
            state.is_authenticated = false;
            state.username = None;
            state.claims = None;
        });
        debug!("session identity cleared");
    }

    /// Current state
    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        self.tx.borrow().clone()
    }

    /// A new reader of this store
    #[must_use]
    pub fn reader(&self) -> SessionReader {
        SessionReader { rx: self.tx.subscribe() }
    }
}

/// Read handle on session state
#[derive(Debug, Clone)]
pub struct SessionReader {
    rx: watch::Receiver<SessionState>,
}

impl SessionReader {
    /// Current state
    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        self.rx.borrow().clone()
    }

    /// Raw receiver, for `select!` loops and UI bindings
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.rx.clone()
    }

    /// Wait for the next write
    ///
    /// Returns `None` once the publisher is gone.
    pub async fn changed(&mut self) -> Option<SessionState> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    /// Wait until initialization has settled
    ///
    /// If the publisher goes away first, the last published state is
    /// returned.
    pub async fn settled(&mut self) -> SessionState {
        let settled = self.rx.wait_for(|state| !state.is_loading).await.map(|state| state.clone());
        settled.unwrap_or_else(|_| self.snapshot())
    }
}
