//! Provider scope for session readers
//!
//! Code running inside [`SessionScope::scope`] can fetch the session reader
//! without it being threaded through every call. Outside a scope the lookup
//! fails instead of returning a default state.

use std::future::Future;

use super::{SessionError, SessionReader};

tokio::task_local! {
    static CURRENT_SESSION: SessionReader;
}

/// Task-local access to the current session reader
#[derive(Debug)]
pub struct SessionScope;

impl SessionScope {
    /// Run `future` with `reader` as the current session
    pub async fn scope<F: Future>(reader: SessionReader, future: F) -> F::Output {
        CURRENT_SESSION.scope(reader, future).await
    }

    /// Reader of the enclosing scope
    ///
    /// # Errors
    /// Returns [`SessionError::OutsideProvider`] when called outside of
    /// [`SessionScope::scope`].
    pub fn current() -> Result<SessionReader, SessionError> {
        CURRENT_SESSION.try_with(SessionReader::clone).map_err(|_| SessionError::OutsideProvider)
    }
}
