//! Testing utilities
//!
//! [`MockIdentityClient`] is a scriptable, counting identity client. It
//! keeps token state like a real adapter would so session code can be
//! exercised without an identity provider.

// Mock setup is infallible in tests; the scripted panic is deliberate.
#![allow(clippy::missing_panics_doc, clippy::panic)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::Notify;

use crate::auth::{Claims, IdentityClient, IdentityError, InitOptions};

/// Scripted outcome of one `update_token` call
#[derive(Debug, Clone)]
pub enum UpdateBehavior {
    /// Token still valid: `Ok(false)`
    Fresh,
    /// Replace the token and return `Ok(true)`
    Refresh(String),
    /// Return the error
    Fail(IdentityError),
    /// Panic inside the call
    Panic,
}

#[derive(Debug)]
struct MockState {
    authenticated: bool,
    token: Option<String>,
    claims: Option<Claims>,
    init_result: Result<bool, IdentityError>,
    updates: VecDeque<UpdateBehavior>,
    default_update: UpdateBehavior,
    update_windows: Vec<Duration>,
}

/// Scriptable identity client
#[derive(Debug)]
pub struct MockIdentityClient {
    state: Mutex<MockState>,
    init_gate: Mutex<Option<Arc<Notify>>>,
    init_calls: AtomicUsize,
    login_calls: AtomicUsize,
    logout_calls: AtomicUsize,
    update_calls: AtomicUsize,
}

impl MockIdentityClient {
    fn with_state(state: MockState) -> Self {
        Self {
            state: Mutex::new(state),
            init_gate: Mutex::new(None),
            init_calls: AtomicUsize::new(0),
            login_calls: AtomicUsize::new(0),
            logout_calls: AtomicUsize::new(0),
            update_calls: AtomicUsize::new(0),
        }
    }

    /// No session; `init` resolves `false`
    #[must_use]
    pub fn signed_out() -> Self {
        Self::with_state(MockState {
            authenticated: false,
            token: None,
            claims: None,
            init_result: Ok(false),
            updates: VecDeque::new(),
            default_update: UpdateBehavior::Fail(IdentityError::NoSession),
            update_windows: Vec::new(),
        })
    }

    /// Existing session for `username`; `init` resolves `true`
    #[must_use]
    pub fn signed_in(token: &str, username: &str) -> Self {
        Self::with_state(MockState {
            authenticated: true,
            token: Some(token.to_string()),
            claims: Some(claims_for(username)),
            init_result: Ok(true),
            updates: VecDeque::new(),
            default_update: UpdateBehavior::Fresh,
            update_windows: Vec::new(),
        })
    }

    /// Override what `init` resolves to
    #[must_use]
    pub fn with_init_result(self, result: Result<bool, IdentityError>) -> Self {
        self.state.lock().init_result = result;
        self
    }

    /// Make `init` wait until the returned gate is notified
    pub fn gate_init(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.init_gate.lock() = Some(Arc::clone(&gate));
        gate
    }

    /// Queue the outcome of the next unscripted `update_token` call
    pub fn push_update(&self, behavior: UpdateBehavior) {
        self.state.lock().updates.push_back(behavior);
    }

    /// Outcome once the queue is empty
    pub fn set_default_update(&self, behavior: UpdateBehavior) {
        self.state.lock().default_update = behavior;
    }

    /// Switch to an authenticated session, as a completed login would
    pub fn set_signed_in(&self, token: &str, username: &str) {
        let mut state = self.state.lock();
        state.authenticated = true;
        state.token = Some(token.to_string());
        state.claims = Some(claims_for(username));
    }

    /// Replace the current token
    pub fn set_token(&self, token: Option<&str>) {
        self.state.lock().token = token.map(str::to_string);
    }

    /// Set or replace one claim
    pub fn set_claim(&self, key: &str, value: Value) {
        self.state.lock().claims.get_or_insert_with(Claims::new).insert(key.to_string(), value);
    }

    /// Number of `init` calls
    pub fn init_calls(&self) -> usize {
        self.init_calls.load(Ordering::SeqCst)
    }

    /// Number of `login` calls
    pub fn login_calls(&self) -> usize {
        self.login_calls.load(Ordering::SeqCst)
    }

    /// Number of `logout` calls
    pub fn logout_calls(&self) -> usize {
        self.logout_calls.load(Ordering::SeqCst)
    }

    /// Number of `update_token` calls
    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    /// `min_validity` of every `update_token` call, in order
    pub fn update_windows(&self) -> Vec<Duration> {
        self.state.lock().update_windows.clone()
    }
}

fn claims_for(username: &str) -> Claims {
    let mut claims = Claims::new();
    claims.insert("preferred_username".to_string(), json!(username));
    claims.insert("sub".to_string(), json!(format!("{username}-id")));
    claims
}

#[async_trait]
impl IdentityClient for MockIdentityClient {
    async fn init(&self, _options: &InitOptions) -> Result<bool, IdentityError> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.init_gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.state.lock().init_result.clone()
    }

    async fn login(&self) {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
    }

    async fn logout(&self) {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock();
        state.authenticated = false;
        state.token = None;
        state.claims = None;
    }

    async fn update_token(&self, min_validity: Duration) -> Result<bool, IdentityError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        let behavior = {
            let mut state = self.state.lock();
            state.update_windows.push(min_validity);
            state.updates.pop_front().unwrap_or_else(|| state.default_update.clone())
        };

        match behavior {
            UpdateBehavior::Fresh => Ok(false),
            UpdateBehavior::Refresh(token) => {
                self.state.lock().token = Some(token);
                Ok(true)
            }
            UpdateBehavior::Fail(e) => Err(e),
            UpdateBehavior::Panic => panic!("scripted update_token panic"),
        }
    }

    fn token(&self) -> Option<String> {
        self.state.lock().token.clone()
    }

    fn authenticated(&self) -> bool {
        self.state.lock().authenticated
    }

    fn token_parsed(&self) -> Option<Claims> {
        self.state.lock().claims.clone()
    }
}
