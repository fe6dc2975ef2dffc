//! Authorized request pipeline
//!
//! Every backend call goes through [`AuthorizedClient::execute`]:
//!
//! ```text
//! Sending(Original) ──401 + session──► AwaitingRefresh ──refreshed──► Retrying
//!        │                                   │                             │
//!        │                                   └──refresh failed: login()    ▼
//!        │                                              │           Sending(Retry)
//!        ▼                                              ▼                  │
//!      Done ◄───────────────────────────────────────────┴──────────────────┘
//! ```
//!
//! Only `Sending(Original)` can move to `AwaitingRefresh`, so a request is
//! retried at most once and a 401 on the retry is returned as it is.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use dictators_core::auth::IdentityClient;
use dictators_domain::{ApiConfig, RefreshConfig};
use futures::FutureExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, Response, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use crate::api::errors::ApiError;

/// A backend call, kept whole so it can be re-issued verbatim
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRequest {
    pub method: Method,
    /// Path relative to the API base URL, starting with `/`
    pub path: String,
    pub body: Option<Value>,
}

impl PendingRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self { method, path: path.into(), body: None }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Attach a JSON body
    ///
    /// # Errors
    /// Returns [`ApiError::Config`] if `body` cannot be serialized.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::Config(format!("Failed to serialize body: {e}")))?;
        self.body = Some(value);
        Ok(self)
    }
}

/// Which send of a request this is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    Original,
    Retry,
}

enum State {
    Sending(Attempt),
    AwaitingRefresh(Response),
    Retrying,
    Done(Result<Response, ApiError>),
}

/// HTTP client that attaches bearer tokens and recovers from one 401
pub struct AuthorizedClient {
    http: Client,
    base_url: String,
    timeout: Duration,
    identity: Arc<dyn IdentityClient>,
    request_min_validity: Duration,
    retry_min_validity: Duration,
}

impl AuthorizedClient {
    /// Create a client for the backend at `api.base_url`
    ///
    /// # Errors
    /// Returns [`ApiError::Config`] if `api.base_url` is not an absolute URL
    /// or the HTTP client cannot be built.
    pub fn new(
        api: &ApiConfig,
        refresh: &RefreshConfig,
        identity: Arc<dyn IdentityClient>,
    ) -> Result<Self, ApiError> {
        Url::parse(&api.base_url).map_err(|e| {
            ApiError::Config(format!("Invalid API base URL '{}': {e}", api.base_url))
        })?;
        let timeout = Duration::from_secs(api.timeout_seconds.max(1));
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: api.base_url.trim_end_matches('/').to_string(),
            timeout,
            identity,
            request_min_validity: Duration::from_secs(refresh.min_validity_seconds),
            retry_min_validity: Duration::from_secs(refresh.retry_min_validity_seconds),
        })
    }

    /// Base URL of the backend
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send `request`, refreshing and retrying once on a 401
    ///
    /// Statuses other than the handled 401 come back as `Ok` responses; the
    /// caller decides what they mean.
    ///
    /// # Errors
    /// Returns [`ApiError::Unauthorized`] when the 401 could not be
    /// recovered from, and a transport error when a send failed.
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    pub async fn execute(&self, request: PendingRequest) -> Result<Response, ApiError> {
        let mut state = State::Sending(Attempt::Original);

        loop {
            state = match state {
                State::Sending(attempt) => {
                    let token = match attempt {
                        Attempt::Original => self.fresh_token().await,
                        // The refresh that led here already ran after the 401.
                        Attempt::Retry => self.identity.token(),
                    };
                    match self.send(&request, token.as_deref(), attempt).await {
                        Ok(response) => self.on_response(attempt, response),
                        Err(e) => State::Done(Err(e)),
                    }
                }
                State::AwaitingRefresh(unauthorized) => self.recover(unauthorized).await,
                State::Retrying => {
                    info!("retrying request with refreshed token");
                    State::Sending(Attempt::Retry)
                }
                State::Done(outcome) => return outcome,
            };
        }
    }

    /// Request phase: refresh a token that is about to expire, then read it
    async fn fresh_token(&self) -> Option<String> {
        if !self.identity.authenticated() {
            debug!("no session, sending without token");
            return None;
        }

        match self.identity.update_token(self.request_min_validity).await {
            Ok(refreshed) => {
                let token = self.identity.token();
                if token.is_none() {
                    warn!("session without access token");
                }
                debug!(refreshed, has_token = token.is_some(), "token ready");
                token
            }
            Err(e) => {
                warn!(error = %e, "token refresh before request failed, sending without token");
                None
            }
        }
    }

    fn on_response(&self, attempt: Attempt, response: Response) -> State {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED
            && attempt == Attempt::Original
            && self.identity.authenticated()
        {
            debug!("401 with live session");
            return State::AwaitingRefresh(response);
        }
        if status == StatusCode::UNAUTHORIZED && attempt == Attempt::Retry {
            warn!("retried request was rejected again");
        }
        State::Done(Ok(response))
    }

    /// Response phase: one short-window refresh after a 401
    async fn recover(&self, unauthorized: Response) -> State {
        // Covers a panic while building the future as well as while polling it.
        let refreshed =
            AssertUnwindSafe(async { self.identity.update_token(self.retry_min_validity).await })
                .catch_unwind()
                .await;

        match refreshed {
            Ok(Ok(_)) => State::Retrying,
            Ok(Err(e)) => {
                warn!(error = %e, "token refresh after 401 failed, starting login");
                self.give_up(unauthorized).await
            }
            Err(_) => {
                error!("token refresh after 401 panicked, starting login");
                self.give_up(unauthorized).await
            }
        }
    }

    async fn give_up(&self, unauthorized: Response) -> State {
        self.identity.login().await;
        let url = unauthorized.url().to_string();
        let body = unauthorized.text().await.unwrap_or_default();
        State::Done(Err(ApiError::from_status(StatusCode::UNAUTHORIZED, &url, &body)))
    }

    async fn send(
        &self,
        request: &PendingRequest,
        token: Option<&str>,
        attempt: Attempt,
    ) -> Result<Response, ApiError> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = self
            .http
            .request(request.method.clone(), &url)
            .header(CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        debug!(?attempt, %url, authorized = token.is_some(), "sending HTTP request");
        let response =
            builder.send().await.map_err(|e| ApiError::from_transport(&e, self.timeout))?;
        debug!(?attempt, %url, status = %response.status(), "received HTTP response");
        Ok(response)
    }
}

impl std::fmt::Debug for AuthorizedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizedClient")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
