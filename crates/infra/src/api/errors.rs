//! API-specific error types
//!
//! Classifies backend failures by HTTP status and transport outcome.

use std::time::Duration;

use dictators_domain::DictatorsError;
use reqwest::StatusCode;
use thiserror::Error;

/// Categories of API errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCategory {
    /// Authentication errors (401, 403)
    Authentication,
    /// Rate limiting errors (429)
    RateLimit,
    /// Server errors (5xx)
    Server,
    /// Client errors (4xx except auth), undecodable bodies
    Client,
    /// Network/connection errors and timeouts
    Network,
    /// Configuration errors
    Config,
}

/// API operation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Client error ({status}): {message}")]
    Client { status: u16, message: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),
}

impl ApiError {
    /// Map a non-success status to an error
    pub fn from_status(status: StatusCode, url: &str, body: &str) -> Self {
        let message = if body.is_empty() {
            format!("{url} returned status {status}")
        } else {
            format!("{url} returned status {status}: {body}")
        };

        match status {
            StatusCode::UNAUTHORIZED => Self::Unauthorized(message),
            StatusCode::FORBIDDEN => Self::Forbidden(message),
            StatusCode::NOT_FOUND => Self::NotFound(message),
            StatusCode::TOO_MANY_REQUESTS => Self::RateLimit(message),
            s if s.is_server_error() => Self::Server { status: s.as_u16(), message },
            s => Self::Client { status: s.as_u16(), message },
        }
    }

    /// Map a transport failure; `timeout` is the configured request timeout
    pub fn from_transport(err: &reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout)
        } else if err.is_builder() {
            Self::Config(err.to_string())
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }

    /// Get the error category for this error
    pub fn category(&self) -> ApiErrorCategory {
        match self {
            Self::Unauthorized(_) | Self::Forbidden(_) => ApiErrorCategory::Authentication,
            Self::RateLimit(_) => ApiErrorCategory::RateLimit,
            Self::Server { .. } => ApiErrorCategory::Server,
            Self::NotFound(_) | Self::Client { .. } | Self::Decode(_) => ApiErrorCategory::Client,
            Self::Network(_) | Self::Timeout(_) => ApiErrorCategory::Network,
            Self::Config(_) => ApiErrorCategory::Config,
        }
    }

    /// HTTP status behind this error, if it came from a response
    pub fn status(&self) -> Option<StatusCode> {
        let code = match self {
            Self::Unauthorized(_) => 401,
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::RateLimit(_) => 429,
            Self::Server { status, .. } | Self::Client { status, .. } => *status,
            Self::Decode(_) | Self::Network(_) | Self::Config(_) | Self::Timeout(_) => {
                return None
            }
        };
        StatusCode::from_u16(code).ok()
    }

    /// Check if this is a 401
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }
}

impl From<ApiError> for DictatorsError {
    fn from(err: ApiError) -> Self {
        let message = err.to_string();
        match err.category() {
            ApiErrorCategory::Authentication => Self::Auth(message),
            ApiErrorCategory::Network | ApiErrorCategory::Server | ApiErrorCategory::RateLimit => {
                Self::Network(message)
            }
            ApiErrorCategory::Config => Self::Config(message),
            ApiErrorCategory::Client if matches!(err, ApiError::NotFound(_)) => {
                Self::NotFound(message)
            }
            ApiErrorCategory::Client => Self::InvalidInput(message),
        }
    }
}
