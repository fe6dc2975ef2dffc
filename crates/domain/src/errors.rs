//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Dictators Club
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum DictatorsError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for Dictators Club operations
pub type Result<T> = std::result::Result<T, DictatorsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serializes_with_type_tag() {
        let err = DictatorsError::Auth("token refresh failed".to_string());
        let json = serde_json::to_value(&err).unwrap();

        assert_eq!(json["type"], "Auth");
        assert_eq!(json["message"], "token refresh failed");
    }

    #[test]
    fn test_error_display() {
        let err = DictatorsError::Config("missing realm".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing realm");
    }
}
