//! # Dictators Club Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - Keycloak-backed identity client (OIDC code flow with PKCE)
//! - Authorized HTTP client with the refresh-and-retry-once pipeline
//! - Typed REST client for the dictators backend
//! - Configuration loading from files and environment
//!
//! ## Architecture
//! - Implements traits defined in `dictators-core`
//! - Depends on `dictators-common` and `dictators-core`
//! - Contains all "impure" code (network, filesystem, environment)

pub mod api;
pub mod config;
pub mod http;
pub mod identity;

// Re-export commonly used items
pub use api::{ApiError, ApiErrorCategory, DictatorsApi};
pub use http::{AuthorizedClient, PendingRequest};
pub use identity::KeycloakClient;
