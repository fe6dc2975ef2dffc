//! Protocol utilities shared across Dictators Club crates.
//!
//! The [`auth`] module speaks the OpenID-Connect side of the identity
//! provider: token endpoint grants, PKCE, claim decoding and local token
//! storage. It holds no session policy; that lives in `dictators-core`.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod auth;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(any(feature = "test-utils", test))]
pub mod testing;

pub use auth::{AuthError, Claims, OidcClient, OidcConfig, TokenSet};
