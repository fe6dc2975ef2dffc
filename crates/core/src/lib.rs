//! # Dictators Club Core
//!
//! Session logic of the client runtime - no HTTP or provider code.
//!
//! This crate contains:
//! - The identity provider port ([`auth::IdentityClient`])
//! - Exactly-once session initialization, the shared session state and the
//!   background token refresher ([`session`])
//! - The route access decision ([`routing`])
//!
//! ## Architecture Principles
//! - Only depends on `dictators-common` and `dictators-domain`
//! - The identity provider is reached through a trait
//! - One [`session::SessionProvider`] per application root; no globals

pub mod auth;
pub mod debug;
pub mod routing;
pub mod session;

// Testing utilities
#[cfg(any(feature = "test-utils", test))]
pub mod testing;

pub use auth::{IdentityClient, IdentityError, InitOptions, Redirector};
pub use debug::{log_auth_state, AuthDebugInfo};
pub use routing::{guard, Route, RouteDecision};
pub use session::{
    SessionError, SessionGuard, SessionProvider, SessionReader, SessionScope, SessionState,
};
