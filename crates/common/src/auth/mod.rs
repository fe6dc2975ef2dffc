//! OpenID-Connect client primitives
//!
//! Everything needed to hold and renew a provider session from a public
//! client: PKCE authorization requests, authorization-code and refresh-token
//! grants, decoded token claims and a pluggable local token store.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │   OidcClient    │  Token endpoint grants + redirect URLs
//! └────────┬────────┘
//!          │
//!          ├──► PkceChallenge   (S256 challenge + CSRF state)
//!          ├──► TokenSet        (access/refresh/id tokens with expiry)
//!          ├──► Claims          (decoded access-token payload)
//!          └──► TokenStore      (where a session survives reloads)
//! ```
//!
//! Session policy (initialize once, refresh in background, retry on 401)
//! is built on top of these primitives in `dictators-core`.

pub mod claims;
pub mod client;
pub mod pkce;
pub mod store;
pub mod types;

pub use claims::{decode_claims, expiry_from_claims, username_from_claims, Claims};
pub use client::{AuthError, OidcClient};
pub use pkce::{generate_code_challenge, generate_code_verifier, generate_state, PkceChallenge};
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use types::{OidcConfig, ProviderError, TokenResponse, TokenSet};
