//! # Dictators Club Application
//!
//! Application layer - context wiring and main entry point.
//!
//! This crate contains:
//! - Application context (dependency injection)
//! - Logging setup
//! - Main entry point
//!
//! ## Architecture
//! - Depends on `common`, `core`, and `infra`
//! - Wires up one identity client, session provider and API client per root

pub mod context;
pub mod utils;

// Re-export for convenience
pub use context::*;
