//! # Dictators Club Domain
//!
//! Business domain types and models for the Dictators Club client.
//!
//! This crate contains:
//! - Domain data types (Dictator, Achievement and their request shapes)
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Route, endpoint and message constants
//!
//! ## Architecture
//! - No dependencies on other Dictators Club crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
