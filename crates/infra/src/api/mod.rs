//! Dictators Club backend API
//!
//! Typed endpoints for dictators and achievements, sent through the
//! authorized request pipeline in [`crate::http`].

pub mod client;
pub mod errors;

pub use client::DictatorsApi;
pub use errors::{ApiError, ApiErrorCategory};
