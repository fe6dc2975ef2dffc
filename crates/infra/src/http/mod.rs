//! HTTP plumbing for the REST backend

pub mod authorized;

pub use authorized::{Attempt, AuthorizedClient, PendingRequest};
