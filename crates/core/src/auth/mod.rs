//! Identity provider boundary

pub mod ports;

pub use ports::{
    username_from_claims, Claims, IdentityClient, IdentityError, InitOptions, Redirector,
};
