//! Identity provider adapters

pub mod keycloak;

pub use keycloak::KeycloakClient;
