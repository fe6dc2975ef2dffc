//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application.

pub const APP_NAME: &str = "Dictators Club";
pub const APP_DESCRIPTION: &str = "A platform for managing dictator profiles and achievements";

// Identity provider defaults
pub const DEFAULT_KEYCLOAK_URL: &str = "https://auth.kneo.io/";
pub const DEFAULT_KEYCLOAK_REALM: &str = "zona-x";
pub const DEFAULT_KEYCLOAK_CLIENT_ID: &str = "useless";
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:5173/";

// REST backend defaults
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 30;

// Token freshness
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_REFRESH_MIN_VALIDITY_SECS: u64 = 30;
pub const DEFAULT_RETRY_MIN_VALIDITY_SECS: u64 = 5;

// Backend endpoints
pub const ENDPOINT_DICTATORS: &str = "/dictators";
pub const ENDPOINT_ACHIEVEMENTS: &str = "/achievements";
pub const ENDPOINT_INIT_SAMPLE_DATA: &str = "/init/sample-data";

// Route paths
pub const ROUTE_HOME: &str = "/";
pub const ROUTE_DICTATORS: &str = "/dictators";
pub const ROUTE_DICTATOR_DETAIL: &str = "/dictators/:id";
pub const ROUTE_PROFILE: &str = "/profile";
pub const ROUTE_CREATE_PROFILE: &str = "/create";

// User-facing messages
pub const MESSAGE_LOADING: &str = "Loading...";
pub const MESSAGE_ERROR: &str = "Something went wrong";
pub const MESSAGE_NO_DATA: &str = "No data available";
pub const MESSAGE_UNAUTHORIZED: &str = "You need to be authenticated to access this page";
pub const MESSAGE_FORBIDDEN: &str = "You do not have permission to access this resource";
