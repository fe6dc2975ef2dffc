//! Configuration loader
//!
//! Loads application configuration from a config file and environment
//! variables. Every setting has a default, so an empty environment yields a
//! working configuration pointed at the public realm.
//!
//! ## Loading Strategy
//! 1. Reads `.env` from the working directory if present
//! 2. Probes multiple paths for a config file (JSON or TOML); without one,
//!    starts from defaults
//! 3. Environment variables override whatever the file or defaults say
//!
//! ## Environment Variables
//! - `DICTATORS_KEYCLOAK_URL`: Identity provider base URL
//! - `DICTATORS_KEYCLOAK_REALM`: Realm name
//! - `DICTATORS_KEYCLOAK_CLIENT_ID`: Public client id
//! - `DICTATORS_KEYCLOAK_ON_LOAD`: `check-sso` or `login-required`
//! - `DICTATORS_REDIRECT_URI`: Where the provider redirects after login/logout
//! - `DICTATORS_API_BASE_URL`: REST backend base URL
//! - `DICTATORS_API_TIMEOUT_SECS`: Per-request timeout in seconds
//! - `DICTATORS_REFRESH_INTERVAL_SECS`: Background refresh interval
//! - `DICTATORS_REFRESH_MIN_VALIDITY_SECS`: Refresh lookahead before requests
//! - `DICTATORS_RETRY_MIN_VALIDITY_SECS`: Refresh lookahead after a 401
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.json` or `./config.toml` (current working directory)
//! 2. `./dictators.json` or `./dictators.toml` (current working directory)
//! 3. `../config.json` or `../config.toml` (parent directory)
//! 4. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use dictators_domain::{Config, DictatorsError, OnLoad, Result};

/// Load configuration: `.env`, then file (or defaults), then environment
///
/// # Errors
/// Returns `DictatorsError::Config` if a config file exists but is invalid
/// or an environment variable has an invalid value.
pub fn load() -> Result<Config> {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env file"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!(error = %e, "Ignoring unreadable .env file"),
    }

    let base = match probe_config_paths() {
        Some(path) => load_from_file(Some(path))?,
        None => {
            tracing::debug!("No config file found, starting from defaults");
            Config::default()
        }
    };

    let config = apply_env(base)?;
    tracing::info!(
        realm = %config.identity.realm,
        api = %config.api.base_url,
        "Configuration loaded"
    );
    Ok(config)
}

/// Load configuration from defaults and environment variables only
///
/// # Errors
/// Returns `DictatorsError::Config` if a variable has an invalid value.
pub fn load_from_env() -> Result<Config> {
    apply_env(Config::default())
}

/// Override `config` with every environment variable that is set
///
/// Empty variables count as unset.
///
/// # Errors
/// Returns `DictatorsError::Config` if a numeric or enum variable cannot
/// be parsed.
pub fn apply_env(mut config: Config) -> Result<Config> {
    if let Some(url) = env_string("DICTATORS_KEYCLOAK_URL") {
        config.identity.url = url;
    }
    if let Some(realm) = env_string("DICTATORS_KEYCLOAK_REALM") {
        config.identity.realm = realm;
    }
    if let Some(client_id) = env_string("DICTATORS_KEYCLOAK_CLIENT_ID") {
        config.identity.client_id = client_id;
    }
    if let Some(on_load) = env_string("DICTATORS_KEYCLOAK_ON_LOAD") {
        config.identity.on_load = OnLoad::from_str(&on_load).map_err(|e| {
            DictatorsError::Config(format!("Invalid DICTATORS_KEYCLOAK_ON_LOAD: {e}"))
        })?;
    }
    if let Some(redirect_uri) = env_string("DICTATORS_REDIRECT_URI") {
        config.identity.redirect_uri = redirect_uri;
    }
    if let Some(base_url) = env_string("DICTATORS_API_BASE_URL") {
        config.api.base_url = base_url;
    }
    if let Some(timeout) = env_u64("DICTATORS_API_TIMEOUT_SECS")? {
        config.api.timeout_seconds = timeout;
    }
    if let Some(interval) = env_u64("DICTATORS_REFRESH_INTERVAL_SECS")? {
        config.refresh.interval_seconds = interval;
    }
    if let Some(window) = env_u64("DICTATORS_REFRESH_MIN_VALIDITY_SECS")? {
        config.refresh.min_validity_seconds = window;
    }
    if let Some(window) = env_u64("DICTATORS_RETRY_MIN_VALIDITY_SECS")? {
        config.refresh.retry_min_validity_seconds = window;
    }

    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
/// Missing sections and fields take their defaults.
///
/// # Errors
/// Returns `DictatorsError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(DictatorsError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            DictatorsError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| DictatorsError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| DictatorsError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| DictatorsError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(DictatorsError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    const NAMES: [&str; 4] = ["config.json", "config.toml", "dictators.json", "dictators.toml"];

    let mut roots = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        roots.push(cwd.clone());
        roots.push(cwd.join(".."));
    }
    if let Some(exe_dir) = std::env::current_exe().ok().and_then(|p| p.parent().map(Path::to_path_buf))
    {
        roots.push(exe_dir);
    }

    roots
        .iter()
        .flat_map(|root| NAMES.iter().map(move |name| root.join(name)))
        .find(|path| path.exists())
}

/// Get an environment variable, treating empty values as unset
fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Parse an optional numeric environment variable
///
/// # Errors
/// Returns `DictatorsError::Config` if the variable is set but not a
/// non-negative integer.
fn env_u64(key: &str) -> Result<Option<u64>> {
    env_string(key)
        .map(|value| {
            value
                .parse::<u64>()
                .map_err(|e| DictatorsError::Config(format!("Invalid {key} '{value}': {e}")))
        })
        .transpose()
}
