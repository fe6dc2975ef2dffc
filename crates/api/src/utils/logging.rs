use std::time::Duration;

use dictators_domain::DictatorsError;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or invalid
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Set to `json` for one JSON object per event
pub const LOG_FORMAT_ENV: &str = "DICTATORS_LOG_FORMAT";

/// Install the global `tracing` subscriber.
///
/// Honours `RUST_LOG` and falls back to [`DEFAULT_LOG_FILTER`]. A second call
/// leaves the first subscriber in place.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let json = std::env::var(LOG_FORMAT_ENV).is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    let result = if json { builder.json().try_init() } else { builder.try_init() };

    if let Err(e) = result {
        tracing::debug!(error = %e, "tracing subscriber already installed");
    }
}

/// Log the outcome of an API operation with structured fields.
///
/// # Parameters
/// * `operation` - Logical operation identifier (e.g. `"dictators::list"`).
/// * `elapsed` - Duration the operation took.
/// * `error` - The failure, if any.
///
/// Callers must avoid forwarding sensitive values in `operation`.
#[inline]
pub fn log_operation(operation: &str, elapsed: Duration, error: Option<&DictatorsError>) {
    let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

    match error {
        None => info!(operation, duration_ms, "operation_success"),
        Some(e) => {
            warn!(operation, duration_ms, error_type = error_label(e), error = %e, "operation_failure");
        }
    }
}

/// Convert a `DictatorsError` into a stable label suitable for logging.
#[inline]
pub fn error_label(error: &DictatorsError) -> &'static str {
    match error {
        DictatorsError::Config(_) => "config",
        DictatorsError::Network(_) => "network",
        DictatorsError::Auth(_) => "auth",
        DictatorsError::NotFound(_) => "not_found",
        DictatorsError::InvalidInput(_) => "invalid_input",
        DictatorsError::Internal(_) => "internal",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_labels_are_stable() {
        assert_eq!(error_label(&DictatorsError::Network("down".into())), "network");
        assert_eq!(error_label(&DictatorsError::Auth("expired".into())), "auth");
        assert_eq!(error_label(&DictatorsError::NotFound("dictator 9".into())), "not_found");
    }

    #[test]
    fn test_init_tracing_twice_is_harmless() {
        init_tracing();
        init_tracing();
    }
}
