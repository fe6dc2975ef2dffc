//! Dictators Club - command line client
//!
//! Loads configuration, settles the identity session and lists the
//! registered dictators.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use dictators_common::auth::{FileTokenStore, MemoryTokenStore, TokenStore};
use dictators_core::log_auth_state;
use dictators_domain::DictatorsError;
use dictators_lib::utils::{init_tracing, log_operation};
use dictators_lib::{AppContext, LoggingRedirector};
use tracing::info;

/// Path of the persisted session; unset keeps it in memory
const SESSION_FILE_ENV: &str = "DICTATORS_SESSION_FILE";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging FIRST so we can see .env and config loading
    init_tracing();

    let config = dictators_infra::config::load().context("failed to load configuration")?;

    let store: Arc<dyn TokenStore> = match std::env::var_os(SESSION_FILE_ENV) {
        Some(path) => {
            info!(path = %std::path::Path::new(&path).display(), "persisting session to file");
            Arc::new(FileTokenStore::new(path))
        }
        None => Arc::new(MemoryTokenStore::new()),
    };

    let ctx = AppContext::with_token_store(config, Arc::new(LoggingRedirector), store)
        .context("failed to create application context")?;

    let state = ctx.start().await;
    info!(
        authenticated = state.is_authenticated,
        username = state.username.as_deref().unwrap_or("-"),
        "Dictators Club session ready"
    );
    log_auth_state(ctx.session().identity().as_ref());

    let started = Instant::now();
    match ctx.api().get_dictators().await {
        Ok(dictators) => {
            log_operation("dictators::list", started.elapsed(), None);
            info!(count = dictators.len(), "dictators loaded");
            for dictator in &dictators {
                info!(
                    id = dictator.id,
                    name = %dictator.name,
                    country = %dictator.country,
                    years = %dictator.years_in_power,
                    "dictator"
                );
            }
        }
        Err(e) => {
            let error = DictatorsError::from(e);
            log_operation("dictators::list", started.elapsed(), Some(&error));
        }
    }

    ctx.shutdown().await?;
    Ok(())
}
