//! Maintenance tooling for the studyhall database.
//!
//! Loads configuration, initialises logging, builds the shared
//! [`Store`](studyhall_store::Store), and implements the operations behind
//! the `studyhall-admin` binary.

pub mod commands;
pub mod config;

use std::sync::Arc;

use studyhall_db::ConnectionProvider;
use studyhall_store::Store;
use tracing_subscriber::EnvFilter;

/// Installs the global tracing subscriber described by `logging`.
pub fn init_tracing(logging: &config::LoggingConfig) {
    let filter = EnvFilter::try_new(&logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Builds a store over a fresh provider for the configured database.
pub fn build_store(config: &config::Config) -> Store {
    let provider = ConnectionProvider::new(
        config.database.url.clone(),
        config.database.runtime_settings(),
    );
    Store::new(Arc::new(provider), config.auth.owner_open_id.clone())
}
