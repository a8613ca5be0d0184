//! Process-wide database handle with lazy, non-fatal initialisation.
//!
//! A [`ConnectionProvider`] is constructed once at startup and shared (via
//! `Arc`) with whatever needs database access. The pool behind it is opened
//! on first use. A missing connection string or a failed connection attempt
//! is not an error: it is logged once and the provider reports the database
//! as unavailable for the rest of its lifetime, so callers can degrade to
//! empty results instead of failing.

use std::sync::OnceLock;

use crate::migrations::run_migrations;
use crate::pool::{create_pool, DbPool, DbRuntimeSettings};

/// Lazily opened, cached connection pool.
pub struct ConnectionProvider {
    url: Option<String>,
    settings: DbRuntimeSettings,
    pool: OnceLock<Option<DbPool>>,
}

impl std::fmt::Debug for ConnectionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionProvider")
            .field("configured", &self.url.is_some())
            .field("settings", &self.settings)
            .field("opened", &self.pool.get().map(Option::is_some))
            .finish()
    }
}

impl ConnectionProvider {
    /// Creates a provider for the given connection string.
    ///
    /// Nothing is opened until [`pool`](Self::pool) is first called. A blank
    /// string is treated the same as no string at all.
    pub fn new(url: Option<String>, settings: DbRuntimeSettings) -> Self {
        let url = url.filter(|u| !u.trim().is_empty());
        Self {
            url,
            settings,
            pool: OnceLock::new(),
        }
    }

    /// Creates a provider with no connection string. Every call to
    /// [`pool`](Self::pool) returns `None`.
    pub fn unconfigured() -> Self {
        Self::new(None, DbRuntimeSettings::default())
    }

    /// Whether a connection string was supplied.
    pub fn is_configured(&self) -> bool {
        self.url.is_some()
    }

    /// Returns the shared pool, opening it on the first call.
    ///
    /// The first call may block while the pool connects and pending
    /// migrations are applied; async callers should reach it from a
    /// blocking task. The outcome of that first attempt, success or
    /// failure, is cached and never retried.
    pub fn pool(&self) -> Option<DbPool> {
        self.pool.get_or_init(|| self.open()).clone()
    }

    /// Drops the pool, closing every idle connection it holds.
    pub fn close(self) {
        if let Some(Some(pool)) = self.pool.into_inner() {
            let state = pool.state();
            tracing::info!(
                connections = state.connections,
                idle = state.idle_connections,
                "closing database pool"
            );
        }
    }

    fn open(&self) -> Option<DbPool> {
        let Some(url) = self.url.as_deref() else {
            tracing::warn!("no database connection string configured, running without storage");
            return None;
        };

        let pool = match create_pool(url, self.settings) {
            Ok(pool) => pool,
            Err(e) => {
                tracing::warn!(error = %e, "failed to connect to database");
                return None;
            }
        };

        let applied = pool
            .get()
            .map_err(|e| e.to_string())
            .and_then(|conn| run_migrations(&conn).map_err(|e| e.to_string()));
        match applied {
            Ok(count) => {
                if count > 0 {
                    tracing::info!(count, "applied database migrations");
                }
                Some(pool)
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to prepare database schema");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_url_is_unconfigured() {
        let provider = ConnectionProvider::new(Some("   ".to_string()), DbRuntimeSettings::default());
        assert!(!provider.is_configured());
        assert!(provider.pool().is_none());
    }

    #[test]
    fn unconfigured_provider_has_no_pool() {
        let provider = ConnectionProvider::unconfigured();
        assert!(provider.pool().is_none());
        assert!(provider.pool().is_none(), "absence is cached");
    }

    #[test]
    fn in_memory_provider_applies_schema() {
        let provider = ConnectionProvider::new(
            Some(":memory:".to_string()),
            DbRuntimeSettings::default(),
        );

        let pool = provider.pool().expect("in-memory pool should open");
        let conn = pool.get().expect("connection");
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .expect("users table should exist");
        assert_eq!(count, 0);
    }

    #[test]
    fn in_memory_provider_serves_schema_on_every_checkout() {
        let provider = std::sync::Arc::new(ConnectionProvider::new(
            Some("sqlite::memory:".to_string()),
            DbRuntimeSettings::default(),
        ));

        let workers: Vec<_> = (0..4)
            .map(|_| {
                let provider = std::sync::Arc::clone(&provider);
                std::thread::spawn(move || {
                    let pool = provider.pool().expect("in-memory pool should open");
                    let conn = pool.get().expect("connection");
                    conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get::<_, i64>(0))
                })
            })
            .collect();

        for worker in workers {
            let count = worker
                .join()
                .expect("worker panicked")
                .expect("users table should exist on every checkout");
            assert_eq!(count, 0);
        }
    }
}
