//! Database layer for studyhall.
//!
//! Provides SQLite connection pooling (via `r2d2`), WAL-mode initialization,
//! embedded SQL migrations, and the [`ConnectionProvider`] that hands the
//! pool out to the data-access layer.
//!
//! # Design decisions
//!
//! - **Non-fatal absence**: a missing or unreachable database never aborts
//!   the process. The provider logs the condition once and reports the
//!   database as unavailable; the store turns that into empty results.
//! - **`r2d2` connection pool**: one pool per process, shared by every
//!   caller. No locking happens above it.
//! - **Embedded migrations**: SQL files are compiled into the binary via
//!   `include_str!` and applied when the pool is first opened.

mod migrations;
mod pool;
mod provider;

pub use migrations::{run_migrations, MigrationError};
pub use pool::{create_pool, database_path, DbPool, DbRuntimeSettings, PoolError};
pub use provider::ConnectionProvider;
