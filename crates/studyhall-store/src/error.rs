//! Error types for the data-access layer.

/// Errors that can occur during store operations.
///
/// An unavailable database is not an error; operations report it through
/// their empty or absent result instead.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The caller supplied input the operation cannot act on.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A statement failed to execute.
    #[error("store database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// No pooled connection could be checked out.
    #[error("store connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// The blocking task running the statement panicked or was cancelled.
    #[error("store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
