//! Data-access layer for studyhall.
//!
//! Two layers live here. The table modules (`users`, `settings`,
//! `questions`, `sessions`, `attempts`, `chat`, `topics`, `stats`) are plain
//! synchronous functions over a `&rusqlite::Connection`, one statement each
//! (the settings upsert is a read followed by a write). [`Store`] is the
//! async facade the application layer calls: it borrows a connection from
//! the shared [`studyhall_db::ConnectionProvider`], runs the function on the
//! blocking pool, and substitutes empty results when no database is
//! configured or reachable.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use studyhall_db::{ConnectionProvider, DbRuntimeSettings};
//! use studyhall_store::{Store, UserUpsert};
//!
//! let provider = Arc::new(ConnectionProvider::new(
//!     std::env::var("DATABASE_URL").ok(),
//!     DbRuntimeSettings::default(),
//! ));
//! let store = Store::new(provider, std::env::var("OWNER_OPEN_ID").ok());
//!
//! store.upsert_user(UserUpsert::for_open_id("auth0|123")).await?;
//! let stats = store.get_user_progress_stats(1).await?;
//! ```

pub mod attempts;
pub mod chat;
mod error;
mod models;
mod query;
pub mod questions;
pub mod sessions;
pub mod settings;
pub mod stats;
mod store;
pub mod topics;
mod upsert;
pub mod users;

pub use error::StoreError;
pub use models::{
    ChatMessage, FieldUpdate, NewChatMessage, NewPracticeSession, NewQuestion,
    NewQuestionAttempt, NewStudyTopic, NewUserSettings, PracticeSession, PracticeSessionUpdate,
    Question, QuestionAttempt, StudyTopic, User, UserSettings,
};
pub use stats::ProgressStats;
pub use store::Store;
pub use upsert::{plan_user_upsert, UserUpsert, UserUpsertPlan};
pub use studyhall_types::{Difficulty, MessageRole, Role};
