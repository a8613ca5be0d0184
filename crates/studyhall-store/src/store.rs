//! Async entry point for the application layer.
//!
//! [`Store`] wraps a shared [`ConnectionProvider`] and runs every statement
//! on tokio's blocking pool. When the provider has no database, reads
//! return their empty value (`None` or an empty `Vec`) and writes log a
//! warning and do nothing. Statement failures are returned to the caller.

use std::sync::Arc;

use chrono::Utc;
use rusqlite::Connection;
use studyhall_db::ConnectionProvider;
use studyhall_types::Difficulty;

use crate::error::StoreError;
use crate::models::{
    ChatMessage, NewChatMessage, NewPracticeSession, NewQuestion, NewQuestionAttempt,
    NewStudyTopic, NewUserSettings, PracticeSession, PracticeSessionUpdate, Question,
    QuestionAttempt, StudyTopic, User, UserSettings,
};
use crate::stats::ProgressStats;
use crate::upsert::{plan_user_upsert, UserUpsert};
use crate::{attempts, chat, questions, sessions, settings, stats, topics, users};

/// Data-access facade shared by request handlers.
#[derive(Debug, Clone)]
pub struct Store {
    provider: Arc<ConnectionProvider>,
    owner_open_id: Option<String>,
}

impl Store {
    /// Creates a store over `provider`. `owner_open_id` is the external
    /// identity that is made an admin on sign-in when no role is given.
    pub fn new(provider: Arc<ConnectionProvider>, owner_open_id: Option<String>) -> Self {
        Self {
            provider,
            owner_open_id: owner_open_id.filter(|id| !id.is_empty()),
        }
    }

    /// The provider this store draws connections from.
    pub fn provider(&self) -> &Arc<ConnectionProvider> {
        &self.provider
    }

    /// Runs `op` against a pooled connection on the blocking pool.
    ///
    /// Returns `Ok(None)` when no database is available.
    async fn with_conn<T, F>(&self, op: F) -> Result<Option<T>, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let provider = Arc::clone(&self.provider);
        tokio::task::spawn_blocking(move || {
            let Some(pool) = provider.pool() else {
                return Ok(None);
            };
            let conn = pool.get()?;
            op(&conn).map(Some)
        })
        .await?
    }

    /// Like [`with_conn`](Self::with_conn), warning when the write is skipped.
    async fn write<T, F>(&self, action: &'static str, op: F) -> Result<Option<T>, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let result = self.with_conn(op).await?;
        if result.is_none() {
            tracing::warn!(action, "database not available, skipping write");
        }
        Ok(result)
    }

    // ── users ────────────────────────────────────────────────────────

    /// Creates the user or updates the supplied fields of the existing one.
    ///
    /// # Errors
    ///
    /// [`StoreError::InvalidArgument`] when `open_id` is missing, whether or
    /// not a database is available. Storage failures are logged and returned.
    pub async fn upsert_user(&self, user: UserUpsert) -> Result<(), StoreError> {
        let plan = plan_user_upsert(&user, self.owner_open_id.as_deref(), Utc::now())?;

        let result = self
            .write("upsert user", move |conn| users::upsert_user(conn, &plan))
            .await;
        if let Err(e) = &result {
            tracing::error!(error = %e, "failed to upsert user");
        }
        result.map(|_| ())
    }

    pub async fn get_user_by_open_id(&self, open_id: &str) -> Result<Option<User>, StoreError> {
        let open_id = open_id.to_string();
        let result = self
            .with_conn(move |conn| users::get_user_by_open_id(conn, &open_id))
            .await?;
        match result {
            Some(user) => Ok(user),
            None => {
                tracing::warn!("database not available, cannot get user");
                Ok(None)
            }
        }
    }

    pub async fn get_user_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        let result = self
            .with_conn(move |conn| users::get_user_by_id(conn, id))
            .await?;
        Ok(result.flatten())
    }

    // ── settings ─────────────────────────────────────────────────────

    pub async fn get_user_settings(&self, user_id: i64) -> Result<Option<UserSettings>, StoreError> {
        let result = self
            .with_conn(move |conn| settings::get_user_settings(conn, user_id))
            .await?;
        Ok(result.flatten())
    }

    /// Read-then-write; not atomic across concurrent first writes for a user.
    pub async fn upsert_user_settings(&self, new: NewUserSettings) -> Result<(), StoreError> {
        self.write("upsert user settings", move |conn| {
            settings::upsert_user_settings(conn, &new)
        })
        .await?;
        Ok(())
    }

    // ── questions ────────────────────────────────────────────────────

    /// Returns the new question's id, or `None` when nothing was written.
    pub async fn create_question(&self, question: NewQuestion) -> Result<Option<i64>, StoreError> {
        self.write("create question", move |conn| {
            questions::create_question(conn, &question)
        })
        .await
    }

    pub async fn get_questions_by_category(
        &self,
        user_id: i64,
        category: &str,
        difficulty: Option<Difficulty>,
    ) -> Result<Vec<Question>, StoreError> {
        let category = category.to_string();
        let result = self
            .with_conn(move |conn| {
                questions::get_questions_by_category(conn, user_id, &category, difficulty)
            })
            .await?;
        Ok(result.unwrap_or_default())
    }

    /// Up to `limit` (default [`questions::DEFAULT_RANDOM_LIMIT`]) randomly
    /// chosen questions of the user matching the optional filters.
    pub async fn get_random_questions(
        &self,
        user_id: i64,
        category: Option<&str>,
        difficulty: Option<Difficulty>,
        limit: Option<u32>,
    ) -> Result<Vec<Question>, StoreError> {
        let category = category.map(str::to_string);
        let limit = limit.unwrap_or(questions::DEFAULT_RANDOM_LIMIT);
        let result = self
            .with_conn(move |conn| {
                questions::get_random_questions(conn, user_id, category.as_deref(), difficulty, limit)
            })
            .await?;
        Ok(result.unwrap_or_default())
    }

    // ── practice sessions ────────────────────────────────────────────

    pub async fn create_practice_session(
        &self,
        session: NewPracticeSession,
    ) -> Result<Option<i64>, StoreError> {
        self.write("create practice session", move |conn| {
            sessions::create_practice_session(conn, &session)
        })
        .await
    }

    pub async fn update_practice_session(
        &self,
        session_id: i64,
        updates: PracticeSessionUpdate,
    ) -> Result<(), StoreError> {
        self.write("update practice session", move |conn| {
            sessions::update_practice_session(conn, session_id, &updates)
        })
        .await?;
        Ok(())
    }

    /// Most recently started sessions, up to `limit` (default
    /// [`sessions::DEFAULT_SESSION_LIMIT`]).
    pub async fn get_practice_sessions(
        &self,
        user_id: i64,
        limit: Option<u32>,
    ) -> Result<Vec<PracticeSession>, StoreError> {
        let limit = limit.unwrap_or(sessions::DEFAULT_SESSION_LIMIT);
        let result = self
            .with_conn(move |conn| sessions::get_practice_sessions(conn, user_id, limit))
            .await?;
        Ok(result.unwrap_or_default())
    }

    pub async fn get_practice_session_by_id(
        &self,
        session_id: i64,
    ) -> Result<Option<PracticeSession>, StoreError> {
        let result = self
            .with_conn(move |conn| sessions::get_practice_session_by_id(conn, session_id))
            .await?;
        Ok(result.flatten())
    }

    // ── attempts ─────────────────────────────────────────────────────

    pub async fn create_question_attempt(
        &self,
        attempt: NewQuestionAttempt,
    ) -> Result<Option<i64>, StoreError> {
        self.write("create question attempt", move |conn| {
            attempts::create_question_attempt(conn, &attempt)
        })
        .await
    }

    pub async fn get_question_attempts_by_session(
        &self,
        session_id: i64,
    ) -> Result<Vec<QuestionAttempt>, StoreError> {
        let result = self
            .with_conn(move |conn| attempts::get_question_attempts_by_session(conn, session_id))
            .await?;
        Ok(result.unwrap_or_default())
    }

    // ── chat ─────────────────────────────────────────────────────────

    pub async fn create_chat_message(
        &self,
        message: NewChatMessage,
    ) -> Result<Option<i64>, StoreError> {
        self.write("create chat message", move |conn| {
            chat::create_chat_message(conn, &message)
        })
        .await
    }

    /// Most recent messages, up to `limit` (default [`chat::DEFAULT_CHAT_LIMIT`]).
    pub async fn get_chat_messages(
        &self,
        user_id: i64,
        limit: Option<u32>,
    ) -> Result<Vec<ChatMessage>, StoreError> {
        let limit = limit.unwrap_or(chat::DEFAULT_CHAT_LIMIT);
        let result = self
            .with_conn(move |conn| chat::get_chat_messages(conn, user_id, limit))
            .await?;
        Ok(result.unwrap_or_default())
    }

    /// Returns how many messages were removed (0 when nothing was written).
    pub async fn clear_chat_messages(&self, user_id: i64) -> Result<usize, StoreError> {
        let removed = self
            .write("clear chat messages", move |conn| {
                chat::clear_chat_messages(conn, user_id)
            })
            .await?;
        Ok(removed.unwrap_or(0))
    }

    // ── study topics ─────────────────────────────────────────────────

    pub async fn create_study_topic(&self, topic: NewStudyTopic) -> Result<Option<i64>, StoreError> {
        self.write("create study topic", move |conn| {
            topics::create_study_topic(conn, &topic)
        })
        .await
    }

    pub async fn get_study_topics(
        &self,
        category: Option<&str>,
        difficulty: Option<Difficulty>,
    ) -> Result<Vec<StudyTopic>, StoreError> {
        let category = category.map(str::to_string);
        let result = self
            .with_conn(move |conn| topics::get_study_topics(conn, category.as_deref(), difficulty))
            .await?;
        Ok(result.unwrap_or_default())
    }

    // ── progress ─────────────────────────────────────────────────────

    /// `None` when no database is available; zeroed stats when the user
    /// has no sessions.
    pub async fn get_user_progress_stats(
        &self,
        user_id: i64,
    ) -> Result<Option<ProgressStats>, StoreError> {
        self.with_conn(move |conn| stats::get_user_progress_stats(conn, user_id))
            .await
    }
}
