//! Records as stored, and the parameter structs used to write them.
//!
//! Timestamps are UTC text in `YYYY-MM-DD HH:MM:SS.mmm` layout, exactly as
//! the columns hold them. Values supplied by callers are
//! `chrono::DateTime<Utc>` and are formatted on the way in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use studyhall_types::{Difficulty, MessageRole, Role};

/// A change to one column of an existing row.
///
/// `Unchanged` leaves the stored value alone. For nullable columns,
/// `Set(None)` clears the value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldUpdate<T> {
    Unchanged,
    Set(T),
}

impl<T> Default for FieldUpdate<T> {
    fn default() -> Self {
        Self::Unchanged
    }
}

impl<T> FieldUpdate<T> {
    /// Returns the new value, if one was supplied.
    pub fn as_set(&self) -> Option<&T> {
        match self {
            Self::Unchanged => None,
            Self::Set(value) => Some(value),
        }
    }
}

/// A registered user, keyed by the identity issued by the auth provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: i64,
    /// External identity; unique across all users.
    pub open_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub login_method: Option<String>,
    pub role: Role,
    pub created_at: String,
    pub updated_at: String,
    pub last_signed_in: String,
}

/// Model selection and API keys for the two AI roles a user can configure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserSettings {
    pub id: i64,
    pub user_id: i64,
    pub tutor_model_name: Option<String>,
    pub tutor_api_key: Option<String>,
    pub question_generator_model_name: Option<String>,
    pub question_generator_api_key: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Parameters for writing a user's settings row.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewUserSettings {
    pub user_id: i64,
    pub tutor_model_name: Option<String>,
    pub tutor_api_key: Option<String>,
    pub question_generator_model_name: Option<String>,
    pub question_generator_api_key: Option<String>,
}

/// A question in a user's question bank.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Question {
    pub id: i64,
    pub user_id: i64,
    pub category: String,
    pub difficulty: Difficulty,
    pub question_text: String,
    pub answer: String,
    /// Where the question came from; `"generated"` unless stated otherwise.
    pub source: String,
    pub created_at: String,
}

/// Parameters for creating a question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewQuestion {
    pub user_id: i64,
    pub category: String,
    pub difficulty: Difficulty,
    pub question_text: String,
    pub answer: String,
    /// `None` takes the column default, `"generated"`.
    pub source: Option<String>,
}

/// One run through a set of questions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PracticeSession {
    pub id: i64,
    pub user_id: i64,
    /// Category filter the session was started with, if any.
    pub category: Option<String>,
    /// Difficulty filter the session was started with, if any.
    pub difficulty: Option<Difficulty>,
    pub total_questions: i32,
    pub correct_answers: i32,
    pub score: i32,
    pub started_at: String,
    /// `None` while the session is still in progress.
    pub completed_at: Option<String>,
}

/// Parameters for creating a practice session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewPracticeSession {
    pub user_id: i64,
    pub category: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub total_questions: i32,
    pub correct_answers: i32,
    pub score: i32,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Partial update of a practice session. Only supplied fields are written.
#[derive(Debug, Clone, Default)]
pub struct PracticeSessionUpdate {
    pub user_id: Option<i64>,
    pub category: FieldUpdate<Option<String>>,
    pub difficulty: FieldUpdate<Option<Difficulty>>,
    pub total_questions: Option<i32>,
    pub correct_answers: Option<i32>,
    pub score: Option<i32>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: FieldUpdate<Option<DateTime<Utc>>>,
}

/// A single answer given during a practice session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuestionAttempt {
    pub id: i64,
    pub session_id: i64,
    pub question_id: i64,
    pub user_answer: Option<String>,
    pub is_correct: bool,
    /// Milliseconds from question reveal to buzz, when timed.
    pub buzz_time: Option<i32>,
    pub created_at: String,
}

/// Parameters for recording an attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewQuestionAttempt {
    pub session_id: i64,
    pub question_id: i64,
    pub user_answer: Option<String>,
    pub is_correct: bool,
    pub buzz_time: Option<i32>,
}

/// One message of a user's tutor conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub id: i64,
    pub user_id: i64,
    pub role: MessageRole,
    pub content: String,
    pub created_at: String,
}

/// Parameters for appending a chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewChatMessage {
    pub user_id: i64,
    pub role: MessageRole,
    pub content: String,
}

/// Shared reference material, not owned by any user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StudyTopic {
    pub id: i64,
    pub category: String,
    pub topic: String,
    pub difficulty: Difficulty,
    pub description: Option<String>,
    pub resource_links: Option<String>,
    pub created_at: String,
}

/// Parameters for creating a study topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewStudyTopic {
    pub category: String,
    pub topic: String,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub resource_links: Option<String>,
}
