//! Practice sessions.

use rusqlite::{Connection, Row};

use crate::error::StoreError;
use crate::models::{FieldUpdate, NewPracticeSession, PracticeSession, PracticeSessionUpdate};
use crate::query::{format_timestamp, get_parsed_opt, nullable, text, Insert, Order, Select, Update};

/// Number of sessions `get_practice_sessions` returns when the caller gives no limit.
pub const DEFAULT_SESSION_LIMIT: u32 = 20;

const COLUMNS: &[&str] = &[
    "id",
    "user_id",
    "category",
    "difficulty",
    "total_questions",
    "correct_answers",
    "score",
    "started_at",
    "completed_at",
];

/// Inserts a session and returns its id. `started_at` takes the column default.
pub fn create_practice_session(
    conn: &Connection,
    session: &NewPracticeSession,
) -> Result<i64, StoreError> {
    let id = Insert::into_table("practice_sessions")
        .value("user_id", session.user_id)
        .value("category", nullable(session.category.clone()))
        .value("difficulty", nullable(session.difficulty.map(|d| text(d.as_str()))))
        .value("total_questions", session.total_questions)
        .value("correct_answers", session.correct_answers)
        .value("score", session.score)
        .value("completed_at", nullable(session.completed_at.map(format_timestamp)))
        .execute(conn)?;
    Ok(id)
}

/// Applies the supplied fields of `updates` to the session with `session_id`.
///
/// Returns the number of rows changed; an update with no supplied fields
/// issues no statement and returns 0.
pub fn update_practice_session(
    conn: &Connection,
    session_id: i64,
    updates: &PracticeSessionUpdate,
) -> Result<usize, StoreError> {
    let mut update = Update::table("practice_sessions").set_opt("user_id", updates.user_id);

    if let FieldUpdate::Set(category) = &updates.category {
        update = update.set("category", nullable(category.clone()));
    }
    if let FieldUpdate::Set(difficulty) = &updates.difficulty {
        update = update.set("difficulty", nullable(difficulty.map(|d| text(d.as_str()))));
    }
    update = update
        .set_opt("total_questions", updates.total_questions)
        .set_opt("correct_answers", updates.correct_answers)
        .set_opt("score", updates.score)
        .set_opt("started_at", updates.started_at.map(format_timestamp));
    if let FieldUpdate::Set(completed_at) = &updates.completed_at {
        update = update.set("completed_at", nullable(completed_at.map(format_timestamp)));
    }

    if update.is_empty() {
        return Ok(0);
    }

    let changed = update.filter("id", session_id).execute(conn)?;
    Ok(changed)
}

/// Lists a user's most recently started sessions.
pub fn get_practice_sessions(
    conn: &Connection,
    user_id: i64,
    limit: u32,
) -> Result<Vec<PracticeSession>, StoreError> {
    let sessions = Select::from("practice_sessions", COLUMNS)
        .filter("user_id", user_id)
        .order_by(Order::Desc("started_at"))
        .order_by(Order::Desc("id"))
        .limit(i64::from(limit))
        .fetch_all(conn, map_row_to_session)?;
    Ok(sessions)
}

/// Every session the user has ever started, unbounded.
pub fn get_all_practice_sessions(
    conn: &Connection,
    user_id: i64,
) -> Result<Vec<PracticeSession>, StoreError> {
    let sessions = Select::from("practice_sessions", COLUMNS)
        .filter("user_id", user_id)
        .fetch_all(conn, map_row_to_session)?;
    Ok(sessions)
}

/// Looks up a session by id.
pub fn get_practice_session_by_id(
    conn: &Connection,
    session_id: i64,
) -> Result<Option<PracticeSession>, StoreError> {
    let session = Select::from("practice_sessions", COLUMNS)
        .filter("id", session_id)
        .fetch_optional(conn, map_row_to_session)?;
    Ok(session)
}

fn map_row_to_session(row: &Row<'_>) -> rusqlite::Result<PracticeSession> {
    Ok(PracticeSession {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        category: row.get("category")?,
        difficulty: get_parsed_opt(row, "difficulty")?,
        total_questions: row.get("total_questions")?,
        correct_answers: row.get("correct_answers")?,
        score: row.get("score")?,
        started_at: row.get("started_at")?,
        completed_at: row.get("completed_at")?,
    })
}
