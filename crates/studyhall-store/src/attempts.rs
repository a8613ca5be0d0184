//! Answers recorded within practice sessions.

use rusqlite::{Connection, Row};

use crate::error::StoreError;
use crate::models::{NewQuestionAttempt, QuestionAttempt};
use crate::query::{nullable, Insert, Order, Select};

const COLUMNS: &[&str] = &[
    "id",
    "session_id",
    "question_id",
    "user_answer",
    "is_correct",
    "buzz_time",
    "created_at",
];

/// Records an attempt and returns its id.
///
/// Neither the session nor the question is checked for existence.
pub fn create_question_attempt(
    conn: &Connection,
    attempt: &NewQuestionAttempt,
) -> Result<i64, StoreError> {
    let id = Insert::into_table("question_attempts")
        .value("session_id", attempt.session_id)
        .value("question_id", attempt.question_id)
        .value("user_answer", nullable(attempt.user_answer.clone()))
        .value("is_correct", attempt.is_correct)
        .value("buzz_time", nullable(attempt.buzz_time))
        .execute(conn)?;
    Ok(id)
}

/// Lists a session's attempts, newest first.
pub fn get_question_attempts_by_session(
    conn: &Connection,
    session_id: i64,
) -> Result<Vec<QuestionAttempt>, StoreError> {
    let attempts = Select::from("question_attempts", COLUMNS)
        .filter("session_id", session_id)
        .order_by(Order::Desc("created_at"))
        .order_by(Order::Desc("id"))
        .fetch_all(conn, map_row_to_attempt)?;
    Ok(attempts)
}

fn map_row_to_attempt(row: &Row<'_>) -> rusqlite::Result<QuestionAttempt> {
    Ok(QuestionAttempt {
        id: row.get("id")?,
        session_id: row.get("session_id")?,
        question_id: row.get("question_id")?,
        user_answer: row.get("user_answer")?,
        is_correct: row.get("is_correct")?,
        buzz_time: row.get("buzz_time")?,
        created_at: row.get("created_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use studyhall_db::run_migrations;

    #[test]
    fn test_attempts_by_session() {
        let conn = Connection::open_in_memory().expect("failed to open in-memory db");
        run_migrations(&conn).expect("failed to run migrations");

        let answers = [(Some("Paris"), true, Some(850)), (None, false, None)];
        for (question_id, (answer, is_correct, buzz_time)) in answers.into_iter().enumerate() {
            create_question_attempt(
                &conn,
                &NewQuestionAttempt {
                    session_id: 5,
                    question_id: question_id as i64 + 1,
                    user_answer: answer.map(str::to_string),
                    is_correct,
                    buzz_time,
                },
            )
            .expect("create failed");
        }
        create_question_attempt(
            &conn,
            &NewQuestionAttempt {
                session_id: 6,
                question_id: 1,
                user_answer: Some("Lyon".to_string()),
                is_correct: false,
                buzz_time: Some(400),
            },
        )
        .expect("create failed");

        let attempts = get_question_attempts_by_session(&conn, 5).expect("list failed");
        assert_eq!(attempts.len(), 2);
        assert_eq!(attempts[0].question_id, 2, "newest first");
        assert_eq!(attempts[0].user_answer, None);
        assert!(!attempts[0].is_correct);
        assert_eq!(attempts[1].buzz_time, Some(850));
        assert!(attempts[1].is_correct);

        assert!(get_question_attempts_by_session(&conn, 99)
            .expect("list failed")
            .is_empty());
    }
}
