//! Progress statistics over a user's practice sessions.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::models::PracticeSession;
use crate::sessions::get_all_practice_sessions;

/// Totals across every session a user has started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressStats {
    pub total_sessions: i64,
    pub total_questions: i64,
    pub correct_answers: i64,
    /// Percentage of questions answered correctly; 0 when there were none.
    pub accuracy: f64,
    /// Mean session score; 0 when there are no sessions.
    pub average_score: f64,
}

impl ProgressStats {
    /// Aggregates the given sessions.
    pub fn from_sessions(sessions: &[PracticeSession]) -> Self {
        let total_sessions = sessions.len() as i64;
        let (total_questions, correct_answers, total_score) =
            sessions.iter().fold((0_i64, 0_i64, 0_i64), |(q, c, s), session| {
                (
                    q + i64::from(session.total_questions),
                    c + i64::from(session.correct_answers),
                    s + i64::from(session.score),
                )
            });

        let accuracy = if total_questions > 0 {
            correct_answers as f64 / total_questions as f64 * 100.0
        } else {
            0.0
        };
        let average_score = if total_sessions > 0 {
            total_score as f64 / total_sessions as f64
        } else {
            0.0
        };

        Self {
            total_sessions,
            total_questions,
            correct_answers,
            accuracy,
            average_score,
        }
    }
}

/// Loads all of the user's sessions and aggregates them.
pub fn get_user_progress_stats(conn: &Connection, user_id: i64) -> Result<ProgressStats, StoreError> {
    let sessions = get_all_practice_sessions(conn, user_id)?;
    Ok(ProgressStats::from_sessions(&sessions))
}
