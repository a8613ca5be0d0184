//! Question bank queries.

use rusqlite::{Connection, Row};
use studyhall_types::Difficulty;

use crate::error::StoreError;
use crate::models::{NewQuestion, Question};
use crate::query::{get_parsed, text, Insert, Order, Raw, Select};

/// Sample size used by `get_random_questions` when the caller gives none.
pub const DEFAULT_RANDOM_LIMIT: u32 = 10;

const COLUMNS: &[&str] = &[
    "id",
    "user_id",
    "category",
    "difficulty",
    "question_text",
    "answer",
    "source",
    "created_at",
];

/// Inserts a question and returns its id.
pub fn create_question(conn: &Connection, question: &NewQuestion) -> Result<i64, StoreError> {
    let id = Insert::into_table("questions")
        .value("user_id", question.user_id)
        .value("category", text(&question.category))
        .value("difficulty", text(question.difficulty.as_str()))
        .value("question_text", text(&question.question_text))
        .value("answer", text(&question.answer))
        .value_opt("source", question.source.as_deref().map(text))
        .execute(conn)?;
    Ok(id)
}

/// Lists a user's questions in one category, newest first, optionally
/// narrowed to one difficulty.
pub fn get_questions_by_category(
    conn: &Connection,
    user_id: i64,
    category: &str,
    difficulty: Option<Difficulty>,
) -> Result<Vec<Question>, StoreError> {
    let questions = Select::from("questions", COLUMNS)
        .filter("user_id", user_id)
        .filter("category", text(category))
        .filter_opt("difficulty", difficulty.map(|d| text(d.as_str())))
        .order_by(Order::Desc("created_at"))
        .order_by(Order::Desc("id"))
        .fetch_all(conn, map_row_to_question)?;
    Ok(questions)
}

/// Returns up to `limit` of the user's matching questions in random order.
pub fn get_random_questions(
    conn: &Connection,
    user_id: i64,
    category: Option<&str>,
    difficulty: Option<Difficulty>,
    limit: u32,
) -> Result<Vec<Question>, StoreError> {
    let questions = Select::from("questions", COLUMNS)
        .filter("user_id", user_id)
        .filter_opt("category", category.map(text))
        .filter_opt("difficulty", difficulty.map(|d| text(d.as_str())))
        .order_by(Order::Raw(Raw::Random))
        .limit(i64::from(limit))
        .fetch_all(conn, map_row_to_question)?;
    Ok(questions)
}

fn map_row_to_question(row: &Row<'_>) -> rusqlite::Result<Question> {
    Ok(Question {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        category: row.get("category")?,
        difficulty: get_parsed(row, "difficulty")?,
        question_text: row.get("question_text")?,
        answer: row.get("answer")?,
        source: row.get("source")?,
        created_at: row.get("created_at")?,
    })
}
