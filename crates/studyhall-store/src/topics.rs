//! Study topics: shared reference data, not scoped to any user.

use rusqlite::{Connection, Row};
use studyhall_types::Difficulty;

use crate::error::StoreError;
use crate::models::{NewStudyTopic, StudyTopic};
use crate::query::{get_parsed, nullable, text, Insert, Order, Select};

const COLUMNS: &[&str] = &[
    "id",
    "category",
    "topic",
    "difficulty",
    "description",
    "resource_links",
    "created_at",
];

/// Inserts a topic and returns its id.
pub fn create_study_topic(conn: &Connection, topic: &NewStudyTopic) -> Result<i64, StoreError> {
    let id = Insert::into_table("study_topics")
        .value("category", text(&topic.category))
        .value("topic", text(&topic.topic))
        .value("difficulty", text(topic.difficulty.as_str()))
        .value("description", nullable(topic.description.clone()))
        .value("resource_links", nullable(topic.resource_links.clone()))
        .execute(conn)?;
    Ok(id)
}

/// Lists topics ordered by category, then topic name, optionally filtered.
pub fn get_study_topics(
    conn: &Connection,
    category: Option<&str>,
    difficulty: Option<Difficulty>,
) -> Result<Vec<StudyTopic>, StoreError> {
    let topics = Select::from("study_topics", COLUMNS)
        .filter_opt("category", category.map(text))
        .filter_opt("difficulty", difficulty.map(|d| text(d.as_str())))
        .order_by(Order::Asc("category"))
        .order_by(Order::Asc("topic"))
        .fetch_all(conn, map_row_to_topic)?;
    Ok(topics)
}

fn map_row_to_topic(row: &Row<'_>) -> rusqlite::Result<StudyTopic> {
    Ok(StudyTopic {
        id: row.get("id")?,
        category: row.get("category")?,
        topic: row.get("topic")?,
        difficulty: get_parsed(row, "difficulty")?,
        description: row.get("description")?,
        resource_links: row.get("resource_links")?,
        created_at: row.get("created_at")?,
    })
}
