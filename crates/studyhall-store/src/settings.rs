//! Per-user model configuration.
//!
//! The store keeps at most one settings row per user, but nothing in the
//! schema enforces it: [`upsert_user_settings`] reads and then writes, so two
//! concurrent first writes for the same user can both insert.

use rusqlite::{Connection, Row};

use crate::error::StoreError;
use crate::models::{NewUserSettings, UserSettings};
use crate::query::{nullable, Insert, Order, Raw, Select, Update};

const COLUMNS: &[&str] = &[
    "id",
    "user_id",
    "tutor_model_name",
    "tutor_api_key",
    "question_generator_model_name",
    "question_generator_api_key",
    "created_at",
    "updated_at",
];

/// Returns the user's settings row, if one exists.
pub fn get_user_settings(conn: &Connection, user_id: i64) -> Result<Option<UserSettings>, StoreError> {
    let settings = Select::from("user_settings", COLUMNS)
        .filter("user_id", user_id)
        .order_by(Order::Asc("id"))
        .fetch_optional(conn, map_row_to_settings)?;
    Ok(settings)
}

/// Overwrites the four model/key fields of the user's settings row, or
/// inserts one if the user has none yet.
pub fn upsert_user_settings(conn: &Connection, settings: &NewUserSettings) -> Result<(), StoreError> {
    let existing = get_user_settings(conn, settings.user_id)?;

    if existing.is_some() {
        Update::table("user_settings")
            .set("tutor_model_name", nullable(settings.tutor_model_name.clone()))
            .set("tutor_api_key", nullable(settings.tutor_api_key.clone()))
            .set(
                "question_generator_model_name",
                nullable(settings.question_generator_model_name.clone()),
            )
            .set(
                "question_generator_api_key",
                nullable(settings.question_generator_api_key.clone()),
            )
            .set_raw("updated_at", Raw::Now)
            .filter("user_id", settings.user_id)
            .execute(conn)?;
    } else {
        Insert::into_table("user_settings")
            .value("user_id", settings.user_id)
            .value("tutor_model_name", nullable(settings.tutor_model_name.clone()))
            .value("tutor_api_key", nullable(settings.tutor_api_key.clone()))
            .value(
                "question_generator_model_name",
                nullable(settings.question_generator_model_name.clone()),
            )
            .value(
                "question_generator_api_key",
                nullable(settings.question_generator_api_key.clone()),
            )
            .execute(conn)?;
    }

    Ok(())
}

fn map_row_to_settings(row: &Row<'_>) -> rusqlite::Result<UserSettings> {
    Ok(UserSettings {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        tutor_model_name: row.get("tutor_model_name")?,
        tutor_api_key: row.get("tutor_api_key")?,
        question_generator_model_name: row.get("question_generator_model_name")?,
        question_generator_api_key: row.get("question_generator_api_key")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use studyhall_db::run_migrations;

    fn setup_db() -> Connection {
        let conn = Connection::open_in_memory().expect("failed to open in-memory db");
        run_migrations(&conn).expect("failed to run migrations");
        conn
    }

    #[test]
    fn test_settings_insert_then_update() {
        let conn = setup_db();
        assert!(get_user_settings(&conn, 1).expect("get failed").is_none());

        upsert_user_settings(
            &conn,
            &NewUserSettings {
                user_id: 1,
                tutor_model_name: Some("tutor-large".to_string()),
                tutor_api_key: Some("key-1".to_string()),
                ..NewUserSettings::default()
            },
        )
        .expect("insert failed");

        let first = get_user_settings(&conn, 1)
            .expect("get failed")
            .expect("settings should exist");
        assert_eq!(first.tutor_model_name.as_deref(), Some("tutor-large"));
        assert_eq!(first.question_generator_model_name, None);

        // Force a visibly later updated_at.
        conn.execute(
            "UPDATE user_settings SET updated_at = '2000-01-01 00:00:00.000' WHERE user_id = 1",
            [],
        )
        .expect("backdate failed");

        upsert_user_settings(
            &conn,
            &NewUserSettings {
                user_id: 1,
                question_generator_model_name: Some("gen-small".to_string()),
                question_generator_api_key: Some("key-2".to_string()),
                ..NewUserSettings::default()
            },
        )
        .expect("update failed");

        let second = get_user_settings(&conn, 1)
            .expect("get failed")
            .expect("settings should exist");
        assert_eq!(second.id, first.id, "row is updated in place");
        assert_eq!(second.tutor_model_name, None, "all four fields are overwritten");
        assert_eq!(second.question_generator_model_name.as_deref(), Some("gen-small"));
        assert_eq!(second.question_generator_api_key.as_deref(), Some("key-2"));
        assert!(second.updated_at.as_str() > "2000-01-01 00:00:00.000");

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM user_settings", [], |row| row.get(0))
            .expect("count failed");
        assert_eq!(count, 1);
    }

    #[test]
    fn test_settings_are_per_user() {
        let conn = setup_db();
        for user_id in [1, 2] {
            upsert_user_settings(
                &conn,
                &NewUserSettings {
                    user_id,
                    tutor_model_name: Some(format!("model-{user_id}")),
                    ..NewUserSettings::default()
                },
            )
            .expect("insert failed");
        }

        let two = get_user_settings(&conn, 2)
            .expect("get failed")
            .expect("settings should exist");
        assert_eq!(two.tutor_model_name.as_deref(), Some("model-2"));
    }
}
