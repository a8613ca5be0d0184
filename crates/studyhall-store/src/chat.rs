//! Tutor chat history.

use rusqlite::{Connection, Row};

use crate::error::StoreError;
use crate::models::{ChatMessage, NewChatMessage};
use crate::query::{get_parsed, text, Delete, Insert, Order, Select};

/// Number of messages `get_chat_messages` returns when the caller gives no limit.
pub const DEFAULT_CHAT_LIMIT: u32 = 50;

const COLUMNS: &[&str] = &["id", "user_id", "role", "content", "created_at"];

/// Appends a message and returns its id.
pub fn create_chat_message(conn: &Connection, message: &NewChatMessage) -> Result<i64, StoreError> {
    let id = Insert::into_table("chat_messages")
        .value("user_id", message.user_id)
        .value("role", text(message.role.as_str()))
        .value("content", text(&message.content))
        .execute(conn)?;
    Ok(id)
}

/// Lists a user's most recent messages, newest first.
pub fn get_chat_messages(
    conn: &Connection,
    user_id: i64,
    limit: u32,
) -> Result<Vec<ChatMessage>, StoreError> {
    let messages = Select::from("chat_messages", COLUMNS)
        .filter("user_id", user_id)
        .order_by(Order::Desc("created_at"))
        .order_by(Order::Desc("id"))
        .limit(i64::from(limit))
        .fetch_all(conn, map_row_to_message)?;
    Ok(messages)
}

/// Deletes every message the user has. Returns the number removed.
pub fn clear_chat_messages(conn: &Connection, user_id: i64) -> Result<usize, StoreError> {
    let removed = Delete::from_table("chat_messages")
        .filter("user_id", user_id)
        .execute(conn)?;
    Ok(removed)
}

fn map_row_to_message(row: &Row<'_>) -> rusqlite::Result<ChatMessage> {
    Ok(ChatMessage {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        role: get_parsed(row, "role")?,
        content: row.get("content")?,
        created_at: row.get("created_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use studyhall_db::run_migrations;
    use studyhall_types::MessageRole;

    fn setup_db() -> Connection {
        let conn = Connection::open_in_memory().expect("failed to open in-memory db");
        run_migrations(&conn).expect("failed to run migrations");
        conn
    }

    fn say(conn: &Connection, user_id: i64, role: MessageRole, content: &str) {
        create_chat_message(
            conn,
            &NewChatMessage {
                user_id,
                role,
                content: content.to_string(),
            },
        )
        .expect("create failed");
    }

    #[test]
    fn test_chat_history_and_clear() {
        let conn = setup_db();
        say(&conn, 1, MessageRole::System, "You are a tutor.");
        say(&conn, 1, MessageRole::User, "What is a prime?");
        say(&conn, 1, MessageRole::Assistant, "A number with two divisors.");
        say(&conn, 2, MessageRole::User, "Hello");

        let recent = get_chat_messages(&conn, 1, 2).expect("list failed");
        let roles: Vec<MessageRole> = recent.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![MessageRole::Assistant, MessageRole::User]);

        let removed = clear_chat_messages(&conn, 1).expect("clear failed");
        assert_eq!(removed, 3);
        assert!(get_chat_messages(&conn, 1, DEFAULT_CHAT_LIMIT)
            .expect("list failed")
            .is_empty());
        assert_eq!(
            get_chat_messages(&conn, 2, DEFAULT_CHAT_LIMIT)
                .expect("list failed")
                .len(),
            1,
            "other users keep their history"
        );
    }

    #[test]
    fn test_clear_without_messages() {
        let conn = setup_db();
        assert_eq!(clear_chat_messages(&conn, 7).expect("clear failed"), 0);
    }
}
