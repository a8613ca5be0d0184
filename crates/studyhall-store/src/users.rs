//! User lookups and the identity-keyed upsert.

use rusqlite::{Connection, Row};

use crate::error::StoreError;
use crate::models::User;
use crate::query::{get_parsed, text, Select};
use crate::upsert::UserUpsertPlan;

const COLUMNS: &[&str] = &[
    "id",
    "open_id",
    "name",
    "email",
    "login_method",
    "role",
    "created_at",
    "updated_at",
    "last_signed_in",
];

/// Applies a planned upsert in a single `INSERT ... ON CONFLICT` statement.
pub fn upsert_user(conn: &Connection, plan: &UserUpsertPlan) -> Result<(), StoreError> {
    plan.to_statement().execute(conn)?;
    Ok(())
}

/// Looks up a user by external identity.
pub fn get_user_by_open_id(conn: &Connection, open_id: &str) -> Result<Option<User>, StoreError> {
    let user = Select::from("users", COLUMNS)
        .filter("open_id", text(open_id))
        .fetch_optional(conn, map_row_to_user)?;
    Ok(user)
}

/// Looks up a user by numeric id.
pub fn get_user_by_id(conn: &Connection, id: i64) -> Result<Option<User>, StoreError> {
    let user = Select::from("users", COLUMNS)
        .filter("id", id)
        .fetch_optional(conn, map_row_to_user)?;
    Ok(user)
}

fn map_row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get("id")?,
        open_id: row.get("open_id")?,
        name: row.get("name")?,
        email: row.get("email")?,
        login_method: row.get("login_method")?,
        role: get_parsed(row, "role")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        last_signed_in: row.get("last_signed_in")?,
    })
}
