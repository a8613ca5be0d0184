//! Insert-or-update planning for user records.
//!
//! [`plan_user_upsert`] turns a partial user record into the column values
//! to insert and the columns to overwrite when the external identity
//! already exists. It touches no database, so every rule below is covered
//! by plain unit tests:
//!
//! - `name`, `email` and `login_method` are written (on insert and on
//!   conflict) only when supplied; `Set(None)` writes a NULL.
//! - A supplied `role` is always written. Without one, the configured owner
//!   identity is written as `admin`; anyone else gets the column default on
//!   insert and keeps their role on conflict.
//! - `last_signed_in` defaults to now on insert. If nothing else would be
//!   overwritten on conflict, it is refreshed so the conflict branch always
//!   writes.

use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use studyhall_types::Role;

use crate::error::StoreError;
use crate::models::FieldUpdate;
use crate::query::{format_timestamp, text, Assign, Insert, Raw};

/// A partial user record for [`plan_user_upsert`].
#[derive(Debug, Clone, Default)]
pub struct UserUpsert {
    /// External identity. Required; the upsert fails without it.
    pub open_id: Option<String>,
    pub name: FieldUpdate<Option<String>>,
    pub email: FieldUpdate<Option<String>>,
    pub login_method: FieldUpdate<Option<String>>,
    pub role: Option<Role>,
    pub last_signed_in: Option<DateTime<Utc>>,
}

impl UserUpsert {
    /// Starts an upsert for the given external identity with every other
    /// field left unchanged.
    pub fn for_open_id(open_id: impl Into<String>) -> Self {
        Self {
            open_id: Some(open_id.into()),
            ..Self::default()
        }
    }
}

/// Column values to insert and columns to overwrite on identity conflict.
#[derive(Debug, Clone, PartialEq)]
pub struct UserUpsertPlan {
    /// `(column, value)` pairs for the insert, `open_id` first.
    pub values: Vec<(&'static str, Value)>,
    /// Columns taken from the proposed row when the identity already exists.
    pub update: Vec<&'static str>,
}

impl UserUpsertPlan {
    /// Value planned for `column`, if it is part of the insert.
    pub fn value(&self, column: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, value)| value)
    }

    /// Single-statement insert with an `ON CONFLICT(open_id)` clause. The
    /// modification timestamp is refreshed whenever the conflict branch runs.
    pub(crate) fn to_statement(&self) -> Insert {
        let insert = self
            .values
            .iter()
            .fold(Insert::into_table("users"), |insert, (column, value)| {
                insert.value(column, value.clone())
            });

        let mut set: Vec<(&'static str, Assign)> = self
            .update
            .iter()
            .map(|column| (*column, Assign::Excluded))
            .collect();
        set.push(("updated_at", Assign::Raw(Raw::Now)));

        insert.on_conflict_update("open_id", set)
    }
}

/// Derives the insert values and conflict update set for `user`.
///
/// `owner_open_id` is the configured owner identity, if any. `now` is used
/// for the default sign-in time.
///
/// # Errors
///
/// Returns [`StoreError::InvalidArgument`] when `open_id` is missing or empty.
pub fn plan_user_upsert(
    user: &UserUpsert,
    owner_open_id: Option<&str>,
    now: DateTime<Utc>,
) -> Result<UserUpsertPlan, StoreError> {
    let open_id = match user.open_id.as_deref() {
        Some(id) if !id.is_empty() => id,
        _ => {
            return Err(StoreError::InvalidArgument(
                "user open_id is required for upsert".to_string(),
            ))
        }
    };

    let mut plan = UserUpsertPlan {
        values: vec![("open_id", text(open_id))],
        update: Vec::new(),
    };

    let nullable_text = [
        ("name", &user.name),
        ("email", &user.email),
        ("login_method", &user.login_method),
    ];
    for (column, field) in nullable_text {
        if let FieldUpdate::Set(value) = field {
            let value = value.as_deref().map_or(Value::Null, text);
            plan.values.push((column, value));
            plan.update.push(column);
        }
    }

    if let Some(at) = user.last_signed_in {
        plan.values.push(("last_signed_in", Value::Text(format_timestamp(at))));
        plan.update.push("last_signed_in");
    }

    let is_owner = owner_open_id.is_some_and(|owner| !owner.is_empty() && owner == open_id);
    let role = match user.role {
        Some(role) => Some(role),
        None if is_owner => Some(Role::Admin),
        None => None,
    };
    if let Some(role) = role {
        plan.values.push(("role", text(role.as_str())));
        plan.update.push("role");
    }

    if plan.value("last_signed_in").is_none() {
        plan.values.push(("last_signed_in", Value::Text(format_timestamp(now))));
    }

    if plan.update.is_empty() {
        plan.update.push("last_signed_in");
    }

    Ok(plan)
}
