//! Minimal statement builders for the store's table modules.
//!
//! Table and column names are `&'static str` so they can only come from
//! the code itself, and every value travels as a bound parameter. The only
//! SQL text that is not a name or a placeholder is the [`Raw`] whitelist.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::types::{Type, Value};
use rusqlite::{params_from_iter, Connection, OptionalExtension, Row};

/// Timestamp layout shared with the schema's column defaults.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// SQL fragments that may be spliced into a statement verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Raw {
    /// Random row order.
    Random,
    /// Current UTC time in the stored timestamp layout.
    Now,
}

impl Raw {
    fn sql(self) -> &'static str {
        match self {
            Self::Random => "RANDOM()",
            Self::Now => "strftime('%Y-%m-%d %H:%M:%f', 'now')",
        }
    }
}

/// One `ORDER BY` term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Order {
    Asc(&'static str),
    Desc(&'static str),
    Raw(Raw),
}

/// Right-hand side of a `SET` assignment.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Assign {
    Bind(Value),
    /// `excluded.<column>`; only meaningful inside a conflict clause.
    Excluded,
    Raw(Raw),
}

/// Formats an instant the way the schema stores timestamps.
pub(crate) fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

pub(crate) fn text(value: &str) -> Value {
    Value::Text(value.to_string())
}

pub(crate) fn nullable<T: Into<Value>>(value: Option<T>) -> Value {
    value.map_or(Value::Null, Into::into)
}

/// Reads a text column and parses it into one of the closed enumerations.
pub(crate) fn get_parsed<T>(row: &Row<'_>, column: &str) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let idx = row.as_ref().column_index(column)?;
    let label: String = row.get(idx)?;
    label
        .parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Nullable variant of [`get_parsed`].
pub(crate) fn get_parsed_opt<T>(row: &Row<'_>, column: &str) -> rusqlite::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let idx = row.as_ref().column_index(column)?;
    let label: Option<String> = row.get(idx)?;
    label
        .map(|l| l.parse::<T>())
        .transpose()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Placeholder numbering shared by the clauses of one statement.
#[derive(Default)]
struct Params {
    values: Vec<Value>,
}

impl Params {
    fn push(&mut self, value: Value) -> String {
        self.values.push(value);
        format!("?{}", self.values.len())
    }

    fn assignment(&mut self, column: &str, assign: &Assign) -> String {
        match assign {
            Assign::Bind(value) => {
                let placeholder = self.push(value.clone());
                format!("{column} = {placeholder}")
            }
            Assign::Excluded => format!("{column} = excluded.{column}"),
            Assign::Raw(raw) => format!("{column} = {}", raw.sql()),
        }
    }

    fn where_clause(&mut self, filters: &[(&'static str, Value)]) -> String {
        if filters.is_empty() {
            return String::new();
        }
        let terms: Vec<String> = filters
            .iter()
            .map(|(column, value)| {
                let placeholder = self.push(value.clone());
                format!("{column} = {placeholder}")
            })
            .collect();
        format!(" WHERE {}", terms.join(" AND "))
    }
}

/// `SELECT <columns> FROM <table> [WHERE a = ? AND ...] [ORDER BY ...] [LIMIT ?]`
#[derive(Debug, Clone)]
pub(crate) struct Select {
    table: &'static str,
    columns: &'static [&'static str],
    filters: Vec<(&'static str, Value)>,
    order: Vec<Order>,
    limit: Option<i64>,
}

impl Select {
    pub(crate) fn from(table: &'static str, columns: &'static [&'static str]) -> Self {
        Self {
            table,
            columns,
            filters: Vec::new(),
            order: Vec::new(),
            limit: None,
        }
    }

    pub(crate) fn filter(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.filters.push((column, value.into()));
        self
    }

    /// Adds an equality filter only when a value is present.
    pub(crate) fn filter_opt<V: Into<Value>>(self, column: &'static str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.filter(column, v),
            None => self,
        }
    }

    pub(crate) fn order_by(mut self, order: Order) -> Self {
        self.order.push(order);
        self
    }

    pub(crate) fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub(crate) fn to_sql(&self) -> (String, Vec<Value>) {
        let mut params = Params::default();
        let mut sql = format!(
            "SELECT {} FROM {}{}",
            self.columns.join(", "),
            self.table,
            params.where_clause(&self.filters)
        );

        if !self.order.is_empty() {
            let terms: Vec<String> = self
                .order
                .iter()
                .map(|order| match order {
                    Order::Asc(column) => format!("{column} ASC"),
                    Order::Desc(column) => format!("{column} DESC"),
                    Order::Raw(raw) => raw.sql().to_string(),
                })
                .collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&terms.join(", "));
        }

        if let Some(limit) = self.limit {
            let placeholder = params.push(Value::Integer(limit));
            sql.push_str(" LIMIT ");
            sql.push_str(&placeholder);
        }

        (sql, params.values)
    }

    pub(crate) fn fetch_all<T, F>(&self, conn: &Connection, map: F) -> rusqlite::Result<Vec<T>>
    where
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        let (sql, values) = self.to_sql();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), map)?;
        let mut items = Vec::new();
        for row in rows {
            items.push(row?);
        }
        Ok(items)
    }

    pub(crate) fn fetch_optional<T, F>(self, conn: &Connection, map: F) -> rusqlite::Result<Option<T>>
    where
        F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
    {
        let (sql, values) = self.limit(1).to_sql();
        conn.query_row(&sql, params_from_iter(values.iter()), map)
            .optional()
    }
}

/// `INSERT INTO <table> (...) VALUES (...) [ON CONFLICT(<target>) DO UPDATE SET ...]`
#[derive(Debug, Clone)]
pub(crate) struct Insert {
    table: &'static str,
    values: Vec<(&'static str, Value)>,
    conflict: Option<(&'static str, Vec<(&'static str, Assign)>)>,
}

impl Insert {
    pub(crate) fn into_table(table: &'static str) -> Self {
        Self {
            table,
            values: Vec::new(),
            conflict: None,
        }
    }

    pub(crate) fn value(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.values.push((column, value.into()));
        self
    }

    /// Skips the column when no value is given, leaving it to the column default.
    pub(crate) fn value_opt<V: Into<Value>>(self, column: &'static str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.value(column, v),
            None => self,
        }
    }

    pub(crate) fn on_conflict_update(
        mut self,
        target: &'static str,
        set: Vec<(&'static str, Assign)>,
    ) -> Self {
        self.conflict = Some((target, set));
        self
    }

    pub(crate) fn to_sql(&self) -> (String, Vec<Value>) {
        let mut params = Params::default();
        let columns: Vec<&str> = self.values.iter().map(|(column, _)| *column).collect();
        let placeholders: Vec<String> = self
            .values
            .iter()
            .map(|(_, value)| params.push(value.clone()))
            .collect();

        let mut sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table,
            columns.join(", "),
            placeholders.join(", ")
        );

        if let Some((target, set)) = &self.conflict {
            let assignments: Vec<String> = set
                .iter()
                .map(|(column, assign)| params.assignment(column, assign))
                .collect();
            sql.push_str(&format!(
                " ON CONFLICT({target}) DO UPDATE SET {}",
                assignments.join(", ")
            ));
        }

        (sql, params.values)
    }

    /// Executes the insert and returns the new row's id.
    ///
    /// When a conflict clause turns the insert into an update, the returned
    /// id is not meaningful.
    pub(crate) fn execute(&self, conn: &Connection) -> rusqlite::Result<i64> {
        let (sql, values) = self.to_sql();
        conn.execute(&sql, params_from_iter(values.iter()))?;
        Ok(conn.last_insert_rowid())
    }
}

/// `UPDATE <table> SET ... WHERE a = ? AND ...`
#[derive(Debug, Clone)]
pub(crate) struct Update {
    table: &'static str,
    set: Vec<(&'static str, Assign)>,
    filters: Vec<(&'static str, Value)>,
}

impl Update {
    pub(crate) fn table(table: &'static str) -> Self {
        Self {
            table,
            set: Vec::new(),
            filters: Vec::new(),
        }
    }

    pub(crate) fn set(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.set.push((column, Assign::Bind(value.into())));
        self
    }

    pub(crate) fn set_opt<V: Into<Value>>(self, column: &'static str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.set(column, v),
            None => self,
        }
    }

    pub(crate) fn set_raw(mut self, column: &'static str, raw: Raw) -> Self {
        self.set.push((column, Assign::Raw(raw)));
        self
    }

    pub(crate) fn filter(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.filters.push((column, value.into()));
        self
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    pub(crate) fn to_sql(&self) -> (String, Vec<Value>) {
        let mut params = Params::default();
        let assignments: Vec<String> = self
            .set
            .iter()
            .map(|(column, assign)| params.assignment(column, assign))
            .collect();
        let sql = format!(
            "UPDATE {} SET {}{}",
            self.table,
            assignments.join(", "),
            params.where_clause(&self.filters)
        );
        (sql, params.values)
    }

    /// Executes the update and returns the number of rows changed.
    pub(crate) fn execute(&self, conn: &Connection) -> rusqlite::Result<usize> {
        let (sql, values) = self.to_sql();
        conn.execute(&sql, params_from_iter(values.iter()))
    }
}

/// `DELETE FROM <table> WHERE a = ? AND ...`
#[derive(Debug, Clone)]
pub(crate) struct Delete {
    table: &'static str,
    filters: Vec<(&'static str, Value)>,
}

impl Delete {
    pub(crate) fn from_table(table: &'static str) -> Self {
        Self {
            table,
            filters: Vec::new(),
        }
    }

    pub(crate) fn filter(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.filters.push((column, value.into()));
        self
    }

    pub(crate) fn execute(&self, conn: &Connection) -> rusqlite::Result<usize> {
        let mut params = Params::default();
        let sql = format!(
            "DELETE FROM {}{}",
            self.table,
            params.where_clause(&self.filters)
        );
        conn.execute(&sql, params_from_iter(params.values.iter()))
    }
}
