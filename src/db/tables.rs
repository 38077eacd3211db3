//! Row/model traits and table descriptors for the generic data-access layer.
//!
//! Rows are decoded straight through [sqlx::FromRow]; column metadata and bind
//! values are provided explicitly per type, so there is no runtime reflection
//! anywhere in the write path.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::Sqlite;
use sqlx::sqlite::SqliteRow;
use uuid::Uuid;

/// A value bound to a parameterized statement. Filters and row serializers
/// collect these alongside the clause strings they belong to.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
    Uuid(Uuid),
    Null,
}

impl SqlValue {
    /// Bind this value to a sqlx query at the next positional parameter.
    pub fn bind_to_query<'q>(
        &'q self,
        query: sqlx::query::Query<'q, Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    ) -> sqlx::query::Query<'q, Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
        match self {
            SqlValue::String(s) => query.bind(s.as_str()),
            SqlValue::Int(i) => query.bind(*i),
            SqlValue::Float(f) => query.bind(*f),
            SqlValue::Bool(b) => query.bind(*b),
            SqlValue::Date(d) => query.bind(*d),
            SqlValue::Timestamp(t) => query.bind(*t),
            SqlValue::Uuid(u) => query.bind(*u),
            SqlValue::Null => query.bind(None::<String>),
        }
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::String(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::String(v.to_string())
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Int(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::Int(v.into())
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(v: NaiveDate) -> Self {
        SqlValue::Date(v)
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(v: DateTime<Utc>) -> Self {
        SqlValue::Timestamp(v)
    }
}

impl From<Uuid> for SqlValue {
    fn from(v: Uuid) -> Self {
        SqlValue::Uuid(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(SqlValue::Null, Into::into)
    }
}

/// A row that can be written to and decoded from a table. Join rows implement
/// only this; rows with their own identity also implement [Model].
pub trait Row: for<'r> sqlx::FromRow<'r, SqliteRow> + Send + Sync + Unpin {
    /// Column names written on insert, in the order [Row::values] yields them.
    fn columns() -> &'static [&'static str];

    /// Bind values aligned with [Row::columns].
    fn values(&self) -> Vec<SqlValue>;
}

/// A row with a primary table and a unique identifier.
pub trait Model: Row {
    /// Identifier type: `i64` for rowid tables, [Uuid] for activation records.
    type Id: for<'q> sqlx::Encode<'q, Sqlite>
        + sqlx::Type<Sqlite>
        + Copy
        + Send
        + Sync
        + std::fmt::Display
        + 'static;

    const TABLE: &'static str;

    fn id(&self) -> Self::Id;

    /// Identifier of a freshly inserted row. Rowid tables take the
    /// storage-assigned value; uuid-keyed tables already carry their id.
    fn assigned_id(&self, last_insert_rowid: i64) -> Self::Id;
}

/// Descriptor for a join table: rows keyed by a foreign column referencing the
/// primary table's id, replaced as full sets on update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinTable {
    pub table: &'static str,
    pub primary_table: &'static str,
    pub join_column: &'static str,
}

impl JoinTable {
    /// View the relation from the joined side: the join table becomes the
    /// primary table and rows are keyed by `join_column` on the other end.
    pub const fn inverse(&self, join_column: &'static str) -> JoinTable {
        JoinTable {
            table: self.primary_table,
            primary_table: self.table,
            join_column,
        }
    }
}
