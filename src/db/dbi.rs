//! Generic data access over a single connection or transaction.
//!
//! [Dbi] is a stateless facade: it holds nothing across calls beyond the
//! connection it was handed. Mutations re-fetch the row after writing so the
//! returned entity reflects storage-computed defaults and silent write
//! failures surface immediately. Callers that need atomicity across several
//! operations must hand in an active transaction.

use sqlx::SqliteConnection;
use tracing::debug;

use crate::db::tables::{JoinTable, Model, Row, SqlValue};
use crate::error::ApiError;

/// Data-access interface bound to an explicitly passed connection. For
/// mutations pass `&mut *tx`; for reads a pool-acquired connection works.
pub struct Dbi<'c> {
    conn: &'c mut SqliteConnection,
}

fn insert_sql(table: &str, columns: &[&str]) -> String {
    let placeholders = vec!["?"; columns.len()].join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        columns.join(", "),
        placeholders
    )
}

fn update_sql(table: &str, columns: &[&str]) -> String {
    let assignments: Vec<String> = columns.iter().map(|c| format!("{c} = ?")).collect();
    format!("UPDATE {} SET {} WHERE id = ?", table, assignments.join(", "))
}

fn select_sql(table: &str) -> String {
    format!("SELECT {table}.* FROM {table}")
}

impl<'c> Dbi<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        Self { conn }
    }

    /// Insert a row and return a freshly fetched copy keyed by the assigned id.
    pub async fn insert<M: Model>(&mut self, row: &M) -> Result<M, ApiError> {
        let sql = insert_sql(M::TABLE, M::columns());
        let values = row.values();

        let mut query = sqlx::query(&sql);
        for value in &values {
            query = value.bind_to_query(query);
        }
        let result = query
            .execute(&mut *self.conn)
            .await
            .map_err(|e| ApiError::storage("insert", M::TABLE, e))?;

        let id = row.assigned_id(result.last_insert_rowid());
        debug!(table = M::TABLE, id = %id, "inserted row");

        self.find::<M>(id)
            .await?
            .ok_or_else(|| ApiError::storage("insert", M::TABLE, sqlx::Error::RowNotFound))
    }

    /// Overwrite all mutable columns of the row identified by its id and
    /// return a freshly fetched copy. A zero-row update is a [NotFound]
    /// failure rather than a silent no-op.
    ///
    /// [NotFound]: ApiError::NotFound
    pub async fn update<M: Model>(&mut self, row: &M) -> Result<M, ApiError> {
        let sql = update_sql(M::TABLE, M::columns());
        let values = row.values();

        let mut query = sqlx::query(&sql);
        for value in &values {
            query = value.bind_to_query(query);
        }
        query = query.bind(row.id());
        let result = query
            .execute(&mut *self.conn)
            .await
            .map_err(|e| ApiError::storage("update", M::TABLE, e))?;

        if result.rows_affected() == 0 {
            return Err(ApiError::not_found(M::TABLE, row.id()));
        }
        debug!(table = M::TABLE, id = %row.id(), "updated row");

        self.find::<M>(row.id())
            .await?
            .ok_or_else(|| ApiError::storage("update", M::TABLE, sqlx::Error::RowNotFound))
    }

    /// Delete the row with the given id, asserting it exists first.
    /// Dependent join rows cascade via the storage layer's foreign keys.
    pub async fn delete<M: Model>(&mut self, id: M::Id) -> Result<(), ApiError> {
        if self.find::<M>(id).await?.is_none() {
            return Err(ApiError::not_found(M::TABLE, id));
        }

        let sql = format!("DELETE FROM {} WHERE id = ?", M::TABLE);
        sqlx::query(&sql)
            .bind(id)
            .execute(&mut *self.conn)
            .await
            .map_err(|e| ApiError::storage("delete", M::TABLE, e))?;
        debug!(table = M::TABLE, id = %id, "deleted row");
        Ok(())
    }

    /// Fetch a row by id. Absence is not an error.
    pub async fn find<M: Model>(&mut self, id: M::Id) -> Result<Option<M>, ApiError> {
        let sql = select_sql(M::TABLE) + " WHERE id = ? LIMIT 1";
        sqlx::query_as::<_, M>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.conn)
            .await
            .map_err(|e| ApiError::storage("find", M::TABLE, e))
    }

    /// Insert a single join row verbatim.
    pub async fn insert_join<J: Row>(&mut self, join: &JoinTable, row: &J) -> Result<(), ApiError> {
        let sql = insert_sql(join.table, J::columns());
        let values = row.values();

        let mut query = sqlx::query(&sql);
        for value in &values {
            query = value.bind_to_query(query);
        }
        query
            .execute(&mut *self.conn)
            .await
            .map(|_| ())
            .map_err(|e| ApiError::storage("insert", join.table, e))
    }

    /// Insert many join rows, stopping at the first error. Partial writes
    /// before the error remain; the enclosing transaction's rollback provides
    /// atomicity.
    pub async fn insert_joins<J: Row>(
        &mut self,
        join: &JoinTable,
        rows: &[J],
    ) -> Result<(), ApiError> {
        for row in rows {
            self.insert_join(join, row).await?;
        }
        Ok(())
    }

    /// Replace the full join set for a parent: delete all, then insert all.
    /// Atomic only when run inside a transaction.
    pub async fn replace_joins<J: Row>(
        &mut self,
        join: &JoinTable,
        parent_id: i64,
        rows: &[J],
    ) -> Result<(), ApiError> {
        self.delete_joins(join, parent_id).await?;
        self.insert_joins(join, rows).await
    }

    /// Delete all join rows referencing a parent. Zero matches is a success.
    pub async fn delete_joins(&mut self, join: &JoinTable, parent_id: i64) -> Result<(), ApiError> {
        let sql = format!("DELETE FROM {} WHERE {} = ?", join.table, join.join_column);
        sqlx::query(&sql)
            .bind(parent_id)
            .execute(&mut *self.conn)
            .await
            .map(|_| ())
            .map_err(|e| ApiError::storage("delete", join.table, e))
    }

    /// Fetch all join rows referencing a parent.
    pub async fn find_joins<J: Row>(
        &mut self,
        join: &JoinTable,
        parent_id: i64,
    ) -> Result<Vec<J>, ApiError> {
        let sql = format!("{} WHERE {} = ?", select_sql(join.table), join.join_column);
        self.raw_query(join.table, &sql, vec![parent_id.into()])
            .await
    }

    /// Execute a parameterized statement and decode every resulting row.
    /// No rows is an empty, non-error result.
    pub async fn raw_query<R: Row>(
        &mut self,
        table: &'static str,
        sql: &str,
        values: Vec<SqlValue>,
    ) -> Result<Vec<R>, ApiError> {
        debug!(table, sql, "executing raw query");

        let mut query = sqlx::query_as::<_, R>(sql);
        for value in &values {
            query = match value {
                SqlValue::String(s) => query.bind(s.as_str()),
                SqlValue::Int(i) => query.bind(*i),
                SqlValue::Float(f) => query.bind(*f),
                SqlValue::Bool(b) => query.bind(*b),
                SqlValue::Date(d) => query.bind(*d),
                SqlValue::Timestamp(t) => query.bind(*t),
                SqlValue::Uuid(u) => query.bind(*u),
                SqlValue::Null => query.bind(None::<String>),
            };
        }

        query
            .fetch_all(&mut *self.conn)
            .await
            .map_err(|e| ApiError::storage("query", table, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn insert_sql_lists_columns_and_placeholders() {
        assert_eq!(
            insert_sql("performer_aliases", &["performer_id", "alias"]),
            "INSERT INTO performer_aliases (performer_id, alias) VALUES (?, ?)"
        );
    }

    #[test]
    fn update_sql_keys_on_id() {
        assert_eq!(
            update_sql("studios", &["name", "parent_studio_id"]),
            "UPDATE studios SET name = ?, parent_studio_id = ? WHERE id = ?"
        );
    }

    #[test]
    fn select_sql_is_table_qualified() {
        assert_eq!(
            select_sql("performers"),
            "SELECT performers.* FROM performers"
        );
    }
}
