//! Studio rows and repository.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;

use crate::db::dbi::Dbi;
use crate::db::query::IdQuery;
use crate::db::tables::{JoinTable, Model, Row, SqlValue};
use crate::error::ApiError;
use crate::graphql::filters::{QuerySpec, StudioFilter};

pub const STUDIO_TABLE: &str = "studios";

pub const STUDIO_URLS: JoinTable = JoinTable {
    table: "studio_urls",
    primary_table: STUDIO_TABLE,
    join_column: "studio_id",
};

const STUDIO_SORT_COLUMNS: &[&str] = &["name", "created_at", "updated_at"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Studio {
    pub id: i64,
    pub name: String,
    pub parent_studio_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Row for Studio {
    fn columns() -> &'static [&'static str] {
        &["name", "parent_studio_id", "created_at", "updated_at"]
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            self.name.clone().into(),
            self.parent_studio_id.into(),
            self.created_at.into(),
            self.updated_at.into(),
        ]
    }
}

impl Model for Studio {
    type Id = i64;

    const TABLE: &'static str = STUDIO_TABLE;

    fn id(&self) -> i64 {
        self.id
    }

    fn assigned_id(&self, last_insert_rowid: i64) -> i64 {
        last_insert_rowid
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct StudioUrl {
    pub studio_id: i64,
    pub url: String,
    pub kind: String,
}

impl Row for StudioUrl {
    fn columns() -> &'static [&'static str] {
        &["studio_id", "url", "kind"]
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            self.studio_id.into(),
            self.url.clone().into(),
            self.kind.clone().into(),
        ]
    }
}

pub struct StudioRepository;

impl StudioRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn find(
        &self,
        conn: &mut SqliteConnection,
        id: i64,
    ) -> Result<Option<Studio>, ApiError> {
        Dbi::new(conn).find(id).await
    }

    pub async fn create(
        &self,
        conn: &mut SqliteConnection,
        studio: Studio,
    ) -> Result<Studio, ApiError> {
        Dbi::new(conn).insert(&studio).await
    }

    pub async fn update(
        &self,
        conn: &mut SqliteConnection,
        studio: Studio,
    ) -> Result<Studio, ApiError> {
        Dbi::new(conn).update(&studio).await
    }

    pub async fn destroy(&self, conn: &mut SqliteConnection, id: i64) -> Result<(), ApiError> {
        Dbi::new(conn).delete::<Studio>(id).await
    }

    pub async fn create_urls(
        &self,
        conn: &mut SqliteConnection,
        urls: &[StudioUrl],
    ) -> Result<(), ApiError> {
        Dbi::new(conn).insert_joins(&STUDIO_URLS, urls).await
    }

    pub async fn update_urls(
        &self,
        conn: &mut SqliteConnection,
        studio_id: i64,
        urls: &[StudioUrl],
    ) -> Result<(), ApiError> {
        Dbi::new(conn)
            .replace_joins(&STUDIO_URLS, studio_id, urls)
            .await
    }

    pub async fn get_urls(
        &self,
        conn: &mut SqliteConnection,
        studio_id: i64,
    ) -> Result<Vec<StudioUrl>, ApiError> {
        Dbi::new(conn).find_joins(&STUDIO_URLS, studio_id).await
    }

    /// Exact name match, case-insensitive.
    pub async fn find_by_name(
        &self,
        conn: &mut SqliteConnection,
        name: &str,
    ) -> Result<Vec<Studio>, ApiError> {
        let sql = "SELECT studios.* FROM studios WHERE upper(name) = upper(?)";
        Dbi::new(conn)
            .raw_query(STUDIO_TABLE, sql, vec![name.into()])
            .await
    }

    pub async fn find_by_parent_id(
        &self,
        conn: &mut SqliteConnection,
        parent_id: i64,
    ) -> Result<Vec<Studio>, ApiError> {
        let sql = "SELECT studios.* FROM studios WHERE parent_studio_id = ?";
        Dbi::new(conn)
            .raw_query(STUDIO_TABLE, sql, vec![parent_id.into()])
            .await
    }

    pub async fn count(&self, conn: &mut SqliteConnection) -> Result<i64, ApiError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM studios")
            .fetch_one(conn)
            .await
            .map_err(|e| ApiError::storage("count", STUDIO_TABLE, e))
    }

    pub async fn query(
        &self,
        conn: &mut SqliteConnection,
        filter: &StudioFilter,
        spec: &QuerySpec,
    ) -> Result<(Vec<Studio>, i64), ApiError> {
        let mut query = IdQuery::new(STUDIO_TABLE);

        if let Some(name) = filter.name.as_deref().filter(|n| !n.is_empty()) {
            query = query.search(&["studios.name"], name);
        }

        let (ids, count) = query
            .sort(spec, "name", STUDIO_SORT_COLUMNS)
            .paginate(spec)
            .execute(conn)
            .await?;

        let mut studios = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(studio) = self.find(conn, id).await? {
                studios.push(studio);
            }
        }

        Ok((studios, count))
    }
}

impl Default for StudioRepository {
    fn default() -> Self {
        Self::new()
    }
}
