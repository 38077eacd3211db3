//! Performer rows, join rows, and repository.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;

use crate::db::dbi::Dbi;
use crate::db::query::{
    IdQuery, age_clauses, birth_year_clauses, in_binding, string_criterion_clauses,
};
use crate::db::tables::{JoinTable, Model, Row, SqlValue};
use crate::error::ApiError;
use crate::graphql::filters::{PerformerFilter, QuerySpec};

pub const PERFORMER_TABLE: &str = "performers";

pub const PERFORMER_ALIASES: JoinTable = JoinTable {
    table: "performer_aliases",
    primary_table: PERFORMER_TABLE,
    join_column: "performer_id",
};

pub const PERFORMER_URLS: JoinTable = JoinTable {
    table: "performer_urls",
    primary_table: PERFORMER_TABLE,
    join_column: "performer_id",
};

pub const PERFORMER_TATTOOS: JoinTable = JoinTable {
    table: "performer_tattoos",
    primary_table: PERFORMER_TABLE,
    join_column: "performer_id",
};

pub const PERFORMER_PIERCINGS: JoinTable = JoinTable {
    table: "performer_piercings",
    primary_table: PERFORMER_TABLE,
    join_column: "performer_id",
};

/// Sortable columns for performer list queries.
const PERFORMER_SORT_COLUMNS: &[&str] = &["name", "birthdate", "country", "created_at", "updated_at"];

/// Performer record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Performer {
    pub id: i64,
    pub name: String,
    pub disambiguation: Option<String>,
    pub gender: Option<String>,
    pub birthdate: Option<NaiveDate>,
    pub ethnicity: Option<String>,
    pub country: Option<String>,
    pub height_cm: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Row for Performer {
    fn columns() -> &'static [&'static str] {
        &[
            "name",
            "disambiguation",
            "gender",
            "birthdate",
            "ethnicity",
            "country",
            "height_cm",
            "created_at",
            "updated_at",
        ]
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            self.name.clone().into(),
            self.disambiguation.clone().into(),
            self.gender.clone().into(),
            self.birthdate.into(),
            self.ethnicity.clone().into(),
            self.country.clone().into(),
            self.height_cm.into(),
            self.created_at.into(),
            self.updated_at.into(),
        ]
    }
}

impl Model for Performer {
    type Id = i64;

    const TABLE: &'static str = PERFORMER_TABLE;

    fn id(&self) -> i64 {
        self.id
    }

    fn assigned_id(&self, last_insert_rowid: i64) -> i64 {
        last_insert_rowid
    }
}

/// Alias join row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PerformerAlias {
    pub performer_id: i64,
    pub alias: String,
}

impl Row for PerformerAlias {
    fn columns() -> &'static [&'static str] {
        &["performer_id", "alias"]
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![self.performer_id.into(), self.alias.clone().into()]
    }
}

/// URL join row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PerformerUrl {
    pub performer_id: i64,
    pub url: String,
    pub kind: String,
}

impl Row for PerformerUrl {
    fn columns() -> &'static [&'static str] {
        &["performer_id", "url", "kind"]
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            self.performer_id.into(),
            self.url.clone().into(),
            self.kind.clone().into(),
        ]
    }
}

/// Body modification join row, used by both the tattoo and piercing tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PerformerBodyMod {
    pub performer_id: i64,
    pub location: String,
    pub description: Option<String>,
}

impl Row for PerformerBodyMod {
    fn columns() -> &'static [&'static str] {
        &["performer_id", "location", "description"]
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            self.performer_id.into(),
            self.location.clone().into(),
            self.description.clone().into(),
        ]
    }
}

/// Performer data access. Stateless; every call takes the connection or
/// transaction it should run on.
pub struct PerformerRepository;

impl PerformerRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn find(
        &self,
        conn: &mut SqliteConnection,
        id: i64,
    ) -> Result<Option<Performer>, ApiError> {
        Dbi::new(conn).find(id).await
    }

    pub async fn create(
        &self,
        conn: &mut SqliteConnection,
        performer: Performer,
    ) -> Result<Performer, ApiError> {
        Dbi::new(conn).insert(&performer).await
    }

    pub async fn update(
        &self,
        conn: &mut SqliteConnection,
        performer: Performer,
    ) -> Result<Performer, ApiError> {
        Dbi::new(conn).update(&performer).await
    }

    pub async fn destroy(&self, conn: &mut SqliteConnection, id: i64) -> Result<(), ApiError> {
        Dbi::new(conn).delete::<Performer>(id).await
    }

    pub async fn create_aliases(
        &self,
        conn: &mut SqliteConnection,
        aliases: &[PerformerAlias],
    ) -> Result<(), ApiError> {
        Dbi::new(conn).insert_joins(&PERFORMER_ALIASES, aliases).await
    }

    pub async fn update_aliases(
        &self,
        conn: &mut SqliteConnection,
        performer_id: i64,
        aliases: &[PerformerAlias],
    ) -> Result<(), ApiError> {
        Dbi::new(conn)
            .replace_joins(&PERFORMER_ALIASES, performer_id, aliases)
            .await
    }

    pub async fn create_urls(
        &self,
        conn: &mut SqliteConnection,
        urls: &[PerformerUrl],
    ) -> Result<(), ApiError> {
        Dbi::new(conn).insert_joins(&PERFORMER_URLS, urls).await
    }

    pub async fn update_urls(
        &self,
        conn: &mut SqliteConnection,
        performer_id: i64,
        urls: &[PerformerUrl],
    ) -> Result<(), ApiError> {
        Dbi::new(conn)
            .replace_joins(&PERFORMER_URLS, performer_id, urls)
            .await
    }

    pub async fn create_tattoos(
        &self,
        conn: &mut SqliteConnection,
        tattoos: &[PerformerBodyMod],
    ) -> Result<(), ApiError> {
        Dbi::new(conn).insert_joins(&PERFORMER_TATTOOS, tattoos).await
    }

    pub async fn update_tattoos(
        &self,
        conn: &mut SqliteConnection,
        performer_id: i64,
        tattoos: &[PerformerBodyMod],
    ) -> Result<(), ApiError> {
        Dbi::new(conn)
            .replace_joins(&PERFORMER_TATTOOS, performer_id, tattoos)
            .await
    }

    pub async fn create_piercings(
        &self,
        conn: &mut SqliteConnection,
        piercings: &[PerformerBodyMod],
    ) -> Result<(), ApiError> {
        Dbi::new(conn)
            .insert_joins(&PERFORMER_PIERCINGS, piercings)
            .await
    }

    pub async fn update_piercings(
        &self,
        conn: &mut SqliteConnection,
        performer_id: i64,
        piercings: &[PerformerBodyMod],
    ) -> Result<(), ApiError> {
        Dbi::new(conn)
            .replace_joins(&PERFORMER_PIERCINGS, performer_id, piercings)
            .await
    }

    pub async fn get_aliases(
        &self,
        conn: &mut SqliteConnection,
        performer_id: i64,
    ) -> Result<Vec<String>, ApiError> {
        let joins: Vec<PerformerAlias> = Dbi::new(conn)
            .find_joins(&PERFORMER_ALIASES, performer_id)
            .await?;
        Ok(joins.into_iter().map(|j| j.alias).collect())
    }

    pub async fn get_urls(
        &self,
        conn: &mut SqliteConnection,
        performer_id: i64,
    ) -> Result<Vec<PerformerUrl>, ApiError> {
        Dbi::new(conn).find_joins(&PERFORMER_URLS, performer_id).await
    }

    pub async fn get_tattoos(
        &self,
        conn: &mut SqliteConnection,
        performer_id: i64,
    ) -> Result<Vec<PerformerBodyMod>, ApiError> {
        Dbi::new(conn)
            .find_joins(&PERFORMER_TATTOOS, performer_id)
            .await
    }

    pub async fn get_piercings(
        &self,
        conn: &mut SqliteConnection,
        performer_id: i64,
    ) -> Result<Vec<PerformerBodyMod>, ApiError> {
        Dbi::new(conn)
            .find_joins(&PERFORMER_PIERCINGS, performer_id)
            .await
    }

    /// Exact name match, case-insensitive.
    pub async fn find_by_name(
        &self,
        conn: &mut SqliteConnection,
        name: &str,
    ) -> Result<Vec<Performer>, ApiError> {
        let sql = "SELECT performers.* FROM performers WHERE upper(name) = upper(?)";
        Dbi::new(conn)
            .raw_query(PERFORMER_TABLE, sql, vec![name.into()])
            .await
    }

    pub async fn find_by_names(
        &self,
        conn: &mut SqliteConnection,
        names: &[String],
    ) -> Result<Vec<Performer>, ApiError> {
        if names.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT performers.* FROM performers WHERE name IN {}",
            in_binding(names.len())
        );
        let values = names.iter().map(|n| n.as_str().into()).collect();
        Dbi::new(conn).raw_query(PERFORMER_TABLE, &sql, values).await
    }

    /// Exact alias match, case-insensitive.
    pub async fn find_by_alias(
        &self,
        conn: &mut SqliteConnection,
        alias: &str,
    ) -> Result<Vec<Performer>, ApiError> {
        let sql = "SELECT performers.* FROM performers \
                   LEFT JOIN performer_aliases ON performers.id = performer_aliases.performer_id \
                   WHERE upper(performer_aliases.alias) = upper(?)";
        Dbi::new(conn)
            .raw_query(PERFORMER_TABLE, sql, vec![alias.into()])
            .await
    }

    pub async fn find_by_aliases(
        &self,
        conn: &mut SqliteConnection,
        aliases: &[String],
    ) -> Result<Vec<Performer>, ApiError> {
        if aliases.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT performers.* FROM performers \
             LEFT JOIN performer_aliases ON performers.id = performer_aliases.performer_id \
             WHERE performer_aliases.alias IN {}",
            in_binding(aliases.len())
        );
        let values = aliases.iter().map(|a| a.as_str().into()).collect();
        Dbi::new(conn).raw_query(PERFORMER_TABLE, &sql, values).await
    }

    pub async fn count(&self, conn: &mut SqliteConnection) -> Result<i64, ApiError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM performers")
            .fetch_one(conn)
            .await
            .map_err(|e| ApiError::storage("count", PERFORMER_TABLE, e))
    }

    /// Run the filter query and re-fetch the matching page of performers by
    /// id, preserving sort order.
    pub async fn query(
        &self,
        conn: &mut SqliteConnection,
        filter: &PerformerFilter,
        spec: &QuerySpec,
    ) -> Result<(Vec<Performer>, i64), ApiError> {
        let mut query = IdQuery::new(PERFORMER_TABLE);

        if let Some(name) = filter.name.as_deref().filter(|n| !n.is_empty()) {
            query = query
                .join("LEFT JOIN performer_aliases ON performer_aliases.performer_id = performers.id")
                .search(&["performers.name", "performer_aliases.alias"], name);
        }

        if let Some(birth_year) = &filter.birth_year {
            let (clauses, values) = birth_year_clauses(birth_year.modifier, birth_year.value);
            query = query.criterion(clauses, values);
        }

        if let Some(age) = &filter.age {
            let today = Utc::now().date_naive();
            let (clauses, values) = age_clauses(age.modifier, age.value, today);
            query = query.criterion(clauses, values);
        }

        if let Some(country) = &filter.country {
            let (clauses, values) = string_criterion_clauses("performers.country", country);
            query = query.criterion(clauses, values);
        }

        let (ids, count) = query
            .sort(spec, "name", PERFORMER_SORT_COLUMNS)
            .paginate(spec)
            .execute(conn)
            .await?;

        let mut performers = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(performer) = self.find(conn, id).await? {
                performers.push(performer);
            }
        }

        Ok((performers, count))
    }
}

impl Default for PerformerRepository {
    fn default() -> Self {
        Self::new()
    }
}
