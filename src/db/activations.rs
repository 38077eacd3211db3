//! Pending account activations (invites).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::db::dbi::Dbi;
use crate::db::tables::{Model, Row, SqlValue};
use crate::error::ApiError;

pub const PENDING_ACTIVATION_TABLE: &str = "pending_activations";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PendingActivation {
    pub id: Uuid,
    pub email: String,
    pub invite_key: String,
    pub created_at: DateTime<Utc>,
}

impl PendingActivation {
    pub fn new(email: String, invite_key: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            email,
            invite_key,
            created_at: Utc::now(),
        }
    }
}

impl Row for PendingActivation {
    // Application-assigned id, so it is part of the insert column list.
    fn columns() -> &'static [&'static str] {
        &["id", "email", "invite_key", "created_at"]
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            self.id.into(),
            self.email.clone().into(),
            self.invite_key.clone().into(),
            self.created_at.into(),
        ]
    }
}

impl Model for PendingActivation {
    type Id = Uuid;

    const TABLE: &'static str = PENDING_ACTIVATION_TABLE;

    fn id(&self) -> Uuid {
        self.id
    }

    fn assigned_id(&self, _last_insert_rowid: i64) -> Uuid {
        self.id
    }
}

pub struct ActivationRepository;

impl ActivationRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn find(
        &self,
        conn: &mut SqliteConnection,
        id: Uuid,
    ) -> Result<Option<PendingActivation>, ApiError> {
        Dbi::new(conn).find(id).await
    }

    pub async fn create(
        &self,
        conn: &mut SqliteConnection,
        activation: PendingActivation,
    ) -> Result<PendingActivation, ApiError> {
        Dbi::new(conn).insert(&activation).await
    }

    pub async fn destroy(&self, conn: &mut SqliteConnection, id: Uuid) -> Result<(), ApiError> {
        Dbi::new(conn).delete::<PendingActivation>(id).await
    }

    pub async fn find_by_email(
        &self,
        conn: &mut SqliteConnection,
        email: &str,
    ) -> Result<Vec<PendingActivation>, ApiError> {
        let sql = "SELECT pending_activations.* FROM pending_activations WHERE email = ?";
        Dbi::new(conn)
            .raw_query(PENDING_ACTIVATION_TABLE, sql, vec![email.into()])
            .await
    }

    pub async fn find_by_key(
        &self,
        conn: &mut SqliteConnection,
        key: &str,
    ) -> Result<Option<PendingActivation>, ApiError> {
        let sql = "SELECT pending_activations.* FROM pending_activations WHERE invite_key = ?";
        let mut rows: Vec<PendingActivation> = Dbi::new(conn)
            .raw_query(PENDING_ACTIVATION_TABLE, sql, vec![key.into()])
            .await?;
        Ok(rows.pop())
    }

    pub async fn count(&self, conn: &mut SqliteConnection) -> Result<i64, ApiError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM pending_activations")
            .fetch_one(conn)
            .await
            .map_err(|e| ApiError::storage("count", PENDING_ACTIVATION_TABLE, e))
    }
}

impl Default for ActivationRepository {
    fn default() -> Self {
        Self::new()
    }
}
