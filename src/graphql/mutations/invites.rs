//! Invite lifecycle over pending activations. Each mutation runs inside a
//! single transaction like the performer and studio mutations.

use async_graphql::{Context, ErrorExtensions, Object, Result};
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::db::{self, ActivationRepository, Database};
use crate::error::ApiError;
use crate::graphql::auth::AuthExt;
use crate::graphql::models::PendingActivation;

#[derive(Default)]
pub struct InviteMutations;

#[Object]
impl InviteMutations {
    /// Create an invite for an email address and return the pending
    /// activation carrying its key.
    async fn invite_create(&self, ctx: &Context<'_>, email: String) -> Result<PendingActivation> {
        ctx.validate_modify()?;
        if !email.contains('@') {
            return Err(ApiError::validation("invite email", email).extend());
        }

        let db = ctx.data_unchecked::<Database>();
        let mut tx = db.begin().await.map_err(|e| e.extend())?;
        match create_in_tx(&mut tx, email).await {
            Ok(record) => {
                tx.commit()
                    .await
                    .map_err(|e| ApiError::storage("commit", "pending_activations", e).extend())?;
                tracing::info!(email = %record.email, "invite created");
                Ok(PendingActivation(record))
            }
            Err(err) => {
                let _ = tx.rollback().await;
                Err(err.extend())
            }
        }
    }

    /// Rescind an outstanding invite by its key.
    async fn invite_rescind(&self, ctx: &Context<'_>, key: String) -> Result<bool> {
        ctx.validate_modify()?;
        let db = ctx.data_unchecked::<Database>();

        let mut tx = db.begin().await.map_err(|e| e.extend())?;
        match rescind_in_tx(&mut tx, &key).await {
            Ok(record) => {
                tx.commit()
                    .await
                    .map_err(|e| ApiError::storage("commit", "pending_activations", e).extend())?;
                tracing::info!(email = %record.email, "invite rescinded");
                Ok(true)
            }
            Err(err) => {
                let _ = tx.rollback().await;
                Err(err.extend())
            }
        }
    }
}

async fn create_in_tx(
    conn: &mut SqliteConnection,
    email: String,
) -> Result<db::PendingActivation, ApiError> {
    let activation = db::PendingActivation::new(email, Uuid::new_v4().to_string());
    ActivationRepository::new().create(conn, activation).await
}

async fn rescind_in_tx(
    conn: &mut SqliteConnection,
    key: &str,
) -> Result<db::PendingActivation, ApiError> {
    let repo = ActivationRepository::new();
    let record = repo
        .find_by_key(conn, key)
        .await?
        .ok_or_else(|| ApiError::not_found("pending activation", key))?;

    repo.destroy(conn, record.id).await?;
    Ok(record)
}
