use async_graphql::{Context, ErrorExtensions, Object, Result};

use crate::db::{ActivationRepository, Database};
use crate::error::ApiError;
use crate::graphql::auth::AuthExt;
use crate::graphql::models::PendingActivation;

#[derive(Default)]
pub struct ActivationQueries;

#[Object]
impl ActivationQueries {
    /// Look up a pending activation by invite key, or the most recent one for
    /// an email address.
    async fn find_pending_activation(
        &self,
        ctx: &Context<'_>,
        email: Option<String>,
        key: Option<String>,
    ) -> Result<Option<PendingActivation>> {
        ctx.validate_modify()?;
        let db = ctx.data_unchecked::<Database>();
        let mut conn = db.acquire().await.map_err(|e| e.extend())?;
        let repo = ActivationRepository::new();

        if let Some(key) = key {
            let record = repo
                .find_by_key(&mut conn, &key)
                .await
                .map_err(|e| e.extend())?;
            return Ok(record.map(PendingActivation));
        }

        if let Some(email) = email {
            let mut records = repo
                .find_by_email(&mut conn, &email)
                .await
                .map_err(|e| e.extend())?;
            return Ok(records.pop().map(PendingActivation));
        }

        Err(ApiError::validation("find_pending_activation", "email or key required").extend())
    }
}
