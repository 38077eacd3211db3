use async_graphql::{Context, ErrorExtensions, ID, Object, Result};

use crate::db::{Database, PerformerRepository};
use crate::error::ApiError;
use crate::graphql::auth::AuthExt;
use crate::graphql::filters::{PerformerFilter, QuerySpec};
use crate::graphql::models::Performer;
use crate::graphql::parse_id;
use crate::graphql::types::QueryPerformersResult;

#[derive(Default)]
pub struct PerformerQueries;

#[Object]
impl PerformerQueries {
    /// Look up a single performer by id or by exact name.
    async fn find_performer(
        &self,
        ctx: &Context<'_>,
        id: Option<ID>,
        name: Option<String>,
    ) -> Result<Option<Performer>> {
        ctx.validate_read()?;
        let db = ctx.data_unchecked::<Database>();
        let mut conn = db.acquire().await.map_err(|e| e.extend())?;
        let repo = PerformerRepository::new();

        if let Some(id) = id {
            let performer_id = parse_id(&id, "performer id").map_err(|e| e.extend())?;
            let record = repo
                .find(&mut conn, performer_id)
                .await
                .map_err(|e| e.extend())?;
            return Ok(record.map(Performer));
        }

        if let Some(name) = name {
            let mut records = repo
                .find_by_name(&mut conn, &name)
                .await
                .map_err(|e| e.extend())?;
            return Ok(if records.is_empty() {
                None
            } else {
                Some(Performer(records.remove(0)))
            });
        }

        Err(ApiError::validation("find_performer", "id or name required").extend())
    }

    /// List performers matching a filter, with pagination and a total count.
    async fn query_performers(
        &self,
        ctx: &Context<'_>,
        filter: Option<PerformerFilter>,
        spec: Option<QuerySpec>,
    ) -> Result<QueryPerformersResult> {
        ctx.validate_read()?;
        let db = ctx.data_unchecked::<Database>();
        let mut conn = db.acquire().await.map_err(|e| e.extend())?;

        let filter = filter.unwrap_or_default();
        let spec = spec.unwrap_or_default();

        let (records, count) = PerformerRepository::new()
            .query(&mut conn, &filter, &spec)
            .await
            .map_err(|e| e.extend())?;

        Ok(QueryPerformersResult {
            count,
            performers: records.into_iter().map(Performer).collect(),
        })
    }
}
