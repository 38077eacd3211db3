use async_graphql::{Context, ErrorExtensions, ID, Object, Result};

use crate::db::{Database, StudioRepository};
use crate::error::ApiError;
use crate::graphql::auth::AuthExt;
use crate::graphql::filters::{QuerySpec, StudioFilter};
use crate::graphql::models::Studio;
use crate::graphql::parse_id;
use crate::graphql::types::QueryStudiosResult;

#[derive(Default)]
pub struct StudioQueries;

#[Object]
impl StudioQueries {
    /// Look up a single studio by id or by exact name.
    async fn find_studio(
        &self,
        ctx: &Context<'_>,
        id: Option<ID>,
        name: Option<String>,
    ) -> Result<Option<Studio>> {
        ctx.validate_read()?;
        let db = ctx.data_unchecked::<Database>();
        let mut conn = db.acquire().await.map_err(|e| e.extend())?;
        let repo = StudioRepository::new();

        if let Some(id) = id {
            let studio_id = parse_id(&id, "studio id").map_err(|e| e.extend())?;
            let record = repo
                .find(&mut conn, studio_id)
                .await
                .map_err(|e| e.extend())?;
            return Ok(record.map(Studio));
        }

        if let Some(name) = name {
            let mut records = repo
                .find_by_name(&mut conn, &name)
                .await
                .map_err(|e| e.extend())?;
            return Ok(if records.is_empty() {
                None
            } else {
                Some(Studio(records.remove(0)))
            });
        }

        Err(ApiError::validation("find_studio", "id or name required").extend())
    }

    /// List studios matching a filter, with pagination and a total count.
    async fn query_studios(
        &self,
        ctx: &Context<'_>,
        filter: Option<StudioFilter>,
        spec: Option<QuerySpec>,
    ) -> Result<QueryStudiosResult> {
        ctx.validate_read()?;
        let db = ctx.data_unchecked::<Database>();
        let mut conn = db.acquire().await.map_err(|e| e.extend())?;

        let filter = filter.unwrap_or_default();
        let spec = spec.unwrap_or_default();

        let (records, count) = StudioRepository::new()
            .query(&mut conn, &filter, &spec)
            .await
            .map_err(|e| e.extend())?;

        Ok(QueryStudiosResult {
            count,
            studios: records.into_iter().map(Studio).collect(),
        })
    }
}
