//! Studio mutations, transactional like the performer ones.

use async_graphql::{Context, ErrorExtensions, Object, Result};
use chrono::Utc;
use sqlx::SqliteConnection;

use crate::db::{self, Database, StudioRepository, StudioUrl};
use crate::error::ApiError;
use crate::graphql::auth::AuthExt;
use crate::graphql::models::Studio;
use crate::graphql::parse_id;
use crate::graphql::types::{StudioCreateInput, StudioDestroyInput, StudioUpdateInput};

#[derive(Default)]
pub struct StudioMutations;

#[Object]
impl StudioMutations {
    async fn studio_create(&self, ctx: &Context<'_>, input: StudioCreateInput) -> Result<Studio> {
        ctx.validate_modify()?;
        let db = ctx.data_unchecked::<Database>();

        let mut tx = db.begin().await.map_err(|e| e.extend())?;
        match create_in_tx(&mut tx, input).await {
            Ok(record) => {
                tx.commit()
                    .await
                    .map_err(|e| ApiError::storage("commit", "studios", e).extend())?;
                Ok(Studio(record))
            }
            Err(err) => {
                let _ = tx.rollback().await;
                Err(err.extend())
            }
        }
    }

    async fn studio_update(&self, ctx: &Context<'_>, input: StudioUpdateInput) -> Result<Studio> {
        ctx.validate_modify()?;
        let db = ctx.data_unchecked::<Database>();
        let studio_id = parse_id(&input.id, "studio id").map_err(|e| e.extend())?;

        let mut tx = db.begin().await.map_err(|e| e.extend())?;
        match update_in_tx(&mut tx, studio_id, input).await {
            Ok(record) => {
                tx.commit()
                    .await
                    .map_err(|e| ApiError::storage("commit", "studios", e).extend())?;
                Ok(Studio(record))
            }
            Err(err) => {
                let _ = tx.rollback().await;
                Err(err.extend())
            }
        }
    }

    async fn studio_destroy(&self, ctx: &Context<'_>, input: StudioDestroyInput) -> Result<bool> {
        ctx.validate_modify()?;
        let db = ctx.data_unchecked::<Database>();
        let studio_id = parse_id(&input.id, "studio id").map_err(|e| e.extend())?;

        let mut tx = db.begin().await.map_err(|e| e.extend())?;
        match StudioRepository::new().destroy(&mut tx, studio_id).await {
            Ok(()) => {
                tx.commit()
                    .await
                    .map_err(|e| ApiError::storage("commit", "studios", e).extend())?;
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
    input: StudioCreateInput,
) -> Result<db::Studio, ApiError> {
    if input.name.trim().is_empty() {
        return Err(ApiError::validation("studio name", input.name));
    }

    let repo = StudioRepository::new();
    let now = Utc::now();

    let parent_studio_id = match input.parent_id {
        Some(id) => Some(resolve_parent(conn, &repo, &id).await?),
        None => None,
    };

    let record = repo
        .create(
            conn,
            db::Studio {
                id: 0,
                name: input.name,
                parent_studio_id,
                created_at: now,
                updated_at: now,
            },
        )
        .await?;

    if let Some(urls) = input.urls {
        let rows: Vec<StudioUrl> = urls
            .into_iter()
            .map(|u| StudioUrl {
                studio_id: record.id,
                url: u.url,
                kind: u.kind,
            })
            .collect();
        repo.create_urls(conn, &rows).await?;
    }

    Ok(record)
}

async fn update_in_tx(
    conn: &mut SqliteConnection,
    studio_id: i64,
    input: StudioUpdateInput,
) -> Result<db::Studio, ApiError> {
    let repo = StudioRepository::new();

    let mut record = repo
        .find(conn, studio_id)
        .await?
        .ok_or_else(|| ApiError::not_found("studio", studio_id))?;

    if let Some(name) = input.name {
        if name.trim().is_empty() {
            return Err(ApiError::validation("studio name", name));
        }
        record.name = name;
    }
    if let Some(parent_id) = input.parent_id {
        let parent_studio_id = resolve_parent(conn, &repo, &parent_id).await?;
        if parent_studio_id == studio_id {
            return Err(ApiError::validation("studio parent", "studio cannot parent itself"));
        }
        record.parent_studio_id = Some(parent_studio_id);
    }
    record.updated_at = Utc::now();

    let record = repo.update(conn, record).await?;

    if let Some(urls) = input.urls {
        let rows: Vec<StudioUrl> = urls
            .into_iter()
            .map(|u| StudioUrl {
                studio_id: record.id,
                url: u.url,
                kind: u.kind,
            })
            .collect();
        repo.update_urls(conn, record.id, &rows).await?;
    }

    Ok(record)
}

/// Parse and verify a parent studio reference.
async fn resolve_parent(
    conn: &mut SqliteConnection,
    repo: &StudioRepository,
    id: &async_graphql::ID,
) -> Result<i64, ApiError> {
    let parent_id = parse_id(id, "studio parent id")?;
    repo.find(conn, parent_id)
        .await?
        .ok_or_else(|| ApiError::not_found("studio", parent_id))?;
    Ok(parent_id)
}
