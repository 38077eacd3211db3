//! Performer mutations. Each mutation runs inside a single transaction so a
//! failed join write rolls back the primary row with it.

use async_graphql::{Context, ErrorExtensions, Object, Result};
use chrono::Utc;
use sqlx::SqliteConnection;

use crate::db::{
    self, Database, PerformerAlias, PerformerBodyMod, PerformerRepository, PerformerUrl,
};
use crate::error::ApiError;
use crate::graphql::auth::AuthExt;
use crate::graphql::models::Performer;
use crate::graphql::parse_id;
use crate::graphql::types::{PerformerCreateInput, PerformerDestroyInput, PerformerUpdateInput};

#[derive(Default)]
pub struct PerformerMutations;

#[Object]
impl PerformerMutations {
    async fn performer_create(
        &self,
        ctx: &Context<'_>,
        input: PerformerCreateInput,
    ) -> Result<Performer> {
        ctx.validate_modify()?;
        let db = ctx.data_unchecked::<Database>();

        let mut tx = db.begin().await.map_err(|e| e.extend())?;
        match create_in_tx(&mut tx, input).await {
            Ok(record) => {
                tx.commit()
                    .await
                    .map_err(|e| ApiError::storage("commit", "performers", e).extend())?;
                Ok(Performer(record))
            }
            Err(err) => {
                let _ = tx.rollback().await;
                Err(err.extend())
            }
        }
    }

    async fn performer_update(
        &self,
        ctx: &Context<'_>,
        input: PerformerUpdateInput,
    ) -> Result<Performer> {
        ctx.validate_modify()?;
        let db = ctx.data_unchecked::<Database>();
        let performer_id = parse_id(&input.id, "performer id").map_err(|e| e.extend())?;

        let mut tx = db.begin().await.map_err(|e| e.extend())?;
        match update_in_tx(&mut tx, performer_id, input).await {
            Ok(record) => {
                tx.commit()
                    .await
                    .map_err(|e| ApiError::storage("commit", "performers", e).extend())?;
                Ok(Performer(record))
            }
            Err(err) => {
                let _ = tx.rollback().await;
                Err(err.extend())
            }
        }
    }

    async fn performer_destroy(
        &self,
        ctx: &Context<'_>,
        input: PerformerDestroyInput,
    ) -> Result<bool> {
        ctx.validate_modify()?;
        let db = ctx.data_unchecked::<Database>();
        let performer_id = parse_id(&input.id, "performer id").map_err(|e| e.extend())?;

        let mut tx = db.begin().await.map_err(|e| e.extend())?;
        match PerformerRepository::new().destroy(&mut tx, performer_id).await {
            Ok(()) => {
                tx.commit()
                    .await
                    .map_err(|e| ApiError::storage("commit", "performers", e).extend())?;
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
    input: PerformerCreateInput,
) -> Result<db::Performer, ApiError> {
    if input.name.trim().is_empty() {
        return Err(ApiError::validation("performer name", input.name));
    }

    let repo = PerformerRepository::new();
    let now = Utc::now();

    let record = repo
        .create(
            conn,
            db::Performer {
                id: 0,
                name: input.name,
                disambiguation: input.disambiguation,
                gender: input.gender.map(|g| g.as_str().to_string()),
                birthdate: input.birthdate,
                ethnicity: input.ethnicity,
                country: input.country,
                height_cm: input.height_cm,
                created_at: now,
                updated_at: now,
            },
        )
        .await?;

    if let Some(aliases) = input.aliases {
        let rows: Vec<PerformerAlias> = aliases
            .into_iter()
            .map(|alias| PerformerAlias {
                performer_id: record.id,
                alias,
            })
            .collect();
        repo.create_aliases(conn, &rows).await?;
    }

    if let Some(urls) = input.urls {
        let rows: Vec<PerformerUrl> = urls
            .into_iter()
            .map(|u| PerformerUrl {
                performer_id: record.id,
                url: u.url,
                kind: u.kind,
            })
            .collect();
        repo.create_urls(conn, &rows).await?;
    }

    if let Some(tattoos) = input.tattoos {
        let rows = body_mods(record.id, tattoos);
        repo.create_tattoos(conn, &rows).await?;
    }

    if let Some(piercings) = input.piercings {
        let rows = body_mods(record.id, piercings);
        repo.create_piercings(conn, &rows).await?;
    }

    Ok(record)
}

async fn update_in_tx(
    conn: &mut SqliteConnection,
    performer_id: i64,
    input: PerformerUpdateInput,
) -> Result<db::Performer, ApiError> {
    let repo = PerformerRepository::new();

    let mut record = repo
        .find(conn, performer_id)
        .await?
        .ok_or_else(|| ApiError::not_found("performer", performer_id))?;

    if let Some(name) = input.name {
        if name.trim().is_empty() {
            return Err(ApiError::validation("performer name", name));
        }
        record.name = name;
    }
    if input.disambiguation.is_some() {
        record.disambiguation = input.disambiguation;
    }
    if let Some(gender) = input.gender {
        record.gender = Some(gender.as_str().to_string());
    }
    if input.birthdate.is_some() {
        record.birthdate = input.birthdate;
    }
    if input.ethnicity.is_some() {
        record.ethnicity = input.ethnicity;
    }
    if input.country.is_some() {
        record.country = input.country;
    }
    if input.height_cm.is_some() {
        record.height_cm = input.height_cm;
    }
    record.updated_at = Utc::now();

    let record = repo.update(conn, record).await?;

    if let Some(aliases) = input.aliases {
        let rows: Vec<PerformerAlias> = aliases
            .into_iter()
            .map(|alias| PerformerAlias {
                performer_id: record.id,
                alias,
            })
            .collect();
        repo.update_aliases(conn, record.id, &rows).await?;
    }

    if let Some(urls) = input.urls {
        let rows: Vec<PerformerUrl> = urls
            .into_iter()
            .map(|u| PerformerUrl {
                performer_id: record.id,
                url: u.url,
                kind: u.kind,
            })
            .collect();
        repo.update_urls(conn, record.id, &rows).await?;
    }

    if let Some(tattoos) = input.tattoos {
        let rows = body_mods(record.id, tattoos);
        repo.update_tattoos(conn, record.id, &rows).await?;
    }

    if let Some(piercings) = input.piercings {
        let rows = body_mods(record.id, piercings);
        repo.update_piercings(conn, record.id, &rows).await?;
    }

    Ok(record)
}

fn body_mods(
    performer_id: i64,
    inputs: Vec<crate::graphql::types::BodyModificationInput>,
) -> Vec<PerformerBodyMod> {
    inputs
        .into_iter()
        .map(|m| PerformerBodyMod {
            performer_id,
            location: m.location,
            description: m.description,
        })
        .collect()
}
