//! GraphQL object wrappers over database rows.
//!
//! Join-backed fields (aliases, urls, body modifications, studio parents)
//! resolve lazily against the pool when selected.

use async_graphql::{Context, ErrorExtensions, ID, Object, Result};
use chrono::{DateTime, NaiveDate, Utc};

use crate::db::{self, Database, PerformerRepository, StudioRepository};
use crate::graphql::types::{BodyModification, GenderEnum, Url};

pub struct Performer(pub db::Performer);

#[Object]
impl Performer {
    async fn id(&self) -> ID {
        ID(self.0.id.to_string())
    }

    async fn name(&self) -> &str {
        &self.0.name
    }

    async fn disambiguation(&self) -> Option<&str> {
        self.0.disambiguation.as_deref()
    }

    async fn gender(&self) -> Option<GenderEnum> {
        self.0.gender.as_deref().and_then(GenderEnum::from_column)
    }

    async fn birthdate(&self) -> Option<NaiveDate> {
        self.0.birthdate
    }

    async fn ethnicity(&self) -> Option<&str> {
        self.0.ethnicity.as_deref()
    }

    async fn country(&self) -> Option<&str> {
        self.0.country.as_deref()
    }

    async fn height_cm(&self) -> Option<i32> {
        self.0.height_cm
    }

    async fn aliases(&self, ctx: &Context<'_>) -> Result<Vec<String>> {
        let db = ctx.data_unchecked::<Database>();
        let mut conn = db.acquire().await.map_err(|e| e.extend())?;
        PerformerRepository::new()
            .get_aliases(&mut conn, self.0.id)
            .await
            .map_err(|e| e.extend())
    }

    async fn urls(&self, ctx: &Context<'_>) -> Result<Vec<Url>> {
        let db = ctx.data_unchecked::<Database>();
        let mut conn = db.acquire().await.map_err(|e| e.extend())?;
        let urls = PerformerRepository::new()
            .get_urls(&mut conn, self.0.id)
            .await
            .map_err(|e| e.extend())?;
        Ok(urls
            .into_iter()
            .map(|u| Url {
                url: u.url,
                kind: u.kind,
            })
            .collect())
    }

    async fn tattoos(&self, ctx: &Context<'_>) -> Result<Vec<BodyModification>> {
        let db = ctx.data_unchecked::<Database>();
        let mut conn = db.acquire().await.map_err(|e| e.extend())?;
        let mods = PerformerRepository::new()
            .get_tattoos(&mut conn, self.0.id)
            .await
            .map_err(|e| e.extend())?;
        Ok(mods
            .into_iter()
            .map(|m| BodyModification {
                location: m.location,
                description: m.description,
            })
            .collect())
    }

    async fn piercings(&self, ctx: &Context<'_>) -> Result<Vec<BodyModification>> {
        let db = ctx.data_unchecked::<Database>();
        let mut conn = db.acquire().await.map_err(|e| e.extend())?;
        let mods = PerformerRepository::new()
            .get_piercings(&mut conn, self.0.id)
            .await
            .map_err(|e| e.extend())?;
        Ok(mods
            .into_iter()
            .map(|m| BodyModification {
                location: m.location,
                description: m.description,
            })
            .collect())
    }

    async fn created_at(&self) -> DateTime<Utc> {
        self.0.created_at
    }

    async fn updated_at(&self) -> DateTime<Utc> {
        self.0.updated_at
    }
}

pub struct Studio(pub db::Studio);

#[Object]
impl Studio {
    async fn id(&self) -> ID {
        ID(self.0.id.to_string())
    }

    async fn name(&self) -> &str {
        &self.0.name
    }

    async fn urls(&self, ctx: &Context<'_>) -> Result<Vec<Url>> {
        let db = ctx.data_unchecked::<Database>();
        let mut conn = db.acquire().await.map_err(|e| e.extend())?;
        let urls = StudioRepository::new()
            .get_urls(&mut conn, self.0.id)
            .await
            .map_err(|e| e.extend())?;
        Ok(urls
            .into_iter()
            .map(|u| Url {
                url: u.url,
                kind: u.kind,
            })
            .collect())
    }

    async fn parent(&self, ctx: &Context<'_>) -> Result<Option<Studio>> {
        let Some(parent_id) = self.0.parent_studio_id else {
            return Ok(None);
        };
        let db = ctx.data_unchecked::<Database>();
        let mut conn = db.acquire().await.map_err(|e| e.extend())?;
        let parent = StudioRepository::new()
            .find(&mut conn, parent_id)
            .await
            .map_err(|e| e.extend())?;
        Ok(parent.map(Studio))
    }

    async fn child_studios(&self, ctx: &Context<'_>) -> Result<Vec<Studio>> {
        let db = ctx.data_unchecked::<Database>();
        let mut conn = db.acquire().await.map_err(|e| e.extend())?;
        let children = StudioRepository::new()
            .find_by_parent_id(&mut conn, self.0.id)
            .await
            .map_err(|e| e.extend())?;
        Ok(children.into_iter().map(Studio).collect())
    }

    async fn created_at(&self) -> DateTime<Utc> {
        self.0.created_at
    }

    async fn updated_at(&self) -> DateTime<Utc> {
        self.0.updated_at
    }
}

pub struct PendingActivation(pub db::PendingActivation);

#[Object]
impl PendingActivation {
    async fn id(&self) -> ID {
        ID(self.0.id.to_string())
    }

    async fn email(&self) -> &str {
        &self.0.email
    }

    async fn invite_key(&self) -> &str {
        &self.0.invite_key
    }

    async fn created_at(&self) -> DateTime<Utc> {
        self.0.created_at
    }
}
