//! GraphQL object and input types shared across resolvers.

use async_graphql::{Enum, InputObject, SimpleObject};
use chrono::NaiveDate;

use crate::graphql::models::{Performer, Studio};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Enum)]
pub enum GenderEnum {
    Male,
    Female,
    TransgenderMale,
    TransgenderFemale,
    Intersex,
    NonBinary,
}

impl GenderEnum {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenderEnum::Male => "MALE",
            GenderEnum::Female => "FEMALE",
            GenderEnum::TransgenderMale => "TRANSGENDER_MALE",
            GenderEnum::TransgenderFemale => "TRANSGENDER_FEMALE",
            GenderEnum::Intersex => "INTERSEX",
            GenderEnum::NonBinary => "NON_BINARY",
        }
    }

    pub fn from_column(value: &str) -> Option<Self> {
        match value {
            "MALE" => Some(GenderEnum::Male),
            "FEMALE" => Some(GenderEnum::Female),
            "TRANSGENDER_MALE" => Some(GenderEnum::TransgenderMale),
            "TRANSGENDER_FEMALE" => Some(GenderEnum::TransgenderFemale),
            "INTERSEX" => Some(GenderEnum::Intersex),
            "NON_BINARY" => Some(GenderEnum::NonBinary),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, SimpleObject)]
pub struct Url {
    pub url: String,
    #[graphql(name = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, SimpleObject)]
pub struct BodyModification {
    pub location: String,
    pub description: Option<String>,
}

#[derive(SimpleObject)]
pub struct QueryPerformersResult {
    pub count: i64,
    pub performers: Vec<Performer>,
}

#[derive(SimpleObject)]
pub struct QueryStudiosResult {
    pub count: i64,
    pub studios: Vec<Studio>,
}

#[derive(Debug, Clone, InputObject)]
pub struct UrlInput {
    pub url: String,
    #[graphql(name = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, InputObject)]
pub struct BodyModificationInput {
    pub location: String,
    pub description: Option<String>,
}

#[derive(Debug, InputObject)]
pub struct PerformerCreateInput {
    pub name: String,
    pub disambiguation: Option<String>,
    pub gender: Option<GenderEnum>,
    pub birthdate: Option<NaiveDate>,
    pub ethnicity: Option<String>,
    pub country: Option<String>,
    pub height_cm: Option<i32>,
    pub aliases: Option<Vec<String>>,
    pub urls: Option<Vec<UrlInput>>,
    pub tattoos: Option<Vec<BodyModificationInput>>,
    pub piercings: Option<Vec<BodyModificationInput>>,
}

#[derive(Debug, InputObject)]
pub struct PerformerUpdateInput {
    pub id: async_graphql::ID,
    pub name: Option<String>,
    pub disambiguation: Option<String>,
    pub gender: Option<GenderEnum>,
    pub birthdate: Option<NaiveDate>,
    pub ethnicity: Option<String>,
    pub country: Option<String>,
    pub height_cm: Option<i32>,
    pub aliases: Option<Vec<String>>,
    pub urls: Option<Vec<UrlInput>>,
    pub tattoos: Option<Vec<BodyModificationInput>>,
    pub piercings: Option<Vec<BodyModificationInput>>,
}

#[derive(Debug, InputObject)]
pub struct PerformerDestroyInput {
    pub id: async_graphql::ID,
}

#[derive(Debug, InputObject)]
pub struct StudioCreateInput {
    pub name: String,
    pub parent_id: Option<async_graphql::ID>,
    pub urls: Option<Vec<UrlInput>>,
}

#[derive(Debug, InputObject)]
pub struct StudioUpdateInput {
    pub id: async_graphql::ID,
    pub name: Option<String>,
    pub parent_id: Option<async_graphql::ID>,
    pub urls: Option<Vec<UrlInput>>,
}

#[derive(Debug, InputObject)]
pub struct StudioDestroyInput {
    pub id: async_graphql::ID,
}
