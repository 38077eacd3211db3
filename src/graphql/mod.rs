//! GraphQL API surface: schema, auth, filters, and resolvers.

use async_graphql::ErrorExtensions;

use crate::error::ApiError;

pub mod auth;
pub mod filters;
pub mod models;
pub mod mutations;
pub mod queries;
pub mod schema;
pub mod types;

pub use schema::{CastbookSchema, build_schema};

impl ErrorExtensions for ApiError {
    fn extend(&self) -> async_graphql::Error {
        async_graphql::Error::new(self.to_string()).extend_with(|_, e| e.set("code", self.code()))
    }
}

/// Parse a GraphQL ID into a row id.
pub(crate) fn parse_id(id: &async_graphql::ID, what: &'static str) -> Result<i64, ApiError> {
    id.parse::<i64>()
        .map_err(|_| ApiError::validation(what, id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_numeric_id_is_a_validation_error() {
        let err = parse_id(&async_graphql::ID("abc".to_string()), "performer id").unwrap_err();
        assert_eq!(err.code(), "INVALID_INPUT");
    }
}
