//! GraphQL schema assembly.

use async_graphql::{EmptySubscription, Schema};

use crate::db::Database;

use super::mutations::MutationRoot;
use super::queries::QueryRoot;

/// The GraphQL schema type
pub type CastbookSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// Build the GraphQL schema with all resolvers
pub fn build_schema(db: Database) -> CastbookSchema {
    Schema::build(
        QueryRoot::default(),
        MutationRoot::default(),
        EmptySubscription,
    )
    .data(db)
    .finish()
}
