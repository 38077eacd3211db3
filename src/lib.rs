//! Castbook backend: a GraphQL API over a performer and studio registry.
//!
//! All operations are exposed via GraphQL at /graphql.

pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod graphql;
