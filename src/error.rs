//! Crate-wide error taxonomy for the data-access and resolver layers.
//!
//! Read paths return `Ok(None)` on absence; `NotFound` is reserved for
//! mutations whose target row does not exist.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Caller lacks the required permission. Raised before any side effect.
    #[error("not authorized")]
    Authorization,

    /// The target of an update/delete does not exist.
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// Malformed identifier or filter value supplied by the caller.
    #[error("invalid {what}: {value}")]
    Validation { what: &'static str, value: String },

    /// Underlying connectivity/constraint/syntax failure, tagged with the
    /// operation and entity for diagnosability.
    #[error("{op} {entity}: {source}")]
    Storage {
        op: &'static str,
        entity: &'static str,
        #[source]
        source: sqlx::Error,
    },
}

impl ApiError {
    pub fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn validation(what: &'static str, value: impl Into<String>) -> Self {
        Self::Validation {
            what,
            value: value.into(),
        }
    }

    pub fn storage(op: &'static str, entity: &'static str, source: sqlx::Error) -> Self {
        Self::Storage { op, entity, source }
    }

    /// Stable machine-readable code, exposed in GraphQL error extensions.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Authorization => "UNAUTHORIZED",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Validation { .. } => "INVALID_INPUT",
            Self::Storage { .. } => "STORAGE_ERROR",
        }
    }
}
