//! GraphQL authentication and authorization
//!
//! Token verification happens at the edge; the request arrives with trusted
//! identity headers set by the upstream proxy. This module turns those
//! headers into an `AuthUser` in the GraphQL context and gates resolvers on
//! the user's role.

use async_graphql::{Context, ErrorExtensions, Result};
use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Role granted to the authenticated user, in increasing order of privilege.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    Read,
    Modify,
    Admin,
}

impl Role {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "READ" => Some(Role::Read),
            "MODIFY" => Some(Role::Modify),
            "ADMIN" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// User identity available to resolvers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub name: String,
    pub role: Role,
}

/// Extract the authenticated user from trusted upstream headers.
pub fn user_from_headers(headers: &HeaderMap) -> Option<AuthUser> {
    let name = headers.get("x-castbook-user")?.to_str().ok()?.to_string();
    let role = headers
        .get("x-castbook-role")
        .and_then(|v| v.to_str().ok())
        .and_then(Role::parse)?;

    Some(AuthUser { name, role })
}

/// Extension trait for role checks in resolvers.
pub trait AuthExt {
    /// Require a user with at least read access.
    fn validate_read(&self) -> Result<&AuthUser>;

    /// Require a user with modify access.
    fn validate_modify(&self) -> Result<&AuthUser>;
}

impl<'a> AuthExt for Context<'a> {
    fn validate_read(&self) -> Result<&AuthUser> {
        self.data_opt::<AuthUser>()
            .ok_or_else(|| ApiError::Authorization.extend())
    }

    fn validate_modify(&self) -> Result<&AuthUser> {
        let user = self.validate_read()?;
        if user.role >= Role::Modify {
            Ok(user)
        } else {
            Err(ApiError::Authorization.extend())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parsing_is_case_insensitive() {
        assert_eq!(Role::parse("modify"), Some(Role::Modify));
        assert_eq!(Role::parse("ADMIN"), Some(Role::Admin));
        assert_eq!(Role::parse("owner"), None);
    }

    #[test]
    fn roles_order_by_privilege() {
        assert!(Role::Admin > Role::Modify);
        assert!(Role::Modify > Role::Read);
    }

    #[test]
    fn headers_without_role_yield_no_user() {
        let mut headers = HeaderMap::new();
        headers.insert("x-castbook-user", "alice".parse().unwrap());
        assert!(user_from_headers(&headers).is_none());

        headers.insert("x-castbook-role", "READ".parse().unwrap());
        let user = user_from_headers(&headers).unwrap();
        assert_eq!(user.name, "alice");
        assert_eq!(user.role, Role::Read);
    }
}
