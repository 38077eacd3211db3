//! GraphQL filter input types shared with the query-builder layer.
//!
//! Criterion objects pair a value with a comparison modifier; absent filters
//! are no-ops. Pagination/sort values are sanitized here so the SQL layer
//! only ever sees positive integers and allow-listed columns.

use async_graphql::{Enum, InputObject};

/// Comparison operator applied to a range-style filter field.
#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum CriterionModifier {
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
}

/// Integer criterion (birth-year, age).
#[derive(InputObject, Clone, Debug)]
pub struct IntCriterion {
    pub value: i32,
    pub modifier: CriterionModifier,
}

/// String criterion (country, ethnicity). Only the equality modifiers are
/// meaningful for strings; range modifiers are no-ops.
#[derive(InputObject, Clone, Debug)]
pub struct StringCriterion {
    pub value: String,
    pub modifier: CriterionModifier,
}

/// Sort direction for ORDER BY clauses.
#[derive(Enum, Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Pagination and sort spec shared by all list queries.
#[derive(InputObject, Default, Clone, Debug)]
pub struct QuerySpec {
    pub page: Option<i32>,
    pub per_page: Option<i32>,
    pub sort: Option<String>,
    pub direction: Option<SortDirection>,
}

impl QuerySpec {
    /// 1-based page number, sanitized to at least 1.
    pub fn page_number(&self) -> i64 {
        i64::from(self.page.unwrap_or(1).max(1))
    }

    /// Page size, sanitized to 1..=120 (default 25).
    pub fn page_size(&self) -> i64 {
        i64::from(self.per_page.unwrap_or(25).clamp(1, 120))
    }

    /// Requested sort column if it is on the allow-list, otherwise the
    /// default. User-controlled sort keys never reach the SQL text directly.
    pub fn sort_column<'a>(&'a self, default: &'a str, allowed: &[&str]) -> &'a str {
        match &self.sort {
            Some(s) if allowed.contains(&s.as_str()) => s.as_str(),
            _ => default,
        }
    }

    pub fn sort_direction(&self) -> SortDirection {
        self.direction.unwrap_or_default()
    }
}

/// Filters recognized by performer queries. Unset fields are no-ops.
#[derive(InputObject, Default, Clone, Debug)]
pub struct PerformerFilter {
    /// Free-text search over the performer name.
    pub name: Option<String>,
    pub birth_year: Option<IntCriterion>,
    /// Age derived from birthdate as of today, not a stored column.
    pub age: Option<IntCriterion>,
    pub country: Option<StringCriterion>,
}

/// Filters recognized by studio queries.
#[derive(InputObject, Default, Clone, Debug)]
pub struct StudioFilter {
    /// Free-text search over the studio name.
    pub name: Option<String>,
}
