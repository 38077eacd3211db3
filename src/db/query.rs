//! Dynamic filter/query builder.
//!
//! [IdQuery] assembles a parameterized `SELECT DISTINCT <t>.id` statement from
//! a list of typed clauses plus positional arguments, together with a parallel
//! count statement. Callers re-fetch full entities by id afterwards; at this
//! scale the N+1 pattern is deliberate.

use chrono::{Datelike, NaiveDate};
use sqlx::SqliteConnection;
use tracing::debug;

use crate::db::tables::SqlValue;
use crate::error::ApiError;
use crate::graphql::filters::{CriterionModifier, QuerySpec, StringCriterion};

/// Builder for distinct-id queries with filtering, sorting and pagination.
pub struct IdQuery {
    table: &'static str,
    joins: Vec<String>,
    wheres: Vec<String>,
    values: Vec<SqlValue>,
    sort: Option<String>,
    limit: i64,
    offset: i64,
}

impl IdQuery {
    pub fn new(table: &'static str) -> Self {
        Self {
            table,
            joins: Vec::new(),
            wheres: Vec::new(),
            values: Vec::new(),
            sort: None,
            limit: 25,
            offset: 0,
        }
    }

    /// Add a static join fragment (never user-controlled text).
    pub fn join(mut self, fragment: &str) -> Self {
        self.joins.push(fragment.to_string());
        self
    }

    /// Case-insensitive partial match over the given columns, OR-combined
    /// across columns and AND-combined with every other active filter.
    pub fn search(mut self, columns: &[&str], term: &str) -> Self {
        let (clause, values) = search_binding(columns, term);
        self.wheres.push(clause);
        self.values.extend(values);
        self
    }

    /// Add pre-built clauses with their bind values (criterion builders).
    pub fn criterion(mut self, clauses: Vec<String>, values: Vec<SqlValue>) -> Self {
        self.wheres.extend(clauses);
        self.values.extend(values);
        self
    }

    /// Apply the sort spec against an allow-list of column names.
    pub fn sort(mut self, spec: &QuerySpec, default: &str, allowed: &[&str]) -> Self {
        let column = spec.sort_column(default, allowed);
        self.sort = Some(format!(
            "ORDER BY {}.{} {}",
            self.table,
            column,
            spec.sort_direction().to_sql()
        ));
        self
    }

    /// Apply sanitized pagination from the spec.
    pub fn paginate(mut self, spec: &QuerySpec) -> Self {
        self.limit = spec.page_size();
        self.offset = (spec.page_number() - 1) * self.limit;
        self
    }

    fn where_sql(&self) -> String {
        if self.wheres.is_empty() {
            String::new()
        } else {
            let grouped: Vec<String> = self.wheres.iter().map(|w| format!("({w})")).collect();
            format!(" WHERE {}", grouped.join(" AND "))
        }
    }

    fn body_sql(&self) -> String {
        let mut sql = format!("SELECT DISTINCT {}.id FROM {}", self.table, self.table);
        for join in &self.joins {
            sql.push(' ');
            sql.push_str(join);
        }
        sql
    }

    fn build_sql(&self) -> String {
        let mut sql = self.body_sql();
        sql.push_str(&self.where_sql());
        if let Some(ref sort) = self.sort {
            sql.push(' ');
            sql.push_str(sort);
        }
        sql.push_str(&format!(" LIMIT {} OFFSET {}", self.limit, self.offset));
        sql
    }

    fn build_count_sql(&self) -> String {
        let mut sql = format!(
            "SELECT COUNT(DISTINCT {}.id) FROM {}",
            self.table, self.table
        );
        for join in &self.joins {
            sql.push(' ');
            sql.push_str(join);
        }
        sql.push_str(&self.where_sql());
        sql
    }

    /// Execute the id query and its parallel count query, returning the
    /// ordered page of matching ids and the unpaginated total.
    pub async fn execute(
        self,
        conn: &mut SqliteConnection,
    ) -> Result<(Vec<i64>, i64), ApiError> {
        let sql = self.build_sql();
        debug!(sql = %sql, "executing id query");

        let mut query = sqlx::query_scalar::<_, i64>(&sql);
        for value in &self.values {
            query = match value {
                SqlValue::String(s) => query.bind(s.as_str()),
                SqlValue::Int(i) => query.bind(*i),
                SqlValue::Float(f) => query.bind(*f),
                SqlValue::Bool(b) => query.bind(*b),
                SqlValue::Date(d) => query.bind(*d),
                SqlValue::Timestamp(t) => query.bind(*t),
                SqlValue::Uuid(u) => query.bind(*u),
                SqlValue::Null => query.bind(None::<String>),
            };
        }
        let ids = query
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| ApiError::storage("query", self.table, e))?;

        let count_sql = self.build_count_sql();
        debug!(sql = %count_sql, "executing count query");

        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        for value in &self.values {
            count_query = match value {
                SqlValue::String(s) => count_query.bind(s.as_str()),
                SqlValue::Int(i) => count_query.bind(*i),
                SqlValue::Float(f) => count_query.bind(*f),
                SqlValue::Bool(b) => count_query.bind(*b),
                SqlValue::Date(d) => count_query.bind(*d),
                SqlValue::Timestamp(t) => count_query.bind(*t),
                SqlValue::Uuid(u) => count_query.bind(*u),
                SqlValue::Null => count_query.bind(None::<String>),
            };
        }
        let count = count_query
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| ApiError::storage("count", self.table, e))?;

        Ok((ids, count))
    }
}

/// Case-insensitive partial-match predicate over one or more columns.
pub fn search_binding(columns: &[&str], term: &str) -> (String, Vec<SqlValue>) {
    let clauses: Vec<String> = columns.iter().map(|c| format!("{c} LIKE ?")).collect();
    let pattern = format!("%{term}%");
    let values = vec![SqlValue::String(pattern); columns.len()];
    (clauses.join(" OR "), values)
}

/// Placeholder list for `IN` bindings, e.g. `(?, ?, ?)`.
pub fn in_binding(len: usize) -> String {
    format!("({})", vec!["?"; len].join(", "))
}

/// Clauses for a birth-year criterion over `performers.birthdate`. The
/// enclosing window is the calendar year, inclusive at both edges.
pub fn birth_year_clauses(
    modifier: CriterionModifier,
    year: i32,
) -> (Vec<String>, Vec<SqlValue>) {
    // Years outside the storable range cannot match any row anyway.
    let year = year.clamp(1, 9999);
    let start_of_year = NaiveDate::from_ymd_opt(year, 1, 1).expect("january 1st always exists");
    let end_of_year = NaiveDate::from_ymd_opt(year, 12, 31).expect("december 31st always exists");

    match modifier {
        CriterionModifier::Equals => (
            vec![
                "performers.birthdate >= ?".to_string(),
                "performers.birthdate <= ?".to_string(),
            ],
            vec![start_of_year.into(), end_of_year.into()],
        ),
        CriterionModifier::NotEquals => (
            vec!["performers.birthdate < ? OR performers.birthdate > ?".to_string()],
            vec![start_of_year.into(), end_of_year.into()],
        ),
        CriterionModifier::GreaterThan => (
            vec!["performers.birthdate > ?".to_string()],
            vec![end_of_year.into()],
        ),
        CriterionModifier::LessThan => (
            vec!["performers.birthdate < ?".to_string()],
            vec![start_of_year.into()],
        ),
    }
}

/// Clauses for an age criterion derived from `performers.birthdate`.
///
/// The window for age `v` counted from `today` is
/// `(today - (v+1) years, today - v years]`: a performer born exactly
/// `today - v years` turns `v` today and matches EQUALS.
pub fn age_clauses(
    modifier: CriterionModifier,
    age: i32,
    today: NaiveDate,
) -> (Vec<String>, Vec<SqlValue>) {
    let age = age.clamp(0, 1000);
    let newest = years_before(today, age);
    let oldest = years_before(today, age + 1);

    match modifier {
        CriterionModifier::Equals => (
            vec![
                "performers.birthdate > ?".to_string(),
                "performers.birthdate <= ?".to_string(),
            ],
            vec![oldest.into(), newest.into()],
        ),
        CriterionModifier::NotEquals => (
            vec!["performers.birthdate <= ? OR performers.birthdate > ?".to_string()],
            vec![oldest.into(), newest.into()],
        ),
        // Older than `age`: born on or before the day they turned age+1.
        CriterionModifier::GreaterThan => (
            vec!["performers.birthdate <= ?".to_string()],
            vec![oldest.into()],
        ),
        // Younger than `age`: born after the day they would turn `age`.
        CriterionModifier::LessThan => (
            vec!["performers.birthdate > ?".to_string()],
            vec![newest.into()],
        ),
    }
}

/// Clauses for a string criterion against a qualified column. Range
/// modifiers have no meaning for strings and yield no clauses.
pub fn string_criterion_clauses(
    column: &str,
    criterion: &StringCriterion,
) -> (Vec<String>, Vec<SqlValue>) {
    match criterion.modifier {
        CriterionModifier::Equals => (
            vec![format!("upper({column}) = upper(?)")],
            vec![criterion.value.clone().into()],
        ),
        CriterionModifier::NotEquals => (
            vec![format!("upper({column}) != upper(?)")],
            vec![criterion.value.clone().into()],
        ),
        CriterionModifier::GreaterThan | CriterionModifier::LessThan => (vec![], vec![]),
    }
}

/// The same calendar day `years` years earlier. February 29 maps to March 1
/// in non-leap years.
fn years_before(date: NaiveDate, years: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year() - years, date.month(), date.day()).unwrap_or_else(|| {
        NaiveDate::from_ymd_opt(date.year() - years, 3, 1).expect("march 1st always exists")
    })
}
