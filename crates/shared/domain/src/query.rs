//! Query expressions built from user filters.
//!
//! A [`Query`] is a small predicate tree the persistence layer translates into
//! its own query language. Only flat equality predicates joined by AND/OR are
//! expressible.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::DomainResult;
use crate::filter::{FilterField, LogicalOperator, UserFilter};

/// Digits interleaved with `.` and `-`, e.g. `130.877.567-92`.
static CPF_LIKE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+\.*)+-*\d*$").expect("valid CPF-like pattern"));

/// Persistence-agnostic query expression
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Query {
    /// Matches every record
    All,
    Eq { field: FilterField, value: String },
    And(Vec<Query>),
    Or(Vec<Query>),
}

impl Query {
    pub fn eq(field: FilterField, value: impl Into<String>) -> Self {
        Query::Eq {
            field,
            value: value.into(),
        }
    }

    /// Check if the query places no restriction on results
    pub fn is_unrestricted(&self) -> bool {
        matches!(self, Query::All)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::All => f.write_str("{ }"),
            Query::Eq { field, value } => write!(f, "{{ {}: '{}' }}", field, value),
            Query::And(predicates) => write_joined(f, "$and", predicates),
            Query::Or(predicates) => write_joined(f, "$or", predicates),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, op: &str, predicates: &[Query]) -> fmt::Result {
    write!(f, "{{ {}: [", op)?;
    for (i, predicate) in predicates.iter().enumerate() {
        if i > 0 {
            f.write_str(",")?;
        }
        write!(f, " {}", predicate)?;
    }
    f.write_str(" ] }")
}

/// Translates [`UserFilter`] values into [`Query`] expressions.
pub struct QueryBuilder;

impl QueryBuilder {
    /// Build the query for a filter.
    ///
    /// Fields are visited in name order, so equal filters always produce
    /// identical queries. A filter with no criteria yields [`Query::All`].
    pub fn build(filter: &UserFilter) -> Query {
        let predicates: Vec<Query> = filter
            .criteria()
            .map(|(field, value)| Query::eq(field, Self::normalize(filter, value)))
            .collect();

        if predicates.is_empty() {
            return Query::All;
        }

        match filter.operator {
            LogicalOperator::And => Query::And(predicates),
            LogicalOperator::Or => Query::Or(predicates),
        }
    }

    /// Build the query for untyped key/value search parameters.
    pub fn build_from_params<I, K, V>(params: I) -> DomainResult<Query>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        UserFilter::from_params(params).map(|filter| Self::build(&filter))
    }

    /// Strip CPF punctuation from CPF-shaped values when normalization is on.
    fn normalize(filter: &UserFilter, value: &str) -> String {
        if filter.normalize && CPF_LIKE.is_match(value) {
            value.trim().replace(['.', ',', '-'], "")
        } else {
            value.to_string()
        }
    }
}
