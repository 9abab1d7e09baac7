//! User search filter and the registry of searchable fields.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Logical combinator for multiple criteria
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicalOperator {
    #[default]
    And,
    Or,
}

impl FromStr for LogicalOperator {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AND" => Ok(LogicalOperator::And),
            "OR" => Ok(LogicalOperator::Or),
            _ => Err(DomainError::invalid_filter_field(format!(
                "{}={}",
                OPERATOR_KEY, s
            ))),
        }
    }
}

/// Searchable user attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FilterField {
    Cpf,
    Email,
    Name,
}

impl FilterField {
    /// Attribute name, as used in query strings and persisted documents
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterField::Cpf => "cpf",
            FilterField::Email => "email",
            FilterField::Name => "name",
        }
    }
}

impl fmt::Display for FilterField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registry entry tying a field to its slot in [`UserFilter`].
pub struct SearchField {
    pub field: FilterField,
    pub get: fn(&UserFilter) -> Option<&str>,
    set: fn(&mut UserFilter, String),
}

impl SearchField {
    pub fn name(&self) -> &'static str {
        self.field.as_str()
    }
}

/// Every searchable field, sorted by name.
pub static SEARCHABLE_FIELDS: [SearchField; 3] = [
    SearchField {
        field: FilterField::Cpf,
        get: get_cpf,
        set: set_cpf,
    },
    SearchField {
        field: FilterField::Email,
        get: get_email,
        set: set_email,
    },
    SearchField {
        field: FilterField::Name,
        get: get_name,
        set: set_name,
    },
];

fn get_cpf(filter: &UserFilter) -> Option<&str> {
    filter.cpf.as_deref()
}

fn set_cpf(filter: &mut UserFilter, value: String) {
    filter.cpf = Some(value);
}

fn get_email(filter: &UserFilter) -> Option<&str> {
    filter.email.as_deref()
}

fn set_email(filter: &mut UserFilter, value: String) {
    filter.email = Some(value);
}

fn get_name(filter: &UserFilter) -> Option<&str> {
    filter.name.as_deref()
}

fn set_name(filter: &mut UserFilter, value: String) {
    filter.name = Some(value);
}

/// Look up a searchable field by name
pub fn search_field(name: &str) -> Option<&'static SearchField> {
    SEARCHABLE_FIELDS.iter().find(|f| f.name() == name)
}

const OPERATOR_KEY: &str = "operator";
const NORMALIZE_KEY: &str = "normalize";
const TYPE_KEY: &str = "type";
const EQUALS_SEARCH: &str = "EQUALS";

/// Sparse set of search criteria plus how to combine them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserFilter {
    pub operator: LogicalOperator,
    pub normalize: bool,
    pub cpf: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
}

impl Default for UserFilter {
    fn default() -> Self {
        Self {
            operator: LogicalOperator::And,
            normalize: true,
            cpf: None,
            name: None,
            email: None,
        }
    }
}

impl UserFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn operator(mut self, operator: LogicalOperator) -> Self {
        self.operator = operator;
        self
    }

    pub fn normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    pub fn cpf(mut self, cpf: impl Into<String>) -> Self {
        self.cpf = Some(cpf.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Build a filter from untyped key/value pairs (e.g. a query string).
    ///
    /// `operator`, `normalize` and `type` configure the filter; every other
    /// key must be a searchable field.
    pub fn from_params<I, K, V>(params: I) -> DomainResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut filter = UserFilter::default();

        for (key, value) in params {
            let key = key.as_ref();
            let value: String = value.into();

            match key {
                OPERATOR_KEY => filter.operator = value.parse()?,
                NORMALIZE_KEY => {
                    filter.normalize = value.trim().parse().map_err(|_| {
                        DomainError::invalid_filter_field(format!("{}={}", NORMALIZE_KEY, value))
                    })?
                }
                TYPE_KEY => {
                    if !value.trim().eq_ignore_ascii_case(EQUALS_SEARCH) {
                        return Err(DomainError::invalid_filter_field(format!(
                            "{}={}",
                            TYPE_KEY, value
                        )));
                    }
                }
                _ => {
                    let field =
                        search_field(key).ok_or_else(|| DomainError::invalid_filter_field(key))?;
                    (field.set)(&mut filter, value);
                }
            }
        }

        Ok(filter)
    }

    /// Non-empty criteria in field name order
    pub fn criteria(&self) -> impl Iterator<Item = (FilterField, &str)> + '_ {
        SEARCHABLE_FIELDS.iter().filter_map(move |f| {
            (f.get)(self)
                .filter(|value| !value.trim().is_empty())
                .map(|value| (f.field, value))
        })
    }

    /// Check if no criterion is set
    pub fn is_unrestricted(&self) -> bool {
        self.criteria().next().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let filter = UserFilter::default();
        assert_eq!(filter.operator, LogicalOperator::And);
        assert!(filter.normalize);
        assert!(filter.is_unrestricted());
    }

    #[test]
    fn test_registry_is_sorted_by_name() {
        let names: Vec<_> = SEARCHABLE_FIELDS.iter().map(SearchField::name).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[test]
    fn test_from_params_sets_fields_and_controls() {
        let filter = UserFilter::from_params([
            ("name", "billy"),
            ("operator", "or"),
            ("normalize", "false"),
            ("type", "EQUALS"),
        ])
        .unwrap();

        assert_eq!(filter.name.as_deref(), Some("billy"));
        assert_eq!(filter.operator, LogicalOperator::Or);
        assert!(!filter.normalize);
        assert!(filter.cpf.is_none());
    }

    #[test]
    fn test_from_params_rejects_unknown_field() {
        let err = UserFilter::from_params([("age", "30")]).unwrap_err();
        assert_eq!(err, DomainError::invalid_filter_field("age"));
    }

    #[test]
    fn test_from_params_rejects_bad_control_values() {
        assert!(UserFilter::from_params([("operator", "XOR")]).is_err());
        assert!(UserFilter::from_params([("normalize", "maybe")]).is_err());
        assert!(UserFilter::from_params([("type", "LIKE")]).is_err());
    }

    #[test]
    fn test_control_keys_are_not_criteria() {
        let filter = UserFilter::from_params([("operator", "OR"), ("normalize", "true")]).unwrap();
        assert!(filter.is_unrestricted());
    }

    #[test]
    fn test_criteria_skip_blank_values_and_follow_name_order() {
        let filter = UserFilter::new()
            .name("Billy")
            .email("billy@x.com")
            .cpf("   ");

        let criteria: Vec<_> = filter.criteria().collect();
        assert_eq!(
            criteria,
            vec![(FilterField::Email, "billy@x.com"), (FilterField::Name, "Billy")]
        );
    }
}
