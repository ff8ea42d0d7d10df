//! # Parse and validate filters from query strings
//!
//! Filters arrive in query strings as bracketed keys, in one of two
//! forms. The full form names both a field and an operator, so
//! `filter[age][gte]=18` asks for rows whose `age` column is at least
//! 18. The short form leaves out the operator, and means equality, so
//! `filter[name]=john` is the same as `filter[name][eq]=john`.
//!
//! Operators that take several values, [`In`](Operator::In) and
//! [`Between`](Operator::Between) and their negations, read them as a
//! comma-separated list, with whitespace around each entry removed.
//!
//! ## Overview
//!
//! A [`Parser`] turns a [`ParamSource`] into a list of [`FilterTerm`]s
//! and a [`FilterErrorCollection`](crate::FilterErrorCollection) of
//! everything it couldn't understand. It never stops at the first bad
//! key. A [`Validator`] then decides whether each term may be used,
//! based on an allowlist of fields, or on a list of [`FieldConfig`]s
//! that also restrict which operators each field accepts.
//!
//! Example:
//! ```rust
//! use query_lens::filtering::{Parser, QueryParams, Validator};
//! use query_lens::Operator;
//!
//! let params = QueryParams::parse("filter[name][like]=jo&filter[age][between]=18&sort=name");
//! let parsed = Parser::new(&params).parse();
//! assert!(parsed.errors.is_ok());
//! assert_eq!(parsed.filters.len(), 2);
//! assert_eq!(parsed.filters[0].operator, Operator::Like);
//!
//! let validator = Validator::new(Some(vec!["name".to_string(), "age".to_string()]), vec![]);
//! assert!(validator.validate(&parsed.filters[0]).is_none());
//! // between needs two values
//! assert!(validator.validate(&parsed.filters[1]).is_some());
//! ```

pub mod parser;
pub mod validator;

use std::str::FromStr;

use serde::Deserialize;

use crate::errors::FilterError;
use crate::operators::Operator;

pub use parser::{ParamSource, ParseResult, Parser, QueryParams};
pub use validator::Validator;

/// One parsed filter condition, waiting to be validated and compiled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterTerm {
    pub field: String,
    pub operator: Operator,
    pub value: String,
}

impl FilterTerm {
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    /// Build a term from an operator token, rejecting tokens that are
    /// not in the operator registry.
    pub fn from_parts(field: &str, operator: &str, value: &str) -> Result<Self, FilterError> {
        let op = Operator::from_str(operator)
            .map_err(|_| FilterError::invalid_operator(field, operator))?;
        Ok(Self::new(field, op, value))
    }

    /// The comma-separated entries of the value, each trimmed.
    pub fn values(&self) -> Vec<String> {
        split_values(&self.value)
    }
}

/// Split a comma-separated value and trim each entry.
///
/// An empty string has no entries. Empty entries in the middle of a
/// list are kept, so callers can tell `"1,,2"` from `"1,2"`.
pub fn split_values(value: &str) -> Vec<String> {
    if value.is_empty() {
        return Vec::new();
    }
    value.split(',').map(|part| part.trim().to_string()).collect()
}

/// Optional per-field configuration.
///
/// Supplying any of these restricts filtering to the configured
/// fields, and each field to its listed operators.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FieldConfig {
    pub field: String,
    pub allowed_operators: Vec<Operator>,
    pub default_operator: Operator,
    #[serde(default)]
    pub description: String,
}

impl FieldConfig {
    /// Allow `field` to be filtered with `operators`.
    ///
    /// With no operators, only [`Eq`](Operator::Eq) is allowed. The
    /// first operator becomes the default.
    pub fn new<I>(field: impl Into<String>, operators: I) -> Self
    where
        I: IntoIterator<Item = Operator>,
    {
        let field = field.into();
        let mut allowed_operators: Vec<Operator> = operators.into_iter().collect();
        if allowed_operators.is_empty() {
            allowed_operators.push(Operator::Eq);
        }
        let default_operator = allowed_operators[0];
        let description = format!("Filter by {}", field);
        Self {
            field,
            allowed_operators,
            default_operator,
            description,
        }
    }

    pub fn allows(&self, operator: Operator) -> bool {
        self.allowed_operators.contains(&operator)
    }
}

/// Types that know which of their fields may be filtered and sorted.
///
/// Normally derived with [`macro@crate::Filterable`].
pub trait Filterable {
    /// One [`FieldConfig`] per filterable field.
    fn field_configs() -> Vec<FieldConfig>;
    /// The fields that may appear in a sort expression.
    fn sort_fields() -> Vec<String>;
}
