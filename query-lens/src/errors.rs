//! Structured errors for the filter pipeline.
//!
//! Every problem the pipeline finds, whether in a malformed key, a
//! disallowed field or an unusable value, becomes a [`FilterError`].
//! Errors are collected in discovery order in a
//! [`FilterErrorCollection`], which can derive a single HTTP status
//! for the whole run and render itself as JSON.
//!
//! Example:
//! ```rust
//! use query_lens::errors::{FilterError, FilterErrorCollection};
//!
//! let mut errors = FilterErrorCollection::new();
//! assert_eq!(errors.status(), http::StatusCode::OK);
//!
//! errors.push(FilterError::field_not_allowed("password", &["name".to_string()]));
//! assert_eq!(errors.status(), http::StatusCode::BAD_REQUEST);
//!
//! errors.push(FilterError::internal("row decoder exploded", anyhow::anyhow!("eof")));
//! assert_eq!(errors.status(), http::StatusCode::INTERNAL_SERVER_ERROR);
//! ```

use std::error::Error as StdError;
use std::sync::Arc;

use http::StatusCode;
use serde_json::map::Map;
use serde_json::Value;
use strum::{AsRefStr, Display};
use thiserror::Error;

use crate::operators::Operator;

/// The family an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display)]
pub enum ErrorKind {
    /// A disallowed field or operator, or a value of the wrong shape.
    #[strum(serialize = "validation_error")]
    Validation,
    /// A filter key that doesn't follow the query grammar.
    #[strum(serialize = "parsing_error")]
    Parsing,
    /// The allowlist setup itself is unusable.
    #[strum(serialize = "configuration_error")]
    Configuration,
    /// Reported by a database collaborator.
    #[strum(serialize = "database_error")]
    Database,
    /// An invariant was broken somewhere outside user control.
    #[strum(serialize = "internal_error")]
    Internal,
}

impl ErrorKind {
    pub fn code(self) -> ErrorCode {
        match self {
            ErrorKind::Validation => ErrorCode::Validation,
            ErrorKind::Parsing => ErrorCode::Parsing,
            ErrorKind::Configuration => ErrorCode::Configuration,
            ErrorKind::Database => ErrorCode::Database,
            ErrorKind::Internal => ErrorCode::Internal,
        }
    }

    /// The status used when an error of this kind is reported alone.
    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::Validation | ErrorKind::Parsing => StatusCode::BAD_REQUEST,
            ErrorKind::Configuration | ErrorKind::Database | ErrorKind::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Whether the server, rather than the caller, is at fault.
    pub fn is_server_error(self) -> bool {
        self.status().is_server_error()
    }
}

/// Machine friendly codes, suitable for routing and localisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display)]
pub enum ErrorCode {
    #[strum(serialize = "FILTER_VALIDATION_ERROR")]
    Validation,
    #[strum(serialize = "FILTER_PARSING_ERROR")]
    Parsing,
    #[strum(serialize = "FILTER_CONFIGURATION_ERROR")]
    Configuration,
    #[strum(serialize = "FILTER_DATABASE_ERROR")]
    Database,
    #[strum(serialize = "FILTER_INTERNAL_ERROR")]
    Internal,
}

fn context_suffix(field: &Option<String>, operator: &Option<String>) -> String {
    match (field, operator) {
        (Some(field), Some(operator)) => format!(" (field: {}, operator: {})", field, operator),
        (Some(field), None) => format!(" (field: {})", field),
        _ => String::new(),
    }
}

/// A single problem found while compiling filters.
///
/// Values are immutable once built; use the constructors to make
/// them.
#[derive(Debug, Clone, Error)]
#[error("{kind}: {message}{}", context_suffix(.field, .operator))]
pub struct FilterError {
    kind: ErrorKind,
    message: String,
    field: Option<String>,
    operator: Option<String>,
    value: Option<String>,
    code: ErrorCode,
    suggestions: Vec<String>,
    status: StatusCode,
    #[source]
    source: Option<Arc<dyn StdError + Send + Sync>>,
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

fn wrap(err: anyhow::Error) -> Arc<dyn StdError + Send + Sync> {
    let boxed: Box<dyn StdError + Send + Sync> = err.into();
    Arc::from(boxed)
}

impl FilterError {
    fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            field: None,
            operator: None,
            value: None,
            code: kind.code(),
            suggestions: Vec::new(),
            status: kind.status(),
            source: None,
        }
    }

    fn with_context(mut self, field: &str, operator: &str, value: &str) -> Self {
        self.field = non_empty(field);
        self.operator = non_empty(operator);
        self.value = non_empty(value);
        self
    }

    fn with_suggestions<I, S>(mut self, suggestions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.suggestions = suggestions.into_iter().map(Into::into).collect();
        self
    }

    /// A generic validation error. Empty `field`, `operator` and
    /// `value` strings are left out of the error.
    pub fn validation<I, S>(
        field: &str,
        operator: &str,
        value: &str,
        message: impl Into<String>,
        suggestions: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(ErrorKind::Validation, message)
            .with_context(field, operator, value)
            .with_suggestions(suggestions)
    }

    pub fn parsing(field: &str, value: &str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Parsing, message).with_context(field, "", value)
    }

    pub fn configuration<I, S>(message: impl Into<String>, suggestions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(ErrorKind::Configuration, message).with_suggestions(suggestions)
    }

    /// Wrap a failure reported by a database collaborator.
    pub fn database(message: impl Into<String>, err: impl Into<anyhow::Error>) -> Self {
        let mut e = Self::new(ErrorKind::Database, message);
        e.source = Some(wrap(err.into()));
        e
    }

    /// Wrap a failure that isn't the caller's fault.
    pub fn internal(message: impl Into<String>, err: impl Into<anyhow::Error>) -> Self {
        let mut e = Self::new(ErrorKind::Internal, message);
        e.source = Some(wrap(err.into()));
        e
    }

    pub fn field_not_allowed(field: &str, allowed_fields: &[String]) -> Self {
        Self::validation(
            field,
            "",
            "",
            format!("Field '{}' is not allowed for filtering", field),
            allowed_fields.iter().cloned(),
        )
    }

    pub fn operator_not_allowed(field: &str, operator: Operator, allowed: &[Operator]) -> Self {
        Self::validation(
            field,
            operator.as_ref(),
            "",
            format!(
                "Operator '{}' is not allowed for field '{}'",
                operator, field
            ),
            allowed.iter().map(|op| op.to_string()),
        )
    }

    /// An operator token outside the registry. The suggestions list
    /// every valid operator.
    pub fn invalid_operator(field: &str, operator: &str) -> Self {
        Self::validation(
            field,
            operator,
            "",
            format!("Invalid operator '{}'", operator),
            Operator::tokens(),
        )
    }

    pub fn invalid_filter_format(key: &str, value: &str) -> Self {
        Self::parsing(
            "",
            value,
            format!(
                "Invalid filter format: '{}'. Expected format: 'filter[field]' or 'filter[field][operator]'",
                key
            ),
        )
    }

    pub fn empty_field(value: &str) -> Self {
        Self::validation::<_, String>("", "", value, "Empty field name in filter", [])
    }

    pub fn missing_value(field: &str, operator: Operator) -> Self {
        Self::validation(
            field,
            operator.as_ref(),
            "",
            "Filter value cannot be empty",
            ["Provide a non-empty value for the filter"],
        )
    }

    pub fn invalid_between(field: &str, operator: Operator, value: &str) -> Self {
        let message = if operator == Operator::NotBetween {
            "Not between operator requires exactly two comma-separated values"
        } else {
            "Between operator requires exactly two comma-separated values"
        };
        Self::validation(
            field,
            operator.as_ref(),
            value,
            message,
            ["Use format: 'value1,value2' (e.g., '10,20')"],
        )
    }

    pub fn sort_field_not_allowed(field: &str, allowed_fields: &[String]) -> Self {
        Self::validation(
            field,
            "",
            "",
            format!("Sort field '{}' is not allowed", field),
            allowed_fields.iter().cloned(),
        )
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    pub fn operator(&self) -> Option<&str> {
        self.operator.as_deref()
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Render as a JSON object, leaving out empty optional members.
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        map.insert("type".to_string(), Value::String(self.kind.to_string()));
        map.insert("message".to_string(), Value::String(self.message.clone()));
        map.insert("code".to_string(), Value::String(self.code.to_string()));
        if let Some(field) = &self.field {
            map.insert("field".to_string(), Value::String(field.clone()));
        }
        if let Some(operator) = &self.operator {
            map.insert("operator".to_string(), Value::String(operator.clone()));
        }
        if let Some(value) = &self.value {
            map.insert("value".to_string(), Value::String(value.clone()));
        }
        if !self.suggestions.is_empty() {
            map.insert(
                "suggestions".to_string(),
                Value::Array(
                    self.suggestions
                        .iter()
                        .map(|s| Value::String(s.clone()))
                        .collect(),
                ),
            );
        }
        Value::Object(map)
    }
}

/// An ordered collection of [`FilterError`]s.
///
/// The order is the order in which problems were discovered.
#[derive(Debug, Clone, Default, Error)]
#[error("{}", summary(.errors))]
pub struct FilterErrorCollection {
    errors: Vec<FilterError>,
}

fn summary(errors: &[FilterError]) -> String {
    match errors {
        [] => "no errors".to_string(),
        [e] => e.to_string(),
        _ => format!("multiple filter errors ({} errors)", errors.len()),
    }
}

impl FilterErrorCollection {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn push(&mut self, error: FilterError) {
        self.errors.push(error);
    }

    /// Append the contents of `other`, keeping its order.
    pub fn merge(&mut self, other: FilterErrorCollection) {
        self.errors.extend(other.errors);
    }

    /// True when there are no errors.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn first(&self) -> Option<&FilterError> {
        self.errors.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FilterError> {
        self.errors.iter()
    }

    pub fn as_slice(&self) -> &[FilterError] {
        &self.errors
    }

    /// The status for the collection as a whole.
    ///
    /// Any server-side error makes the whole collection a server
    /// error; otherwise any error at all is the caller's fault.
    pub fn status(&self) -> StatusCode {
        if self.errors.iter().any(|e| e.status().is_server_error()) {
            StatusCode::INTERNAL_SERVER_ERROR
        } else if !self.errors.is_empty() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::OK
        }
    }

    /// Render as `{"errors": [...]}`.
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        map.insert("errors".to_string(), self.errors_json());
        Value::Object(map)
    }

    pub(crate) fn errors_json(&self) -> Value {
        Value::Array(self.errors.iter().map(FilterError::to_json).collect())
    }
}

impl Extend<FilterError> for FilterErrorCollection {
    fn extend<I: IntoIterator<Item = FilterError>>(&mut self, iter: I) {
        self.errors.extend(iter)
    }
}

impl FromIterator<FilterError> for FilterErrorCollection {
    fn from_iter<I: IntoIterator<Item = FilterError>>(iter: I) -> Self {
        Self {
            errors: iter.into_iter().collect(),
        }
    }
}

impl From<FilterError> for FilterErrorCollection {
    fn from(error: FilterError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

impl IntoIterator for FilterErrorCollection {
    type Item = FilterError;
    type IntoIter = std::vec::IntoIter<FilterError>;
    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a FilterErrorCollection {
    type Item = &'a FilterError;
    type IntoIter = std::slice::Iter<'a, FilterError>;
    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}
