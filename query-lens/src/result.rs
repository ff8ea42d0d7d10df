//! The outcome of a compile run.

use http::StatusCode;
use serde_json::map::Map;
use serde_json::Value;

use crate::errors::{FilterError, FilterErrorCollection};

/// A query handle with whatever could be compiled onto it, and every
/// error found along the way.
///
/// Errors don't stop compilation, so a result can carry both a
/// partially filtered query and errors. Callers decide whether to
/// run the query anyway or reject the request.
#[derive(Debug, Clone)]
pub struct FilterResult<Q> {
    query: Q,
    errors: FilterErrorCollection,
}

impl<Q> FilterResult<Q> {
    pub fn new(query: Q) -> Self {
        Self {
            query,
            errors: FilterErrorCollection::new(),
        }
    }

    pub fn add_error(&mut self, error: FilterError) {
        self.errors.push(error);
    }

    /// Append `errors` after any already recorded.
    pub fn add_errors(&mut self, errors: FilterErrorCollection) {
        self.errors.merge(errors);
    }

    /// True when no errors were recorded.
    pub fn ok(&self) -> bool {
        self.errors.is_ok()
    }

    pub fn status(&self) -> StatusCode {
        self.errors.status()
    }

    pub fn errors(&self) -> &FilterErrorCollection {
        &self.errors
    }

    pub fn first_error(&self) -> Option<&FilterError> {
        self.errors.first()
    }

    pub fn query(&self) -> &Q {
        &self.query
    }

    pub fn query_mut(&mut self) -> &mut Q {
        &mut self.query
    }

    /// The query, but only if nothing went wrong.
    pub fn into_query(self) -> Result<Q, FilterErrorCollection> {
        if self.errors.is_ok() {
            Ok(self.query)
        } else {
            Err(self.errors)
        }
    }

    pub fn into_parts(self) -> (Q, FilterErrorCollection) {
        (self.query, self.errors)
    }

    /// Render as `{"success": ..., "errors": [...]}`. The `errors`
    /// member is only present when there are errors.
    pub fn to_response(&self) -> Value {
        let mut map = Map::new();
        map.insert("success".to_string(), Value::Bool(self.ok()));
        if !self.errors.is_empty() {
            map.insert("errors".to_string(), self.errors.errors_json());
        }
        Value::Object(map)
    }
}
