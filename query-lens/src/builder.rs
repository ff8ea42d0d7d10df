//! # Configure and run the whole pipeline
//!
//! [`FilterSettings`] says which fields may be filtered and sorted on,
//! and [`FilterBuilder`] runs a request's parameters through the
//! parser, validator and compiler onto a [`QueryHandle`] in one call.
//!
//! Settings are plain values. Every fluent method consumes the
//! settings and returns a new value, and a builder never changes once
//! made, so one builder can serve any number of requests.
//!
//! Example:
//! ```rust
//! use query_lens::filtering::QueryParams;
//! use query_lens::sql::SqlQuery;
//! use query_lens::{Dialect, FilterBuilder, FilterSettings};
//!
//! let builder = FilterBuilder::with_settings(
//!     FilterSettings::default()
//!         .allow_fields(["name", "age"])
//!         .allow_sorts(["name"]),
//! );
//!
//! let params = QueryParams::parse("filter[age][gte]=18&filter[role]=admin&sort=-name");
//! let result = builder.compile_request(&params, SqlQuery::new(Dialect::Postgres));
//!
//! assert_eq!(result.query().where_clause(), "\"age\" >= $1");
//! assert_eq!(result.query().order_clause(), "\"name\" DESC");
//! assert_eq!(result.errors().len(), 1);
//! assert_eq!(result.status(), http::StatusCode::BAD_REQUEST);
//! ```

use std::collections::BTreeSet;

use log::debug;
use serde::Deserialize;

use crate::compile::{Applier, QueryHandle};
use crate::errors::{FilterError, FilterErrorCollection};
use crate::filtering::{FieldConfig, Filterable, ParamSource, Parser, Validator};
use crate::result::FilterResult;

const SORT_PARAM: &str = "sort";

/// Which fields may be filtered and sorted on.
///
/// With no restrictions at all, any field may be used. Supplying
/// [`FieldConfig`]s takes priority over a plain field list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
    pub allowed_fields: Option<Vec<String>>,
    pub allowed_sorts: Option<Vec<String>>,
    pub configs: Vec<FieldConfig>,
}

fn owned<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    names.into_iter().map(Into::into).collect()
}

impl FilterSettings {
    pub fn allow_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_fields = Some(owned(fields));
        self
    }

    pub fn allow_sorts<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_sorts = Some(owned(fields));
        self
    }

    /// Restrict filtering and sorting to the same fields.
    pub fn allow_all<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields = owned(fields);
        self.allowed_sorts = Some(fields.clone());
        self.allowed_fields = Some(fields);
        self
    }

    pub fn allow_configs<I>(mut self, configs: I) -> Self
    where
        I: IntoIterator<Item = FieldConfig>,
    {
        self.configs = configs.into_iter().collect();
        self
    }

    /// Settings taken from a type's `#[derive(Filterable)]`.
    pub fn for_type<T: Filterable>() -> Self {
        Self::default()
            .allow_configs(T::field_configs())
            .allow_sorts(T::sort_fields())
    }

    /// Load settings from JSON, for example
    /// `{"allowed_fields": ["name"], "allowed_sorts": ["name"]}`.
    ///
    /// Missing members mean no restriction. Unreadable JSON is
    /// reported as a configuration error.
    pub fn from_json(s: &str) -> Result<Self, FilterError> {
        serde_json::from_str(s).map_err(|e| {
            FilterError::configuration::<_, String>(
                format!("Invalid filter settings: {}", e),
                [],
            )
        })
    }

    /// Look for problems in the settings themselves.
    pub fn check(&self) -> FilterErrorCollection {
        let mut errors = FilterErrorCollection::new();

        let lists = [
            ("allowed fields", self.allowed_fields.as_deref()),
            ("allowed sorts", self.allowed_sorts.as_deref()),
        ];
        for (name, list) in lists {
            if list.unwrap_or_default().iter().any(|f| f.trim().is_empty()) {
                errors.push(FilterError::configuration::<_, String>(
                    format!("Blank field name in {}", name),
                    [],
                ));
            }
        }

        let mut seen = BTreeSet::new();
        for config in &self.configs {
            if config.field.trim().is_empty() {
                errors.push(FilterError::configuration::<_, String>(
                    "Blank field name in field configs",
                    [],
                ));
                continue;
            }
            if !seen.insert(config.field.as_str()) {
                errors.push(FilterError::configuration::<_, String>(
                    format!("Field '{}' is configured more than once", config.field),
                    [],
                ));
            }
            if config.allowed_operators.is_empty() {
                errors.push(FilterError::configuration(
                    format!("Field '{}' allows no operators", config.field),
                    ["List at least one operator, e.g. 'eq'"],
                ));
            } else if !config.allows(config.default_operator) {
                errors.push(FilterError::configuration(
                    format!(
                        "Default operator '{}' is not allowed for field '{}'",
                        config.default_operator, config.field
                    ),
                    config.allowed_operators.iter().map(|op| op.to_string()),
                ));
            }
        }

        errors
    }

    pub fn validator(&self) -> Validator {
        Validator::new(self.allowed_fields.clone(), self.configs.clone())
    }

    pub fn applier(&self) -> Applier {
        Applier::new(self.validator())
    }

    /// The fields that may be sorted on, or `None` if any may.
    ///
    /// Without an explicit sort list, the fields that may be filtered
    /// on may also be sorted on.
    pub fn sort_allowlist(&self) -> Option<Vec<String>> {
        match &self.allowed_sorts {
            Some(sorts) => Some(sorts.clone()),
            None => self.validator().allowed_fields(),
        }
    }
}

/// Runs the filter pipeline with fixed [`FilterSettings`].
#[derive(Debug, Clone, Default)]
pub struct FilterBuilder {
    settings: FilterSettings,
}

impl FilterBuilder {
    /// A builder that allows every field.
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_settings(settings: FilterSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &FilterSettings {
        &self.settings
    }

    /// Compile the filters in `params` and the sort expression `sort`
    /// onto `handle`.
    ///
    /// Errors are reported in the order parser, filters, sort. If the
    /// settings themselves are unusable, nothing is compiled and the
    /// configuration errors are returned instead.
    pub fn compile<P, Q>(&self, params: &P, sort: &str, handle: Q) -> FilterResult<Q>
    where
        P: ParamSource + ?Sized,
        Q: QueryHandle,
    {
        let mut result = FilterResult::new(handle);

        let problems = self.settings.check();
        if !problems.is_ok() {
            debug!("Not compiling, settings are unusable: {}", problems);
            result.add_errors(problems);
            return result;
        }

        let parsed = Parser::new(params).parse();
        result.add_errors(parsed.errors);

        let applier = self.settings.applier();
        let mut errors = FilterErrorCollection::new();
        applier.apply_filters(result.query_mut(), &parsed.filters, &mut errors);
        result.add_errors(errors);

        let allowed = self.settings.sort_allowlist();
        let sort_errors = applier.apply_sort(result.query_mut(), sort, allowed.as_deref());
        result.add_errors(sort_errors);

        debug!(
            "Compiled {} filter term(s) with {} error(s)",
            parsed.filters.len(),
            result.errors().len()
        );
        result
    }

    /// As [`compile`](Self::compile), taking the sort expression from
    /// the `sort` parameter of `params`.
    pub fn compile_request<P, Q>(&self, params: &P, handle: Q) -> FilterResult<Q>
    where
        P: ParamSource + ?Sized,
        Q: QueryHandle,
    {
        let sort = params.first(SORT_PARAM).unwrap_or_default();
        self.compile(params, sort, handle)
    }
}
