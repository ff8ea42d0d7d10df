use log::trace;

use crate::errors::FilterError;
use crate::filtering::{split_values, FieldConfig, FilterTerm};
use crate::operators::ValueShape;

/// Which fields, and which operators on them, may be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Allowlist {
    /// Any field and any operator.
    Any,
    /// Only the named fields, with any operator.
    Fields(Vec<String>),
    /// Only the configured fields, each with its own operators.
    Configs(Vec<FieldConfig>),
}

/// Checks filter terms against an [`Allowlist`] and the value shape
/// each operator expects.
#[derive(Debug, Clone)]
pub struct Validator {
    allowlist: Allowlist,
}

impl Validator {
    /// Configs take priority when both are supplied. With neither,
    /// everything is allowed.
    pub fn new(allowed_fields: Option<Vec<String>>, configs: Vec<FieldConfig>) -> Self {
        let allowlist = if !configs.is_empty() {
            Allowlist::Configs(configs)
        } else if let Some(fields) = allowed_fields {
            Allowlist::Fields(fields)
        } else {
            Allowlist::Any
        };
        Self { allowlist }
    }

    pub fn allow_any() -> Self {
        Self {
            allowlist: Allowlist::Any,
        }
    }

    pub fn allowlist(&self) -> &Allowlist {
        &self.allowlist
    }

    fn config_for(&self, field: &str) -> Option<&FieldConfig> {
        match &self.allowlist {
            Allowlist::Configs(configs) => configs.iter().find(|c| c.field == field),
            _ => None,
        }
    }

    fn field_allowed(&self, field: &str) -> bool {
        match &self.allowlist {
            Allowlist::Any => true,
            Allowlist::Fields(fields) => fields.iter().any(|f| f == field),
            Allowlist::Configs(configs) => configs.iter().any(|c| c.field == field),
        }
    }

    /// The fields that may be filtered on, or `None` if any may.
    pub fn allowed_fields(&self) -> Option<Vec<String>> {
        match &self.allowlist {
            Allowlist::Any => None,
            Allowlist::Fields(fields) => Some(fields.clone()),
            Allowlist::Configs(configs) => Some(configs.iter().map(|c| c.field.clone()).collect()),
        }
    }

    /// A quick membership check, without looking at the value.
    pub fn is_allowed(&self, term: &FilterTerm) -> bool {
        match &self.allowlist {
            Allowlist::Configs(_) => self
                .config_for(&term.field)
                .map(|c| c.allows(term.operator))
                .unwrap_or(false),
            _ => self.field_allowed(&term.field),
        }
    }

    /// Fully check a term, returning the first problem found.
    pub fn validate(&self, term: &FilterTerm) -> Option<FilterError> {
        trace!("Validating {:?}", term);

        if term.field.trim().is_empty() {
            return Some(FilterError::validation::<_, String>(
                "",
                term.operator.as_ref(),
                &term.value,
                "Field name cannot be empty",
                [],
            ));
        }

        if !self.field_allowed(&term.field) {
            return Some(FilterError::field_not_allowed(
                &term.field,
                &self.allowed_fields().unwrap_or_default(),
            ));
        }

        if let Some(config) = self.config_for(&term.field) {
            if !config.allows(term.operator) {
                return Some(FilterError::operator_not_allowed(
                    &term.field,
                    term.operator,
                    &config.allowed_operators,
                ));
            }
        }

        check_value_shape(term)
    }
}

fn check_value_shape(term: &FilterTerm) -> Option<FilterError> {
    match term.operator.value_shape() {
        ValueShape::Ignored => None,
        ValueShape::Pair => {
            let parts = split_values(&term.value);
            if parts.len() == 2 && parts.iter().all(|p| !p.is_empty()) {
                None
            } else {
                Some(FilterError::invalid_between(
                    &term.field,
                    term.operator,
                    &term.value,
                ))
            }
        }
        ValueShape::List => {
            if split_values(&term.value).iter().any(|p| !p.is_empty()) {
                None
            } else {
                Some(FilterError::missing_value(&term.field, term.operator))
            }
        }
        ValueShape::Single => {
            if term.value.trim().is_empty() {
                Some(FilterError::missing_value(&term.field, term.operator))
            } else {
                None
            }
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::allow_any()
    }
}

