//! # Compile filter terms and sort expressions onto a query
//!
//! The compiler never builds query text itself. Instead it describes
//! each accepted filter to a [`QueryHandle`] as a column, a set of
//! [`Bound`] values and a [`PredicateShape`], and each sort key as a
//! column and a [`Direction`]. The handle decides how to render them,
//! so user input only ever reaches the database as bound parameters.
//!
//! Case-insensitive pattern matching depends on the [`Dialect`] the
//! handle declares. Dialects with a native operator (such as
//! PostgreSQL's `ILIKE`) use it directly, while others fold both the
//! column and the pattern to lower case before an ordinary `LIKE`.
//! Either way the same rows are selected for ASCII input.
//!
//! Example:
//! ```rust
//! use query_lens::compile::Applier;
//! use query_lens::filtering::{FilterTerm, Validator};
//! use query_lens::sql::SqlQuery;
//! use query_lens::{Dialect, FilterErrorCollection, Operator};
//!
//! let applier = Applier::new(Validator::new(Some(vec!["name".to_string()]), vec![]));
//! let mut query = SqlQuery::new(Dialect::Sqlite);
//! let mut errors = FilterErrorCollection::new();
//! applier.apply_filters(
//!     &mut query,
//!     &[
//!         FilterTerm::new("name", Operator::Like, "jo"),
//!         FilterTerm::new("password", Operator::Eq, "hunter2"),
//!     ],
//!     &mut errors,
//! );
//! assert_eq!(query.where_clause(), "LOWER(\"name\") LIKE LOWER(?)");
//! assert_eq!(query.params(), &["%jo%".to_string()]);
//! assert_eq!(errors.len(), 1);
//! ```

use std::fmt;

use log::{debug, trace};
use strum::{AsRefStr, Display};

use crate::errors::{FilterError, FilterErrorCollection};
use crate::filtering::{split_values, FilterTerm, Validator};
use crate::operators::Operator;

/// The database a query is headed for.
///
/// Only the capabilities that affect compilation are modelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, AsRefStr, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Dialect {
    Postgres,
    DuckDb,
    ClickHouse,
    MySql,
    Sqlite,
    #[default]
    Unknown,
}

/// How a dialect performs case-insensitive matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaseMatch {
    /// The dialect has its own case-insensitive operator, such as `ILIKE`.
    Native,
    /// Fold column and pattern to lower case, then match case-sensitively.
    Folded,
}

impl Dialect {
    /// Recognise a dialect from a driver or dialect name. Unrecognised
    /// names give [`Dialect::Unknown`].
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" | "pgdialect" => Dialect::Postgres,
            "duckdb" => Dialect::DuckDb,
            "clickhouse" => Dialect::ClickHouse,
            "mysql" | "mariadb" => Dialect::MySql,
            "sqlite" | "sqlite3" => Dialect::Sqlite,
            _ => Dialect::Unknown,
        }
    }

    pub fn case_match(self) -> CaseMatch {
        match self {
            Dialect::Postgres | Dialect::DuckDb | Dialect::ClickHouse => CaseMatch::Native,
            Dialect::MySql | Dialect::Sqlite | Dialect::Unknown => CaseMatch::Folded,
        }
    }
}

/// A comparison between a column and one bound value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Comparison {
    pub fn sql_operator(self) -> &'static str {
        match self {
            Comparison::Eq => "=",
            Comparison::Ne => "!=",
            Comparison::Gt => ">",
            Comparison::Gte => ">=",
            Comparison::Lt => "<",
            Comparison::Lte => "<=",
        }
    }
}

/// The form of a predicate, independent of any query syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PredicateShape {
    /// `column <op> value`.
    Compare(Comparison),
    /// A case-insensitive `LIKE` style match against a pattern using
    /// `%` as the wildcard.
    Pattern { negated: bool, case: CaseMatch },
    /// Membership of a list of values.
    Membership { negated: bool },
    /// `column IS [NOT] NULL`.
    Nullness { negated: bool },
    /// An inclusive range between two values.
    Range { negated: bool },
}

/// The values bound to a predicate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Bound {
    None,
    Single(String),
    Pair(String, String),
    List(Vec<String>),
}

impl Bound {
    /// The bound values, in order.
    pub fn values(&self) -> Vec<&str> {
        match self {
            Bound::None => Vec::new(),
            Bound::Single(v) => vec![v.as_str()],
            Bound::Pair(a, b) => vec![a.as_str(), b.as_str()],
            Bound::List(vs) => vs.iter().map(String::as_str).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Asc => write!(f, "ASC"),
            Direction::Desc => write!(f, "DESC"),
        }
    }
}

/// Something predicates and orderings can be added to.
///
/// The compiler only ever talks to queries through this trait, which
/// keeps it independent of any database driver.
pub trait QueryHandle {
    /// The dialect predicates should be emitted for.
    fn dialect(&self) -> Dialect;
    /// Add a predicate, combined with any existing ones by `AND`.
    fn add_predicate(&mut self, column: &str, values: Bound, shape: PredicateShape);
    /// Add a sort key after any existing ones.
    fn add_ordering(&mut self, column: &str, direction: Direction);
}

impl<Q: QueryHandle + ?Sized> QueryHandle for &mut Q {
    fn dialect(&self) -> Dialect {
        (**self).dialect()
    }

    fn add_predicate(&mut self, column: &str, values: Bound, shape: PredicateShape) {
        (**self).add_predicate(column, values, shape)
    }

    fn add_ordering(&mut self, column: &str, direction: Direction) {
        (**self).add_ordering(column, direction)
    }
}

/// One entry of a sort expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub direction: Direction,
}

/// Split a sort expression like `-age,name` into [`SortKey`]s.
///
/// Tokens are trimmed and a leading `-` makes a key descending. Empty
/// tokens are skipped, and so are tokens with more than one leading
/// `-` such as `--age`.
pub fn parse_sort(expr: &str) -> Vec<SortKey> {
    expr.split(',')
        .filter_map(|token| {
            let token = token.trim();
            let (field, direction) = match token.strip_prefix('-') {
                Some(rest) => (rest.trim(), Direction::Desc),
                None => (token, Direction::Asc),
            };
            if field.is_empty() || field.starts_with('-') {
                None
            } else {
                Some(SortKey {
                    field: field.to_string(),
                    direction,
                })
            }
        })
        .collect()
}

/// Compiles filter terms and sort expressions onto a [`QueryHandle`].
#[derive(Debug, Clone, Default)]
pub struct Applier {
    validator: Validator,
}

impl Applier {
    pub fn new(validator: Validator) -> Self {
        Self { validator }
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    /// Check a term again immediately before it is compiled.
    fn recheck(&self, term: &FilterTerm) -> Result<(), FilterError> {
        if let Some(e) = self.validator.validate(term) {
            return Err(e);
        }
        if !self.validator.is_allowed(term) {
            return Err(FilterError::field_not_allowed(
                &term.field,
                &self.validator.allowed_fields().unwrap_or_default(),
            ));
        }
        Ok(())
    }

    /// Compile every acceptable term onto `query`.
    ///
    /// A term that fails validation is recorded in `errors` and
    /// skipped; the remaining terms are still compiled.
    pub fn apply_filters<Q: QueryHandle + ?Sized>(
        &self,
        query: &mut Q,
        terms: &[FilterTerm],
        errors: &mut FilterErrorCollection,
    ) {
        let dialect = query.dialect();
        for term in terms {
            let applied = self
                .recheck(term)
                .and_then(|_| apply_filter(&mut *query, dialect, term));
            if let Err(e) = applied {
                debug!("Skipping filter on {}: {}", term.field, e);
                errors.push(e);
            }
        }
    }

    /// Compile a sort expression onto `query`.
    ///
    /// `allowed` restricts the fields that may be sorted on; `None`
    /// allows any. Disallowed fields are reported and left out.
    pub fn apply_sort<Q: QueryHandle + ?Sized>(
        &self,
        query: &mut Q,
        expr: &str,
        allowed: Option<&[String]>,
    ) -> FilterErrorCollection {
        let mut errors = FilterErrorCollection::new();
        for key in parse_sort(expr) {
            if let Some(allowed) = allowed {
                if !allowed.iter().any(|f| *f == key.field) {
                    debug!("Skipping sort on {}: not allowed", key.field);
                    errors.push(FilterError::sort_field_not_allowed(&key.field, allowed));
                    continue;
                }
            }
            trace!("Ordering by {} {}", key.field, key.direction);
            query.add_ordering(&key.field, key.direction);
        }
        errors
    }
}

fn pattern<Q: QueryHandle + ?Sized>(
    query: &mut Q,
    dialect: Dialect,
    column: &str,
    value: String,
    negated: bool,
) {
    query.add_predicate(
        column,
        Bound::Single(value),
        PredicateShape::Pattern {
            negated,
            case: dialect.case_match(),
        },
    );
}

/// Compile a single term, which must already have been validated.
pub fn apply_filter<Q: QueryHandle + ?Sized>(
    query: &mut Q,
    dialect: Dialect,
    term: &FilterTerm,
) -> Result<(), FilterError> {
    let column = term.field.as_str();
    let value = term.value.as_str();
    trace!("Compiling {} {} {:?}", column, term.operator, value);

    let compare = |query: &mut Q, cmp: Comparison| {
        query.add_predicate(
            column,
            Bound::Single(value.to_string()),
            PredicateShape::Compare(cmp),
        )
    };

    match term.operator {
        Operator::Eq => compare(query, Comparison::Eq),
        Operator::Ne => compare(query, Comparison::Ne),
        Operator::Gt => compare(query, Comparison::Gt),
        Operator::Gte => compare(query, Comparison::Gte),
        Operator::Lt => compare(query, Comparison::Lt),
        Operator::Lte => compare(query, Comparison::Lte),
        Operator::Like => pattern(query, dialect, column, format!("%{}%", value), false),
        Operator::NotLike => pattern(query, dialect, column, format!("%{}%", value), true),
        Operator::StartsWith => pattern(query, dialect, column, format!("{}%", value), false),
        Operator::EndsWith => pattern(query, dialect, column, format!("%{}", value), false),
        Operator::In | Operator::NotIn => query.add_predicate(
            column,
            Bound::List(split_values(value)),
            PredicateShape::Membership {
                negated: term.operator == Operator::NotIn,
            },
        ),
        Operator::Null | Operator::NotNull => query.add_predicate(
            column,
            Bound::None,
            PredicateShape::Nullness {
                negated: term.operator == Operator::NotNull,
            },
        ),
        Operator::Between | Operator::NotBetween => {
            let mut parts = split_values(value).into_iter();
            match (parts.next(), parts.next(), parts.next()) {
                (Some(low), Some(high), None) => query.add_predicate(
                    column,
                    Bound::Pair(low, high),
                    PredicateShape::Range {
                        negated: term.operator == Operator::NotBetween,
                    },
                ),
                _ => {
                    return Err(FilterError::invalid_between(column, term.operator, value));
                }
            }
        }
    }

    Ok(())
}
