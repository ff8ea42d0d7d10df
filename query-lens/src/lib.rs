//! # Compile untrusted filter parameters into bound predicates
//!
//! This crate turns the `filter[...]` and `sort` parameters of a
//! request into predicates and orderings on a database query, without
//! ever putting user input into query text and without giving up at
//! the first bad parameter.
//!
//! Filters look like `filter[age][gte]=18`, or `filter[name]=john`
//! for plain equality, and sorts look like `sort=-age,name`. See
//! [`operators`] for the operator tokens.
//!
//! The pipeline has three stages:
//!
//! - [`filtering::Parser`] reads the parameters into
//!   [`FilterTerm`]s,
//! - [`filtering::Validator`] checks each term against the fields
//!   and operators you allow,
//! - [`compile::Applier`] adds what survives to a
//!   [`QueryHandle`](compile::QueryHandle), which could be a SQL
//!   builder like [`sql::SqlQuery`] or anything else that can accept
//!   predicates.
//!
//! Every problem along the way is recorded as a [`FilterError`] and
//! collected in the [`FilterResult`] alongside the query, so a request
//! with one bad filter still gets every good one applied, and the
//! caller gets a precise description of what was rejected.
//!
//! Normally you don't drive the stages yourself. A [`FilterBuilder`]
//! holds [`FilterSettings`] and runs the whole pipeline:
//!
//! ```rust
//! use query_lens::filtering::QueryParams;
//! use query_lens::sql::SqlQuery;
//! use query_lens::{Dialect, FilterBuilder, FilterSettings};
//!
//! let builder = FilterBuilder::with_settings(FilterSettings::default().allow_all(["name", "age"]));
//! let params = QueryParams::parse("filter[name][starts-with]=jo&sort=-age");
//! let result = builder.compile_request(&params, SqlQuery::new(Dialect::Postgres));
//!
//! assert!(result.ok());
//! assert_eq!(
//!     result.query().to_sql(),
//!     "SELECT * WHERE \"name\" ILIKE $1 ORDER BY \"age\" DESC"
//! );
//! assert_eq!(result.query().params(), &["jo%".to_string()]);
//! ```
//!
//! Types can describe their own filterable fields with
//! `#[derive(Filterable)]`, and [`FilterSettings::for_type`] turns
//! that into settings.
//!
//! ## Optional features
//! - `row`: [`IntoRow`] and cell values, for types that can be turned
//!   into rows.
//! - `mock`: the in-memory [`mock::MemoryQuery`] handle, which
//!   evaluates compiled predicates over rows. Useful in tests.

pub mod builder;
pub mod compile;
pub mod errors;
pub mod filtering;
pub mod operators;
pub mod result;
pub mod sql;

#[cfg(feature = "row")]
pub mod row;

#[cfg(feature = "mock")]
pub mod mock;

pub use crate::builder::{FilterBuilder, FilterSettings};
pub use crate::compile::Dialect;
pub use crate::errors::{ErrorKind, FilterError, FilterErrorCollection};
pub use crate::filtering::{FieldConfig, FilterTerm, Filterable};
pub use crate::operators::Operator;
pub use crate::result::FilterResult;

#[cfg(feature = "row")]
pub use crate::row::{CellValue, IntoRow, StringCellValue};

pub use query_lens_derive::Filterable;
#[cfg(feature = "row")]
pub use query_lens_derive::IntoRow;
