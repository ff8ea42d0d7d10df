#![cfg(feature = "mock")]

//! An in-memory [`QueryHandle`].
//!
//! [`MemoryQuery`] holds a table of rows and evaluates whatever
//! predicates and orderings are compiled onto it, so tests can check
//! which rows a request actually selects without a database. It
//! follows the dialect it declares: a [`Native`](CaseMatch::Native)
//! pattern is matched case-insensitively as is, a
//! [`Folded`](CaseMatch::Folded) one lower-cases both sides first.
//!
//! ```rust
//! use query_lens::compile::{Bound, PredicateShape, QueryHandle};
//! use query_lens::mock::MemoryQuery;
//! use query_lens::{Dialect, IntoRow};
//!
//! #[derive(IntoRow)]
//! struct User {
//!     name: String,
//! }
//!
//! let users = vec![
//!     User { name: "Ann".to_string() },
//!     User { name: "Bob".to_string() },
//! ];
//! let mut q = MemoryQuery::from_rows(Dialect::Postgres, &users);
//! q.add_predicate("name", Bound::List(vec!["Bob".to_string()]), PredicateShape::Membership { negated: false });
//! assert_eq!(q.select_column("name"), vec!["Bob".to_string()]);
//! ```

use std::cmp::Ordering;

use log::{trace, warn};
use regex::RegexBuilder;
use serde_json::map::Map;
use serde_json::{Number, Value};

use crate::compile::{Bound, CaseMatch, Comparison, Dialect, Direction, PredicateShape, QueryHandle};
use crate::row::{CellValue, IntoRow, Row};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Predicate {
    column: String,
    values: Bound,
    shape: PredicateShape,
}

/// A table of rows with predicates and orderings applied on demand.
#[derive(Debug, Clone, Default)]
pub struct MemoryQuery {
    dialect: Dialect,
    rows: Vec<Row>,
    predicates: Vec<Predicate>,
    orderings: Vec<(String, Direction)>,
}

impl MemoryQuery {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            ..Default::default()
        }
    }

    pub fn from_rows<T: IntoRow>(dialect: Dialect, rows: &[T]) -> Self {
        let mut q = Self::new(dialect);
        q.rows = rows.iter().map(IntoRow::to_row).collect();
        q
    }

    pub fn push_row(&mut self, row: Row) -> &mut Self {
        self.rows.push(row);
        self
    }

    /// How many predicates have been added.
    pub fn predicate_count(&self) -> usize {
        self.predicates.len()
    }

    pub fn orderings(&self) -> &[(String, Direction)] {
        &self.orderings
    }

    /// Rows matching every predicate, in the requested order.
    ///
    /// Sorting is stable, so rows that tie on every key keep their
    /// original order.
    pub fn select(&self) -> Vec<&Row> {
        let mut selected: Vec<&Row> = self
            .rows
            .iter()
            .filter(|row| self.predicates.iter().all(|p| row_matches(self.dialect, p, row)))
            .collect();

        selected.sort_by(|a, b| {
            for (column, direction) in &self.orderings {
                let ord = order_cells(a.get(column), b.get(column));
                let ord = match direction {
                    Direction::Asc => ord,
                    Direction::Desc => ord.reverse(),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        });

        trace!("Selected {} of {} rows", selected.len(), self.rows.len());
        selected
    }

    /// The text of one column for every selected row. Missing and null
    /// cells are left out.
    pub fn select_column(&self, column: &str) -> Vec<String> {
        self.select()
            .into_iter()
            .filter_map(|row| row.get(column).and_then(CellValue::as_text))
            .collect()
    }

    /// The selected rows as `{"count": n, "results": [...]}`.
    pub fn to_json(&self) -> Value {
        let rows = self.select();
        let mut map = Map::new();
        map.insert(
            "count".to_string(),
            Value::Number(Number::from(rows.len())),
        );
        map.insert(
            "results".to_string(),
            Value::Array(
                rows.into_iter()
                    .map(|row| {
                        Value::Object(
                            row.iter()
                                .map(|(k, v)| (k.clone(), v.to_json()))
                                .collect(),
                        )
                    })
                    .collect(),
            ),
        );
        Value::Object(map)
    }
}

impl QueryHandle for MemoryQuery {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn add_predicate(&mut self, column: &str, values: Bound, shape: PredicateShape) {
        self.predicates.push(Predicate {
            column: column.to_string(),
            values,
            shape,
        });
    }

    fn add_ordering(&mut self, column: &str, direction: Direction) {
        self.orderings.push((column.to_string(), direction));
    }
}

/// Parse `text` as a finite number. `nan` and `inf` stay text.
fn finite(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Compare a cell with a bound value: numerically when both sides are
/// finite numbers, as text otherwise.
fn compare(cell: &CellValue, value: &str) -> Option<Ordering> {
    let text = cell.as_text()?;
    match (finite(&text), finite(value)) {
        (Some(a), Some(b)) => a.partial_cmp(&b),
        _ => Some(text.as_str().cmp(value)),
    }
}

fn order_cells(a: Option<&CellValue>, b: Option<&CellValue>) -> Ordering {
    let a = a.and_then(CellValue::as_text);
    let b = b.and_then(CellValue::as_text);
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => match (finite(&a), finite(&b)) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => a.cmp(&b),
        },
    }
}

/// Translate a `LIKE` pattern into an anchored regular expression.
fn like_to_regex(pattern: &str) -> String {
    let mut re = String::from("^");
    for c in pattern.chars() {
        match c {
            '%' => re.push_str(".*"),
            '_' => re.push('.'),
            c => re.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
        }
    }
    re.push('$');
    re
}

fn like(text: &str, pattern: &str, case: CaseMatch) -> bool {
    let (text, pattern, insensitive) = match case {
        CaseMatch::Native => (text.to_string(), pattern.to_string(), true),
        CaseMatch::Folded => (text.to_lowercase(), pattern.to_lowercase(), false),
    };
    match RegexBuilder::new(&like_to_regex(&pattern))
        .case_insensitive(insensitive)
        .dot_matches_new_line(true)
        .build()
    {
        Ok(re) => re.is_match(&text),
        Err(e) => {
            warn!("Unusable pattern {:?}: {}", pattern, e);
            false
        }
    }
}

static NULL: CellValue = CellValue::Null;

fn row_matches(dialect: Dialect, p: &Predicate, row: &Row) -> bool {
    let cell = row.get(&p.column).unwrap_or(&NULL);

    if let PredicateShape::Nullness { negated } = p.shape {
        return (*cell == CellValue::Null) != negated;
    }
    // Every other predicate is false on NULL, negated or not.
    if *cell == CellValue::Null {
        return false;
    }

    match (p.shape, &p.values) {
        (PredicateShape::Compare(cmp), Bound::Single(v)) => {
            let ord = match compare(cell, v) {
                Some(ord) => ord,
                None => return false,
            };
            match cmp {
                Comparison::Eq => ord == Ordering::Equal,
                Comparison::Ne => ord != Ordering::Equal,
                Comparison::Gt => ord == Ordering::Greater,
                Comparison::Gte => ord != Ordering::Less,
                Comparison::Lt => ord == Ordering::Less,
                Comparison::Lte => ord != Ordering::Greater,
            }
        }
        (PredicateShape::Pattern { negated, case }, Bound::Single(v)) => {
            let text = cell.as_text().unwrap_or_default();
            like(&text, v, case) != negated
        }
        (PredicateShape::Membership { negated }, Bound::List(vs)) => {
            let found = vs
                .iter()
                .any(|v| compare(cell, v) == Some(Ordering::Equal));
            found != negated
        }
        (PredicateShape::Range { negated }, Bound::Pair(low, high)) => {
            let inside = matches!(compare(cell, low), Some(Ordering::Greater | Ordering::Equal))
                && matches!(compare(cell, high), Some(Ordering::Less | Ordering::Equal));
            inside != negated
        }
        (shape, values) => {
            warn!(
                "Unsupported predicate on {} for {}: {:?} with {:?}",
                p.column, dialect, shape, values
            );
            false
        }
    }
}
