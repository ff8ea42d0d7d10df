//! A [`QueryHandle`] that renders parameterized SQL.
//!
//! [`SqlQuery`] collects predicates and orderings and renders them as
//! `WHERE` and `ORDER BY` fragments, with every user-supplied value
//! left as a placeholder and collected, in order, in its parameter
//! list. Identifiers are quoted for the declared [`Dialect`].
//! Placeholders are `$1`, `$2`, ... for PostgreSQL and DuckDB, and `?`
//! otherwise.
//!
//! ```rust
//! use query_lens::sql::SqlQuery;
//! use query_lens::compile::{Bound, Comparison, Direction, PredicateShape, QueryHandle};
//! use query_lens::Dialect;
//!
//! let mut q = SqlQuery::new(Dialect::Postgres).from_table("users");
//! q.add_predicate("age", Bound::Single("18".into()), PredicateShape::Compare(Comparison::Gte));
//! q.add_ordering("name", Direction::Desc);
//! assert_eq!(q.to_sql(), "SELECT * FROM \"users\" WHERE \"age\" >= $1 ORDER BY \"name\" DESC");
//! assert_eq!(q.params(), &["18".to_string()]);
//! ```

use crate::compile::{Bound, CaseMatch, Dialect, Direction, PredicateShape, QueryHandle};

/// Collects SQL parameters during query building, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SqlParams {
    pub values: Vec<String>,
}

impl SqlParams {
    fn placeholder(&mut self, dialect: Dialect, value: &str) -> String {
        self.values.push(value.to_string());
        match dialect {
            Dialect::Postgres | Dialect::DuckDb => format!("${}", self.values.len()),
            _ => "?".to_string(),
        }
    }
}

/// Quote an identifier for `dialect`, doubling any embedded quote
/// characters.
pub fn quote_ident(dialect: Dialect, ident: &str) -> String {
    match dialect {
        Dialect::MySql | Dialect::ClickHouse => format!("`{}`", ident.replace('`', "``")),
        _ => format!("\"{}\"", ident.replace('"', "\"\"")),
    }
}

#[derive(Debug, Clone)]
pub struct SqlQuery {
    dialect: Dialect,
    table: Option<String>,
    predicates: Vec<String>,
    orderings: Vec<String>,
    params: SqlParams,
}

impl SqlQuery {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            table: None,
            predicates: Vec::new(),
            orderings: Vec::new(),
            params: SqlParams::default(),
        }
    }

    pub fn from_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Each predicate rendered on its own.
    pub fn predicates(&self) -> &[String] {
        &self.predicates
    }

    /// Each ordering rendered on its own, e.g. `"age" DESC`.
    pub fn orderings(&self) -> &[String] {
        &self.orderings
    }

    pub fn params(&self) -> &[String] {
        &self.params.values
    }

    /// The predicates joined by `AND`, without the `WHERE` keyword.
    pub fn where_clause(&self) -> String {
        self.predicates.join(" AND ")
    }

    /// The orderings joined by commas, without `ORDER BY`.
    pub fn order_clause(&self) -> String {
        self.orderings.join(", ")
    }

    pub fn to_sql(&self) -> String {
        let mut sql = match &self.table {
            Some(table) => format!("SELECT * FROM {}", quote_ident(self.dialect, table)),
            None => "SELECT *".to_string(),
        };
        if !self.predicates.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.where_clause());
        }
        if !self.orderings.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.order_clause());
        }
        sql
    }

    fn render(&mut self, column: &str, values: &Bound, shape: PredicateShape) -> String {
        let dialect = self.dialect;
        let col = quote_ident(dialect, column);
        let not = |negated: bool| if negated { "NOT " } else { "" };

        match (shape, values) {
            (PredicateShape::Compare(cmp), Bound::Single(v)) => {
                let p = self.params.placeholder(dialect, v);
                format!("{} {} {}", col, cmp.sql_operator(), p)
            }
            (PredicateShape::Pattern { negated, case }, Bound::Single(v)) => {
                let p = self.params.placeholder(dialect, v);
                match case {
                    CaseMatch::Native => format!("{} {}ILIKE {}", col, not(negated), p),
                    CaseMatch::Folded => {
                        format!("LOWER({}) {}LIKE LOWER({})", col, not(negated), p)
                    }
                }
            }
            (PredicateShape::Membership { negated }, Bound::List(vs)) => {
                if vs.is_empty() {
                    // IN () is not valid SQL; an empty list matches nothing.
                    return if negated { "1=1" } else { "1=0" }.to_string();
                }
                let placeholders: Vec<String> = vs
                    .iter()
                    .map(|v| self.params.placeholder(dialect, v))
                    .collect();
                format!("{} {}IN ({})", col, not(negated), placeholders.join(", "))
            }
            (PredicateShape::Nullness { negated }, _) => {
                format!("{} IS {}NULL", col, not(negated))
            }
            (PredicateShape::Range { negated }, Bound::Pair(low, high)) => {
                let low = self.params.placeholder(dialect, low);
                let high = self.params.placeholder(dialect, high);
                format!("{} {}BETWEEN {} AND {}", col, not(negated), low, high)
            }
            (shape, values) => {
                // Shapes and bounds are paired by the compiler; fall back
                // to a predicate that selects nothing.
                log::warn!(
                    "Unsupported predicate on {}: {:?} with {:?}",
                    column,
                    shape,
                    values
                );
                "1=0".to_string()
            }
        }
    }
}

impl QueryHandle for SqlQuery {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn add_predicate(&mut self, column: &str, values: Bound, shape: PredicateShape) {
        let rendered = self.render(column, &values, shape);
        self.predicates.push(rendered);
    }

    fn add_ordering(&mut self, column: &str, direction: Direction) {
        let col = quote_ident(self.dialect, column);
        self.orderings.push(format!("{} {}", col, direction));
    }
}
