use query_lens::compile::{
    apply_filter, parse_sort, Applier, Bound, CaseMatch, Direction, PredicateShape, QueryHandle,
    SortKey,
};
use query_lens::errors::ErrorKind;
use query_lens::filtering::Validator;
use query_lens::sql::{quote_ident, SqlQuery};
use query_lens::{Dialect, FilterErrorCollection, FilterTerm, Operator};

fn compile_one(dialect: Dialect, field: &str, op: Operator, value: &str) -> SqlQuery {
    let mut query = SqlQuery::new(dialect);
    let mut errors = FilterErrorCollection::new();
    Applier::default().apply_filters(
        &mut query,
        &[FilterTerm::new(field, op, value)],
        &mut errors,
    );
    assert!(errors.is_ok(), "{}", errors);
    query
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_comparisons() {
    for (op, sql) in [
        (Operator::Eq, "\"age\" = $1"),
        (Operator::Ne, "\"age\" != $1"),
        (Operator::Gt, "\"age\" > $1"),
        (Operator::Gte, "\"age\" >= $1"),
        (Operator::Lt, "\"age\" < $1"),
        (Operator::Lte, "\"age\" <= $1"),
    ] {
        let q = compile_one(Dialect::Postgres, "age", op, "30");
        assert_eq!(q.where_clause(), sql);
        assert_eq!(q.params(), strings(&["30"]).as_slice());
    }
}

#[test]
fn test_patterns_native() {
    for (op, sql, param) in [
        (Operator::Like, "\"name\" ILIKE $1", "%jo%"),
        (Operator::NotLike, "\"name\" NOT ILIKE $1", "%jo%"),
        (Operator::StartsWith, "\"name\" ILIKE $1", "jo%"),
        (Operator::EndsWith, "\"name\" ILIKE $1", "%jo"),
    ] {
        for dialect in [Dialect::Postgres, Dialect::DuckDb] {
            let q = compile_one(dialect, "name", op, "jo");
            assert_eq!(q.where_clause(), sql);
            assert_eq!(q.params(), strings(&[param]).as_slice());
        }
    }

    let q = compile_one(Dialect::ClickHouse, "name", Operator::Like, "jo");
    assert_eq!(q.where_clause(), "`name` ILIKE ?");
}

#[test]
fn test_patterns_folded() {
    let q = compile_one(Dialect::MySql, "name", Operator::NotLike, "Jo");
    assert_eq!(q.where_clause(), "LOWER(`name`) NOT LIKE LOWER(?)");
    assert_eq!(q.params(), strings(&["%Jo%"]).as_slice());

    for dialect in [Dialect::Sqlite, Dialect::Unknown] {
        let q = compile_one(dialect, "name", Operator::StartsWith, "Jo");
        assert_eq!(q.where_clause(), "LOWER(\"name\") LIKE LOWER(?)");
        assert_eq!(q.params(), strings(&["Jo%"]).as_slice());
    }
}

#[test]
fn test_membership() {
    let q = compile_one(Dialect::Postgres, "role", Operator::In, " admin, staff ,guest");
    assert_eq!(q.where_clause(), "\"role\" IN ($1, $2, $3)");
    assert_eq!(q.params(), strings(&["admin", "staff", "guest"]).as_slice());

    let q = compile_one(Dialect::Sqlite, "role", Operator::NotIn, "admin");
    assert_eq!(q.where_clause(), "\"role\" NOT IN (?)");
}

#[test]
fn test_nullness() {
    let q = compile_one(Dialect::Postgres, "deleted_at", Operator::Null, "ignored");
    assert_eq!(q.where_clause(), "\"deleted_at\" IS NULL");
    assert!(q.params().is_empty());

    let q = compile_one(Dialect::Postgres, "deleted_at", Operator::NotNull, "");
    assert_eq!(q.where_clause(), "\"deleted_at\" IS NOT NULL");
}

#[test]
fn test_ranges() {
    let q = compile_one(Dialect::Postgres, "age", Operator::Between, "18, 30");
    assert_eq!(q.where_clause(), "\"age\" BETWEEN $1 AND $2");
    assert_eq!(q.params(), strings(&["18", "30"]).as_slice());

    let q = compile_one(Dialect::MySql, "age", Operator::NotBetween, "18,30");
    assert_eq!(q.where_clause(), "`age` NOT BETWEEN ? AND ?");
}

#[test]
fn test_predicates_are_anded() {
    let mut query = SqlQuery::new(Dialect::Postgres).from_table("users");
    let mut errors = FilterErrorCollection::new();
    Applier::default().apply_filters(
        &mut query,
        &[
            FilterTerm::new("age", Operator::Gte, "18"),
            FilterTerm::new("name", Operator::Like, "a"),
            FilterTerm::new("role", Operator::In, "x,y"),
        ],
        &mut errors,
    );
    assert!(errors.is_ok());
    assert_eq!(
        query.to_sql(),
        "SELECT * FROM \"users\" WHERE \"age\" >= $1 AND \"name\" ILIKE $2 AND \"role\" IN ($3, $4)"
    );
    assert_eq!(query.params(), strings(&["18", "%a%", "x", "y"]).as_slice());
}

#[test]
fn test_rejected_terms_are_skipped() {
    let applier = Applier::new(Validator::new(Some(strings(&["age", "name"])), vec![]));
    let mut query = SqlQuery::new(Dialect::Postgres);
    let mut errors = FilterErrorCollection::new();
    applier.apply_filters(
        &mut query,
        &[
            FilterTerm::new("age", Operator::Between, "18"),
            FilterTerm::new("secret", Operator::Eq, "x"),
            FilterTerm::new("name", Operator::Eq, "bob"),
        ],
        &mut errors,
    );
    assert_eq!(query.predicates(), &["\"name\" = $1".to_string()]);
    assert_eq!(query.params(), strings(&["bob"]).as_slice());
    assert_eq!(errors.len(), 2);
    assert!(errors.iter().all(|e| e.kind() == ErrorKind::Validation));
    assert_eq!(
        errors.first().unwrap().message(),
        "Between operator requires exactly two comma-separated values"
    );
}

#[test]
fn test_unchecked_range_is_rejected() {
    let mut query = SqlQuery::new(Dialect::Postgres);
    let term = FilterTerm::new("age", Operator::Between, "1,2,3");
    let e = apply_filter(&mut query, Dialect::Postgres, &term).unwrap_err();
    assert_eq!(e.kind(), ErrorKind::Validation);
    assert!(query.predicates().is_empty());
}

#[test]
fn test_empty_membership() {
    let mut query = SqlQuery::new(Dialect::Sqlite);
    query.add_predicate("id", Bound::List(vec![]), PredicateShape::Membership { negated: false });
    query.add_predicate("id", Bound::List(vec![]), PredicateShape::Membership { negated: true });
    assert_eq!(query.where_clause(), "1=0 AND 1=1");
    assert!(query.params().is_empty());
}

#[test]
fn test_mismatched_shape() {
    let mut query = SqlQuery::new(Dialect::Sqlite);
    query.add_predicate("id", Bound::None, PredicateShape::Range { negated: false });
    assert_eq!(query.where_clause(), "1=0");
}

#[test]
fn test_placeholders() {
    for (dialect, sql) in [
        (Dialect::Postgres, "SELECT * FROM \"t\" WHERE \"a\" = $1 AND \"b\" IN ($2, $3)"),
        (Dialect::DuckDb, "SELECT * FROM \"t\" WHERE \"a\" = $1 AND \"b\" IN ($2, $3)"),
        (Dialect::Sqlite, "SELECT * FROM \"t\" WHERE \"a\" = ? AND \"b\" IN (?, ?)"),
        (Dialect::ClickHouse, "SELECT * FROM `t` WHERE `a` = ? AND `b` IN (?, ?)"),
    ] {
        let mut query = SqlQuery::new(dialect).from_table("t");
        let mut errors = FilterErrorCollection::new();
        Applier::default().apply_filters(
            &mut query,
            &[
                FilterTerm::new("a", Operator::Eq, "1"),
                FilterTerm::new("b", Operator::In, "x,y"),
            ],
            &mut errors,
        );
        assert!(errors.is_ok());
        assert_eq!(query.to_sql(), sql, "{}", dialect);
        assert_eq!(query.params(), strings(&["1", "x", "y"]).as_slice());
    }
}

#[test]
fn test_quoting() {
    assert_eq!(quote_ident(Dialect::Postgres, "we\"ird"), "\"we\"\"ird\"");
    assert_eq!(quote_ident(Dialect::MySql, "we`ird"), "`we``ird`");
    assert_eq!(quote_ident(Dialect::Unknown, "name"), "\"name\"");
}

#[test]
fn test_dialects() {
    for (name, dialect) in [
        ("postgres", Dialect::Postgres),
        ("PostgreSQL", Dialect::Postgres),
        ("pg", Dialect::Postgres),
        ("duckdb", Dialect::DuckDb),
        ("ClickHouse", Dialect::ClickHouse),
        ("mysql", Dialect::MySql),
        ("mariadb", Dialect::MySql),
        ("sqlite3", Dialect::Sqlite),
        ("oracle", Dialect::Unknown),
        ("", Dialect::Unknown),
    ] {
        assert_eq!(Dialect::from_name(name), dialect, "{}", name);
    }

    assert_eq!(Dialect::Postgres.case_match(), CaseMatch::Native);
    assert_eq!(Dialect::DuckDb.case_match(), CaseMatch::Native);
    assert_eq!(Dialect::ClickHouse.case_match(), CaseMatch::Native);
    assert_eq!(Dialect::MySql.case_match(), CaseMatch::Folded);
    assert_eq!(Dialect::Sqlite.case_match(), CaseMatch::Folded);
    assert_eq!(Dialect::Unknown.case_match(), CaseMatch::Folded);
    assert_eq!(Dialect::default(), Dialect::Unknown);
}

#[test]
fn test_parse_sort() {
    assert_eq!(
        parse_sort("-age, name,, - ,- created_at"),
        vec![
            SortKey {
                field: "age".to_string(),
                direction: Direction::Desc
            },
            SortKey {
                field: "name".to_string(),
                direction: Direction::Asc
            },
            SortKey {
                field: "created_at".to_string(),
                direction: Direction::Desc
            },
        ]
    );
    assert!(parse_sort("").is_empty());
    assert!(parse_sort(" , ,-").is_empty());
    // only one leading '-' is a direction
    assert!(parse_sort("--age,- -name").is_empty());
}

#[test]
fn test_apply_sort() {
    let applier = Applier::default();

    let mut query = SqlQuery::new(Dialect::Postgres);
    let errors = applier.apply_sort(&mut query, "-age,name", None);
    assert!(errors.is_ok());
    assert_eq!(query.order_clause(), "\"age\" DESC, \"name\" ASC");

    let allowed = strings(&["name"]);
    let mut query = SqlQuery::new(Dialect::Postgres);
    let errors = applier.apply_sort(&mut query, "email,-name", Some(allowed.as_slice()));
    assert_eq!(query.orderings(), &["\"name\" DESC".to_string()]);
    assert_eq!(errors.len(), 1);
    let e = errors.first().unwrap();
    assert_eq!(e.message(), "Sort field 'email' is not allowed");
    assert_eq!(e.suggestions(), allowed.as_slice());
}
