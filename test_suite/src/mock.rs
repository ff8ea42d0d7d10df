use query_lens::compile::{Bound, Comparison, Direction, PredicateShape, QueryHandle};
use query_lens::filtering::QueryParams;
use query_lens::mock::MemoryQuery;
use query_lens::sql::SqlQuery;
use query_lens::{CellValue, Dialect, FilterBuilder, FilterSettings, IntoRow};

#[derive(IntoRow)]
struct Person {
    name: String,
    age: i32,
    #[lens(rename = "team")]
    team_name: Option<String>,
    #[lens(exclude)]
    #[allow(dead_code)]
    password: String,
}

fn person(name: &str, age: i32, team: Option<&str>) -> Person {
    Person {
        name: name.to_string(),
        age,
        team_name: team.map(str::to_string),
        password: "hunter2".to_string(),
    }
}

fn people() -> Vec<Person> {
    vec![
        person("John", 34, Some("red")),
        person("johanna", 28, Some("blue")),
        person("Bob", 41, None),
        person("JOE", 28, Some("red")),
        person("Alice", 19, Some("Blue")),
    ]
}

fn select(dialect: Dialect, query: &str) -> Vec<String> {
    let builder = FilterBuilder::with_settings(
        FilterSettings::default().allow_all(["name", "age", "team"]),
    );
    let params = QueryParams::parse(query);
    let result = builder.compile_request(&params, MemoryQuery::from_rows(dialect, &people()));
    assert!(result.ok(), "{}", result.errors());
    result.query().select_column("name")
}

#[test]
fn test_rows() {
    let row = person("Ann", 3, None).to_row();
    assert_eq!(row.len(), 3);
    assert_eq!(row["name"], CellValue::String("Ann".to_string()));
    assert_eq!(row["team"], CellValue::Null);
    assert!(!row.contains_key("password"));
    assert_eq!(
        Person::columns(),
        vec!["name".to_string(), "age".to_string(), "team".to_string()]
    );
    assert_eq!(
        person("Ann", 3, Some("x")).to_json(),
        serde_json::json!({"name": "Ann", "age": 3, "team": "x"})
    );
}

#[test_log::test]
fn test_case_insensitive_match_is_dialect_independent() {
    let query = "filter[name][like]=jo";

    let native = select(Dialect::Postgres, query);
    let folded = select(Dialect::Unknown, query);
    log::debug!("native: {:?} folded: {:?}", native, folded);

    assert_eq!(native, vec!["John", "johanna", "JOE"]);
    assert_eq!(native, folded);

    // the compiled SQL differs though
    let builder = FilterBuilder::new();
    let params = QueryParams::parse(query);
    let pg = builder.compile_request(&params, SqlQuery::new(Dialect::Postgres));
    let other = builder.compile_request(&params, SqlQuery::new(Dialect::Unknown));
    assert_ne!(pg.query().where_clause(), other.query().where_clause());
    assert_eq!(pg.query().params(), other.query().params());
}

#[test]
fn test_patterns_across_dialects() {
    for query in [
        "filter[name][starts-with]=JO",
        "filter[name][ends-with]=NNA",
        "filter[name][not-like]=o",
        "filter[team][like]=BLUE",
    ] {
        let expected = select(Dialect::Postgres, query);
        for dialect in [Dialect::MySql, Dialect::Sqlite, Dialect::Unknown, Dialect::DuckDb] {
            assert_eq!(select(dialect, query), expected, "{} on {}", query, dialect);
        }
    }
    assert_eq!(
        select(Dialect::Sqlite, "filter[name][starts-with]=JO"),
        vec!["John", "johanna", "JOE"]
    );
    assert_eq!(select(Dialect::Sqlite, "filter[name][not-like]=o"), vec!["Alice"]);
    assert_eq!(
        select(Dialect::Postgres, "filter[team][like]=BLUE"),
        vec!["johanna", "Alice"]
    );
}

#[test]
fn test_comparisons() {
    assert_eq!(select(Dialect::Postgres, "filter[age][gte]=34"), vec!["John", "Bob"]);
    assert_eq!(select(Dialect::Postgres, "filter[age]=28"), vec!["johanna", "JOE"]);
    assert_eq!(
        select(Dialect::Postgres, "filter[age][ne]=28"),
        vec!["John", "Bob", "Alice"]
    );
    assert_eq!(select(Dialect::Postgres, "filter[age][lt]=20"), vec!["Alice"]);
    assert_eq!(select(Dialect::Postgres, "filter[name][eq]=john"), Vec::<String>::new());
}

#[test]
fn test_lists_and_ranges() {
    assert_eq!(
        select(Dialect::Postgres, "filter[age][in]=19, 41"),
        vec!["Bob", "Alice"]
    );
    assert_eq!(
        select(Dialect::Postgres, "filter[team][not-in]=red"),
        vec!["johanna", "Alice"]
    );
    assert_eq!(
        select(Dialect::Postgres, "filter[age][between]=20,35"),
        vec!["John", "johanna", "JOE"]
    );
    assert_eq!(
        select(Dialect::Postgres, "filter[age][not-between]=20,35"),
        vec!["Bob", "Alice"]
    );
}

#[test]
fn test_nulls() {
    assert_eq!(select(Dialect::Postgres, "filter[team][null]="), vec!["Bob"]);
    assert_eq!(select(Dialect::Postgres, "filter[team][not-null]=").len(), 4);
    // negated predicates don't match NULL either
    assert!(!select(Dialect::Postgres, "filter[team][ne]=red").contains(&"Bob".to_string()));
}

#[test]
fn test_combined_and_sorted() {
    assert_eq!(
        select(Dialect::Postgres, "filter[age][lte]=34&filter[team][not-null]=&sort=age,-name"),
        vec!["Alice", "johanna", "JOE", "John"]
    );
    assert_eq!(
        select(Dialect::Postgres, "sort=-team,name"),
        vec!["JOE", "John", "johanna", "Alice", "Bob"]
    );
}

#[test]
fn test_direct_handle() {
    let mut q = MemoryQuery::from_rows(Dialect::Sqlite, &people());
    q.add_predicate("age", Bound::Single("30".to_string()), PredicateShape::Compare(Comparison::Gt));
    q.add_ordering("age", Direction::Desc);
    assert_eq!(q.predicate_count(), 1);
    assert_eq!(q.select_column("name"), vec!["Bob", "John"]);

    let json = q.to_json();
    assert_eq!(json["count"], serde_json::json!(2));
    assert_eq!(json["results"][0]["name"], serde_json::json!("Bob"));
    assert_eq!(json["results"][0]["team"], serde_json::Value::Null);
}

#[derive(IntoRow)]
struct Reading {
    label: String,
}

#[test]
fn test_non_finite_text() {
    let readings: Vec<Reading> = ["nan", "inf", "infinity", "7"]
        .iter()
        .map(|l| Reading { label: l.to_string() })
        .collect();
    let labels = |query: &str| {
        let params = QueryParams::parse(query);
        let result = FilterBuilder::new()
            .compile_request(&params, MemoryQuery::from_rows(Dialect::Sqlite, &readings));
        assert!(result.ok(), "{}", result.errors());
        result.query().select_column("label")
    };

    assert_eq!(labels("filter[label]=nan"), vec!["nan"]);
    assert_eq!(labels("filter[label][in]=inf,nan"), vec!["nan", "inf"]);
    assert_eq!(labels("filter[label][ne]=inf"), vec!["nan", "infinity", "7"]);
    assert_eq!(labels("filter[label][between]=i,j"), vec!["inf", "infinity"]);
    assert_eq!(labels("sort=label"), vec!["7", "inf", "infinity", "nan"]);
}
