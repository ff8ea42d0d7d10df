use std::error::Error;

use http::StatusCode;
use query_lens::errors::{ErrorCode, ErrorKind};
use query_lens::filtering::QueryParams;
use query_lens::sql::SqlQuery;
use query_lens::{
    Dialect, FilterBuilder, FilterError, FilterErrorCollection, FilterResult, FilterSettings,
    Operator,
};
use serde_json::json;

#[test]
fn test_kinds() {
    for (kind, name, code, status) in [
        (
            ErrorKind::Validation,
            "validation_error",
            "FILTER_VALIDATION_ERROR",
            StatusCode::BAD_REQUEST,
        ),
        (
            ErrorKind::Parsing,
            "parsing_error",
            "FILTER_PARSING_ERROR",
            StatusCode::BAD_REQUEST,
        ),
        (
            ErrorKind::Configuration,
            "configuration_error",
            "FILTER_CONFIGURATION_ERROR",
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
        (
            ErrorKind::Database,
            "database_error",
            "FILTER_DATABASE_ERROR",
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
        (
            ErrorKind::Internal,
            "internal_error",
            "FILTER_INTERNAL_ERROR",
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
    ] {
        assert_eq!(kind.to_string(), name);
        assert_eq!(kind.code().to_string(), code);
        assert_eq!(kind.status(), status);
    }
    assert_eq!(ErrorKind::Validation.code(), ErrorCode::Validation);
    assert!(ErrorKind::Database.is_server_error());
    assert!(!ErrorKind::Parsing.is_server_error());
}

#[test]
fn test_display() {
    let e = FilterError::field_not_allowed("password", &["name".to_string()]);
    assert_eq!(
        e.to_string(),
        "validation_error: Field 'password' is not allowed for filtering (field: password)"
    );

    let e = FilterError::operator_not_allowed("name", Operator::Gt, &[Operator::Eq]);
    assert_eq!(
        e.to_string(),
        "validation_error: Operator 'gt' is not allowed for field 'name' (field: name, operator: gt)"
    );

    let e = FilterError::invalid_filter_format("filter[x", "1");
    assert_eq!(
        e.to_string(),
        "parsing_error: Invalid filter format: 'filter[x'. Expected format: 'filter[field]' or 'filter[field][operator]'"
    );
}

#[test]
fn test_error_json() {
    let e = FilterError::field_not_allowed("password", &["name".to_string(), "age".to_string()]);
    assert_eq!(
        e.to_json(),
        json!({
            "type": "validation_error",
            "message": "Field 'password' is not allowed for filtering",
            "code": "FILTER_VALIDATION_ERROR",
            "field": "password",
            "suggestions": ["name", "age"],
        })
    );

    let e = FilterError::invalid_between("age", Operator::Between, "18");
    assert_eq!(
        e.to_json(),
        json!({
            "type": "validation_error",
            "message": "Between operator requires exactly two comma-separated values",
            "code": "FILTER_VALIDATION_ERROR",
            "field": "age",
            "operator": "between",
            "value": "18",
            "suggestions": ["Use format: 'value1,value2' (e.g., '10,20')"],
        })
    );

    let e = FilterError::parsing("", "", "bad");
    assert_eq!(
        e.to_json(),
        json!({
            "type": "parsing_error",
            "message": "bad",
            "code": "FILTER_PARSING_ERROR",
        })
    );
}

#[test]
fn test_wrapped_source() {
    let io = std::io::Error::new(std::io::ErrorKind::Other, "connection reset");
    let e = FilterError::database("query failed", io);
    assert_eq!(e.kind(), ErrorKind::Database);
    assert_eq!(e.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(e.source().map(|s| s.to_string()), Some("connection reset".to_string()));

    let e = FilterError::internal("bad state", anyhow::anyhow!("oops"));
    assert_eq!(e.code(), ErrorCode::Internal);
    assert!(e.source().is_some());

    assert!(FilterError::empty_field("x").source().is_none());
}

#[test]
fn test_collection() {
    let mut errors = FilterErrorCollection::new();
    assert!(errors.is_ok());
    assert_eq!(errors.status(), StatusCode::OK);
    assert_eq!(errors.to_string(), "no errors");
    assert_eq!(errors.to_json(), json!({ "errors": [] }));

    errors.push(FilterError::missing_value("name", Operator::Eq));
    assert_eq!(errors.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        errors.to_string(),
        "validation_error: Filter value cannot be empty (field: name, operator: eq)"
    );

    let mut more = FilterErrorCollection::new();
    more.push(FilterError::invalid_operator("age", "older"));
    more.push(FilterError::configuration::<_, String>("broken", []));
    errors.merge(more);
    assert_eq!(errors.len(), 3);
    assert_eq!(errors.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(errors.to_string(), "multiple filter errors (3 errors)");

    let messages: Vec<&str> = errors.iter().map(FilterError::message).collect();
    assert_eq!(
        messages,
        vec!["Filter value cannot be empty", "Invalid operator 'older'", "broken"]
    );

    errors.extend(vec![FilterError::empty_field("")]);
    assert_eq!(errors.len(), 4);

    let collected: FilterErrorCollection = errors.into_iter().take(2).collect();
    assert_eq!(collected.len(), 2);
    assert_eq!(collected.status(), StatusCode::BAD_REQUEST);
}

#[test]
fn test_response() {
    let mut result = FilterResult::new(SqlQuery::new(Dialect::Postgres));
    assert_eq!(result.to_response(), json!({ "success": true }));

    result.add_error(FilterError::sort_field_not_allowed("email", &["name".to_string()]));
    assert_eq!(
        result.to_response(),
        json!({
            "success": false,
            "errors": [{
                "type": "validation_error",
                "message": "Sort field 'email' is not allowed",
                "code": "FILTER_VALIDATION_ERROR",
                "field": "email",
                "suggestions": ["name"],
            }],
        })
    );
}

#[test]
fn test_response_from_compile() {
    let builder = FilterBuilder::with_settings(FilterSettings::default().allow_fields(["name"]));
    let params = QueryParams::parse("filter[name][between]=a&filter[x]=1");
    let result = builder.compile_request(&params, SqlQuery::new(Dialect::Postgres));

    let response = result.to_response();
    assert_eq!(response["success"], json!(false));
    let errors = response["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0]["operator"], json!("between"));
    assert_eq!(errors[1]["field"], json!("x"));
    assert_eq!(errors[1]["suggestions"], json!(["name"]));
}
