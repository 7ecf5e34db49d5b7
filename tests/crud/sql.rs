//! SQL Tests
//!
//! Raw SQL with positional `?` binding.

use crate::common::*;
use fluentdb::{Error, Value};

#[test]
fn positional_binding_in_order() {
    let node = node();
    let mut sql = node.sql("SELECT ? + ? AS total, concat(?, '!') AS shout").unwrap();
    sql.bind(1).unwrap().bind(2).unwrap().bind("hi").unwrap();
    let mut result = sql.execute().unwrap();
    assert!(result.has_data());
    assert_eq!(result.columns(), ["total", "shout"]);
    let row = result.fetch_one().unwrap();
    assert_eq!(row.get("total"), Some(&Value::Int(3)));
    assert_eq!(row.get("shout"), Some(&Value::from("hi!")));
    assert!(result.fetch_one().is_none());
}

#[test]
fn bind_all_and_rebinding_after_execute() {
    let node = node();
    let mut sql = node.sql("SELECT ? * 2 AS doubled").unwrap();
    sql.bind_all([Value::from(21)]).unwrap();
    let row = sql.execute().unwrap().fetch_one().unwrap();
    assert_eq!(row.get("doubled"), Some(&Value::Int(42)));

    // the first bind after an execute starts a new argument list
    sql.bind(5).unwrap();
    let row = sql.execute().unwrap().fetch_one().unwrap();
    assert_eq!(row.get("doubled"), Some(&Value::Int(10)));
}

#[test]
fn binding_count_is_checked() {
    let node = node();
    let mut sql = node.sql("SELECT ?, ?").unwrap();
    assert!(matches!(sql.bind_all([1, 2, 3]), Err(Error::InvalidArgument { .. })));
    sql.bind(1).unwrap();
    match sql.execute() {
        Err(Error::MissingBinding { placeholders, .. }) => assert_eq!(placeholders, vec!["#2"]),
        other => panic!("Expected MissingBinding, got {:?}", other.err()),
    }
}

#[test]
fn quoted_markers_are_not_placeholders() {
    let node = node();
    let mut sql = node.sql("SELECT '?' AS mark, :name AS n").unwrap();
    let err = sql.execute().err().unwrap();
    // `:name` reaches the session unbound
    assert_eq!(session_code(&err), 2031);
}

#[test]
fn unsupported_statements_report_session_errors() {
    let node = node();
    let mut sql = node.sql("SELECT * FROM users").unwrap();
    assert_eq!(session_code(&sql.execute().err().unwrap()), 1064);
    assert!(matches!(node.sql("   "), Err(Error::InvalidArgument { .. })));
    assert!(matches!(node.sql("SELECT 'open"), Err(Error::Syntax { .. })));
}

#[test]
fn warnings_follow_fetch_setting() {
    let node = node();
    let mut sql = node.sql("SELECT 1 / 0 AS r").unwrap();
    let result = sql.execute().unwrap();
    assert_eq!(result.warning_count(), 0);

    node.set_fetch_warnings(true);
    let mut result = sql.execute().unwrap();
    assert_eq!(result.warning_count(), 1);
    assert_eq!(result.warnings()[0].code, 1365);
    assert_eq!(result.fetch_one().unwrap().get("r"), Some(&Value::Null));
}

#[test]
fn use_switches_current_schema() {
    let node = node();
    node.create_schema("other").unwrap();
    let mut sql = node.sql("USE other").unwrap();
    let result = sql.execute().unwrap();
    assert!(!result.has_data());
    assert_eq!(node.get_current_schema().unwrap().name(), "other");
    assert_eq!(node.get_default_schema().unwrap().name(), "test");
}
