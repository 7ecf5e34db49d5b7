//! Dynamic Invocation Tests
//!
//! Builders driven by method name, the way script bindings call them.

use crate::common::*;
use fluentdb::{Crud, Error, Value};
use serde_json::json;

#[test]
fn find_chain_by_name() {
    let node = node();
    let people = people(&node);
    let mut find = people.find("age > :min").unwrap();
    assert!(find.call("fields", &[Value::from(vec!["name"])]).unwrap().is_chained());
    find.call("sort", &[Value::from("name desc")]).unwrap();
    find.call("limit", &[Value::Int(2)]).unwrap();
    find.call("bind", &[Value::from("min"), Value::Int(14)]).unwrap();
    let mut docs = find.call("execute", &[]).unwrap().into_docs().unwrap();
    assert_eq!(
        docs.fetch_all(),
        vec![doc(json!({"name": "jack"})), doc(json!({"name": "donna"}))]
    );
}

#[test]
fn allowed_methods_follow_stages() {
    let node = node();
    let users = users(&node);
    let mut update = users.update();
    assert_eq!(update.allowed_methods(), vec!["set"]);
    update.call("set", &[Value::from("age"), Value::Int(1)]).unwrap();
    update.call("where", &[Value::from("id = 1")]).unwrap();
    assert!(update.allowed_methods().contains(&"execute"));

    let err = update.call("set", &[Value::from("age"), Value::Int(2)]).unwrap_err();
    assert!(matches!(err, Error::IllegalState { .. }));
    let err = update.call("fields", &[]).unwrap_err();
    assert_eq!(err.to_string(), "TableUpdate.fields: Unknown method 'fields'");

    let outcome = update.call("execute", &[]).unwrap();
    assert_eq!(outcome.into_write().unwrap().affected_item_count(), 1);
}

#[test]
fn argument_errors_leave_builder_untouched() {
    let node = node();
    let users = users(&node);
    let mut select = users.select(&["name"]).unwrap();
    let err = select.call("limit", &[Value::from("ten")]).unwrap_err();
    assert!(matches!(err, Error::TypeMismatch { position: 1, .. }));
    let err = select.call("where", &[]).unwrap_err();
    assert!(matches!(err, Error::ArgumentCount { .. }));

    select.call("where", &[Value::from("age = 17")]).unwrap();
    let mut rows = select.call("execute", &[]).unwrap().into_rows().unwrap();
    assert_eq!(rows.fetch_one().unwrap().get("name"), Some(&Value::from("jack")));
}

#[test]
fn sql_bind_by_name() {
    let node = node();
    let mut sql = node.sql("SELECT ? + ? AS n").unwrap();
    sql.call("bind", &[Value::from(vec![Value::Int(1), Value::Int(2)])]).unwrap();
    let mut result = sql.call("execute", &[]).unwrap().into_sql().unwrap();
    assert_eq!(result.fetch_one().unwrap().get("n"), Some(&Value::Int(3)));
}

#[test]
fn create_index_by_name() {
    let node = node();
    let people = people(&node);
    let mut index = people.create_index("by_name", None).unwrap();
    assert_eq!(index.allowed_methods(), vec!["field"]);
    let err = index
        .call("field", &[Value::from("name"), Value::from("TEXT(20)"), Value::Int(1)])
        .unwrap_err();
    assert!(matches!(err, Error::TypeMismatch { position: 3, .. }));
    index
        .call("field", &[Value::from("name"), Value::from("TEXT(20)"), Value::Bool(true)])
        .unwrap();
    let outcome = index.call("execute", &[]).unwrap();
    assert_eq!(outcome.into_write().unwrap().affected_item_count(), 0);
    assert!(index.allowed_methods().is_empty());

    let mut add = people.add(doc(json!({"age": 3}))).unwrap();
    assert_eq!(session_code(&add.execute().err().unwrap()), 5115);
}
