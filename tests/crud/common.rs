//! Common test utilities for CRUD tests

#![allow(dead_code)]

use fluentdb::{connect_memory, Collection, ColumnDef, NodeSession, Table, Value};
use serde_json::json;

/// Fresh in-memory session with schema `test` selected
pub fn node() -> NodeSession {
    connect_memory(&"root@localhost/test".parse().unwrap())
}

/// JSON literal as a fluentdb value
pub fn doc(value: serde_json::Value) -> Value {
    Value::from(value)
}

/// `test.people` holding seven documents with ids "1" to "7"
pub fn people(node: &NodeSession) -> Collection {
    let people = node
        .get_schema("test")
        .unwrap()
        .create_collection("people")
        .unwrap();
    let mut add = people
        .add(doc(json!([
            {"_id": "1", "name": "jack", "age": 17, "gender": "male"},
            {"_id": "2", "name": "adam", "age": 15, "gender": "male"},
            {"_id": "3", "name": "brian", "age": 14, "gender": "male"},
            {"_id": "4", "name": "alma", "age": 13, "gender": "female"},
            {"_id": "5", "name": "carol", "age": 14, "gender": "female"},
            {"_id": "6", "name": "donna", "age": 16, "gender": "female"},
            {"_id": "7", "name": "angel", "age": 14, "gender": "male"}
        ])))
        .unwrap();
    assert_eq!(add.execute().unwrap().affected_item_count(), 7);
    people
}

/// `test.users (id auto, name not null, age)` holding the same seven people
pub fn users(node: &NodeSession) -> Table {
    let users = node
        .get_schema("test")
        .unwrap()
        .create_table(
            "users",
            &[
                ColumnDef::auto_increment("id"),
                ColumnDef::new("name").not_null(),
                ColumnDef::new("age"),
            ],
        )
        .unwrap();
    let mut insert = users.insert_columns(&["name", "age"]).unwrap();
    for (name, age) in [
        ("jack", 17),
        ("adam", 15),
        ("brian", 14),
        ("alma", 13),
        ("carol", 14),
        ("donna", 16),
        ("angel", 14),
    ] {
        insert.values([Value::from(name), Value::from(age)]).unwrap();
    }
    assert_eq!(insert.execute().unwrap().affected_item_count(), 7);
    users
}

/// Names of the documents, in result order
pub fn names(docs: &[Value]) -> Vec<String> {
    docs.iter()
        .map(|d| d.get("name").and_then(Value::as_str).unwrap_or_default().to_string())
        .collect()
}

/// Session error code carried by `err`
pub fn session_code(err: &fluentdb::Error) -> u32 {
    match err {
        fluentdb::Error::Session(e) => e.code,
        other => panic!("Expected Session error, got {:?}", other),
    }
}
