//! Transaction and Session Tests
//!
//! Snapshot transactions, schema management and closed-session behaviour
//! observed through `NodeSession`.

use crate::common::*;
use fluentdb::Error;
use serde_json::json;

fn count(node: &fluentdb::NodeSession) -> usize {
    let people = node.get_schema("test").unwrap().get_collection("people").unwrap();
    let mut find = people.find(None::<&str>).unwrap();
    find.execute().unwrap().count()
}

#[test]
fn rollback_discards_statements() {
    let node = node();
    let people = people(&node);
    node.start_transaction().unwrap();
    people.add(doc(json!({"name": "tmp"}))).unwrap().execute().unwrap();
    let mut remove = people.remove("age > 15").unwrap();
    remove.execute().unwrap();
    assert_eq!(count(&node), 6);
    node.rollback().unwrap();
    assert_eq!(count(&node), 7);
}

#[test]
fn commit_keeps_statements() {
    let node = node();
    let people = people(&node);
    node.start_transaction().unwrap();
    let mut modify = people.modify("true").unwrap();
    modify.set("seen", true).unwrap();
    modify.execute().unwrap();
    node.commit().unwrap();

    let mut find = people.find("seen = true").unwrap();
    assert_eq!(find.execute().unwrap().count(), 7);
}

#[test]
fn transaction_state_errors_are_session_errors() {
    let node = node();
    assert_eq!(session_code(&node.commit().unwrap_err()), 5102);
    assert_eq!(session_code(&node.rollback().unwrap_err()), 5102);
    node.start_transaction().unwrap();
    assert_eq!(session_code(&node.start_transaction().unwrap_err()), 5101);
    node.rollback().unwrap();
}

#[test]
fn sql_transaction_words() {
    let node = node();
    let people = people(&node);
    node.sql("START TRANSACTION").unwrap().execute().unwrap();
    let mut remove = people.remove("true").unwrap();
    remove.execute().unwrap();
    node.sql("ROLLBACK").unwrap().execute().unwrap();
    assert_eq!(count(&node), 7);
}

#[test]
fn schema_management() {
    let node = node();
    let shop = node.create_schema("shop").unwrap();
    assert!(shop.exists_in_database().unwrap());
    assert!(node.create_schema("shop").is_err());
    let names: Vec<String> = node
        .get_schemas()
        .unwrap()
        .iter()
        .map(|s| s.name().to_string())
        .collect();
    assert_eq!(names, vec!["shop", "test"]);

    shop.create_collection("orders").unwrap();
    assert_eq!(shop.get_collections().unwrap().len(), 1);
    shop.drop_collection("orders").unwrap();
    assert!(shop.get_collection("orders").is_err());

    node.drop_schema("shop").unwrap();
    assert!(!shop.exists_in_database().unwrap());
    assert!(matches!(node.get_schema("shop"), Err(Error::InvalidArgument { .. })));
}

#[test]
fn closed_session_rejects_execute() {
    let node = node();
    let people = people(&node);
    let mut find = people.find("true").unwrap();
    node.close();
    assert!(!node.is_open());
    match find.execute() {
        Err(Error::IllegalState { reason, .. }) => assert_eq!(reason, "session is closed"),
        other => panic!("Expected IllegalState, got {:?}", other.err()),
    }
}
