//! Collection Tests
//!
//! add / find / modify / remove against the memory session, including id
//! generation, projection, binding and the document id guard.

use crate::common::*;
use fluentdb::{expr, Error, IndexType, Value};
use serde_json::json;

// ============================================================================
// Add
// ============================================================================

#[test]
fn add_generates_ids_only_when_missing() {
    let node = node();
    let people = node.get_schema("test").unwrap().create_collection("people").unwrap();

    let mut add = people
        .add(doc(json!([{"name": "jack"}, {"_id": "given", "name": "adam"}])))
        .unwrap();
    let result = add.execute().unwrap();
    assert_eq!(result.affected_item_count(), 2);
    let ids = result.last_document_ids().unwrap().to_vec();
    assert_eq!(ids.len(), 1);

    let mut find = people.find("name = 'jack'").unwrap();
    let jack = find.execute().unwrap().fetch_one().unwrap();
    assert_eq!(jack.get("_id"), Some(&Value::from(ids[0].as_str())));
}

#[test]
fn add_reexecute_uses_fresh_ids() {
    let node = node();
    let people = node.get_schema("test").unwrap().create_collection("people").unwrap();
    let mut add = people.add(doc(json!({"name": "jack"}))).unwrap();
    let first = add.execute().unwrap().last_document_id().unwrap().to_string();
    let second = add.execute().unwrap().last_document_id().unwrap().to_string();
    assert_ne!(first, second);

    let mut find = people.find(None::<&str>).unwrap();
    assert_eq!(find.execute().unwrap().count(), 2);
}

#[test]
fn add_duplicate_id_is_rejected_atomically() {
    let node = node();
    let people = people(&node);
    let mut add = people
        .add(doc(json!([{"_id": "new", "name": "x"}, {"_id": "1", "name": "y"}])))
        .unwrap();
    let err = add.execute().err().unwrap();
    assert_eq!(session_code(&err), 1062);

    let mut find = people.find("_id = 'new'").unwrap();
    assert_eq!(find.execute().unwrap().count(), 0);
}

// ============================================================================
// Find
// ============================================================================

#[test]
fn find_with_binding_sort_limit_skip() {
    let node = node();
    let people = people(&node);
    let mut find = people.find("age < :years AND gender = :g").unwrap();
    find.sort(&["age desc", "name"])
        .unwrap()
        .limit(2)
        .unwrap()
        .skip(1)
        .unwrap()
        .bind("years", 16)
        .unwrap()
        .bind("g", "male")
        .unwrap();
    let docs = find.execute().unwrap().fetch_all();
    // adam 15, angel 14, brian 14
    assert_eq!(names(&docs), vec!["angel", "brian"]);
}

#[test]
fn find_projection_and_expressions() {
    let node = node();
    let people = people(&node);
    let mut find = people.find("_id = '1'").unwrap();
    find.fields(&["name", "age + 1 AS next_age"]).unwrap();
    let jack = find.execute().unwrap().fetch_one().unwrap();
    assert_eq!(jack, doc(json!({"name": "jack", "next_age": 18})));
}

#[test]
fn find_rebinding_reexecutes() {
    let node = node();
    let people = people(&node);
    let mut find = people.find("name like :pattern").unwrap();
    find.bind("pattern", "a%").unwrap();
    assert_eq!(find.execute().unwrap().count(), 3);
    find.bind("pattern", "%n%").unwrap();
    let docs = find.execute().unwrap().fetch_all();
    assert_eq!(names(&docs), vec!["brian", "donna", "angel"]);
}

#[test]
fn find_missing_binding_keeps_statement_usable() {
    let node = node();
    let people = people(&node);
    let mut find = people.find("age = :age").unwrap();
    match find.execute() {
        Err(Error::MissingBinding { placeholders, .. }) => assert_eq!(placeholders, vec!["age"]),
        other => panic!("Expected MissingBinding, got {:?}", other.err()),
    }
    find.bind("age", 13).unwrap();
    let docs = find.execute().unwrap().fetch_all();
    assert_eq!(names(&docs), vec!["alma"]);
}

#[test]
fn find_result_rewinds() {
    let node = node();
    let people = people(&node);
    let mut find = people.find("age = 14").unwrap();
    let mut result = find.execute().unwrap();
    assert_eq!(result.fetch_all().len(), 3);
    assert!(result.fetch_all().is_empty());
    assert!(result.fetch_one().is_none());
    result.rewind();
    assert_eq!(result.fetch_one().and_then(|d| d.get("name").cloned()), Some(Value::from("brian")));
}

// ============================================================================
// Modify
// ============================================================================

#[test]
fn modify_set_unset_and_arrays() {
    let node = node();
    let people = people(&node);
    let mut modify = people.modify("_id = :id").unwrap();
    modify
        .set("age", expr("age + 1"))
        .unwrap()
        .unset(["gender"])
        .unwrap()
        .set("hobbies", doc(json!(["chess"])))
        .unwrap()
        .array_append("hobbies", "golf")
        .unwrap()
        .array_insert("hobbies[0]", "reading")
        .unwrap()
        .bind("id", "1")
        .unwrap();
    assert_eq!(modify.execute().unwrap().affected_item_count(), 1);

    let mut find = people.find("_id = '1'").unwrap();
    let jack = find.execute().unwrap().fetch_one().unwrap();
    assert_eq!(
        jack,
        doc(json!({"_id": "1", "name": "jack", "age": 18, "hobbies": ["reading", "chess", "golf"]}))
    );
}

#[test]
fn modify_merge_and_limit() {
    let node = node();
    let people = people(&node);
    let mut modify = people.modify("gender = 'female'").unwrap();
    modify
        .merge(doc(json!({"club": "chess"})))
        .unwrap()
        .sort(&["age"])
        .unwrap()
        .limit(2)
        .unwrap();
    assert_eq!(modify.execute().unwrap().affected_item_count(), 2);

    let mut find = people.find("club = 'chess'").unwrap();
    find.sort(&["name"]).unwrap();
    assert_eq!(names(&find.execute().unwrap().fetch_all()), vec!["alma", "carol"]);
}

#[test]
fn modify_cannot_touch_document_id() {
    let node = node();
    let people = people(&node);
    let mut modify = people.modify("true").unwrap();
    modify.set("_id", "x").unwrap();
    let err = modify.execute().err().unwrap();
    assert_eq!(session_code(&err), 5053);

    let mut find = people.find("_id = 'x'").unwrap();
    assert_eq!(find.execute().unwrap().count(), 0);
}

#[test]
fn modify_rebinding_gives_independent_results() {
    let node = node();
    let people = people(&node);
    let mut modify = people.modify("name = :data").unwrap();
    modify.set("age", 15).unwrap().bind("data", "angel").unwrap();
    let first = modify.execute().unwrap();
    modify.bind("data", "carol").unwrap();
    let second = modify.execute().unwrap();
    assert_eq!(first.affected_item_count(), 1);
    assert_eq!(second.affected_item_count(), 1);

    let mut find = people.find("age = 15").unwrap();
    find.sort(&["name"]).unwrap();
    assert_eq!(names(&find.execute().unwrap().fetch_all()), vec!["adam", "angel", "carol"]);
}

#[test]
fn modify_set_expression_value() {
    let node = node();
    let people = people(&node);
    let mut modify = people.modify("name = 'jack'").unwrap();
    modify.set("age", expr("13+1")).unwrap();
    assert_eq!(modify.execute().unwrap().affected_item_count(), 1);

    let mut find = people.find("name = 'jack'").unwrap();
    let jack = find.execute().unwrap().fetch_one().unwrap();
    assert_eq!(jack.get("age"), Some(&Value::Int(14)));
}

#[test]
fn unicode_placeholder_names_reach_the_session() {
    let node = node();
    let people = people(&node);
    let mut find = people.find("name = :nombreé").unwrap();
    find.bind("nombreé", "jack").unwrap();
    assert_eq!(names(&find.execute().unwrap().fetch_all()), vec!["jack"]);
}

// ============================================================================
// Remove
// ============================================================================

#[test]
fn remove_with_sort_and_limit() {
    let node = node();
    let people = people(&node);
    let mut remove = people.remove("age >= 14").unwrap();
    remove.sort(&["age desc"]).unwrap().limit(2).unwrap();
    assert_eq!(remove.execute().unwrap().affected_item_count(), 2);

    let mut find = people.find(None::<&str>).unwrap();
    find.sort(&["age desc"]).unwrap();
    let docs = find.execute().unwrap().fetch_all();
    assert_eq!(docs.len(), 5);
    assert_eq!(names(&docs)[0], "adam");
}

#[test]
fn remove_everything_without_criteria() {
    let node = node();
    let people = people(&node);
    let mut remove = people.remove(None::<&str>).unwrap();
    assert_eq!(remove.execute().unwrap().affected_item_count(), 7);
    assert!(people.exists_in_database().unwrap());
}

// ============================================================================
// Indexes
// ============================================================================

#[test]
fn unique_index_rejects_duplicate_add() {
    let node = node();
    let people = people(&node);
    let mut index = people.create_index("by_name", Some(IndexType::Unique)).unwrap();
    index.field("name", "TEXT(20)", true).unwrap();
    assert_eq!(index.execute().unwrap().affected_item_count(), 0);

    let mut add = people.add(doc(json!({"name": "jack", "age": 30}))).unwrap();
    let err = add.execute().err().unwrap();
    assert_eq!(session_code(&err), 1062);

    let mut add = people.add(doc(json!({"age": 30}))).unwrap();
    let err = add.execute().err().unwrap();
    assert_eq!(session_code(&err), 5115);

    let mut find = people.find(None::<&str>).unwrap();
    assert_eq!(find.execute().unwrap().count(), 7);
}

#[test]
fn index_over_existing_duplicates_fails() {
    let node = node();
    let people = people(&node);
    let mut index = people.create_index("by_age", Some(IndexType::Unique)).unwrap();
    index.field("age", "INTEGER", false).unwrap();
    let err = index.execute().err().unwrap();
    assert_eq!(session_code(&err), 1062);

    let mut plain = people.create_index("by_age", None).unwrap();
    plain.field("age", "INTEGER", false).unwrap();
    plain.execute().unwrap();
    let mut again = people.create_index("by_age", None).unwrap();
    again.field("gender", "TEXT(10)", false).unwrap();
    assert_eq!(session_code(&again.execute().err().unwrap()), 1061);
}
