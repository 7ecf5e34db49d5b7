//! Table Tests
//!
//! insert / select / update / delete on tables and views.

use crate::common::*;
use fluentdb::{expr, ColumnDef, Error, Row, Value};
use serde_json::json;

fn column(rows: &[Row], name: &str) -> Vec<Value> {
    rows.iter()
        .map(|r| r.get(name).cloned().unwrap_or(Value::Null))
        .collect()
}

// ============================================================================
// Insert
// ============================================================================

#[test]
fn insert_reports_auto_increment() {
    let node = node();
    let users = users(&node);
    let mut insert = users.insert_columns(&["name"]).unwrap();
    insert.values(["brenda"]).unwrap().values(["bob"]).unwrap();
    let result = insert.execute().unwrap();
    assert_eq!(result.affected_item_count(), 2);
    assert_eq!(result.auto_increment_value(), Some(8));
}

#[test]
fn insert_full_rows_and_documents() {
    let node = node();
    let users = users(&node);
    let mut insert = users.insert();
    insert.values([Value::from(100), Value::from("zed"), Value::Null]).unwrap();
    insert.execute().unwrap();

    let mut insert = users.insert_document(doc(json!({"name": "yan", "age": 30}))).unwrap();
    assert_eq!(insert.execute().unwrap().auto_increment_value(), Some(101));

    let mut select = users.select(&["id", "name"]).unwrap();
    select.where_("id >= 100").unwrap().order_by(&["id"]).unwrap();
    let rows = select.execute().unwrap().fetch_all();
    assert_eq!(column(&rows, "name"), vec![Value::from("zed"), Value::from("yan")]);
}

#[test]
fn insert_not_null_violation_writes_nothing() {
    let node = node();
    let users = users(&node);
    let mut insert = users.insert_columns(&["name", "age"]).unwrap();
    insert
        .values([Value::from("ok"), Value::from(1)])
        .unwrap()
        .values([Value::Null, Value::from(2)])
        .unwrap();
    let err = insert.execute().err().unwrap();
    assert_eq!(session_code(&err), 1048);

    let mut select = users.select(&["name"]).unwrap();
    assert_eq!(select.execute().unwrap().count(), 7);
}

#[test]
fn insert_expression_values() {
    let node = node();
    let users = users(&node);
    let mut insert = users.insert_columns(&["name", "age"]).unwrap();
    insert.values([expr("concat('x', 'y')"), expr("6 * 7")]).unwrap();
    insert.execute().unwrap();

    let mut select = users.select(&["age"]).unwrap();
    select.where_("name = 'xy'").unwrap();
    let row = select.execute().unwrap().fetch_one().unwrap();
    assert_eq!(row.get("age"), Some(&Value::Int(42)));
}

// ============================================================================
// Select
// ============================================================================

#[test]
fn select_where_order_limit_offset() {
    let node = node();
    let users = users(&node);
    let mut select = users.select(&["name", "age"]).unwrap();
    select
        .where_("age > :min")
        .unwrap()
        .order_by(&["age desc", "name"])
        .unwrap()
        .limit(3)
        .unwrap()
        .offset(1)
        .unwrap()
        .bind("min", 13)
        .unwrap();
    let mut result = select.execute().unwrap();
    assert_eq!(result.columns(), ["name", "age"]);
    let rows = result.fetch_all();
    // jack 17, donna 16, adam 15, angel 14 ...
    assert_eq!(
        column(&rows, "name"),
        vec![Value::from("donna"), Value::from("adam"), Value::from("angel")]
    );
}

#[test]
fn select_all_columns_and_expressions() {
    let node = node();
    let users = users(&node);
    let mut select = users.select::<&str>(&[]).unwrap();
    let result = select.execute().unwrap();
    assert_eq!(result.columns(), ["id", "name", "age"]);
    assert_eq!(result.count(), 7);

    let mut select = users.select(&["upper(name) AS shout", "age * 2"]).unwrap();
    select.where_("id = 1").unwrap();
    let mut result = select.execute().unwrap();
    assert_eq!(result.columns(), ["shout", "age * 2"]);
    let row = result.fetch_one().unwrap();
    assert_eq!(row.values(), [Value::from("JACK"), Value::Int(34)]);
}

#[test]
fn select_unknown_column_is_session_error() {
    let node = node();
    let users = users(&node);
    let mut select = users.select(&["salary"]).unwrap();
    let err = select.execute().err().unwrap();
    assert_eq!(session_code(&err), 1054);
}

// ============================================================================
// Update / Delete
// ============================================================================

#[test]
fn update_with_expression_and_binding() {
    let node = node();
    let users = users(&node);
    let mut update = users.update();
    update
        .set("age", expr("age + :delta"))
        .unwrap()
        .where_("name like 'a%'")
        .unwrap()
        .bind("delta", 10)
        .unwrap();
    assert_eq!(update.execute().unwrap().affected_item_count(), 3);

    let mut select = users.select(&["age"]).unwrap();
    select.where_("name like 'a%'").unwrap().order_by(&["id"]).unwrap();
    let rows = select.execute().unwrap().fetch_all();
    assert_eq!(column(&rows, "age"), vec![Value::Int(25), Value::Int(23), Value::Int(24)]);
}

#[test]
fn update_order_by_limit() {
    let node = node();
    let users = users(&node);
    let mut update = users.update();
    update
        .set("name", "youngest")
        .unwrap()
        .where_("true")
        .unwrap()
        .order_by(&["age"])
        .unwrap()
        .limit(1)
        .unwrap();
    assert_eq!(update.execute().unwrap().affected_item_count(), 1);

    let mut select = users.select(&["age"]).unwrap();
    select.where_("name = 'youngest'").unwrap();
    let row = select.execute().unwrap().fetch_one().unwrap();
    assert_eq!(row.get("age"), Some(&Value::Int(13)));
}

#[test]
fn delete_where_and_limit() {
    let node = node();
    let users = users(&node);
    let mut delete = users.delete();
    delete.where_("age = 14").unwrap().order_by(&["name"]).unwrap().limit(2).unwrap();
    assert_eq!(delete.execute().unwrap().affected_item_count(), 2);

    let mut select = users.select(&["name"]).unwrap();
    select.where_("age = 14").unwrap();
    let rows = select.execute().unwrap().fetch_all();
    assert_eq!(column(&rows, "name"), vec![Value::from("carol")]);
}

#[test]
fn delete_missing_binding() {
    let node = node();
    let users = users(&node);
    let mut delete = users.delete();
    delete.where_("id = :id").unwrap();
    assert!(matches!(delete.execute(), Err(Error::MissingBinding { .. })));
}

// ============================================================================
// Views
// ============================================================================

#[test]
fn view_reads_and_writes_base_table() {
    let node = node();
    let users = users(&node);
    let schema = node.get_schema("test").unwrap();
    let view = schema
        .create_view(
            "ages",
            "users",
            &[
                ("who".to_string(), "name".to_string()),
                ("years".to_string(), "age".to_string()),
            ],
        )
        .unwrap();
    assert!(view.is_view().unwrap());
    assert!(!users.is_view().unwrap());

    let mut select = view.select::<&str>(&[]).unwrap();
    select.where_("years = 17").unwrap();
    let mut result = select.execute().unwrap();
    assert_eq!(result.columns(), ["who", "years"]);
    assert_eq!(result.fetch_one().unwrap().get("who"), Some(&Value::from("jack")));

    let mut insert = view.insert_columns(&["who", "years"]).unwrap();
    insert.values([Value::from("vic"), Value::from(40)]).unwrap();
    assert_eq!(insert.execute().unwrap().auto_increment_value(), Some(8));

    let mut update = view.update();
    update.set("years", 41).unwrap().where_("who = 'vic'").unwrap();
    update.execute().unwrap();

    let mut select = users.select(&["id", "age"]).unwrap();
    select.where_("name = 'vic'").unwrap();
    let row = select.execute().unwrap().fetch_one().unwrap();
    assert_eq!(row.values(), [Value::Int(8), Value::Int(41)]);

    let names: Vec<String> = schema
        .get_tables()
        .unwrap()
        .iter()
        .map(|t| t.name().to_string())
        .collect();
    assert_eq!(names, vec!["ages", "users"]);
}

#[test]
fn table_handles_check_existence() {
    let node = node();
    let schema = node.get_schema("test").unwrap();
    schema.create_table("t", &[ColumnDef::new("a")]).unwrap();
    assert!(schema.get_table("t").unwrap().exists_in_database().unwrap());
    assert!(matches!(schema.get_table("nope"), Err(Error::InvalidArgument { .. })));
    assert!(matches!(schema.get_collection("t"), Err(Error::InvalidArgument { .. })));
    schema.drop_table("t").unwrap();
    assert!(schema.get_table("t").is_err());
}
