//! In-place document mutation for modify statements.

use thiserror::Error;

use fluentdb_core::{
    append_at_path, insert_at_path, merge_documents, remove_at_path, set_at_path, DocPath,
    PatchOperation, PathError, Value,
};

use crate::catalog::codes;
use crate::eval::{self, DocumentScope, Env, EvalError};

const ID: &str = "_id";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PatchError {
    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error("Invalid data for update operation on document collection table: {0}")]
    Path(#[from] PathError),

    #[error("Forbidden update operation on '$._id' member")]
    IdChange,
}

impl PatchError {
    pub fn code(&self) -> u32 {
        match self {
            PatchError::Eval(e) => e.code(),
            PatchError::Path(_) => codes::INVALID_JSON_PATH,
            PatchError::IdChange => codes::FORBIDDEN_ID_UPDATE,
        }
    }
}

fn touches_id(path: &DocPath) -> bool {
    path.segments().first() == Some(&fluentdb_core::PathSegment::Key(ID.to_string()))
}

/// Apply `operations` in order. Expressions see the document as it was
/// before the first operation.
pub fn apply(
    doc: &mut Value,
    operations: &[PatchOperation],
    env: &mut Env<'_>,
) -> Result<(), PatchError> {
    let original = doc.clone();
    let scope = DocumentScope(&original);
    for op in operations {
        match op {
            PatchOperation::Set { path, value } => {
                if touches_id(path) {
                    return Err(PatchError::IdChange);
                }
                let value = eval::resolve(value, &scope, env)?;
                set_at_path(doc, path, value)?;
            }
            PatchOperation::Unset { paths } => {
                for path in paths {
                    if touches_id(path) {
                        return Err(PatchError::IdChange);
                    }
                    remove_at_path(doc, path);
                }
            }
            PatchOperation::Merge { document } => {
                let document = eval::resolve(document, &scope, env)?;
                if let Some(id) = document.get(ID) {
                    if doc.get(ID) != Some(id) {
                        return Err(PatchError::IdChange);
                    }
                }
                merge_documents(doc, &document);
            }
            PatchOperation::ArrayInsert { path, value } => {
                let value = eval::resolve(value, &scope, env)?;
                match insert_at_path(doc, path, value) {
                    Ok(()) | Err(PathError::NotFound(_)) => {}
                    Err(e) => return Err(e.into()),
                }
            }
            PatchOperation::ArrayAppend { path, value } => {
                let value = eval::resolve(value, &scope, env)?;
                append_at_path(doc, path, value);
            }
            PatchOperation::ArrayDelete { path } => {
                remove_at_path(doc, path);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fluentdb_core::expr;
    use proptest::prelude::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn p(s: &str) -> DocPath {
        s.parse().unwrap()
    }

    fn doc() -> Value {
        json!({"_id": "1", "name": "jack", "age": 17, "hobbies": ["a", "b"]}).into()
    }

    fn run(doc: &mut Value, ops: Vec<PatchOperation>) -> Result<(), PatchError> {
        let named = BTreeMap::new();
        let mut env = Env::new(&named, &[]);
        apply(doc, &ops, &mut env)
    }

    #[test]
    fn test_set_sees_original_document() {
        let mut d = doc();
        run(
            &mut d,
            vec![
                PatchOperation::Set { path: p("age"), value: expr("age + 1") },
                PatchOperation::Set { path: p("next"), value: expr("age + 1") },
            ],
        )
        .unwrap();
        assert_eq!(d.get("age"), Some(&Value::Int(18)));
        assert_eq!(d.get("next"), Some(&Value::Int(18)));
    }

    #[test]
    fn test_id_is_protected() {
        let mut d = doc();
        let set_id = PatchOperation::Set {
            path: p("_id"),
            value: "2".into(),
        };
        let err = run(&mut d, vec![set_id]).unwrap_err();
        assert_eq!(err.code(), codes::FORBIDDEN_ID_UPDATE);
        let err = run(&mut d, vec![PatchOperation::Unset { paths: vec![p("_id")] }]).unwrap_err();
        assert_eq!(err, PatchError::IdChange);

        let same: Value = json!({"_id": "1", "x": 1}).into();
        run(&mut d, vec![PatchOperation::Merge { document: same }]).unwrap();
        assert_eq!(d.get("x"), Some(&Value::Int(1)));
        let other: Value = json!({"_id": "9"}).into();
        assert!(run(&mut d, vec![PatchOperation::Merge { document: other }]).is_err());
    }

    #[test]
    fn test_array_operations() {
        let mut d = doc();
        run(
            &mut d,
            vec![
                PatchOperation::ArrayInsert { path: p("hobbies[0]"), value: "z".into() },
                PatchOperation::ArrayAppend { path: p("hobbies"), value: "c".into() },
                PatchOperation::ArrayDelete { path: p("hobbies[1]") },
                PatchOperation::ArrayInsert { path: p("missing[0]"), value: 1.into() },
                PatchOperation::ArrayDelete { path: p("missing[3]") },
            ],
        )
        .unwrap();
        let hobbies: Value = json!(["z", "b", "c"]).into();
        assert_eq!(d.get("hobbies"), Some(&hobbies));
        assert_eq!(d.get("missing"), None);
    }

    #[test]
    fn test_path_type_mismatch() {
        let mut d = doc();
        let set = PatchOperation::Set {
            path: p("name.first"),
            value: 1.into(),
        };
        let err = run(&mut d, vec![set]).unwrap_err();
        assert_eq!(err.code(), codes::INVALID_JSON_PATH);
    }

    proptest! {
        #[test]
        fn prop_set_then_unset_removes_field(
            field in "[a-z][a-z0-9_]{0,8}",
            value in any::<i64>(),
        ) {
            prop_assume!(field != "name" && field != "age" && field != "hobbies");
            let mut d = doc();
            let before = d.clone();
            run(
                &mut d,
                vec![
                    PatchOperation::Set { path: p(&field), value: value.into() },
                    PatchOperation::Unset { paths: vec![p(&field)] },
                ],
            )
            .unwrap();
            prop_assert_eq!(d, before);
        }

        #[test]
        fn prop_append_then_delete_restores_length(
            items in prop::collection::vec(any::<i32>(), 0..6),
            extra in any::<i32>(),
        ) {
            let len = items.len();
            let mut d: Value = json!({"_id": "1", "list": items}).into();
            run(
                &mut d,
                vec![
                    PatchOperation::ArrayAppend { path: p("list"), value: extra.into() },
                    PatchOperation::ArrayDelete { path: p(&format!("list[{}]", len)) },
                ],
            )
            .unwrap();
            prop_assert_eq!(d.get("list").and_then(Value::as_array).map(|a| a.len()), Some(len));
        }
    }
}
