//! `Collection::add` builder.

use std::sync::Arc;

use uuid::Uuid;

use fluentdb_core::{
    Error, InsertPayload, InsertStatement, Result, Session, Statement, Target, Value,
};

use crate::args::Args;
use crate::common::StatementCore;
use crate::crud::{resolve, Crud, Outcome};
use crate::result::WriteResult;
use crate::stage::{Method, Stage, StatementKind};

/// Field holding a document's identifier.
pub const DOCUMENT_ID_FIELD: &str = "_id";

/// Fresh document id: UUID v4 as 32 lowercase hex characters.
pub fn generate_document_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Insertion of one or more documents.
pub struct CollectionAdd {
    core: StatementCore,
    documents: Vec<Value>,
}

impl CollectionAdd {
    /// Empty builder; `add` must be called before `execute`.
    pub fn new(session: Arc<dyn Session>, target: Target) -> Self {
        Self {
            core: StatementCore::new(StatementKind::CollectionAdd, session, Some(target)),
            documents: Vec::new(),
        }
    }

    /// Stage a document or a list of documents.
    pub fn add(&mut self, documents: impl Into<Value>) -> Result<&mut Self> {
        self.core.enter(Method::Add)?;
        let function = self.core.function(Method::Add);
        let staged = match documents.into() {
            doc @ Value::Object(_) => vec![doc],
            Value::Array(items) => {
                if items.is_empty() {
                    return Err(Error::argument_count(function, "at least 1", 0));
                }
                if !items.iter().all(Value::is_object) {
                    return Err(Error::type_mismatch(
                        function,
                        1,
                        "a document or a list of documents",
                    ));
                }
                items
            }
            _ => {
                return Err(Error::type_mismatch(
                    function,
                    1,
                    "a document or a list of documents",
                ))
            }
        };
        self.documents.extend(staged);
        self.core.advance(Method::Add);
        Ok(self)
    }

    /// Insert the staged documents. Documents without `_id` receive a fresh
    /// id on every execution.
    pub fn execute(&mut self) -> Result<WriteResult> {
        self.core.enter(Method::Execute)?;
        let mut generated = Vec::new();
        let documents: Vec<Value> = self
            .documents
            .iter()
            .cloned()
            .map(|mut doc| {
                if let Some(fields) = doc.as_object_mut() {
                    if !fields.contains_key(DOCUMENT_ID_FIELD) {
                        let id = generate_document_id();
                        fields.insert(DOCUMENT_ID_FIELD.to_string(), Value::from(id.as_str()));
                        generated.push(id);
                    }
                }
                doc
            })
            .collect();
        let statement = Statement::Insert(InsertStatement {
            target: self.core.target()?,
            payload: InsertPayload::Documents(documents),
        });
        let dispatched = self.core.dispatch(&statement)?;
        Ok(WriteResult::new(dispatched.raw, generated, dispatched.elapsed))
    }
}

impl Crud for CollectionAdd {
    fn kind(&self) -> StatementKind {
        self.core.kind
    }

    fn stage(&self) -> Stage {
        self.core.stage
    }

    fn call(&mut self, method: &str, args: &[Value]) -> Result<Outcome> {
        let method = resolve(self.kind(), self.allowed(), method)?;
        let args = Args::new(self.core.function(method), args);
        match method {
            Method::Add => {
                args.at_least(1)?;
                if args.len() == 1 {
                    self.add(args.value(0)?.clone())?;
                } else {
                    for (i, doc) in args.all().iter().enumerate() {
                        if !doc.is_object() {
                            return Err(Error::type_mismatch(args.function(), i + 1, "a document"));
                        }
                    }
                    self.add(Value::Array(args.all().to_vec()))?;
                }
            }
            Method::Execute => {
                args.exactly(0)?;
                return Ok(Outcome::Write(self.execute()?));
            }
            other => {
                return Err(Error::invalid_argument(
                    args.function(),
                    format!("Unknown method '{}'", other),
                ))
            }
        }
        Ok(Outcome::Chained)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{collection, RecordingSession};
    use serde_json::json;

    fn added_documents(session: &RecordingSession) -> Vec<Value> {
        match session.last() {
            Some(Statement::Insert(InsertStatement {
                payload: InsertPayload::Documents(docs),
                ..
            })) => docs,
            other => panic!("Expected document insert, got {:?}", other),
        }
    }

    #[test]
    fn test_generated_id_format() {
        let id = generate_document_id();
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_ids_generated_only_when_missing() {
        let session = RecordingSession::new();
        let mut stmt = CollectionAdd::new(session.clone(), collection());
        stmt.add(Value::from(json!({"name": "a"})))
            .unwrap()
            .add(Value::from(json!([{"_id": "given", "name": "b"}, {"name": "c"}])))
            .unwrap();
        session.reply(Ok(fluentdb_core::RawResult::affected(3)));
        let result = stmt.execute().unwrap();

        let ids = result.last_document_ids().unwrap().to_vec();
        assert_eq!(ids.len(), 2);
        assert_eq!(result.last_document_id().unwrap(), ids[1]);

        let docs = added_documents(&session);
        assert_eq!(docs[1].get("_id"), Some(&Value::from("given")));
        assert_eq!(docs[2].get("_id"), Some(&Value::from(ids[1].as_str())));
    }

    #[test]
    fn test_explicit_ids_report_no_generated_ids() {
        let session = RecordingSession::new();
        let mut stmt = CollectionAdd::new(session, collection());
        stmt.add(Value::from(json!({"_id": "1"}))).unwrap();
        let result = stmt.execute().unwrap();
        assert!(matches!(
            result.last_document_id(),
            Err(Error::Unsupported { .. })
        ));
    }

    #[test]
    fn test_reexecution_generates_fresh_ids() {
        let session = RecordingSession::new();
        let mut stmt = CollectionAdd::new(session, collection());
        stmt.add(Value::from(json!({"name": "a"}))).unwrap();
        let first = stmt.execute().unwrap().last_document_id().unwrap().to_string();
        let second = stmt.execute().unwrap().last_document_id().unwrap().to_string();
        assert_ne!(first, second);
        assert_eq!(stmt.allowed_methods(), vec!["execute"]);
    }

    #[test]
    fn test_add_validation() {
        let session = RecordingSession::new();
        let mut stmt = CollectionAdd::new(session, collection());
        assert!(matches!(stmt.execute(), Err(Error::IllegalState { .. })));
        assert!(matches!(stmt.add(5), Err(Error::TypeMismatch { .. })));
        assert!(matches!(
            stmt.add(Value::Array(vec![])),
            Err(Error::ArgumentCount { .. })
        ));
        assert!(matches!(
            stmt.add(Value::from(json!([{"a": 1}, 2]))),
            Err(Error::TypeMismatch { .. })
        ));
        assert_eq!(stmt.allowed_methods(), vec!["add"]);
    }

    #[test]
    fn test_dynamic_variadic_add() {
        let session = RecordingSession::new();
        let mut stmt = CollectionAdd::new(session.clone(), collection());
        stmt.call(
            "add",
            &[Value::from(json!({"a": 1})), Value::from(json!({"b": 2}))],
        )
        .unwrap();
        assert!(matches!(
            stmt.call("add", &[Value::from(json!({"a": 1})), Value::Int(2)]),
            Err(Error::TypeMismatch { position: 2, .. })
        ));
        stmt.call("execute", &[]).unwrap();
        assert_eq!(added_documents(&session).len(), 2);
    }
}
