//! Recording session used by the builder unit tests.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use fluentdb_core::{
    ColumnDef, IndexDefinition, ObjectKind, RawResult, Session, SessionError, Statement, Target,
};

/// Records every statement and answers with queued results. Keeps a
/// bare catalog of object names for the handle tests.
pub(crate) struct RecordingSession {
    pub statements: Mutex<Vec<Statement>>,
    replies: Mutex<VecDeque<Result<RawResult, SessionError>>>,
    open: AtomicBool,
    schemas: Mutex<BTreeSet<String>>,
    objects: Mutex<BTreeMap<(String, String), ObjectKind>>,
    current: Mutex<Option<String>>,
    pub transactions: Mutex<Vec<&'static str>>,
    pub indexes: Mutex<Vec<(String, IndexDefinition)>>,
}

impl RecordingSession {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            statements: Mutex::new(Vec::new()),
            replies: Mutex::new(VecDeque::new()),
            open: AtomicBool::new(true),
            schemas: Mutex::new(BTreeSet::from(["test".to_string()])),
            objects: Mutex::new(BTreeMap::new()),
            current: Mutex::new(Some("test".into())),
            transactions: Mutex::new(Vec::new()),
            indexes: Mutex::new(Vec::new()),
        })
    }

    /// Queue the reply for the next statement. Without one, the session
    /// answers `RawResult::affected(1)`.
    pub fn reply(&self, reply: Result<RawResult, SessionError>) {
        self.replies.lock().push_back(reply);
    }

    pub fn last(&self) -> Option<Statement> {
        self.statements.lock().last().cloned()
    }

    pub fn count(&self) -> usize {
        self.statements.lock().len()
    }
}

impl Session for RecordingSession {
    fn run_statement(&self, statement: &Statement) -> Result<RawResult, SessionError> {
        self.statements.lock().push(statement.clone());
        self.replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(RawResult::affected(1)))
    }

    fn uri(&self) -> String {
        "recording@localhost:33060/test".into()
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
    }

    fn default_schema(&self) -> Option<String> {
        Some("test".into())
    }

    fn current_schema(&self) -> Option<String> {
        self.current.lock().clone()
    }

    fn set_current_schema(&self, name: &str) -> Result<(), SessionError> {
        *self.current.lock() = Some(name.to_string());
        Ok(())
    }

    fn start_transaction(&self) -> Result<(), SessionError> {
        self.transactions.lock().push("start");
        Ok(())
    }

    fn commit(&self) -> Result<(), SessionError> {
        self.transactions.lock().push("commit");
        Ok(())
    }

    fn rollback(&self) -> Result<(), SessionError> {
        self.transactions.lock().push("rollback");
        Ok(())
    }

    fn set_fetch_warnings(&self, _: bool) {}

    fn create_schema(&self, name: &str) -> Result<(), SessionError> {
        if !self.schemas.lock().insert(name.to_string()) {
            return Err(SessionError::new(
                1007,
                format!("Can't create database '{}'; database exists", name),
            ));
        }
        Ok(())
    }

    fn drop_schema(&self, name: &str) -> Result<(), SessionError> {
        self.schemas.lock().remove(name);
        self.objects.lock().retain(|(schema, _), _| schema != name);
        Ok(())
    }

    fn schema_names(&self) -> Result<Vec<String>, SessionError> {
        Ok(self.schemas.lock().iter().cloned().collect())
    }

    fn create_collection(&self, schema: &str, name: &str) -> Result<(), SessionError> {
        self.create(schema, name, ObjectKind::Collection)
    }

    fn drop_collection(&self, schema: &str, name: &str) -> Result<(), SessionError> {
        self.objects.lock().remove(&(schema.to_string(), name.to_string()));
        Ok(())
    }

    fn create_collection_index(
        &self,
        _: &str,
        collection: &str,
        index: &IndexDefinition,
    ) -> Result<(), SessionError> {
        if let Some(Err(e)) = self.replies.lock().pop_front() {
            return Err(e);
        }
        self.indexes.lock().push((collection.to_string(), index.clone()));
        Ok(())
    }

    fn create_table(&self, schema: &str, name: &str, _: &[ColumnDef]) -> Result<(), SessionError> {
        self.create(schema, name, ObjectKind::Table)
    }

    fn drop_table(&self, schema: &str, name: &str) -> Result<(), SessionError> {
        self.objects.lock().remove(&(schema.to_string(), name.to_string()));
        Ok(())
    }

    fn create_view(
        &self,
        schema: &str,
        name: &str,
        _: &str,
        _: &[(String, String)],
    ) -> Result<(), SessionError> {
        self.create(schema, name, ObjectKind::View)
    }

    fn object_kind(&self, schema: &str, name: &str) -> Result<Option<ObjectKind>, SessionError> {
        Ok(self
            .objects
            .lock()
            .get(&(schema.to_string(), name.to_string()))
            .copied())
    }

    fn object_names(&self, schema: &str, kind: ObjectKind) -> Result<Vec<String>, SessionError> {
        Ok(self
            .objects
            .lock()
            .iter()
            .filter(|((s, _), k)| s == schema && **k == kind)
            .map(|((_, name), _)| name.clone())
            .collect())
    }
}

impl RecordingSession {
    fn create(&self, schema: &str, name: &str, kind: ObjectKind) -> Result<(), SessionError> {
        let mut objects = self.objects.lock();
        let key = (schema.to_string(), name.to_string());
        if objects.contains_key(&key) {
            return Err(SessionError::new(1050, format!("Table '{}' already exists", name)));
        }
        objects.insert(key, kind);
        Ok(())
    }
}

pub(crate) fn collection() -> Target {
    Target::collection("test", "people")
}

pub(crate) fn table() -> Target {
    Target::table("test", "users")
}
