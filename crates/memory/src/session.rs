//! In-memory [`Session`] implementation.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use fluentdb_core::{
    ColumnDef, IndexDefinition, ObjectKind, RawResult, Session, SessionError, SqlStatement,
    Statement,
};

use crate::catalog::{codes, unknown_schema, Catalog, CollectionData, Object};
use crate::exec;

const DEFAULT_URI: &str = "memory://localhost";

struct State {
    catalog: Catalog,
    /// Catalog as it was at `start_transaction`
    snapshot: Option<Catalog>,
    current_schema: Option<String>,
    fetch_warnings: bool,
}

/// Session over process memory.
///
/// Every statement runs on a copy of the catalog that replaces the live one
/// only when the statement succeeds. Transactions keep a snapshot to roll
/// back to; schema changes inside a transaction commit it first.
///
/// # Example
///
/// ```
/// use fluentdb_core::Session;
/// use fluentdb_memory::MemorySession;
///
/// let session = MemorySession::with_default_schema("test");
/// assert_eq!(session.current_schema().as_deref(), Some("test"));
/// assert!(session.schema_names().unwrap().contains(&"test".to_string()));
/// ```
pub struct MemorySession {
    uri: String,
    default_schema: Option<String>,
    state: Mutex<State>,
    open: AtomicBool,
}

impl MemorySession {
    /// Session without any schema.
    pub fn new() -> Self {
        Self::build(DEFAULT_URI.to_string(), None)
    }

    /// Session with `schema` created and selected.
    pub fn with_default_schema(schema: impl Into<String>) -> Self {
        let schema = schema.into();
        let uri = format!("{}/{}", DEFAULT_URI, schema);
        Self::build(uri, Some(schema))
    }

    /// Session reporting `uri`, with an optional default schema.
    pub fn with_uri(uri: impl Into<String>, default_schema: Option<String>) -> Self {
        Self::build(uri.into(), default_schema)
    }

    fn build(uri: String, default_schema: Option<String>) -> Self {
        let mut catalog = Catalog::default();
        if let Some(schema) = &default_schema {
            // fresh catalog, cannot collide
            let _ = catalog.create_schema(schema);
        }
        Self {
            uri,
            state: Mutex::new(State {
                catalog,
                snapshot: None,
                current_schema: default_schema.clone(),
                fetch_warnings: false,
            }),
            default_schema,
            open: AtomicBool::new(true),
        }
    }

    /// Whether a transaction is open.
    pub fn in_transaction(&self) -> bool {
        self.state.lock().snapshot.is_some()
    }

    fn ensure_open(&self) -> Result<(), SessionError> {
        if self.is_open() {
            Ok(())
        } else {
            Err(SessionError::new(codes::SERVER_GONE, "Session is closed"))
        }
    }

    /// Run a schema change. An open transaction is committed first.
    fn ddl<T>(
        &self,
        operation: &str,
        f: impl FnOnce(&mut Catalog) -> Result<T, SessionError>,
    ) -> Result<T, SessionError> {
        self.ensure_open()?;
        let mut state = self.state.lock();
        if state.snapshot.take().is_some() {
            tracing::debug!(
                target: "fluentdb::memory",
                operation,
                "Implicit commit before schema change"
            );
        }
        let result = f(&mut state.catalog);
        if let Err(e) = &result {
            tracing::warn!(
                target: "fluentdb::memory",
                operation,
                code = e.code,
                error = %e,
                "Schema change failed"
            );
        }
        result
    }

    fn read<T>(
        &self,
        f: impl FnOnce(&Catalog) -> Result<T, SessionError>,
    ) -> Result<T, SessionError> {
        self.ensure_open()?;
        f(&self.state.lock().catalog)
    }
}

impl Default for MemorySession {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemorySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemorySession")
            .field("uri", &self.uri)
            .field("open", &self.is_open())
            .finish()
    }
}

// =============================================================================
// Transactions
// =============================================================================

fn start(state: &mut State) -> Result<(), SessionError> {
    if state.snapshot.is_some() {
        return Err(SessionError::new(
            codes::TRANSACTION_ACTIVE,
            "A transaction is already active",
        ));
    }
    state.snapshot = Some(state.catalog.clone());
    tracing::debug!(target: "fluentdb::memory", "Transaction started");
    Ok(())
}

fn commit(state: &mut State) -> Result<(), SessionError> {
    state.snapshot.take().ok_or_else(no_transaction)?;
    tracing::debug!(target: "fluentdb::memory", "Transaction committed");
    Ok(())
}

fn rollback(state: &mut State) -> Result<(), SessionError> {
    state.catalog = state.snapshot.take().ok_or_else(no_transaction)?;
    tracing::debug!(target: "fluentdb::memory", "Transaction rolled back");
    Ok(())
}

fn no_transaction() -> SessionError {
    SessionError::new(codes::NO_TRANSACTION, "No transaction is active")
}

fn use_schema(state: &mut State, name: &str) -> Result<(), SessionError> {
    if !state.catalog.has_schema(name) {
        return Err(unknown_schema(name));
    }
    state.current_schema = Some(name.to_string());
    Ok(())
}

/// Session-level SQL commands; `None` when `text` is not one of them.
fn session_command(state: &mut State, sql: &SqlStatement) -> Option<Result<(), SessionError>> {
    let text = sql.text.trim().trim_end_matches(';').trim();
    let words: Vec<&str> = text.split_whitespace().collect();
    let upper: Vec<String> = words.iter().map(|w| w.to_ascii_uppercase()).collect();
    let upper: Vec<&str> = upper.iter().map(String::as_str).collect();
    match upper.as_slice() {
        ["START", "TRANSACTION"] | ["BEGIN"] => Some(start(state)),
        ["COMMIT"] => Some(commit(state)),
        ["ROLLBACK"] => Some(rollback(state)),
        ["USE", _] => Some(use_schema(state, words[1].trim_matches('`'))),
        _ => None,
    }
}

impl Session for MemorySession {
    fn run_statement(&self, statement: &Statement) -> Result<RawResult, SessionError> {
        self.ensure_open()?;
        let mut state = self.state.lock();

        if let Statement::Sql(sql) = statement {
            if let Some(outcome) = session_command(&mut state, sql) {
                return outcome.map(|()| RawResult::default());
            }
        }

        let mut working = state.catalog.clone();
        match exec::run(&mut working, statement) {
            Ok(mut result) => {
                state.catalog = working;
                if !state.fetch_warnings {
                    result.warnings.clear();
                }
                Ok(result)
            }
            Err(e) => {
                tracing::warn!(
                    target: "fluentdb::memory",
                    statement = statement.name(),
                    code = e.code,
                    error = %e,
                    "Statement rejected"
                );
                Err(e)
            }
        }
    }

    fn uri(&self) -> String {
        self.uri.clone()
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    fn close(&self) {
        if self.open.swap(false, Ordering::SeqCst) {
            let mut state = self.state.lock();
            if state.snapshot.is_some() {
                // uncommitted work is discarded on close
                let _ = rollback(&mut state);
            }
            tracing::debug!(target: "fluentdb::memory", uri = %self.uri, "Session closed");
        }
    }

    fn default_schema(&self) -> Option<String> {
        self.default_schema.clone()
    }

    fn current_schema(&self) -> Option<String> {
        self.state.lock().current_schema.clone()
    }

    fn set_current_schema(&self, name: &str) -> Result<(), SessionError> {
        self.ensure_open()?;
        use_schema(&mut self.state.lock(), name)
    }

    fn start_transaction(&self) -> Result<(), SessionError> {
        self.ensure_open()?;
        start(&mut self.state.lock())
    }

    fn commit(&self) -> Result<(), SessionError> {
        self.ensure_open()?;
        commit(&mut self.state.lock())
    }

    fn rollback(&self) -> Result<(), SessionError> {
        self.ensure_open()?;
        rollback(&mut self.state.lock())
    }

    fn set_fetch_warnings(&self, enabled: bool) {
        self.state.lock().fetch_warnings = enabled;
    }

    fn create_schema(&self, name: &str) -> Result<(), SessionError> {
        self.ddl("create_schema", |c| c.create_schema(name))
    }

    fn drop_schema(&self, name: &str) -> Result<(), SessionError> {
        self.ddl("drop_schema", |c| c.drop_schema(name))?;
        let mut state = self.state.lock();
        if state.current_schema.as_deref() == Some(name) {
            state.current_schema = None;
        }
        Ok(())
    }

    fn schema_names(&self) -> Result<Vec<String>, SessionError> {
        self.read(|c| Ok(c.schema_names()))
    }

    fn create_collection(&self, schema: &str, name: &str) -> Result<(), SessionError> {
        self.ddl("create_collection", |c| {
            c.create(schema, name, Object::Collection(CollectionData::default()))
        })
    }

    fn create_collection_index(
        &self,
        schema: &str,
        collection: &str,
        index: &IndexDefinition,
    ) -> Result<(), SessionError> {
        self.ddl("create_collection_index", |c| {
            c.create_index(schema, collection, index)
        })
    }

    fn drop_collection(&self, schema: &str, name: &str) -> Result<(), SessionError> {
        self.ddl("drop_collection", |c| c.drop(schema, name, &[ObjectKind::Collection]))
    }

    fn create_table(
        &self,
        schema: &str,
        name: &str,
        columns: &[ColumnDef],
    ) -> Result<(), SessionError> {
        self.ddl("create_table", |c| c.create_table(schema, name, columns))
    }

    fn drop_table(&self, schema: &str, name: &str) -> Result<(), SessionError> {
        self.ddl("drop_table", |c| {
            c.drop(schema, name, &[ObjectKind::Table, ObjectKind::View])
        })
    }

    fn create_view(
        &self,
        schema: &str,
        name: &str,
        base_table: &str,
        columns: &[(String, String)],
    ) -> Result<(), SessionError> {
        self.ddl("create_view", |c| c.create_view(schema, name, base_table, columns))
    }

    fn object_kind(&self, schema: &str, name: &str) -> Result<Option<ObjectKind>, SessionError> {
        self.read(|c| c.object_kind(schema, name))
    }

    fn object_names(&self, schema: &str, kind: ObjectKind) -> Result<Vec<String>, SessionError> {
        self.read(|c| c.object_names(schema, kind))
    }
}
