//! Session collaborator contract.
//!
//! A [`Session`] executes finalized statements and owns connection state,
//! the current schema and transactions. Builders share it as
//! `Arc<dyn Session>`; every method takes `&self`, so implementations carry
//! their own interior locking.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::SessionError;
use crate::path::DocPath;
use crate::raw::RawResult;
use crate::statement::Statement;

/// Code used by the default DDL implementations.
pub const UNSUPPORTED_BY_SESSION: u32 = 5000;

/// Kind of a named schema object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    Collection,
    Table,
    View,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectKind::Collection => write!(f, "collection"),
            ObjectKind::Table => write!(f, "table"),
            ObjectKind::View => write!(f, "view"),
        }
    }
}

/// Column declaration for `create_table`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    /// Filled from the table counter when omitted on insert
    pub auto_increment: bool,
    pub nullable: bool,
}

impl ColumnDef {
    /// Nullable column
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            auto_increment: false,
            nullable: true,
        }
    }

    /// Non-null auto-increment key column
    pub fn auto_increment(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            auto_increment: true,
            nullable: false,
        }
    }

    /// Reject nulls
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }
}

/// One indexed document member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexField {
    pub path: DocPath,
    /// Column type of the generated index column, such as `TEXT(20)`
    pub column_type: String,
    /// Documents missing the member are rejected
    pub required: bool,
}

impl IndexField {
    /// Member path as the server spells it, `$.address.city`.
    pub fn member(&self) -> String {
        format!("$.{}", self.path)
    }
}

/// Secondary index over collection documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDefinition {
    pub name: String,
    pub unique: bool,
    pub fields: Vec<IndexField>,
}

fn unsupported(operation: &str) -> SessionError {
    SessionError::new(
        UNSUPPORTED_BY_SESSION,
        format!("{} is not supported by this session", operation),
    )
}

/// Executes statements on behalf of the builders.
pub trait Session: Send + Sync {
    // ==================== Execution ====================

    /// Run one finalized statement.
    fn run_statement(&self, statement: &Statement) -> Result<RawResult, SessionError>;

    // ==================== Lifecycle ====================

    /// Connection URI without password.
    fn uri(&self) -> String;

    /// Whether statements can still be run.
    fn is_open(&self) -> bool;

    /// Close the session. Closing twice is harmless.
    fn close(&self);

    /// Schema given at connect time.
    fn default_schema(&self) -> Option<String>;

    /// Schema used by unqualified SQL.
    fn current_schema(&self) -> Option<String>;

    /// Switch the current schema.
    fn set_current_schema(&self, name: &str) -> Result<(), SessionError>;

    // ==================== Transactions ====================

    fn start_transaction(&self) -> Result<(), SessionError>;

    fn commit(&self) -> Result<(), SessionError>;

    fn rollback(&self) -> Result<(), SessionError>;

    /// Ask the session to report warnings with each result.
    fn set_fetch_warnings(&self, enabled: bool);

    // ==================== Schema Objects ====================

    fn create_schema(&self, name: &str) -> Result<(), SessionError> {
        let _ = name;
        Err(unsupported("create_schema"))
    }

    fn drop_schema(&self, name: &str) -> Result<(), SessionError> {
        let _ = name;
        Err(unsupported("drop_schema"))
    }

    fn schema_names(&self) -> Result<Vec<String>, SessionError> {
        Err(unsupported("schema_names"))
    }

    fn create_collection(&self, schema: &str, name: &str) -> Result<(), SessionError> {
        let _ = (schema, name);
        Err(unsupported("create_collection"))
    }

    fn drop_collection(&self, schema: &str, name: &str) -> Result<(), SessionError> {
        let _ = (schema, name);
        Err(unsupported("drop_collection"))
    }

    /// Add a secondary index to an existing collection.
    fn create_collection_index(
        &self,
        schema: &str,
        collection: &str,
        index: &IndexDefinition,
    ) -> Result<(), SessionError> {
        let _ = (schema, collection, index);
        Err(unsupported("create_collection_index"))
    }

    fn create_table(
        &self,
        schema: &str,
        name: &str,
        columns: &[ColumnDef],
    ) -> Result<(), SessionError> {
        let _ = (schema, name, columns);
        Err(unsupported("create_table"))
    }

    fn drop_table(&self, schema: &str, name: &str) -> Result<(), SessionError> {
        let _ = (schema, name);
        Err(unsupported("drop_table"))
    }

    /// Create a view exposing `(alias, column)` pairs of `base_table`.
    fn create_view(
        &self,
        schema: &str,
        name: &str,
        base_table: &str,
        columns: &[(String, String)],
    ) -> Result<(), SessionError> {
        let _ = (schema, name, base_table, columns);
        Err(unsupported("create_view"))
    }

    /// Kind of the named object, `None` when it does not exist.
    fn object_kind(&self, schema: &str, name: &str) -> Result<Option<ObjectKind>, SessionError> {
        let _ = (schema, name);
        Err(unsupported("object_kind"))
    }

    /// Names of every object of `kind` in `schema`.
    fn object_names(&self, schema: &str, kind: ObjectKind) -> Result<Vec<String>, SessionError> {
        let _ = (schema, kind);
        Err(unsupported("object_names"))
    }
}
