//! fluentdb - fluent CRUD statement builders with deferred execution
//!
//! Statements are built through staged method chains, bound to named or
//! positional parameters, and executed against a [`Session`] collaborator.
//! The workspace ships [`MemorySession`], an in-memory collaborator, so
//! everything can run without a server.
//!
//! # Quick Start
//!
//! ```
//! use fluentdb::{connect_memory, ColumnDef, ConnectionData, Value};
//!
//! let node = connect_memory(&"root@localhost/test".parse::<ConnectionData>().unwrap());
//! let schema = node.get_schema("test").unwrap();
//! let users = schema
//!     .create_table("users", &[ColumnDef::auto_increment("id"), ColumnDef::new("name")])
//!     .unwrap();
//!
//! let mut insert = users.insert_columns(&["name"]).unwrap();
//! insert.values(["jack"]).unwrap();
//! assert_eq!(insert.execute().unwrap().auto_increment_value(), Some(1));
//!
//! let mut select = users.select(&["name"]).unwrap();
//! select.where_("id = :id").unwrap().bind("id", 1).unwrap();
//! let mut rows = select.execute().unwrap();
//! assert_eq!(rows.fetch_one().unwrap().get("name"), Some(&Value::from("jack")));
//! ```
//!
//! # Layout
//!
//! - `fluentdb-core`: values, paths, statements, errors, the `Session` trait
//! - `fluentdb-statement`: builders, binding, dispatch, results, handles
//! - `fluentdb-memory`: the in-memory collaborator
//! - this crate: re-exports, [`ClientConfig`], [`logging`], [`StoredSessions`]

pub mod config;
pub mod logging;
pub mod registry;

pub use config::{ClientConfig, SessionConfig, CONFIG_FILE_NAME};
pub use registry::{connect_default, connect_memory, ConnectionData, StoredSessions};

pub use fluentdb_core::{
    expr, ColumnDef, DocPath, Error, Expression, IndexDefinition, IndexField, ObjectKind, Result,
    Session, SessionError, Statement, Value, Warning, WarningLevel,
};
pub use fluentdb_memory::MemorySession;
pub use fluentdb_statement::{
    generate_document_id, BindTable, Collection, CollectionAdd, CollectionCreateIndex,
    CollectionFind, CollectionModify, CollectionRemove, Crud, DocResult, IndexType, Method,
    NodeSession, Outcome, Row, RowResult, Schema, SqlExecute, SqlResult, Stage, StatementKind,
    Table, TableDelete, TableInsert, TableSelect, TableUpdate, WriteResult, DOCUMENT_ID_FIELD,
};
