//! In-memory session collaborator for fluentdb.
//!
//! [`MemorySession`] implements [`fluentdb_core::Session`] over process
//! memory: schemas holding collections, tables and views, snapshot
//! transactions, and an evaluator for the filter and expression language the
//! statement builders emit. It has no joins, aggregation or persistence.
//!
//! ```
//! use std::sync::Arc;
//! use fluentdb_core::{ColumnDef, Session};
//! use fluentdb_memory::MemorySession;
//!
//! let session = Arc::new(MemorySession::with_default_schema("test"));
//! session.create_table("test", "users", &[ColumnDef::new("name")]).unwrap();
//! ```

#![warn(clippy::all)]

mod catalog;
pub mod eval;
mod exec;
mod patch;
mod session;

pub use catalog::codes;
pub use eval::EvalError;
pub use patch::PatchError;
pub use session::MemorySession;
