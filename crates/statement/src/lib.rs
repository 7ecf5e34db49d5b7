//! # fluentdb statement layer
//!
//! Staged CRUD statement builders with deferred execution and parameter
//! binding.
//!
//! ## Quick Start
//!
//! ```text
//! use fluentdb_statement::NodeSession;
//!
//! let node = NodeSession::new(session);
//! let people = node.get_schema("test")?.get_collection("people")?;
//!
//! let mut stmt = people.modify("name = :who")?;
//! stmt.set("age", 18)?.bind("who", "jack")?;
//! let result = stmt.execute()?;
//! assert_eq!(result.affected_item_count(), 1);
//! ```
//!
//! ## Builders
//!
//! | Handle | Builders |
//! |--------|----------|
//! | [`Collection`] | [`CollectionAdd`], [`CollectionFind`], [`CollectionModify`] |
//! | [`Collection`] | [`CollectionRemove`], [`CollectionCreateIndex`] |
//! | [`Table`] | [`TableInsert`], [`TableSelect`], [`TableUpdate`], [`TableDelete`] |
//! | [`NodeSession`] | [`SqlExecute`] |
//!
//! Each builder walks a fixed stage machine (see [`stage`]). A call that is
//! not legal in the current stage fails with `IllegalState` and leaves the
//! builder untouched. [`Crud::call`] exposes the same methods by name to
//! script bindings.

mod args;
mod bind;
mod collection;
mod common;
mod crud;
mod dispatch;
pub mod placeholder;
mod result;
mod schema;
mod session;
mod sql;
pub mod stage;
mod table;

#[cfg(test)]
mod testing;

// =============================================================================
// Public API
// =============================================================================

pub use bind::BindTable;
pub use collection::{
    generate_document_id, Collection, CollectionAdd, CollectionCreateIndex, CollectionFind,
    CollectionModify, CollectionRemove, IndexType, DOCUMENT_ID_FIELD,
};
pub use crud::{Crud, Outcome};
pub use result::{DocResult, Row, RowResult, SqlResult, WriteResult};
pub use schema::Schema;
pub use session::NodeSession;
pub use sql::SqlExecute;
pub use stage::{Method, Stage, StatementKind};
pub use table::{Table, TableDelete, TableInsert, TableSelect, TableUpdate};
