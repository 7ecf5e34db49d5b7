//! Core types for fluentdb
//!
//! This crate defines the foundational types shared by the statement builders
//! and session collaborators:
//! - Value: Unified value enum, including deferred expressions
//! - DocPath: Paths into documents and the operations over them
//! - Statement: Finalized instruction set handed to a session
//! - RawResult: Collaborator output before wrapping
//! - Session: Collaborator trait
//! - Error: Error taxonomy shared by every crate

#![warn(clippy::all)]

pub mod error;
pub mod path;
pub mod raw;
pub mod session;
pub mod statement;
pub mod value;

pub use error::{Error, Result, SessionError};
pub use path::{
    append_at_path, get_at_path, get_at_path_mut, insert_at_path, merge_documents,
    remove_at_path, set_at_path, DocPath, PathError, PathParseError, PathSegment,
};
pub use raw::{RawData, RawResult, Warning, WarningLevel};
pub use session::{
    ColumnDef, IndexDefinition, IndexField, ObjectKind, Session, UNSUPPORTED_BY_SESSION,
};
pub use statement::{
    Assignment, Criteria, DeleteStatement, FindStatement, InsertPayload, InsertStatement,
    ModifyStatement, PatchOperation, SortDirection, SortKey, SqlStatement, Statement, Target,
    TargetKind, UpdateStatement,
};
pub use value::{expr, Document, Expression, Value};
