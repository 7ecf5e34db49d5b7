//! Dynamic invocation layer for script bindings.
//!
//! Scripts call builder methods by name with loosely typed arguments.
//! [`Crud::call`] checks the stage, the argument count and the argument
//! types, then forwards to the typed builder method.

use fluentdb_core::{Error, Result, Value};

use crate::result::{DocResult, RowResult, SqlResult, WriteResult};
use crate::stage::{self, Method, Stage, StatementKind};

/// What a dynamic call produced.
#[derive(Debug)]
pub enum Outcome {
    /// Chain call; the builder itself is the result
    Chained,
    Write(WriteResult),
    Docs(DocResult),
    Rows(RowResult),
    Sql(SqlResult),
}

impl Outcome {
    pub fn is_chained(&self) -> bool {
        matches!(self, Outcome::Chained)
    }

    pub fn into_write(self) -> Option<WriteResult> {
        match self {
            Outcome::Write(r) => Some(r),
            _ => None,
        }
    }

    pub fn into_docs(self) -> Option<DocResult> {
        match self {
            Outcome::Docs(r) => Some(r),
            _ => None,
        }
    }

    pub fn into_rows(self) -> Option<RowResult> {
        match self {
            Outcome::Rows(r) => Some(r),
            _ => None,
        }
    }

    pub fn into_sql(self) -> Option<SqlResult> {
        match self {
            Outcome::Sql(r) => Some(r),
            _ => None,
        }
    }
}

/// Builder reachable by method name.
pub trait Crud {
    fn kind(&self) -> StatementKind;

    fn stage(&self) -> Stage;

    /// Methods legal right now.
    fn allowed(&self) -> &'static [Method] {
        stage::allowed(self.kind(), self.stage())
    }

    /// Names of the methods legal right now, as scripts see them.
    fn allowed_methods(&self) -> Vec<&'static str> {
        self.allowed().iter().map(Method::name).collect()
    }

    /// Invoke `method` with script arguments.
    fn call(&mut self, method: &str, args: &[Value]) -> Result<Outcome>;
}

/// Look up `name` for `kind` and check it is legal in `allowed`.
pub(crate) fn resolve(kind: StatementKind, allowed: &[Method], name: &str) -> Result<Method> {
    let method = Method::lookup(kind, name).ok_or_else(|| {
        Error::invalid_argument(
            format!("{}.{}", kind.class_name(), name),
            format!("Unknown method '{}'", name),
        )
    })?;
    stage::check(kind, allowed, method)?;
    Ok(method)
}
