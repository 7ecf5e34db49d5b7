//! `Table::insert` builder.

use std::sync::Arc;

use fluentdb_core::{
    Error, InsertPayload, InsertStatement, Result, Session, Statement, Target, Value,
};

use crate::args::Args;
use crate::common::StatementCore;
use crate::crud::{resolve, Crud, Outcome};
use crate::result::WriteResult;
use crate::stage::{self, Method, Stage, StatementKind};

fn is_column_value(value: &Value) -> bool {
    value.is_scalar() || value.is_expr()
}

/// Row insertion into a table or view.
pub struct TableInsert {
    core: StatementCore,
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    /// Built from a column/value map; no further rows may be added
    complete: bool,
}

impl TableInsert {
    pub(crate) fn new(session: Arc<dyn Session>, target: Target, columns: Vec<String>) -> Self {
        Self {
            core: StatementCore::new(StatementKind::TableInsert, session, Some(target)),
            columns,
            rows: Vec::new(),
            complete: false,
        }
    }

    /// Single-row insert from a `{column: value}` document.
    pub(crate) fn from_document(
        session: Arc<dyn Session>,
        target: Target,
        document: Value,
    ) -> Result<Self> {
        let function = "Table.insert";
        let Value::Object(fields) = document else {
            return Err(Error::type_mismatch(function, 1, "a document"));
        };
        if fields.is_empty() {
            return Err(Error::invalid_argument(
                function,
                "Column/value document can not be empty",
            ));
        }
        let mut columns = Vec::with_capacity(fields.len());
        let mut row = Vec::with_capacity(fields.len());
        for (column, value) in fields {
            if !is_column_value(&value) {
                return Err(Error::invalid_argument(
                    function,
                    format!("Unsupported value for column '{}': {}", column, value.type_name()),
                ));
            }
            columns.push(column);
            row.push(value);
        }
        let mut stmt = Self::new(session, target, columns);
        stmt.rows.push(row);
        stmt.complete = true;
        stmt.core.advance(Method::Values);
        Ok(stmt)
    }

    fn capabilities(&self) -> &'static [Method] {
        if self.complete && self.core.stage == Stage::Operation {
            &[Method::Execute]
        } else {
            self.core.allowed()
        }
    }

    /// Stage one row. With declared columns the row must match them.
    pub fn values<I, V>(&mut self, row: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        stage::check(self.core.kind, self.capabilities(), Method::Values)?;
        let function = self.core.function(Method::Values);
        let row: Vec<Value> = row.into_iter().map(Into::into).collect();
        if row.is_empty() {
            return Err(Error::argument_count(function, "at least 1", 0));
        }
        if let Some(pos) = row.iter().position(|v| !is_column_value(v)) {
            return Err(Error::type_mismatch(
                function,
                pos + 1,
                "a scalar value or an expression",
            ));
        }
        let expected = if self.columns.is_empty() {
            self.rows.first().map(Vec::len)
        } else {
            Some(self.columns.len())
        };
        if let Some(expected) = expected {
            if row.len() != expected {
                return Err(Error::invalid_argument(
                    function,
                    format!(
                        "Mismatched insert columns and values: expected {} values but got {}",
                        expected,
                        row.len()
                    ),
                ));
            }
        }
        self.rows.push(row);
        self.core.advance(Method::Values);
        Ok(self)
    }

    pub fn execute(&mut self) -> Result<WriteResult> {
        stage::check(self.core.kind, self.capabilities(), Method::Execute)?;
        let statement = Statement::Insert(InsertStatement {
            target: self.core.target()?,
            payload: InsertPayload::Rows {
                columns: self.columns.clone(),
                rows: self.rows.clone(),
            },
        });
        let dispatched = self.core.dispatch(&statement)?;
        Ok(WriteResult::new(dispatched.raw, Vec::new(), dispatched.elapsed))
    }
}

impl Crud for TableInsert {
    fn kind(&self) -> StatementKind {
        self.core.kind
    }

    fn stage(&self) -> Stage {
        self.core.stage
    }

    fn allowed(&self) -> &'static [Method] {
        self.capabilities()
    }

    fn call(&mut self, method: &str, args: &[Value]) -> Result<Outcome> {
        let method = resolve(self.kind(), self.allowed(), method)?;
        let args = Args::new(self.core.function(method), args);
        match method {
            Method::Values => {
                args.at_least(1)?;
                self.values(args.all().iter().cloned())?;
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
