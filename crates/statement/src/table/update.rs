//! `Table::update` builder.

use std::sync::Arc;

use fluentdb_core::{
    Assignment, Criteria, Error, Result, Session, SortKey, Statement, Target, UpdateStatement,
    Value,
};

use crate::args::Args;
use crate::common::{column_name, order_keys, StatementCore};
use crate::crud::{resolve, Crud, Outcome};
use crate::result::WriteResult;
use crate::stage::{Method, Stage, StatementKind};

/// Column assignment over the rows matching a filter.
pub struct TableUpdate {
    core: StatementCore,
    assignments: Vec<Assignment>,
    criteria: Option<Criteria>,
    sort: Vec<SortKey>,
    limit: Option<u64>,
}

impl TableUpdate {
    pub(crate) fn new(session: Arc<dyn Session>, target: Target) -> Self {
        Self {
            core: StatementCore::new(StatementKind::TableUpdate, session, Some(target)),
            assignments: Vec::new(),
            criteria: None,
            sort: Vec::new(),
            limit: None,
        }
    }

    /// Assign `value` to `column`. Expressions may reference other columns.
    pub fn set(&mut self, column: &str, value: impl Into<Value>) -> Result<&mut Self> {
        self.core.enter(Method::Set)?;
        let function = self.core.function(Method::Set);
        let column = column_name(&function, column)?;
        let value = value.into();
        if !(value.is_scalar() || value.is_expr()) {
            return Err(Error::type_mismatch(
                function,
                2,
                "a scalar value or an expression",
            ));
        }
        self.core.track(&function, &value)?;
        self.assignments.push(Assignment { column, value });
        self.core.advance(Method::Set);
        Ok(self)
    }

    pub fn where_(&mut self, criteria: &str) -> Result<&mut Self> {
        self.core.enter(Method::Where)?;
        let function = self.core.function(Method::Where);
        if criteria.trim().is_empty() {
            return Err(Error::invalid_argument(function, "Where condition can not be empty"));
        }
        self.criteria = Some(self.core.criteria(&function, criteria)?);
        self.core.advance(Method::Where);
        Ok(self)
    }

    pub fn order_by<S: AsRef<str>>(&mut self, keys: &[S]) -> Result<&mut Self> {
        self.core.enter(Method::OrderBy)?;
        self.sort = order_keys(&self.core.function(Method::OrderBy), keys)?;
        self.core.advance(Method::OrderBy);
        Ok(self)
    }

    pub fn limit(&mut self, count: u64) -> Result<&mut Self> {
        self.core.enter(Method::Limit)?;
        self.limit = Some(count);
        self.core.advance(Method::Limit);
        Ok(self)
    }

    pub fn bind(&mut self, name: &str, value: impl Into<Value>) -> Result<&mut Self> {
        self.core.enter(Method::Bind)?;
        self.core.bind(name, value.into())?;
        self.core.advance(Method::Bind);
        Ok(self)
    }

    pub fn execute(&mut self) -> Result<WriteResult> {
        self.core.enter(Method::Execute)?;
        let statement = Statement::Update(UpdateStatement {
            target: self.core.target()?,
            assignments: self.assignments.clone(),
            criteria: self.criteria.clone(),
            sort: self.sort.clone(),
            limit: self.limit,
            bindings: self.core.bindings()?,
        });
        let dispatched = self.core.dispatch(&statement)?;
        Ok(WriteResult::new(dispatched.raw, Vec::new(), dispatched.elapsed))
    }
}

impl Crud for TableUpdate {
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
            Method::Set => {
                args.exactly(2)?;
                self.set(args.string(0)?, args.value(1)?.clone())?;
            }
            Method::Where => {
                args.exactly(1)?;
                self.where_(args.string(0)?)?;
            }
            Method::OrderBy => {
                args.at_least(1)?;
                self.order_by(&args.names()?)?;
            }
            Method::Limit => {
                args.exactly(1)?;
                self.limit(args.unsigned(0)?)?;
            }
            Method::Bind => {
                args.exactly(2)?;
                self.bind(args.string(0)?, args.value(1)?.clone())?;
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
