//! `Collection::modify` builder.

use std::fmt;
use std::sync::Arc;

use fluentdb_core::{
    Criteria, Error, ModifyStatement, PatchOperation, Result, Session, SortKey, Statement, Target,
    Value,
};

use crate::args::Args;
use crate::common::{array_element_path, doc_path, optional_criteria, sort_keys, StatementCore};
use crate::crud::{resolve, Crud, Outcome};
use crate::result::WriteResult;
use crate::stage::{Method, Stage, StatementKind};

/// In-place update of the documents matching a criteria.
///
/// ```ignore
/// collection
///     .modify("name = :name")?
///     .set("age", expr("13+1"))?
///     .unset(["nickname"])?
///     .bind("name", "jack")?
///     .execute()?;
/// ```
pub struct CollectionModify {
    core: StatementCore,
    criteria: Option<Criteria>,
    operations: Vec<PatchOperation>,
    sort: Vec<SortKey>,
    limit: Option<u64>,
}

impl CollectionModify {
    pub(crate) fn new(
        session: Arc<dyn Session>,
        target: Target,
        criteria: Option<&str>,
    ) -> Result<Self> {
        let mut core = StatementCore::new(StatementKind::CollectionModify, session, Some(target));
        let criteria = match optional_criteria(criteria) {
            Some(text) => Some(core.criteria("Collection.modify", text)?),
            None => None,
        };
        Ok(Self {
            core,
            criteria,
            operations: Vec::new(),
            sort: Vec::new(),
            limit: None,
        })
    }

    fn stage_operation(&mut self, method: Method, operation: PatchOperation) -> &mut Self {
        self.operations.push(operation);
        self.core.advance(method);
        self
    }

    /// Set the value at a document path.
    pub fn set(&mut self, path: &str, value: impl Into<Value>) -> Result<&mut Self> {
        self.core.enter(Method::Set)?;
        let function = self.core.function(Method::Set);
        let path = doc_path(&function, path)?;
        let value = value.into();
        self.core.track(&function, &value)?;
        Ok(self.stage_operation(Method::Set, PatchOperation::Set { path, value }))
    }

    /// Remove fields. An empty list changes nothing.
    pub fn unset<I, S>(&mut self, fields: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.core.enter(Method::Unset)?;
        let function = self.core.function(Method::Unset);
        let paths = fields
            .into_iter()
            .map(|f| doc_path(&function, f.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        if paths.is_empty() {
            return Ok(self);
        }
        Ok(self.stage_operation(Method::Unset, PatchOperation::Unset { paths }))
    }

    /// Merge the fields of a document into each match.
    pub fn merge(&mut self, document: impl Into<Value>) -> Result<&mut Self> {
        self.core.enter(Method::Merge)?;
        let function = self.core.function(Method::Merge);
        let document = document.into();
        if !document.is_object() {
            return Err(Error::type_mismatch(function, 1, "a document"));
        }
        self.core.track(&function, &document)?;
        Ok(self.stage_operation(Method::Merge, PatchOperation::Merge { document }))
    }

    /// Insert before the array element addressed by `path` (`hobbies[1]`).
    pub fn array_insert(&mut self, path: &str, value: impl Into<Value>) -> Result<&mut Self> {
        self.core.enter(Method::ArrayInsert)?;
        let function = self.core.function(Method::ArrayInsert);
        let path = array_element_path(&function, path)?;
        let value = value.into();
        self.core.track(&function, &value)?;
        Ok(self.stage_operation(Method::ArrayInsert, PatchOperation::ArrayInsert { path, value }))
    }

    /// Append to the array at `path`.
    pub fn array_append(&mut self, path: &str, value: impl Into<Value>) -> Result<&mut Self> {
        self.core.enter(Method::ArrayAppend)?;
        let function = self.core.function(Method::ArrayAppend);
        let path = doc_path(&function, path)?;
        let value = value.into();
        self.core.track(&function, &value)?;
        Ok(self.stage_operation(Method::ArrayAppend, PatchOperation::ArrayAppend { path, value }))
    }

    /// Remove the array element addressed by `path`.
    pub fn array_delete(&mut self, path: &str) -> Result<&mut Self> {
        self.core.enter(Method::ArrayDelete)?;
        let function = self.core.function(Method::ArrayDelete);
        let path = array_element_path(&function, path)?;
        Ok(self.stage_operation(Method::ArrayDelete, PatchOperation::ArrayDelete { path }))
    }

    pub fn sort<S: AsRef<str>>(&mut self, keys: &[S]) -> Result<&mut Self> {
        self.core.enter(Method::Sort)?;
        self.sort = sort_keys(&self.core.function(Method::Sort), keys)?;
        self.core.advance(Method::Sort);
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
        let statement = Statement::Modify(ModifyStatement {
            target: self.core.target()?,
            operations: self.operations.clone(),
            criteria: self.criteria.clone(),
            sort: self.sort.clone(),
            limit: self.limit,
            bindings: self.core.bindings()?,
        });
        let dispatched = self.core.dispatch(&statement)?;
        Ok(WriteResult::new(dispatched.raw, Vec::new(), dispatched.elapsed))
    }
}

impl Crud for CollectionModify {
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
            Method::Unset => {
                args.at_least(1)?;
                self.unset(&args.names()?)?;
            }
            Method::Merge => {
                args.exactly(1)?;
                args.document(0)?;
                self.merge(args.value(0)?.clone())?;
            }
            Method::ArrayInsert => {
                args.exactly(2)?;
                self.array_insert(args.string(0)?, args.value(1)?.clone())?;
            }
            Method::ArrayAppend => {
                args.exactly(2)?;
                self.array_append(args.string(0)?, args.value(1)?.clone())?;
            }
            Method::ArrayDelete => {
                args.exactly(1)?;
                self.array_delete(args.string(0)?)?;
            }
            Method::Sort => {
                args.at_least(1)?;
                self.sort(&args.names()?)?;
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

impl fmt::Debug for CollectionModify {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionModify")
            .field("stage", &self.core.stage)
            .field("criteria", &self.criteria)
            .field("operations", &self.operations)
            .field("sort", &self.sort)
            .field("limit", &self.limit)
            .finish()
    }
}
