//! `Collection::find` builder.

use std::sync::Arc;

use fluentdb_core::{
    Criteria, Error, FindStatement, Result, Session, SortKey, Statement, Target, Value,
};

use crate::args::Args;
use crate::common::{optional_criteria, sort_keys, StatementCore};
use crate::crud::{resolve, Crud, Outcome};
use crate::result::DocResult;
use crate::stage::{Method, Stage, StatementKind};

/// Document query.
pub struct CollectionFind {
    core: StatementCore,
    criteria: Option<Criteria>,
    projection: Vec<String>,
    sort: Vec<SortKey>,
    limit: Option<u64>,
    skip: Option<u64>,
}

impl CollectionFind {
    pub(crate) fn new(
        session: Arc<dyn Session>,
        target: Target,
        criteria: Option<&str>,
    ) -> Result<Self> {
        let mut core = StatementCore::new(StatementKind::CollectionFind, session, Some(target));
        let criteria = match optional_criteria(criteria) {
            Some(text) => Some(core.criteria("Collection.find", text)?),
            None => None,
        };
        Ok(Self {
            core,
            criteria,
            projection: Vec::new(),
            sort: Vec::new(),
            limit: None,
            skip: None,
        })
    }

    /// Restrict returned fields (`"name"`, `"address.city as city"`).
    pub fn fields<S: AsRef<str>>(&mut self, fields: &[S]) -> Result<&mut Self> {
        self.core.enter(Method::Fields)?;
        let function = self.core.function(Method::Fields);
        if fields.is_empty() {
            return Err(Error::invalid_argument(
                function,
                "Field selection criteria can not be empty",
            ));
        }
        let projection = self.core.projection(&function, fields)?;
        self.projection = projection;
        self.core.advance(Method::Fields);
        Ok(self)
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

    /// Skip the first `count` matches. Only legal after `limit`.
    pub fn skip(&mut self, count: u64) -> Result<&mut Self> {
        self.core.enter(Method::Skip)?;
        self.skip = Some(count);
        self.core.advance(Method::Skip);
        Ok(self)
    }

    pub fn bind(&mut self, name: &str, value: impl Into<Value>) -> Result<&mut Self> {
        self.core.enter(Method::Bind)?;
        self.core.bind(name, value.into())?;
        self.core.advance(Method::Bind);
        Ok(self)
    }

    pub fn execute(&mut self) -> Result<DocResult> {
        self.core.enter(Method::Execute)?;
        let statement = Statement::Find(FindStatement {
            target: self.core.target()?,
            projection: self.projection.clone(),
            criteria: self.criteria.clone(),
            sort: self.sort.clone(),
            limit: self.limit,
            offset: self.skip,
            bindings: self.core.bindings()?,
        });
        let dispatched = self.core.dispatch(&statement)?;
        Ok(DocResult::new(dispatched.raw, dispatched.elapsed))
    }
}

impl Crud for CollectionFind {
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
            Method::Fields => {
                args.at_least(1)?;
                self.fields(&args.names()?)?;
            }
            Method::Sort => {
                args.at_least(1)?;
                self.sort(&args.names()?)?;
            }
            Method::Limit => {
                args.exactly(1)?;
                self.limit(args.unsigned(0)?)?;
            }
            Method::Skip => {
                args.exactly(1)?;
                self.skip(args.unsigned(0)?)?;
            }
            Method::Bind => {
                args.exactly(2)?;
                self.bind(args.string(0)?, args.value(1)?.clone())?;
            }
            Method::Execute => {
                args.exactly(0)?;
                return Ok(Outcome::Docs(self.execute()?));
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
