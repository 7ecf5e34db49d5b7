//! `Collection::remove` builder.

use std::sync::Arc;

use fluentdb_core::{
    Criteria, DeleteStatement, Error, Result, Session, SortKey, Statement, Target, Value,
};

use crate::args::Args;
use crate::common::{optional_criteria, sort_keys, StatementCore};
use crate::crud::{resolve, Crud, Outcome};
use crate::result::WriteResult;
use crate::stage::{Method, Stage, StatementKind};

/// Removal of the documents matching a criteria.
pub struct CollectionRemove {
    core: StatementCore,
    criteria: Option<Criteria>,
    sort: Vec<SortKey>,
    limit: Option<u64>,
}

impl CollectionRemove {
    pub(crate) fn new(
        session: Arc<dyn Session>,
        target: Target,
        criteria: Option<&str>,
    ) -> Result<Self> {
        let mut core = StatementCore::new(StatementKind::CollectionRemove, session, Some(target));
        let criteria = match optional_criteria(criteria) {
            Some(text) => Some(core.criteria("Collection.remove", text)?),
            None => None,
        };
        Ok(Self {
            core,
            criteria,
            sort: Vec::new(),
            limit: None,
        })
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
        let statement = Statement::Delete(DeleteStatement {
            target: self.core.target()?,
            criteria: self.criteria.clone(),
            sort: self.sort.clone(),
            limit: self.limit,
            bindings: self.core.bindings()?,
        });
        let dispatched = self.core.dispatch(&statement)?;
        Ok(WriteResult::new(dispatched.raw, Vec::new(), dispatched.elapsed))
    }
}

impl Crud for CollectionRemove {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{collection, RecordingSession};

    #[test]
    fn test_remove_chain() {
        let session = RecordingSession::new();
        let mut stmt =
            CollectionRemove::new(session.clone(), collection(), Some("age = :years")).unwrap();
        assert_eq!(
            stmt.allowed_methods(),
            vec!["sort", "limit", "bind", "execute"]
        );
        stmt.sort(&["name"]).unwrap().limit(1).unwrap();
        assert_eq!(stmt.allowed_methods(), vec!["bind", "execute"]);
        assert!(matches!(stmt.execute(), Err(Error::MissingBinding { .. })));
        stmt.bind("years", 13).unwrap();
        let result = stmt.execute().unwrap();
        assert!(result.last_document_id().is_err());

        match session.last() {
            Some(Statement::Delete(d)) => {
                assert_eq!(d.limit, Some(1));
                assert_eq!(d.target, collection());
            }
            other => panic!("Expected Delete statement, got {:?}", other),
        }
    }

    #[test]
    fn test_remove_without_criteria() {
        let session = RecordingSession::new();
        let mut stmt = CollectionRemove::new(session.clone(), collection(), None).unwrap();
        stmt.execute().unwrap();
        assert_eq!(session.count(), 1);
    }

    #[test]
    fn test_dynamic_limit_validation() {
        let session = RecordingSession::new();
        let mut stmt = CollectionRemove::new(session, collection(), None).unwrap();
        assert!(matches!(stmt.call("limit", &[]), Err(Error::ArgumentCount { .. })));
        assert!(matches!(
            stmt.call("limit", &[Value::Int(-1)]),
            Err(Error::TypeMismatch { .. })
        ));
        assert!(matches!(
            stmt.call("skip", &[Value::Int(1)]),
            Err(Error::InvalidArgument { .. })
        ));
    }
}
