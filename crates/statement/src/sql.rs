//! Raw SQL statement with positional `?` binding.

use std::sync::Arc;

use fluentdb_core::{Error, Result, Session, SqlStatement, Statement, Value};

use crate::args::Args;
use crate::common::StatementCore;
use crate::crud::{resolve, Crud, Outcome};
use crate::placeholder;
use crate::result::SqlResult;
use crate::stage::{Method, Stage, StatementKind};

/// SQL text plus the values bound to its `?` markers, in order.
pub struct SqlExecute {
    core: StatementCore,
    text: String,
    markers: usize,
    arguments: Vec<Value>,
    /// Arguments belong to the previous execution; the next bind starts over
    stale: bool,
}

impl SqlExecute {
    pub(crate) fn new(session: Arc<dyn Session>, text: &str) -> Result<Self> {
        let function = "Session.sql";
        if text.trim().is_empty() {
            return Err(Error::invalid_argument(function, "SQL statement can not be empty"));
        }
        let found = placeholder::scan(text).map_err(|e| Error::syntax(function, e.message()))?;
        Ok(Self {
            core: StatementCore::new(StatementKind::Sql, session, None),
            text: text.to_string(),
            markers: found.positional,
            arguments: Vec::new(),
            stale: false,
        })
    }

    /// Statement text as given.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Bind the next `?` marker.
    pub fn bind(&mut self, value: impl Into<Value>) -> Result<&mut Self> {
        self.bind_all([value.into()])
    }

    /// Bind several markers at once, in order.
    pub fn bind_all<I, V>(&mut self, values: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.core.enter(Method::Bind)?;
        let function = self.core.function(Method::Bind);
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        let already = if self.stale { 0 } else { self.arguments.len() };
        if already + values.len() > self.markers {
            return Err(Error::invalid_argument(
                function,
                format!(
                    "Too many values bound: the statement has {} placeholder(s)",
                    self.markers
                ),
            ));
        }
        if self.stale {
            self.arguments.clear();
            self.stale = false;
        }
        self.arguments.extend(values);
        self.core.advance(Method::Bind);
        Ok(self)
    }

    pub fn execute(&mut self) -> Result<SqlResult> {
        self.core.enter(Method::Execute)?;
        if self.arguments.len() < self.markers {
            return Err(Error::MissingBinding {
                function: self.core.function(Method::Execute),
                placeholders: (self.arguments.len() + 1..=self.markers)
                    .map(|n| format!("#{}", n))
                    .collect(),
            });
        }
        let statement = Statement::Sql(SqlStatement {
            text: self.text.clone(),
            arguments: self.arguments.clone(),
        });
        let dispatched = self.core.dispatch(&statement)?;
        self.stale = true;
        Ok(SqlResult::new(dispatched.raw, dispatched.elapsed))
    }
}

impl Crud for SqlExecute {
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
            Method::Bind => {
                args.exactly(1)?;
                match args.value(0)? {
                    Value::Array(items) => self.bind_all(items.clone())?,
                    other => self.bind(other.clone())?,
                };
            }
            Method::Execute => {
                args.exactly(0)?;
                return Ok(Outcome::Sql(self.execute()?));
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
    use crate::testing::RecordingSession;
    use fluentdb_core::RawResult;

    fn sql(text: &str) -> (Arc<RecordingSession>, SqlExecute) {
        let session = RecordingSession::new();
        let stmt = SqlExecute::new(session.clone(), text).unwrap();
        (session, stmt)
    }

    fn arguments(session: &RecordingSession) -> Vec<Value> {
        match session.last() {
            Some(Statement::Sql(s)) => s.arguments,
            other => panic!("Expected Sql statement, got {:?}", other),
        }
    }

    #[test]
    fn test_positional_binding() {
        let (session, mut stmt) = sql("select * from t where a = ? and b = '?'");
        assert!(matches!(stmt.bind(1).unwrap().bind(2), Err(Error::InvalidArgument { .. })));
        stmt.execute().unwrap();
        assert_eq!(arguments(&session), vec![Value::Int(1)]);
    }

    #[test]
    fn test_missing_positional_values() {
        let (_, mut stmt) = sql("insert into t values (?, ?, ?)");
        stmt.bind("x").unwrap();
        match stmt.execute() {
            Err(Error::MissingBinding { placeholders, .. }) => {
                assert_eq!(placeholders, vec!["#2", "#3"]);
            }
            Err(e) => panic!("Expected MissingBinding, got {:?}", e),
            Ok(_) => panic!("Expected MissingBinding"),
        }
        assert_eq!(stmt.stage(), Stage::Bound);
    }

    #[test]
    fn test_rebind_after_execute_starts_over() {
        let (session, mut stmt) = sql("select ?");
        stmt.bind(1).unwrap().execute().unwrap();
        stmt.bind(2).unwrap().execute().unwrap();
        assert_eq!(arguments(&session), vec![Value::Int(2)]);
        stmt.execute().unwrap();
        assert_eq!(arguments(&session), vec![Value::Int(2)]);
        assert_eq!(session.count(), 3);
    }

    #[test]
    fn test_result_rows() {
        let (session, mut stmt) = sql("select 1 as one");
        session.reply(Ok(RawResult::rows(
            vec!["one".into()],
            vec![vec![Value::Int(1)]],
        )));
        let mut result = stmt.execute().unwrap();
        assert!(result.has_data());
        assert_eq!(result.fetch_all().len(), 1);
    }

    #[test]
    fn test_sql_text_validation() {
        let session = RecordingSession::new();
        assert!(matches!(
            SqlExecute::new(session.clone(), "  "),
            Err(Error::InvalidArgument { .. })
        ));
        assert!(matches!(
            SqlExecute::new(session, "select 'abc"),
            Err(Error::Syntax { .. })
        ));
    }

    #[test]
    fn test_dynamic_bind_list() {
        let (session, mut stmt) = sql("select ?, ?");
        stmt.call("bind", &[Value::Array(vec![Value::Int(1), Value::Int(2)])])
            .unwrap();
        assert!(matches!(stmt.call("bind", &[]), Err(Error::ArgumentCount { .. })));
        assert!(stmt.call("execute", &[]).unwrap().into_sql().is_some());
        assert_eq!(arguments(&session).len(), 2);
        assert_eq!(stmt.allowed_methods(), vec!["bind", "execute"]);
    }
}
