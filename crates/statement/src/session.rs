//! Session handle: the entry point to schemas, SQL and transactions.

use std::fmt;
use std::sync::Arc;

use fluentdb_core::{Error, Result, Session};

use crate::schema::Schema;
use crate::sql::SqlExecute;

/// Client-side view of a session collaborator.
#[derive(Clone)]
pub struct NodeSession {
    inner: Arc<dyn Session>,
}

impl NodeSession {
    pub fn new(inner: Arc<dyn Session>) -> Self {
        Self { inner }
    }

    /// The collaborator behind this handle.
    pub fn session(&self) -> &Arc<dyn Session> {
        &self.inner
    }

    /// Raw SQL with `?` markers bound positionally.
    pub fn sql(&self, text: &str) -> Result<SqlExecute> {
        SqlExecute::new(Arc::clone(&self.inner), text)
    }

    pub fn get_schema(&self, name: &str) -> Result<Schema> {
        if !self.inner.schema_names()?.iter().any(|s| s == name) {
            return Err(Error::invalid_argument(
                "Session.getSchema",
                format!("Unknown database '{}'", name),
            ));
        }
        Ok(self.schema(name))
    }

    pub fn get_schemas(&self) -> Result<Vec<Schema>> {
        let names = self.inner.schema_names()?;
        Ok(names.iter().map(|n| self.schema(n)).collect())
    }

    pub fn create_schema(&self, name: &str) -> Result<Schema> {
        if name.trim().is_empty() {
            return Err(Error::invalid_argument(
                "Session.createSchema",
                "Name can not be empty",
            ));
        }
        self.inner.create_schema(name)?;
        tracing::debug!(target: "fluentdb::session", schema = name, "Schema created");
        Ok(self.schema(name))
    }

    pub fn drop_schema(&self, name: &str) -> Result<()> {
        self.inner.drop_schema(name)?;
        tracing::debug!(target: "fluentdb::session", schema = name, "Schema dropped");
        Ok(())
    }

    /// Schema statements default to; `None` until one is selected.
    pub fn get_current_schema(&self) -> Option<Schema> {
        self.inner.current_schema().map(|n| self.schema(&n))
    }

    /// Switch the current schema. The schema must exist.
    pub fn set_current_schema(&self, name: &str) -> Result<Schema> {
        let schema = self.get_schema(name)?;
        self.inner.set_current_schema(name)?;
        Ok(schema)
    }

    /// Schema named in the connection URI.
    pub fn get_default_schema(&self) -> Option<Schema> {
        self.inner.default_schema().map(|n| self.schema(&n))
    }

    pub fn start_transaction(&self) -> Result<()> {
        self.inner.start_transaction()?;
        Ok(())
    }

    pub fn commit(&self) -> Result<()> {
        self.inner.commit()?;
        Ok(())
    }

    pub fn rollback(&self) -> Result<()> {
        self.inner.rollback()?;
        Ok(())
    }

    pub fn set_fetch_warnings(&self, enabled: bool) {
        self.inner.set_fetch_warnings(enabled);
    }

    pub fn uri(&self) -> String {
        self.inner.uri()
    }

    pub fn is_open(&self) -> bool {
        self.inner.is_open()
    }

    pub fn close(&self) {
        self.inner.close();
    }

    fn schema(&self, name: &str) -> Schema {
        Schema::new(Arc::clone(&self.inner), name)
    }
}

impl fmt::Debug for NodeSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_open() {
            write!(f, "<NodeSession:{}>", self.uri())
        } else {
            write!(f, "<NodeSession:disconnected>")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingSession;

    fn node() -> (Arc<RecordingSession>, NodeSession) {
        let session = RecordingSession::new();
        (session.clone(), NodeSession::new(session))
    }

    #[test]
    fn test_get_schema() {
        let (_, node) = node();
        assert_eq!(node.get_schema("test").unwrap().name(), "test");
        let err = node.get_schema("nope").unwrap_err();
        assert_eq!(err.to_string(), "Session.getSchema: Unknown database 'nope'");
    }

    #[test]
    fn test_schema_lifecycle() {
        let (_, node) = node();
        node.create_schema("other").unwrap();
        let names: Vec<String> = node
            .get_schemas()
            .unwrap()
            .iter()
            .map(|s| s.name().to_string())
            .collect();
        assert_eq!(names, vec!["other", "test"]);
        assert_eq!(node.set_current_schema("other").unwrap().name(), "other");
        assert_eq!(node.get_current_schema().unwrap().name(), "other");
        assert_eq!(node.get_default_schema().unwrap().name(), "test");
        node.drop_schema("other").unwrap();
        assert!(node.set_current_schema("other").is_err());
    }

    #[test]
    fn test_transactions_forwarded() {
        let (session, node) = node();
        node.start_transaction().unwrap();
        node.rollback().unwrap();
        node.start_transaction().unwrap();
        node.commit().unwrap();
        assert_eq!(
            *session.transactions.lock(),
            vec!["start", "rollback", "start", "commit"]
        );
    }

    #[test]
    fn test_closed_session_rejects_execute() {
        let (session, node) = node();
        let mut stmt = node.sql("select 1").unwrap();
        node.close();
        assert!(!node.is_open());
        let err = stmt.execute().err().unwrap();
        assert_eq!(err.to_string(), "SqlExecute.execute: session is closed");
        assert_eq!(session.count(), 0);
        assert_eq!(format!("{:?}", node), "<NodeSession:disconnected>");
    }
}
