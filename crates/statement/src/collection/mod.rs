//! Document collection handle and its statement builders.

mod add;
mod create_index;
mod find;
mod modify;
mod remove;

pub use add::{generate_document_id, CollectionAdd, DOCUMENT_ID_FIELD};
pub use create_index::{CollectionCreateIndex, IndexType};
pub use find::CollectionFind;
pub use modify::CollectionModify;
pub use remove::CollectionRemove;

use std::fmt;
use std::sync::Arc;

use fluentdb_core::{ObjectKind, Result, Session, Target, Value};

/// A named document collection inside a schema.
#[derive(Clone)]
pub struct Collection {
    session: Arc<dyn Session>,
    schema: String,
    name: String,
}

impl Collection {
    pub(crate) fn new(session: Arc<dyn Session>, schema: &str, name: &str) -> Self {
        Self {
            session,
            schema: schema.to_string(),
            name: name.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the owning schema.
    pub fn schema(&self) -> &str {
        &self.schema
    }

    fn target(&self) -> Target {
        Target::collection(&self.schema, &self.name)
    }

    /// Start an add with a document or a list of documents.
    pub fn add(&self, documents: impl Into<Value>) -> Result<CollectionAdd> {
        let mut stmt = CollectionAdd::new(Arc::clone(&self.session), self.target());
        stmt.add(documents)?;
        Ok(stmt)
    }

    /// Query documents; `None` or blank criteria matches every document.
    pub fn find<'a>(&self, criteria: impl Into<Option<&'a str>>) -> Result<CollectionFind> {
        CollectionFind::new(Arc::clone(&self.session), self.target(), criteria.into())
    }

    /// Update documents in place.
    pub fn modify<'a>(&self, criteria: impl Into<Option<&'a str>>) -> Result<CollectionModify> {
        CollectionModify::new(Arc::clone(&self.session), self.target(), criteria.into())
    }

    /// Delete documents.
    pub fn remove<'a>(&self, criteria: impl Into<Option<&'a str>>) -> Result<CollectionRemove> {
        CollectionRemove::new(Arc::clone(&self.session), self.target(), criteria.into())
    }

    /// Start a secondary index definition; add members with `field`.
    pub fn create_index(
        &self,
        name: &str,
        index_type: Option<IndexType>,
    ) -> Result<CollectionCreateIndex> {
        let mut stmt = CollectionCreateIndex::new(Arc::clone(&self.session), self.target());
        stmt.create_index(name, index_type)?;
        Ok(stmt)
    }

    /// Whether the collection still exists.
    pub fn exists_in_database(&self) -> Result<bool> {
        let kind = self.session.object_kind(&self.schema, &self.name)?;
        Ok(kind == Some(ObjectKind::Collection))
    }
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Collection:{}>", self.name)
    }
}
