//! Relational table handle and its statement builders.

mod delete;
mod insert;
mod select;
mod update;

pub use delete::TableDelete;
pub use insert::TableInsert;
pub use select::TableSelect;
pub use update::TableUpdate;

use std::fmt;
use std::sync::Arc;

use fluentdb_core::{ObjectKind, Result, Session, Target, Value};

use crate::common::column_name;

/// A named table, or a view over one, inside a schema.
#[derive(Clone)]
pub struct Table {
    session: Arc<dyn Session>,
    schema: String,
    name: String,
}

impl Table {
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

    pub fn schema(&self) -> &str {
        &self.schema
    }

    fn target(&self) -> Target {
        Target::table(&self.schema, &self.name)
    }

    /// Insert rows covering every column, in table order.
    pub fn insert(&self) -> TableInsert {
        TableInsert::new(Arc::clone(&self.session), self.target(), Vec::new())
    }

    /// Insert rows for the listed columns only.
    pub fn insert_columns<S: AsRef<str>>(&self, columns: &[S]) -> Result<TableInsert> {
        let function = "Table.insert";
        let columns = columns
            .iter()
            .map(|c| column_name(function, c.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(TableInsert::new(
            Arc::clone(&self.session),
            self.target(),
            columns,
        ))
    }

    /// Insert one row given as a `{column: value}` document.
    pub fn insert_document(&self, document: impl Into<Value>) -> Result<TableInsert> {
        TableInsert::from_document(Arc::clone(&self.session), self.target(), document.into())
    }

    /// Select the listed columns or expressions; an empty list selects all.
    pub fn select<S: AsRef<str>>(&self, fields: &[S]) -> Result<TableSelect> {
        TableSelect::new(Arc::clone(&self.session), self.target(), fields)
    }

    pub fn update(&self) -> TableUpdate {
        TableUpdate::new(Arc::clone(&self.session), self.target())
    }

    pub fn delete(&self) -> TableDelete {
        TableDelete::new(Arc::clone(&self.session), self.target())
    }

    /// Whether a table or view of this name still exists.
    pub fn exists_in_database(&self) -> Result<bool> {
        let kind = self.session.object_kind(&self.schema, &self.name)?;
        Ok(matches!(kind, Some(ObjectKind::Table | ObjectKind::View)))
    }

    pub fn is_view(&self) -> Result<bool> {
        let kind = self.session.object_kind(&self.schema, &self.name)?;
        Ok(kind == Some(ObjectKind::View))
    }
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Table:{}>", self.name)
    }
}
