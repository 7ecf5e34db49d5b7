//! Schema handle.

use std::fmt;
use std::sync::Arc;

use fluentdb_core::{ColumnDef, Error, ObjectKind, Result, Session};

use crate::collection::Collection;
use crate::table::Table;

/// A named schema: the namespace holding collections, tables and views.
#[derive(Clone)]
pub struct Schema {
    session: Arc<dyn Session>,
    name: String,
}

impl Schema {
    pub(crate) fn new(session: Arc<dyn Session>, name: &str) -> Self {
        Self {
            session,
            name: name.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Existing collection; anything else is `InvalidArgument`.
    pub fn get_collection(&self, name: &str) -> Result<Collection> {
        match self.session.object_kind(&self.name, name)? {
            Some(ObjectKind::Collection) => Ok(self.collection(name)),
            _ => Err(Error::invalid_argument(
                "Schema.getCollection",
                format!("The collection '{}.{}' does not exist", self.name, name),
            )),
        }
    }

    /// Existing table or view.
    pub fn get_table(&self, name: &str) -> Result<Table> {
        match self.session.object_kind(&self.name, name)? {
            Some(ObjectKind::Table | ObjectKind::View) => Ok(self.table(name)),
            _ => Err(Error::invalid_argument(
                "Schema.getTable",
                format!("The table '{}.{}' does not exist", self.name, name),
            )),
        }
    }

    pub fn create_collection(&self, name: &str) -> Result<Collection> {
        check_name("Schema.createCollection", name)?;
        self.session.create_collection(&self.name, name)?;
        Ok(self.collection(name))
    }

    pub fn create_table(&self, name: &str, columns: &[ColumnDef]) -> Result<Table> {
        let function = "Schema.createTable";
        check_name(function, name)?;
        if columns.is_empty() {
            return Err(Error::invalid_argument(
                function,
                "A table must have at least one column",
            ));
        }
        self.session.create_table(&self.name, name, columns)?;
        Ok(self.table(name))
    }

    /// View over `base_table` exposing `(alias, column)` pairs.
    pub fn create_view(
        &self,
        name: &str,
        base_table: &str,
        columns: &[(String, String)],
    ) -> Result<Table> {
        check_name("Schema.createView", name)?;
        self.session
            .create_view(&self.name, name, base_table, columns)?;
        Ok(self.table(name))
    }

    pub fn get_collections(&self) -> Result<Vec<Collection>> {
        let names = self.session.object_names(&self.name, ObjectKind::Collection)?;
        Ok(names.iter().map(|n| self.collection(n)).collect())
    }

    /// Tables and views, sorted by name.
    pub fn get_tables(&self) -> Result<Vec<Table>> {
        let mut names = self.session.object_names(&self.name, ObjectKind::Table)?;
        names.extend(self.session.object_names(&self.name, ObjectKind::View)?);
        names.sort();
        Ok(names.iter().map(|n| self.table(n)).collect())
    }

    pub fn drop_collection(&self, name: &str) -> Result<()> {
        self.session.drop_collection(&self.name, name)?;
        Ok(())
    }

    pub fn drop_table(&self, name: &str) -> Result<()> {
        self.session.drop_table(&self.name, name)?;
        Ok(())
    }

    pub fn exists_in_database(&self) -> Result<bool> {
        Ok(self.session.schema_names()?.contains(&self.name))
    }

    fn collection(&self, name: &str) -> Collection {
        Collection::new(Arc::clone(&self.session), &self.name, name)
    }

    fn table(&self, name: &str) -> Table {
        Table::new(Arc::clone(&self.session), &self.name, name)
    }
}

fn check_name(function: &str, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::invalid_argument(function, "Name can not be empty"));
    }
    Ok(())
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Schema:{}>", self.name)
    }
}
