//! Schemas and the objects they hold.

use std::collections::{BTreeMap, HashSet};

use fluentdb_core::{get_at_path, ColumnDef, IndexDefinition, ObjectKind, SessionError, Value};

/// Error codes reported by the memory session, in MySQL numbering where
/// MySQL has an equivalent.
pub mod codes {
    pub const DB_CREATE_EXISTS: u32 = 1007;
    pub const DB_DROP_EXISTS: u32 = 1008;
    pub const BAD_NULL: u32 = 1048;
    pub const BAD_DB: u32 = 1049;
    pub const TABLE_EXISTS: u32 = 1050;
    pub const BAD_FIELD: u32 = 1054;
    pub const DUP_KEYNAME: u32 = 1061;
    pub const DUP_ENTRY: u32 = 1062;
    pub const PARSE: u32 = 1064;
    pub const WRONG_VALUE_COUNT: u32 = 1136;
    pub const NO_SUCH_TABLE: u32 = 1146;
    pub const WRONG_OBJECT: u32 = 1347;
    pub const NO_DB_SELECTED: u32 = 1046;
    pub const SERVER_GONE: u32 = 2006;
    pub const INVALID_JSON_PATH: u32 = 3143;
    pub const FORBIDDEN_ID_UPDATE: u32 = 5053;
    pub const REQUIRED_FIELD_MISSING: u32 = 5115;
    pub const TRANSACTION_ACTIVE: u32 = 5101;
    pub const NO_TRANSACTION: u32 = 5102;
}

#[derive(Debug, Clone, Default)]
pub(crate) struct TableData {
    pub columns: Vec<ColumnDef>,
    pub rows: Vec<Vec<Value>>,
    /// Next auto-increment value
    pub next_auto: u64,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct CollectionData {
    /// Documents in insertion order
    pub docs: Vec<Value>,
    pub indexes: Vec<IndexDefinition>,
}

impl CollectionData {
    /// Fail when any document breaks a required member or a unique key.
    pub fn check_indexes(&self) -> Result<(), SessionError> {
        self.indexes
            .iter()
            .try_for_each(|index| check_index(index, &self.docs))
    }
}

fn check_index(index: &IndexDefinition, docs: &[Value]) -> Result<(), SessionError> {
    let mut seen = HashSet::new();
    for doc in docs {
        let mut key = Vec::with_capacity(index.fields.len());
        for field in &index.fields {
            match get_at_path(doc, &field.path) {
                Some(value) if !value.is_null() => key.push(value.clone()),
                _ if field.required => {
                    return Err(SessionError::new(
                        codes::REQUIRED_FIELD_MISSING,
                        format!("Document is missing a required field '{}'", field.path),
                    ))
                }
                _ => {}
            }
        }
        // Keys with a missing member never collide
        if !index.unique || key.len() < index.fields.len() {
            continue;
        }
        let text: Vec<String> = key.iter().map(Value::to_string).collect();
        if !seen.insert(text.clone()) {
            let entry: Vec<String> = key
                .iter()
                .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
                .collect();
            return Err(SessionError::new(
                codes::DUP_ENTRY,
                format!("Duplicate entry '{}' for key '{}'", entry.join("-"), index.name),
            ));
        }
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub(crate) struct ViewDef {
    pub base: String,
    /// `(alias, base column)` pairs
    pub columns: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub(crate) enum Object {
    Collection(CollectionData),
    Table(TableData),
    View(ViewDef),
}

impl Object {
    pub fn kind(&self) -> ObjectKind {
        match self {
            Object::Collection(_) => ObjectKind::Collection,
            Object::Table(_) => ObjectKind::Table,
            Object::View(_) => ObjectKind::View,
        }
    }
}

/// A table or a view over one, flattened to the base table.
#[derive(Debug, Clone)]
pub(crate) struct TableRef {
    pub base: String,
    /// Visible column names
    pub columns: Vec<String>,
    /// Base column index of each visible column
    pub mapping: Vec<usize>,
}

impl TableRef {
    /// Visible projection of a base row.
    pub fn visible(&self, row: &[Value]) -> Vec<Value> {
        self.mapping
            .iter()
            .map(|&i| row.get(i).cloned().unwrap_or(Value::Null))
            .collect()
    }

    /// Base index of a visible column, case-insensitively.
    pub fn base_index(&self, column: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(column))
            .map(|i| self.mapping[i])
    }
}

/// Every schema of one session.
#[derive(Debug, Clone, Default)]
pub(crate) struct Catalog {
    schemas: BTreeMap<String, BTreeMap<String, Object>>,
}

fn qualified(schema: &str, name: &str) -> String {
    format!("{}.{}", schema, name)
}

fn no_such_table(schema: &str, name: &str) -> SessionError {
    SessionError::new(
        codes::NO_SUCH_TABLE,
        format!("Table '{}' doesn't exist", qualified(schema, name)),
    )
}

impl Catalog {
    pub fn schema_names(&self) -> Vec<String> {
        self.schemas.keys().cloned().collect()
    }

    pub fn has_schema(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    pub fn create_schema(&mut self, name: &str) -> Result<(), SessionError> {
        if self.schemas.contains_key(name) {
            return Err(SessionError::new(
                codes::DB_CREATE_EXISTS,
                format!("Can't create database '{}'; database exists", name),
            ));
        }
        self.schemas.insert(name.to_string(), BTreeMap::new());
        Ok(())
    }

    pub fn drop_schema(&mut self, name: &str) -> Result<(), SessionError> {
        self.schemas.remove(name).map(|_| ()).ok_or_else(|| {
            SessionError::new(
                codes::DB_DROP_EXISTS,
                format!("Can't drop database '{}'; database doesn't exist", name),
            )
        })
    }

    fn objects(&self, schema: &str) -> Result<&BTreeMap<String, Object>, SessionError> {
        self.schemas.get(schema).ok_or_else(|| unknown_schema(schema))
    }

    fn objects_mut(
        &mut self,
        schema: &str,
    ) -> Result<&mut BTreeMap<String, Object>, SessionError> {
        self.schemas.get_mut(schema).ok_or_else(|| unknown_schema(schema))
    }

    pub fn object_kind(
        &self,
        schema: &str,
        name: &str,
    ) -> Result<Option<ObjectKind>, SessionError> {
        Ok(self.objects(schema)?.get(name).map(Object::kind))
    }

    pub fn object_names(
        &self,
        schema: &str,
        kind: ObjectKind,
    ) -> Result<Vec<String>, SessionError> {
        Ok(self
            .objects(schema)?
            .iter()
            .filter(|(_, o)| o.kind() == kind)
            .map(|(n, _)| n.clone())
            .collect())
    }

    pub fn create(
        &mut self,
        schema: &str,
        name: &str,
        object: Object,
    ) -> Result<(), SessionError> {
        let objects = self.objects_mut(schema)?;
        if objects.contains_key(name) {
            return Err(SessionError::new(
                codes::TABLE_EXISTS,
                format!("Table '{}' already exists", name),
            ));
        }
        objects.insert(name.to_string(), object);
        Ok(())
    }

    /// Drop `name` if it is one of `kinds`. Missing objects are ignored.
    pub fn drop(
        &mut self,
        schema: &str,
        name: &str,
        kinds: &[ObjectKind],
    ) -> Result<(), SessionError> {
        let objects = self.objects_mut(schema)?;
        match objects.get(name) {
            None => Ok(()),
            Some(o) if kinds.contains(&o.kind()) => {
                objects.remove(name);
                Ok(())
            }
            Some(o) => Err(wrong_object(schema, name, o.kind(), kinds[0])),
        }
    }

    pub fn create_table(
        &mut self,
        schema: &str,
        name: &str,
        columns: &[ColumnDef],
    ) -> Result<(), SessionError> {
        let table = TableData {
            columns: columns.to_vec(),
            rows: Vec::new(),
            next_auto: 1,
        };
        self.create(schema, name, Object::Table(table))
    }

    /// View over an existing base table. No columns means every base column.
    pub fn create_view(
        &mut self,
        schema: &str,
        name: &str,
        base: &str,
        columns: &[(String, String)],
    ) -> Result<(), SessionError> {
        let table = self.table(schema, base)?;
        let columns = if columns.is_empty() {
            table
                .columns
                .iter()
                .map(|c| (c.name.clone(), c.name.clone()))
                .collect()
        } else {
            for (_, column) in columns {
                if !table.columns.iter().any(|c| c.name.eq_ignore_ascii_case(column)) {
                    return Err(unknown_column(column));
                }
            }
            columns.to_vec()
        };
        let view = ViewDef {
            base: base.to_string(),
            columns,
        };
        self.create(schema, name, Object::View(view))
    }

    pub fn collection_data(
        &self,
        schema: &str,
        name: &str,
    ) -> Result<&CollectionData, SessionError> {
        match self.objects(schema)?.get(name) {
            Some(Object::Collection(data)) => Ok(data),
            Some(o) => Err(wrong_object(schema, name, o.kind(), ObjectKind::Collection)),
            None => Err(no_such_table(schema, name)),
        }
    }

    pub fn collection_data_mut(
        &mut self,
        schema: &str,
        name: &str,
    ) -> Result<&mut CollectionData, SessionError> {
        match self.objects_mut(schema)?.get_mut(name) {
            Some(Object::Collection(data)) => Ok(data),
            Some(o) => Err(wrong_object(schema, name, o.kind(), ObjectKind::Collection)),
            None => Err(no_such_table(schema, name)),
        }
    }

    pub fn collection(&self, schema: &str, name: &str) -> Result<&Vec<Value>, SessionError> {
        Ok(&self.collection_data(schema, name)?.docs)
    }

    pub fn collection_mut(
        &mut self,
        schema: &str,
        name: &str,
    ) -> Result<&mut Vec<Value>, SessionError> {
        Ok(&mut self.collection_data_mut(schema, name)?.docs)
    }

    /// Add an index after checking it against the stored documents.
    pub fn create_index(
        &mut self,
        schema: &str,
        name: &str,
        index: &IndexDefinition,
    ) -> Result<(), SessionError> {
        let data = self.collection_data_mut(schema, name)?;
        if data
            .indexes
            .iter()
            .any(|i| i.name.eq_ignore_ascii_case(&index.name))
        {
            return Err(SessionError::new(
                codes::DUP_KEYNAME,
                format!("Duplicate key name '{}'", index.name),
            ));
        }
        check_index(index, &data.docs)?;
        data.indexes.push(index.clone());
        Ok(())
    }

    /// Base table data.
    pub fn table(&self, schema: &str, name: &str) -> Result<&TableData, SessionError> {
        match self.objects(schema)?.get(name) {
            Some(Object::Table(t)) => Ok(t),
            Some(o) => Err(wrong_object(schema, name, o.kind(), ObjectKind::Table)),
            None => Err(no_such_table(schema, name)),
        }
    }

    pub fn table_mut(&mut self, schema: &str, name: &str) -> Result<&mut TableData, SessionError> {
        match self.objects_mut(schema)?.get_mut(name) {
            Some(Object::Table(t)) => Ok(t),
            Some(o) => Err(wrong_object(schema, name, o.kind(), ObjectKind::Table)),
            None => Err(no_such_table(schema, name)),
        }
    }

    /// Resolve a table or view name to its base table.
    pub fn table_ref(&self, schema: &str, name: &str) -> Result<TableRef, SessionError> {
        match self.objects(schema)?.get(name) {
            Some(Object::Table(t)) => Ok(TableRef {
                base: name.to_string(),
                columns: t.columns.iter().map(|c| c.name.clone()).collect(),
                mapping: (0..t.columns.len()).collect(),
            }),
            Some(Object::View(view)) => {
                let base = self.table(schema, &view.base)?;
                let mut columns = Vec::with_capacity(view.columns.len());
                let mut mapping = Vec::with_capacity(view.columns.len());
                for (alias, column) in &view.columns {
                    let index = base
                        .columns
                        .iter()
                        .position(|c| c.name.eq_ignore_ascii_case(column))
                        .ok_or_else(|| unknown_column(column))?;
                    columns.push(alias.clone());
                    mapping.push(index);
                }
                Ok(TableRef {
                    base: view.base.clone(),
                    columns,
                    mapping,
                })
            }
            Some(o) => Err(wrong_object(schema, name, o.kind(), ObjectKind::Table)),
            None => Err(no_such_table(schema, name)),
        }
    }
}

pub(crate) fn unknown_schema(name: &str) -> SessionError {
    SessionError::new(codes::BAD_DB, format!("Unknown database '{}'", name))
}

pub(crate) fn unknown_column(name: &str) -> SessionError {
    SessionError::new(
        codes::BAD_FIELD,
        format!("Unknown column '{}' in 'field list'", name),
    )
}

fn wrong_object(
    schema: &str,
    name: &str,
    found: ObjectKind,
    expected: ObjectKind,
) -> SessionError {
    SessionError::new(
        codes::WRONG_OBJECT,
        format!(
            "'{}' is a {}, not a {}",
            qualified(schema, name),
            found,
            expected
        ),
    )
}
