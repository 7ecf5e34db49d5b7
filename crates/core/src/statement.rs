//! Finalized statements handed to a session collaborator.
//!
//! A [`Statement`] is the "instruction set" between the fluent builders and
//! the collaborator that executes them. Statements are:
//! - **Self-contained**: Clauses and resolved bindings travel together
//! - **Serializable**: Can be converted to/from JSON
//! - **Pure data**: Criteria and expressions are carried verbatim as text

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::path::DocPath;
use crate::value::Value;

/// Whether a target holds documents or rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetKind {
    /// Document collection
    Collection,
    /// Relational table (or view)
    Table,
}

/// Database object a statement operates on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    pub schema: String,
    pub name: String,
    pub kind: TargetKind,
}

impl Target {
    /// Collection target
    pub fn collection(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
            kind: TargetKind::Collection,
        }
    }

    /// Table target
    pub fn table(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
            kind: TargetKind::Table,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}

/// Filter text with the named placeholders it references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criteria {
    pub text: String,
    /// Placeholder names in first-appearance order
    pub placeholders: Vec<String>,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// One `"<field> [ASC|DESC]"` ordering clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

impl SortKey {
    /// Parse `"name"`, `"name asc"` or `"age DESC"`.
    pub fn parse(spec: &str) -> Result<SortKey, String> {
        let mut parts = spec.split_whitespace();
        let field = parts
            .next()
            .ok_or_else(|| "Order criteria can not be empty".to_string())?;
        let direction = match parts.next() {
            None => SortDirection::Asc,
            Some(dir) if dir.eq_ignore_ascii_case("asc") => SortDirection::Asc,
            Some(dir) if dir.eq_ignore_ascii_case("desc") => SortDirection::Desc,
            Some(dir) => {
                return Err(format!(
                    "Invalid sort direction '{}' in '{}', expected ASC or DESC",
                    dir, spec
                ))
            }
        };
        if parts.next().is_some() {
            return Err(format!("Invalid order criteria '{}'", spec));
        }
        Ok(SortKey {
            field: field.to_string(),
            direction,
        })
    }
}

/// One in-place document mutation of a modify statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PatchOperation {
    /// Set the value at `path`
    Set { path: DocPath, value: Value },
    /// Remove every listed path
    Unset { paths: Vec<DocPath> },
    /// Merge fields of a document into the target
    Merge { document: Value },
    /// Insert into an array before the addressed element
    ArrayInsert { path: DocPath, value: Value },
    /// Append to the array at `path`
    ArrayAppend { path: DocPath, value: Value },
    /// Remove the addressed array element
    ArrayDelete { path: DocPath },
}

/// Column assignment of a table update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub column: String,
    pub value: Value,
}

/// What an insert writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InsertPayload {
    /// Collection documents (each a `Value::Object`)
    Documents(Vec<Value>),
    /// Table rows; empty `columns` means table column order
    Rows {
        columns: Vec<String>,
        rows: Vec<Vec<Value>>,
    },
}

/// Collection add or table insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertStatement {
    pub target: Target,
    pub payload: InsertPayload,
}

/// Collection find or table select.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FindStatement {
    pub target: Target,
    /// Empty means every field
    pub projection: Vec<String>,
    pub criteria: Option<Criteria>,
    pub sort: Vec<SortKey>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub bindings: BTreeMap<String, Value>,
}

/// Table update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateStatement {
    pub target: Target,
    pub assignments: Vec<Assignment>,
    pub criteria: Option<Criteria>,
    pub sort: Vec<SortKey>,
    pub limit: Option<u64>,
    pub bindings: BTreeMap<String, Value>,
}

/// Collection modify.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifyStatement {
    pub target: Target,
    pub operations: Vec<PatchOperation>,
    pub criteria: Option<Criteria>,
    pub sort: Vec<SortKey>,
    pub limit: Option<u64>,
    pub bindings: BTreeMap<String, Value>,
}

/// Collection remove or table delete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteStatement {
    pub target: Target,
    pub criteria: Option<Criteria>,
    pub sort: Vec<SortKey>,
    pub limit: Option<u64>,
    pub bindings: BTreeMap<String, Value>,
}

/// Raw SQL with positional arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlStatement {
    pub text: String,
    pub arguments: Vec<Value>,
}

/// A finalized statement.
///
/// # Example
///
/// ```
/// use fluentdb_core::{DeleteStatement, Statement, Target};
/// use std::collections::BTreeMap;
///
/// let stmt = Statement::Delete(DeleteStatement {
///     target: Target::table("test", "users"),
///     criteria: None,
///     sort: vec![],
///     limit: Some(1),
///     bindings: BTreeMap::new(),
/// });
/// assert_eq!(stmt.name(), "Delete");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    Insert(InsertStatement),
    Find(FindStatement),
    Update(UpdateStatement),
    Modify(ModifyStatement),
    Delete(DeleteStatement),
    Sql(SqlStatement),
}

impl Statement {
    /// Variant name, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Statement::Insert(_) => "Insert",
            Statement::Find(_) => "Find",
            Statement::Update(_) => "Update",
            Statement::Modify(_) => "Modify",
            Statement::Delete(_) => "Delete",
            Statement::Sql(_) => "Sql",
        }
    }

    /// Target object; `None` for raw SQL.
    pub fn target(&self) -> Option<&Target> {
        match self {
            Statement::Insert(s) => Some(&s.target),
            Statement::Find(s) => Some(&s.target),
            Statement::Update(s) => Some(&s.target),
            Statement::Modify(s) => Some(&s.target),
            Statement::Delete(s) => Some(&s.target),
            Statement::Sql(_) => None,
        }
    }
}
