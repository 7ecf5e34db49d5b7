//! Statement execution against a [`Catalog`].
//!
//! Every function here works on the catalog it is given. The session runs
//! statements on a copy and only keeps it when the statement succeeds, so a
//! failure halfway through a batch leaves nothing behind.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

use fluentdb_core::{
    set_at_path, Criteria, DeleteStatement, DocPath, FindStatement, InsertPayload,
    InsertStatement, ModifyStatement, RawResult, SessionError, SortDirection, SortKey,
    SqlStatement, Statement, TargetKind, UpdateStatement, Value,
};

use crate::catalog::{codes, unknown_column, Catalog, TableRef};
use crate::eval::{self, DocumentScope, EmptyScope, Env, EvalError, Expr, RowScope, Scope};
use crate::patch::{self, PatchError};

impl From<EvalError> for SessionError {
    fn from(e: EvalError) -> Self {
        SessionError::new(e.code(), e.to_string())
    }
}

impl From<PatchError> for SessionError {
    fn from(e: PatchError) -> Self {
        SessionError::new(e.code(), e.to_string())
    }
}

const NO_BINDINGS: &[Value] = &[];

/// Run one CRUD or SQL statement.
pub(crate) fn run(
    catalog: &mut Catalog,
    statement: &Statement,
) -> Result<RawResult, SessionError> {
    match statement {
        Statement::Insert(s) => insert(catalog, s),
        Statement::Find(s) => find(catalog, s),
        Statement::Update(s) => update(catalog, s),
        Statement::Modify(s) => modify(catalog, s),
        Statement::Delete(s) => delete(catalog, s),
        Statement::Sql(s) => sql(s),
    }
}

// =============================================================================
// Record selection
// =============================================================================

/// Compiled filter, ordering and window.
struct Query {
    filter: Option<Expr>,
    sort: Vec<(Expr, SortDirection)>,
    limit: Option<u64>,
    offset: u64,
}

impl Query {
    fn compile(
        criteria: Option<&Criteria>,
        sort: &[SortKey],
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> Result<Self, EvalError> {
        let filter = match criteria {
            Some(c) if !c.text.trim().is_empty() => Some(eval::parse(&c.text)?),
            _ => None,
        };
        let sort = sort
            .iter()
            .map(|key| Ok((eval::parse(&key.field)?, key.direction)))
            .collect::<Result<Vec<_>, EvalError>>()?;
        Ok(Query {
            filter,
            sort,
            limit,
            offset: offset.unwrap_or(0),
        })
    }

    /// Indexes of the selected records, in result order.
    fn select<'r, R, S, F>(
        &self,
        records: &'r [R],
        scope: F,
        env: &mut Env<'_>,
    ) -> Result<Vec<usize>, EvalError>
    where
        S: Scope,
        F: Fn(&'r R) -> S,
    {
        let mut picked: Vec<(usize, Vec<Value>)> = Vec::new();
        for (i, record) in records.iter().enumerate() {
            let scope = scope(record);
            if let Some(filter) = &self.filter {
                if !eval::matches(filter, &scope, env)? {
                    continue;
                }
            }
            let keys = self
                .sort
                .iter()
                .map(|(e, _)| eval::eval(e, &scope, env))
                .collect::<Result<Vec<_>, _>>()?;
            picked.push((i, keys));
        }

        if !self.sort.is_empty() {
            picked.sort_by(|(_, a), (_, b)| {
                for ((x, y), (_, direction)) in a.iter().zip(b).zip(&self.sort) {
                    let ord = sort_order(x, y);
                    let ord = match direction {
                        SortDirection::Asc => ord,
                        SortDirection::Desc => ord.reverse(),
                    };
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                Ordering::Equal
            });
        }

        let take = self.limit.map_or(usize::MAX, |l| l as usize);
        Ok(picked
            .into_iter()
            .skip(self.offset as usize)
            .take(take)
            .map(|(i, _)| i)
            .collect())
    }
}

fn rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Int(_) | Value::Float(_) => 2,
        Value::String(_) => 3,
        Value::Bytes(_) => 4,
        Value::Array(_) => 5,
        Value::Object(_) => 6,
        Value::Expr(_) => 7,
    }
}

/// Total order used by ORDER BY. `NULL` sorts first.
pub(crate) fn sort_order(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Int(x), Value::Int(y)) => x.cmp(y),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bytes(x), Value::Bytes(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => x
            .iter()
            .zip(y)
            .map(|(p, q)| sort_order(p, q))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or_else(|| x.len().cmp(&y.len())),
        (Value::Object(x), Value::Object(y)) => x
            .iter()
            .zip(y)
            .map(|((kp, vp), (kq, vq))| kp.cmp(kq).then_with(|| sort_order(vp, vq)))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or_else(|| x.len().cmp(&y.len())),
        (Value::Expr(x), Value::Expr(y)) => x.text().cmp(y.text()),
        _ => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) if rank(a) == 2 && rank(b) == 2 => {
                x.partial_cmp(&y).unwrap_or(Ordering::Equal)
            }
            _ => rank(a).cmp(&rank(b)),
        },
    }
}

fn row_scope<'r>(columns: &'r [String]) -> impl Fn(&'r Vec<Value>) -> RowScope<'r> {
    move |values| RowScope { columns, values }
}

/// Visible rows of a table or view.
fn visible_rows(
    catalog: &Catalog,
    schema: &str,
    table: &TableRef,
) -> Result<Vec<Vec<Value>>, SessionError> {
    let data = catalog.table(schema, &table.base)?;
    Ok(data.rows.iter().map(|row| table.visible(row)).collect())
}

fn not_null_check(
    catalog: &Catalog,
    schema: &str,
    base: &str,
    row: &[Value],
) -> Result<(), SessionError> {
    let data = catalog.table(schema, base)?;
    for (column, value) in data.columns.iter().zip(row) {
        if !column.nullable && value.is_null() {
            return Err(SessionError::new(
                codes::BAD_NULL,
                format!("Column '{}' cannot be null", column.name),
            ));
        }
    }
    Ok(())
}

// =============================================================================
// Insert
// =============================================================================

fn insert(catalog: &mut Catalog, s: &InsertStatement) -> Result<RawResult, SessionError> {
    let schema = &s.target.schema;
    match (&s.payload, s.target.kind) {
        (InsertPayload::Documents(docs), TargetKind::Collection) => {
            let named = BTreeMap::new();
            let mut env = Env::new(&named, NO_BINDINGS);
            let existing = catalog.collection_mut(schema, &s.target.name)?;
            let mut ids: HashSet<String> = existing
                .iter()
                .filter_map(|d| d.get("_id").map(|id| id.to_string()))
                .collect();
            let mut added = Vec::with_capacity(docs.len());
            for doc in docs {
                let doc = eval::resolve(doc, &DocumentScope(doc), &mut env)?;
                let id = doc.get("_id").ok_or_else(|| {
                    SessionError::new(
                        codes::REQUIRED_FIELD_MISSING,
                        "Document is missing a required field",
                    )
                })?;
                if !ids.insert(id.to_string()) {
                    return Err(SessionError::new(
                        codes::DUP_ENTRY,
                        format!(
                            "Document contains a field value that is not unique but required \
                             to be: '{}'",
                            id
                        ),
                    ));
                }
                added.push(doc);
            }
            let count = added.len() as u64;
            existing.extend(added);
            catalog.collection_data(schema, &s.target.name)?.check_indexes()?;
            Ok(RawResult::affected(count).with_warnings(env.warnings))
        }
        (InsertPayload::Rows { columns, rows }, TargetKind::Table) => {
            let table = catalog.table_ref(schema, &s.target.name)?;
            let targets = if columns.is_empty() {
                table.mapping.clone()
            } else {
                columns
                    .iter()
                    .map(|c| table.base_index(c).ok_or_else(|| unknown_column(c)))
                    .collect::<Result<Vec<_>, _>>()?
            };
            let named = BTreeMap::new();
            let mut env = Env::new(&named, NO_BINDINGS);
            let width = catalog.table(schema, &table.base)?.columns.len();

            let mut built = Vec::with_capacity(rows.len());
            for (n, row) in rows.iter().enumerate() {
                if row.len() != targets.len() {
                    return Err(SessionError::new(
                        codes::WRONG_VALUE_COUNT,
                        format!("Column count doesn't match value count at row {}", n + 1),
                    ));
                }
                let mut base = vec![Value::Null; width];
                for (value, &index) in row.iter().zip(&targets) {
                    base[index] = eval::resolve(value, &EmptyScope, &mut env)?;
                }
                built.push(base);
            }

            let data = catalog.table_mut(schema, &table.base)?;
            let mut first_generated = None;
            for row in &mut built {
                for (column, value) in data.columns.iter().zip(row.iter_mut()) {
                    if !column.auto_increment {
                        continue;
                    }
                    match value {
                        Value::Null => {
                            *value = Value::Int(data.next_auto as i64);
                            if first_generated.is_none() {
                                first_generated = Some(data.next_auto);
                            }
                            data.next_auto += 1;
                        }
                        Value::Int(i) if *i >= 0 && *i as u64 >= data.next_auto => {
                            data.next_auto = *i as u64 + 1;
                        }
                        _ => {}
                    }
                }
            }
            for row in &built {
                not_null_check(catalog, schema, &table.base, row)?;
            }
            let count = built.len() as u64;
            catalog.table_mut(schema, &table.base)?.rows.extend(built);
            let mut result = RawResult::affected(count).with_warnings(env.warnings);
            result.auto_increment = first_generated;
            Ok(result)
        }
        _ => Err(SessionError::new(
            codes::WRONG_OBJECT,
            format!("Insert payload does not fit {}", s.target),
        )),
    }
}

// =============================================================================
// Find
// =============================================================================

fn find(catalog: &Catalog, s: &FindStatement) -> Result<RawResult, SessionError> {
    let schema = &s.target.schema;
    let query = Query::compile(s.criteria.as_ref(), &s.sort, s.limit, s.offset)?;
    let projections = s
        .projection
        .iter()
        .map(|p| eval::parse_projection(p))
        .collect::<Result<Vec<_>, _>>()?;
    let mut env = Env::new(&s.bindings, NO_BINDINGS);

    match s.target.kind {
        TargetKind::Collection => {
            let docs = catalog.collection(schema, &s.target.name)?;
            let picked = query.select(docs, DocumentScope, &mut env)?;
            let mut out = Vec::with_capacity(picked.len());
            for i in picked {
                let doc = &docs[i];
                if projections.is_empty() {
                    out.push(doc.clone());
                    continue;
                }
                let mut projected = Value::document();
                for p in &projections {
                    let value = eval::eval(&p.expr, &DocumentScope(doc), &mut env)?;
                    match p.name.parse::<DocPath>() {
                        Ok(path) => {
                            set_at_path(&mut projected, &path, value).map_err(PatchError::from)?
                        }
                        Err(_) => {
                            if let Some(fields) = projected.as_object_mut() {
                                fields.insert(p.name.clone(), value);
                            }
                        }
                    }
                }
                out.push(projected);
            }
            Ok(RawResult::documents(out).with_warnings(env.warnings))
        }
        TargetKind::Table => {
            let table = catalog.table_ref(schema, &s.target.name)?;
            let rows = visible_rows(catalog, schema, &table)?;
            let picked = query.select(&rows, row_scope(&table.columns), &mut env)?;
            if projections.is_empty() {
                let out = picked.into_iter().map(|i| rows[i].clone()).collect();
                return Ok(RawResult::rows(table.columns.clone(), out).with_warnings(env.warnings));
            }
            let mut out = Vec::with_capacity(picked.len());
            for i in picked {
                let scope = RowScope { columns: &table.columns, values: &rows[i] };
                let row = projections
                    .iter()
                    .map(|p| eval::eval(&p.expr, &scope, &mut env))
                    .collect::<Result<Vec<_>, _>>()?;
                out.push(row);
            }
            let columns = projections.into_iter().map(|p| p.name).collect();
            Ok(RawResult::rows(columns, out).with_warnings(env.warnings))
        }
    }
}

// =============================================================================
// Update / Modify
// =============================================================================

fn update(catalog: &mut Catalog, s: &UpdateStatement) -> Result<RawResult, SessionError> {
    let schema = &s.target.schema;
    let table = catalog.table_ref(schema, &s.target.name)?;
    let query = Query::compile(s.criteria.as_ref(), &s.sort, s.limit, None)?;
    let targets = s
        .assignments
        .iter()
        .map(|a| table.base_index(&a.column).ok_or_else(|| unknown_column(&a.column)))
        .collect::<Result<Vec<_>, _>>()?;
    let mut env = Env::new(&s.bindings, NO_BINDINGS);

    let rows = visible_rows(catalog, schema, &table)?;
    let picked = query.select(&rows, row_scope(&table.columns), &mut env)?;

    let mut changed = Vec::with_capacity(picked.len());
    for i in &picked {
        let mut base = catalog.table(schema, &table.base)?.rows[*i].clone();
        for (assignment, &index) in s.assignments.iter().zip(&targets) {
            // later assignments see earlier ones
            let visible = table.visible(&base);
            let scope = RowScope { columns: &table.columns, values: &visible };
            base[index] = eval::resolve(&assignment.value, &scope, &mut env)?;
        }
        not_null_check(catalog, schema, &table.base, &base)?;
        changed.push((*i, base));
    }

    let data = catalog.table_mut(schema, &table.base)?;
    for (i, row) in changed {
        data.rows[i] = row;
    }
    Ok(RawResult::affected(picked.len() as u64).with_warnings(env.warnings))
}

fn modify(catalog: &mut Catalog, s: &ModifyStatement) -> Result<RawResult, SessionError> {
    let query = Query::compile(s.criteria.as_ref(), &s.sort, s.limit, None)?;
    let mut env = Env::new(&s.bindings, NO_BINDINGS);
    let docs = catalog.collection_mut(&s.target.schema, &s.target.name)?;
    let picked = query.select(&docs[..], DocumentScope, &mut env)?;

    let mut changed = Vec::with_capacity(picked.len());
    for &i in &picked {
        let mut doc = docs[i].clone();
        patch::apply(&mut doc, &s.operations, &mut env)?;
        changed.push((i, doc));
    }
    for (i, doc) in changed {
        docs[i] = doc;
    }
    catalog
        .collection_data(&s.target.schema, &s.target.name)?
        .check_indexes()?;
    Ok(RawResult::affected(picked.len() as u64).with_warnings(env.warnings))
}

// =============================================================================
// Delete
// =============================================================================

fn delete(catalog: &mut Catalog, s: &DeleteStatement) -> Result<RawResult, SessionError> {
    let schema = &s.target.schema;
    let query = Query::compile(s.criteria.as_ref(), &s.sort, s.limit, None)?;
    let mut env = Env::new(&s.bindings, NO_BINDINGS);

    let mut picked = match s.target.kind {
        TargetKind::Collection => {
            let docs = catalog.collection(schema, &s.target.name)?;
            query.select(docs, DocumentScope, &mut env)?
        }
        TargetKind::Table => {
            let table = catalog.table_ref(schema, &s.target.name)?;
            let rows = visible_rows(catalog, schema, &table)?;
            query.select(&rows, row_scope(&table.columns), &mut env)?
        }
    };
    picked.sort_unstable_by(|a, b| b.cmp(a));

    match s.target.kind {
        TargetKind::Collection => {
            let docs = catalog.collection_mut(schema, &s.target.name)?;
            for &i in &picked {
                docs.remove(i);
            }
        }
        TargetKind::Table => {
            let base = catalog.table_ref(schema, &s.target.name)?.base;
            let data = catalog.table_mut(schema, &base)?;
            for &i in &picked {
                data.rows.remove(i);
            }
        }
    }
    Ok(RawResult::affected(picked.len() as u64).with_warnings(env.warnings))
}

// =============================================================================
// SQL
// =============================================================================

fn sql(s: &SqlStatement) -> Result<RawResult, SessionError> {
    let projections = eval::parse_select(&s.text)?;
    let named = BTreeMap::new();
    let mut env = Env::new(&named, &s.arguments);
    let row = projections
        .iter()
        .map(|p| eval::eval(&p.expr, &EmptyScope, &mut env))
        .collect::<Result<Vec<_>, _>>()?;
    let columns = projections.into_iter().map(|p| p.name).collect();
    Ok(RawResult::rows(columns, vec![row]).with_warnings(env.warnings))
}
