//! Statement stages and the capability table.
//!
//! Every builder carries a [`Stage`]. Before each call it consults
//! [`allowed`] for its [`StatementKind`]; calls outside the returned set fail
//! with `IllegalState`. The same table answers `allowed_methods()` for script
//! bindings.

use std::fmt;

use fluentdb_core::{Error, Result};

/// Operation kind of a builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    CollectionAdd,
    CollectionFind,
    CollectionModify,
    CollectionRemove,
    CollectionCreateIndex,
    TableInsert,
    TableSelect,
    TableUpdate,
    TableDelete,
    Sql,
}

impl StatementKind {
    /// Class name exposed to scripts.
    pub fn class_name(&self) -> &'static str {
        match self {
            StatementKind::CollectionAdd => "CollectionAdd",
            StatementKind::CollectionFind => "CollectionFind",
            StatementKind::CollectionModify => "CollectionModify",
            StatementKind::CollectionRemove => "CollectionRemove",
            StatementKind::CollectionCreateIndex => "CollectionCreateIndex",
            StatementKind::TableInsert => "TableInsert",
            StatementKind::TableSelect => "TableSelect",
            StatementKind::TableUpdate => "TableUpdate",
            StatementKind::TableDelete => "TableDelete",
            StatementKind::Sql => "SqlExecute",
        }
    }

    /// Every method the kind exposes in any stage.
    pub fn methods(&self) -> &'static [Method] {
        use Method::*;
        match self {
            StatementKind::CollectionAdd => &[Add, Execute],
            StatementKind::CollectionFind => &[Fields, Sort, Limit, Skip, Bind, Execute],
            StatementKind::CollectionModify => &[
                Set,
                Unset,
                Merge,
                ArrayInsert,
                ArrayAppend,
                ArrayDelete,
                Sort,
                Limit,
                Bind,
                Execute,
            ],
            StatementKind::CollectionRemove => &[Sort, Limit, Bind, Execute],
            StatementKind::CollectionCreateIndex => &[CreateIndex, Field, Execute],
            StatementKind::TableInsert => &[Values, Execute],
            StatementKind::TableSelect => &[Where, OrderBy, Limit, Offset, Bind, Execute],
            StatementKind::TableUpdate => &[Set, Where, OrderBy, Limit, Bind, Execute],
            StatementKind::TableDelete => &[Where, OrderBy, Limit, Bind, Execute],
            StatementKind::Sql => &[Bind, Execute],
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.class_name())
    }
}

/// Position of a builder in its call chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Fresh builder
    Initial,
    /// After `createIndex`
    Declared,
    /// At least one add/values/set/patch staged
    Operation,
    /// After `fields`
    Projected,
    /// After `where`
    Filtered,
    /// After `sort` / `orderBy`
    Sorted,
    /// After `limit`
    Limited,
    /// After `skip` / `offset`
    Offset,
    /// After `bind`
    Bound,
    /// After a successful `execute`
    Executed,
}

/// Builder method, named as scripts see it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    CreateIndex,
    Field,
    Add,
    Values,
    Fields,
    Set,
    Unset,
    Merge,
    ArrayInsert,
    ArrayAppend,
    ArrayDelete,
    Where,
    Sort,
    OrderBy,
    Limit,
    Skip,
    Offset,
    Bind,
    Execute,
}

impl Method {
    pub fn name(&self) -> &'static str {
        match self {
            Method::CreateIndex => "createIndex",
            Method::Field => "field",
            Method::Add => "add",
            Method::Values => "values",
            Method::Fields => "fields",
            Method::Set => "set",
            Method::Unset => "unset",
            Method::Merge => "merge",
            Method::ArrayInsert => "arrayInsert",
            Method::ArrayAppend => "arrayAppend",
            Method::ArrayDelete => "arrayDelete",
            Method::Where => "where",
            Method::Sort => "sort",
            Method::OrderBy => "orderBy",
            Method::Limit => "limit",
            Method::Skip => "skip",
            Method::Offset => "offset",
            Method::Bind => "bind",
            Method::Execute => "execute",
        }
    }

    /// Method of `kind` called `name`.
    pub fn lookup(kind: StatementKind, name: &str) -> Option<Method> {
        kind.methods().iter().copied().find(|m| m.name() == name)
    }

    /// Stage a builder enters after this call succeeds.
    pub fn next_stage(&self) -> Stage {
        match self {
            Method::Add
            | Method::Values
            | Method::Set
            | Method::Unset
            | Method::Merge
            | Method::ArrayInsert
            | Method::ArrayAppend
            | Method::ArrayDelete => Stage::Operation,
            Method::CreateIndex => Stage::Declared,
            Method::Field => Stage::Operation,
            Method::Fields => Stage::Projected,
            Method::Where => Stage::Filtered,
            Method::Sort | Method::OrderBy => Stage::Sorted,
            Method::Limit => Stage::Limited,
            Method::Skip | Method::Offset => Stage::Offset,
            Method::Bind => Stage::Bound,
            Method::Execute => Stage::Executed,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Methods legal for `kind` in `stage`.
pub fn allowed(kind: StatementKind, stage: Stage) -> &'static [Method] {
    use Method::*;
    use Stage as S;
    use StatementKind as K;

    const BIND_EXECUTE: &[Method] = &[Bind, Execute];

    match (kind, stage) {
        (K::CollectionAdd, S::Initial) => &[Add],
        (K::CollectionAdd, S::Operation) => &[Add, Execute],
        (K::CollectionAdd, _) => &[Execute],

        (K::CollectionFind, S::Initial) => &[Fields, Sort, Limit, Bind, Execute],
        (K::CollectionFind, S::Projected) => &[Sort, Limit, Bind, Execute],
        (K::CollectionFind, S::Sorted) => &[Limit, Bind, Execute],
        (K::CollectionFind, S::Limited) => &[Skip, Bind, Execute],
        (K::CollectionFind, _) => BIND_EXECUTE,

        (K::CollectionModify, S::Initial) => {
            &[Set, Unset, Merge, ArrayInsert, ArrayAppend, ArrayDelete]
        }
        (K::CollectionModify, S::Operation) => &[
            Set,
            Unset,
            Merge,
            ArrayInsert,
            ArrayAppend,
            ArrayDelete,
            Sort,
            Limit,
            Bind,
            Execute,
        ],
        (K::CollectionModify, S::Sorted) => &[Limit, Bind, Execute],
        (K::CollectionModify, _) => BIND_EXECUTE,

        (K::CollectionRemove, S::Initial) => &[Sort, Limit, Bind, Execute],
        (K::CollectionRemove, S::Sorted) => &[Limit, Bind, Execute],
        (K::CollectionRemove, _) => BIND_EXECUTE,

        (K::CollectionCreateIndex, S::Initial) => &[CreateIndex],
        (K::CollectionCreateIndex, S::Declared) => &[Field],
        (K::CollectionCreateIndex, S::Operation) => &[Field, Execute],
        (K::CollectionCreateIndex, _) => &[],

        (K::TableInsert, S::Initial) => &[Values],
        (K::TableInsert, S::Operation) => &[Values, Execute],
        (K::TableInsert, _) => &[Execute],

        (K::TableSelect, S::Initial) => &[Where, OrderBy, Limit, Bind, Execute],
        (K::TableSelect, S::Filtered) => &[OrderBy, Limit, Bind, Execute],
        (K::TableSelect, S::Sorted) => &[Limit, Bind, Execute],
        (K::TableSelect, S::Limited) => &[Offset, Bind, Execute],
        (K::TableSelect, _) => BIND_EXECUTE,

        (K::TableUpdate, S::Initial) => &[Set],
        (K::TableUpdate, S::Operation) => &[Set, Where, OrderBy, Limit, Bind, Execute],
        (K::TableUpdate, S::Filtered) => &[OrderBy, Limit, Bind, Execute],
        (K::TableUpdate, S::Sorted) => &[Limit, Bind, Execute],
        (K::TableUpdate, _) => BIND_EXECUTE,

        (K::TableDelete, S::Initial) => &[Where, OrderBy, Limit, Bind, Execute],
        (K::TableDelete, S::Filtered) => &[OrderBy, Limit, Bind, Execute],
        (K::TableDelete, S::Sorted) => &[Limit, Bind, Execute],
        (K::TableDelete, _) => BIND_EXECUTE,

        (K::Sql, _) => BIND_EXECUTE,
    }
}

/// `Kind.method`, the function name used in error messages.
pub fn function_name(kind: StatementKind, method: Method) -> String {
    format!("{}.{}", kind.class_name(), method.name())
}

/// Fail with `IllegalState` unless `method` is in `allowed`.
pub fn check(kind: StatementKind, allowed: &[Method], method: Method) -> Result<()> {
    if allowed.contains(&method) {
        Ok(())
    } else {
        Err(Error::illegal_state(
            function_name(kind, method),
            format!("Forbidden usage of {}", method.name()),
        ))
    }
}
