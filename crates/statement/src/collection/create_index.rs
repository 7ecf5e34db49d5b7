//! `Collection::createIndex` builder.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use fluentdb_core::{
    Error, IndexDefinition, IndexField, RawResult, Result, Session, Target, Value,
};

use crate::args::Args;
use crate::common::{doc_path, StatementCore};
use crate::crud::{resolve, Crud, Outcome};
use crate::dispatch;
use crate::result::WriteResult;
use crate::stage::{Method, Stage, StatementKind};

/// Optional index flavour accepted by `createIndex`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexType {
    Unique,
}

impl FromStr for IndexType {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, ()> {
        if s.eq_ignore_ascii_case("unique") {
            Ok(IndexType::Unique)
        } else {
            Err(())
        }
    }
}

impl fmt::Display for IndexType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexType::Unique => write!(f, "Unique"),
        }
    }
}

/// Secondary index creation over document members.
///
/// Runs as an administrative command rather than a statement, so there is
/// nothing to bind and a finished builder accepts no further calls.
pub struct CollectionCreateIndex {
    core: StatementCore,
    name: String,
    unique: bool,
    fields: Vec<IndexField>,
}

impl CollectionCreateIndex {
    pub(crate) fn new(session: Arc<dyn Session>, target: Target) -> Self {
        Self {
            core: StatementCore::new(StatementKind::CollectionCreateIndex, session, Some(target)),
            name: String::new(),
            unique: false,
            fields: Vec::new(),
        }
    }

    pub fn create_index(
        &mut self,
        name: &str,
        index_type: Option<IndexType>,
    ) -> Result<&mut Self> {
        self.core.enter(Method::CreateIndex)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::invalid_argument(
                self.core.function(Method::CreateIndex),
                "Index name can not be empty",
            ));
        }
        self.name = name.to_string();
        self.unique = index_type == Some(IndexType::Unique);
        self.core.advance(Method::CreateIndex);
        Ok(self)
    }

    /// Index one more member. `column_type` is the SQL type of the generated
    /// column, such as `TEXT(20)` or `INTEGER`.
    pub fn field(&mut self, path: &str, column_type: &str, required: bool) -> Result<&mut Self> {
        self.core.enter(Method::Field)?;
        let function = self.core.function(Method::Field);
        let path = doc_path(&function, path)?;
        let column_type = column_type.trim();
        if column_type.is_empty() {
            return Err(Error::invalid_argument(function, "Column type can not be empty"));
        }
        self.fields.push(IndexField {
            path,
            column_type: column_type.to_string(),
            required,
        });
        self.core.advance(Method::Field);
        Ok(self)
    }

    /// Index definition as it stands.
    pub fn definition(&self) -> IndexDefinition {
        IndexDefinition {
            name: self.name.clone(),
            unique: self.unique,
            fields: self.fields.clone(),
        }
    }

    pub fn execute(&mut self) -> Result<WriteResult> {
        self.core.enter(Method::Execute)?;
        let target = self.core.target()?;
        let index = self.definition();
        let elapsed = dispatch::admin(
            self.core.session.as_ref(),
            self.core.kind,
            &self.core.function(Method::Execute),
            &target.to_string(),
            |session| session.create_collection_index(&target.schema, &target.name, &index),
        )?;
        self.core.advance(Method::Execute);
        Ok(WriteResult::new(RawResult::affected(0), Vec::new(), elapsed))
    }
}

impl Crud for CollectionCreateIndex {
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
            Method::CreateIndex => {
                args.between(1, 2)?;
                let name = args.string(0)?;
                let index_type = if args.len() == 2 {
                    let parsed = args.value(1)?.as_str().and_then(|s| s.parse().ok());
                    match parsed {
                        Some(t) => Some(t),
                        None => {
                            return Err(Error::type_mismatch(
                                args.function(),
                                2,
                                "IndexType.Unique",
                            ))
                        }
                    }
                } else {
                    None
                };
                self.create_index(name, index_type)?;
            }
            Method::Field => {
                args.exactly(3)?;
                self.field(args.string(0)?, args.string(1)?, args.boolean(2)?)?;
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

impl fmt::Debug for CollectionCreateIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionCreateIndex")
            .field("stage", &self.core.stage)
            .field("index", &self.definition())
            .finish()
    }
}
