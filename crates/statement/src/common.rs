//! State and validation shared by every builder.

use std::collections::BTreeMap;
use std::sync::Arc;

use fluentdb_core::{
    Criteria, DocPath, Error, Result, Session, SortKey, Statement, Target, Value,
};

use crate::bind::BindTable;
use crate::dispatch::{self, Dispatched};
use crate::placeholder;
use crate::stage::{self, Method, Stage, StatementKind};

/// Stage, target and bindings of one builder.
pub(crate) struct StatementCore {
    pub kind: StatementKind,
    pub stage: Stage,
    pub session: Arc<dyn Session>,
    pub target: Option<Target>,
    pub binds: BindTable,
}

impl StatementCore {
    pub fn new(kind: StatementKind, session: Arc<dyn Session>, target: Option<Target>) -> Self {
        Self {
            kind,
            stage: Stage::Initial,
            session,
            target,
            binds: BindTable::new(),
        }
    }

    pub fn function(&self, method: Method) -> String {
        stage::function_name(self.kind, method)
    }

    pub fn allowed(&self) -> &'static [Method] {
        stage::allowed(self.kind, self.stage)
    }

    /// `IllegalState` unless `method` is legal now.
    pub fn enter(&self, method: Method) -> Result<()> {
        stage::check(self.kind, self.allowed(), method)
    }

    pub fn advance(&mut self, method: Method) {
        self.stage = method.next_stage();
    }

    pub fn target(&self) -> Result<Target> {
        self.target.clone().ok_or_else(|| {
            Error::illegal_state(self.kind.class_name(), "statement has no target object")
        })
    }

    /// Scan filter text and register its placeholders.
    pub fn criteria(&mut self, function: &str, text: &str) -> Result<Criteria> {
        let criteria = scan_criteria(function, text)?;
        self.binds.register(&criteria.placeholders);
        Ok(criteria)
    }

    /// Scan every projection field, registering placeholders only when all
    /// of them are valid.
    pub fn projection<S: AsRef<str>>(
        &mut self,
        function: &str,
        fields: &[S],
    ) -> Result<Vec<String>> {
        let mut scanned = Vec::with_capacity(fields.len());
        for field in fields {
            let field = field.as_ref().trim();
            if field.is_empty() {
                return Err(Error::invalid_argument(
                    function,
                    "Field selection criteria can not contain empty fields",
                ));
            }
            scanned.push(scan_criteria(function, field)?);
        }
        for criteria in &scanned {
            self.binds.register(&criteria.placeholders);
        }
        Ok(scanned.into_iter().map(|c| c.text).collect())
    }

    /// Validate expressions inside `value` and register their placeholders.
    pub fn track(&mut self, function: &str, value: &Value) -> Result<()> {
        let mut names = Vec::new();
        collect_expression_placeholders(function, value, &mut names)?;
        self.binds.register(&names);
        Ok(())
    }

    pub fn bind(&mut self, name: &str, value: Value) -> Result<()> {
        let function = self.function(Method::Bind);
        self.binds.bind(&function, name, value)
    }

    /// Resolved bindings for an execute of this statement.
    pub fn bindings(&self) -> Result<BTreeMap<String, Value>> {
        self.binds.resolve(&self.function(Method::Execute))
    }

    /// Dispatch and enter `Executed` on success.
    pub fn dispatch(&mut self, statement: &Statement) -> Result<Dispatched> {
        let function = self.function(Method::Execute);
        let dispatched = dispatch::execute(self.session.as_ref(), self.kind, &function, statement)?;
        self.advance(Method::Execute);
        Ok(dispatched)
    }
}

/// Criteria text with its named placeholders. `?` is SQL only.
fn scan_criteria(function: &str, text: &str) -> Result<Criteria> {
    let found = placeholder::scan(text).map_err(|e| Error::syntax(function, e.message()))?;
    if found.positional > 0 {
        return Err(Error::syntax(
            function,
            "Positional placeholders are only supported in SQL statements",
        ));
    }
    Ok(Criteria {
        text: text.to_string(),
        placeholders: found.named,
    })
}

fn collect_expression_placeholders(
    function: &str,
    value: &Value,
    names: &mut Vec<String>,
) -> Result<()> {
    match value {
        Value::Expr(e) => {
            if e.text().trim().is_empty() {
                return Err(Error::invalid_argument(
                    function,
                    "Expression can not be empty",
                ));
            }
            let found =
                placeholder::scan(e.text()).map_err(|err| Error::syntax(function, err.message()))?;
            names.extend(found.named);
        }
        Value::Array(items) => {
            for item in items {
                collect_expression_placeholders(function, item, names)?;
            }
        }
        Value::Object(map) => {
            for item in map.values() {
                collect_expression_placeholders(function, item, names)?;
            }
        }
        _ => {}
    }
    Ok(())
}

/// Optional criteria argument; blank text means no filter.
pub(crate) fn optional_criteria(text: Option<&str>) -> Option<&str> {
    text.filter(|t| !t.trim().is_empty())
}

/// Parse a document path argument.
pub(crate) fn doc_path(function: &str, text: &str) -> Result<DocPath> {
    if text.trim().is_empty() {
        return Err(Error::invalid_argument(
            function,
            "Invalid document path: path can not be empty",
        ));
    }
    text.parse::<DocPath>().map_err(|e| {
        Error::invalid_argument(function, format!("Invalid document path '{}': {}", text, e))
    })
}

/// Path that must address an array element (`field[n]`).
pub(crate) fn array_element_path(function: &str, text: &str) -> Result<DocPath> {
    let path = doc_path(function, text)?;
    if !path.is_array_element() {
        return Err(Error::invalid_argument(
            function,
            format!("An array document path must be specified, got '{}'", text),
        ));
    }
    Ok(path)
}

/// Table column name; nested paths are rejected.
pub(crate) fn column_name(function: &str, text: &str) -> Result<String> {
    let path = doc_path(function, text)?;
    match path.field_name() {
        Some(name) => Ok(name.to_string()),
        None => Err(Error::invalid_argument(
            function,
            format!("Invalid column name '{}': nested paths are not allowed", text),
        )),
    }
}

/// Parse `"<path> [ASC|DESC]"` clauses of a collection `sort`.
pub(crate) fn sort_keys<S: AsRef<str>>(function: &str, specs: &[S]) -> Result<Vec<SortKey>> {
    parse_order(function, specs, |text| doc_path(function, text).map(drop))
}

/// Parse `"<column> [ASC|DESC]"` clauses of a table `orderBy`.
pub(crate) fn order_keys<S: AsRef<str>>(function: &str, specs: &[S]) -> Result<Vec<SortKey>> {
    parse_order(function, specs, |text| column_name(function, text).map(drop))
}

fn parse_order<S, F>(function: &str, specs: &[S], check_field: F) -> Result<Vec<SortKey>>
where
    S: AsRef<str>,
    F: Fn(&str) -> Result<()>,
{
    if specs.is_empty() {
        return Err(Error::invalid_argument(
            function,
            "Order criteria can not be empty",
        ));
    }
    specs
        .iter()
        .map(|spec| {
            let key = SortKey::parse(spec.as_ref())
                .map_err(|reason| Error::invalid_argument(function, reason))?;
            check_field(&key.field)?;
            Ok(key)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fluentdb_core::expr;

    #[test]
    fn test_doc_path_errors() {
        let err = doc_path("CollectionModify.set", "").unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
        let err = doc_path("CollectionModify.set", "a[").unwrap_err();
        assert!(err.to_string().contains("unclosed bracket"));
    }

    #[test]
    fn test_array_element_path() {
        assert!(array_element_path("f", "hobbies[0]").is_ok());
        let err = array_element_path("CollectionModify.arrayInsert", "test").unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
    }

    #[test]
    fn test_column_name() {
        assert_eq!(column_name("f", "age").unwrap(), "age");
        assert!(column_name("TableUpdate.set", "address.city").is_err());
        assert!(column_name("TableUpdate.set", "tags[0]").is_err());
    }

    #[test]
    fn test_sort_keys() {
        let keys = sort_keys("f", &["name", "age desc"]).unwrap();
        assert_eq!(keys.len(), 2);
        let empty: [&str; 0] = [];
        let err = sort_keys("CollectionFind.sort", &empty).unwrap_err();
        assert_eq!(
            err.to_string(),
            "CollectionFind.sort: Order criteria can not be empty"
        );
        assert!(sort_keys("f", &["age upward"]).is_err());
        assert_eq!(sort_keys("f", &["address.city desc"]).unwrap()[0].field, "address.city");
    }

    #[test]
    fn test_malformed_sort_fields_rejected() {
        for spec in ["(name", "a+", "age) desc", "name[x]"] {
            let err = sort_keys("CollectionFind.sort", &[spec]).unwrap_err();
            assert!(matches!(err, Error::InvalidArgument { .. }), "{}", spec);
        }
        assert!(order_keys("TableSelect.orderBy", &["age desc"]).is_ok());
        let err = order_keys("TableSelect.orderBy", &["address.city"]).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
        assert!(order_keys("TableSelect.orderBy", &["(age"]).is_err());
    }

    #[test]
    fn test_expression_placeholders_collected_from_nested_values() {
        let mut names = Vec::new();
        let doc = Value::Array(vec![expr(":a + 1"), Value::Int(1), expr("concat(:b, ':c')")]);
        collect_expression_placeholders("f", &doc, &mut names).unwrap();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_blank_expression_rejected() {
        let mut names = Vec::new();
        let err = collect_expression_placeholders("f", &expr("  "), &mut names).unwrap_err();
        assert_eq!(err.to_string(), "f: Expression can not be empty");
    }

    #[test]
    fn test_optional_criteria() {
        assert_eq!(optional_criteria(Some("  ")), None);
        assert_eq!(optional_criteria(Some("a = 1")), Some("a = 1"));
        assert_eq!(optional_criteria(None), None);
    }
}
