//! Result wrappers returned by `execute()`.
//!
//! Results own their data; they never refer back to the builder that
//! produced them.

use std::sync::Arc;
use std::time::Duration;

use fluentdb_core::{Error, RawData, RawResult, Result, Value, Warning};

fn format_elapsed(elapsed: Duration) -> String {
    format!("{:.4} sec", elapsed.as_secs_f64())
}

/// Outcome of add, insert, modify, update, remove and delete.
#[derive(Debug, Clone)]
pub struct WriteResult {
    affected: u64,
    auto_increment: Option<u64>,
    generated_ids: Vec<String>,
    warnings: Vec<Warning>,
    elapsed: Duration,
}

impl WriteResult {
    pub(crate) fn new(raw: RawResult, generated_ids: Vec<String>, elapsed: Duration) -> Self {
        Self {
            affected: raw.affected_items,
            auto_increment: raw.auto_increment,
            generated_ids,
            warnings: raw.warnings,
            elapsed,
        }
    }

    /// Number of documents or rows written.
    pub fn affected_item_count(&self) -> u64 {
        self.affected
    }

    /// Auto-increment value generated by a table insert; the first one for
    /// multi-row inserts.
    pub fn auto_increment_value(&self) -> Option<u64> {
        self.auto_increment
    }

    /// Id generated for the last added document.
    pub fn last_document_id(&self) -> Result<&str> {
        self.generated_ids.last().map(String::as_str).ok_or_else(|| {
            Error::unsupported(
                "Result.getLastDocumentId()",
                "document id is not available.",
            )
        })
    }

    /// Every id generated by the add, in document order.
    pub fn last_document_ids(&self) -> Result<&[String]> {
        if self.generated_ids.is_empty() {
            return Err(Error::unsupported(
                "Result.getLastDocumentIds()",
                "document ids are not available.",
            ));
        }
        Ok(&self.generated_ids)
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Elapsed time formatted as `"0.0012 sec"`.
    pub fn execution_time(&self) -> String {
        format_elapsed(self.elapsed)
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

/// Buffered records with a restartable cursor.
#[derive(Debug, Clone)]
struct Cursor<T> {
    records: Vec<T>,
    position: usize,
}

impl<T: Clone> Cursor<T> {
    fn new(records: Vec<T>) -> Self {
        Self {
            records,
            position: 0,
        }
    }

    fn next(&mut self) -> Option<T> {
        let record = self.records.get(self.position).cloned()?;
        self.position += 1;
        Some(record)
    }

    fn drain(&mut self) -> Vec<T> {
        let rest = self.records[self.position..].to_vec();
        self.position = self.records.len();
        rest
    }

    fn rewind(&mut self) {
        self.position = 0;
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}

/// Documents returned by a collection find.
#[derive(Debug, Clone)]
pub struct DocResult {
    cursor: Cursor<Value>,
    warnings: Vec<Warning>,
    elapsed: Duration,
}

impl DocResult {
    pub(crate) fn new(raw: RawResult, elapsed: Duration) -> Self {
        let docs = match raw.data {
            RawData::Documents(docs) => docs,
            RawData::Rows { rows, .. } => rows
                .into_iter()
                .filter_map(|row| row.into_iter().next())
                .collect(),
            RawData::None => Vec::new(),
        };
        Self {
            cursor: Cursor::new(docs),
            warnings: raw.warnings,
            elapsed,
        }
    }

    /// Next document, `None` once the cursor is exhausted.
    pub fn fetch_one(&mut self) -> Option<Value> {
        self.cursor.next()
    }

    /// Every remaining document. Later calls return an empty vector.
    pub fn fetch_all(&mut self) -> Vec<Value> {
        self.cursor.drain()
    }

    /// Move the cursor back to the first document.
    pub fn rewind(&mut self) {
        self.cursor.rewind();
    }

    /// Number of documents in the result.
    pub fn count(&self) -> usize {
        self.cursor.len()
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    pub fn execution_time(&self) -> String {
        format_elapsed(self.elapsed)
    }
}

/// One table row with its column names.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<Vec<String>>,
    values: Vec<Value>,
}

impl Row {
    /// Value of the named column.
    pub fn get(&self, column: &str) -> Option<&Value> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.values.get(idx)
    }

    /// Value at a column position.
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

/// Rows returned by a table select.
#[derive(Debug, Clone)]
pub struct RowResult {
    columns: Arc<Vec<String>>,
    cursor: Cursor<Vec<Value>>,
    warnings: Vec<Warning>,
    elapsed: Duration,
}

impl RowResult {
    pub(crate) fn new(raw: RawResult, elapsed: Duration) -> Self {
        let (columns, rows) = match raw.data {
            RawData::Rows { columns, rows } => (columns, rows),
            RawData::Documents(docs) => (
                vec!["doc".to_string()],
                docs.into_iter().map(|d| vec![d]).collect(),
            ),
            RawData::None => (Vec::new(), Vec::new()),
        };
        Self {
            columns: Arc::new(columns),
            cursor: Cursor::new(rows),
            warnings: raw.warnings,
            elapsed,
        }
    }

    fn wrap(&self, values: Vec<Value>) -> Row {
        Row {
            columns: Arc::clone(&self.columns),
            values,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Next row, `None` once the cursor is exhausted.
    pub fn fetch_one(&mut self) -> Option<Row> {
        let values = self.cursor.next()?;
        Some(self.wrap(values))
    }

    /// Every remaining row. Later calls return an empty vector.
    pub fn fetch_all(&mut self) -> Vec<Row> {
        self.cursor
            .drain()
            .into_iter()
            .map(|values| self.wrap(values))
            .collect()
    }

    /// Move the cursor back to the first row.
    pub fn rewind(&mut self) {
        self.cursor.rewind();
    }

    /// Number of rows in the result.
    pub fn count(&self) -> usize {
        self.cursor.len()
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    pub fn execution_time(&self) -> String {
        format_elapsed(self.elapsed)
    }
}

/// Result of a SQL statement: rows and write counters together.
#[derive(Debug, Clone)]
pub struct SqlResult {
    rows: RowResult,
    affected: u64,
    auto_increment: Option<u64>,
    has_data: bool,
}

impl SqlResult {
    pub(crate) fn new(raw: RawResult, elapsed: Duration) -> Self {
        let affected = raw.affected_items;
        let auto_increment = raw.auto_increment;
        let has_data = !matches!(raw.data, RawData::None);
        Self {
            rows: RowResult::new(raw, elapsed),
            affected,
            auto_increment,
            has_data,
        }
    }

    /// Whether the statement produced a row set.
    pub fn has_data(&self) -> bool {
        self.has_data
    }

    pub fn affected_item_count(&self) -> u64 {
        self.affected
    }

    pub fn auto_increment_value(&self) -> Option<u64> {
        self.auto_increment
    }

    pub fn columns(&self) -> &[String] {
        self.rows.columns()
    }

    pub fn column_count(&self) -> usize {
        self.rows.column_count()
    }

    pub fn fetch_one(&mut self) -> Option<Row> {
        self.rows.fetch_one()
    }

    pub fn fetch_all(&mut self) -> Vec<Row> {
        self.rows.fetch_all()
    }

    pub fn rewind(&mut self) {
        self.rows.rewind();
    }

    pub fn warnings(&self) -> &[Warning] {
        self.rows.warnings()
    }

    pub fn warning_count(&self) -> usize {
        self.rows.warning_count()
    }

    pub fn execution_time(&self) -> String {
        self.rows.execution_time()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(n: i64) -> RawResult {
        RawResult::documents((0..n).map(Value::Int).collect())
    }

    #[test]
    fn test_write_result_without_ids() {
        let result = WriteResult::new(RawResult::affected(3), vec![], Duration::ZERO);
        assert_eq!(result.affected_item_count(), 3);
        assert_eq!(
            result.last_document_id().unwrap_err().to_string(),
            "Result.getLastDocumentId(): document id is not available."
        );
        assert_eq!(
            result.last_document_ids().unwrap_err().to_string(),
            "Result.getLastDocumentIds(): document ids are not available."
        );
    }

    #[test]
    fn test_write_result_with_ids() {
        let ids = vec!["a".to_string(), "b".to_string()];
        let result = WriteResult::new(RawResult::affected(2), ids, Duration::ZERO);
        assert_eq!(result.last_document_id().unwrap(), "b");
        assert_eq!(result.last_document_ids().unwrap().len(), 2);
    }

    #[test]
    fn test_doc_cursor() {
        let mut result = DocResult::new(docs(3), Duration::ZERO);
        assert_eq!(result.fetch_one(), Some(Value::Int(0)));
        assert_eq!(result.fetch_all(), vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(result.fetch_one(), None);
        assert!(result.fetch_all().is_empty());

        result.rewind();
        assert_eq!(result.fetch_all().len(), 3);
    }

    #[test]
    fn test_row_access() {
        let raw = RawResult::rows(
            vec!["id".into(), "name".into()],
            vec![vec![Value::Int(1), Value::from("jack")]],
        );
        let mut result = RowResult::new(raw, Duration::ZERO);
        assert_eq!(result.column_count(), 2);
        let row = result.fetch_one().unwrap();
        assert_eq!(row.get("name"), Some(&Value::from("jack")));
        assert_eq!(row.get_index(0), Some(&Value::Int(1)));
        assert_eq!(row.get("missing"), None);
        assert!(result.fetch_one().is_none());
    }

    #[test]
    fn test_sql_result_has_data() {
        let write = SqlResult::new(RawResult::affected(1), Duration::ZERO);
        assert!(!write.has_data());
        assert_eq!(write.affected_item_count(), 1);

        let read = SqlResult::new(RawResult::rows(vec!["x".into()], vec![]), Duration::ZERO);
        assert!(read.has_data());
    }

    #[test]
    fn test_execution_time_format() {
        let result = WriteResult::new(
            RawResult::affected(0),
            vec![],
            Duration::from_micros(1200),
        );
        assert_eq!(result.execution_time(), "0.0012 sec");
    }
}
