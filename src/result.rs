//! Generic result shapes.
//!
//! Native rows are materialized into a scalar, a list (one column) or a table.
//! Cells keep the value the driver produced; turning a cell into text happens
//! only when a consumer asks for it, through `get_row_column` and friends. A
//! byte payload is resolved by the dialect at that point, so a column the
//! dialect cannot decode fails only the cells that are actually read.

use crate::db::{ColumnMeta, NativeRows, TIME_FORMAT, Value};
use crate::dialect::{AnyDialect, Dialect};
use crate::error::DecodeError;

/// Text used for null cells.
pub const NULL_TEXT: &str = "null";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Scalar,
    List,
    Table,
}

/// Render one cell as text.
///
/// Primitive values format directly, times use `TIME_FORMAT`, byte payloads
/// go through `dialect.resolve_type` with the column's engine type name.
pub fn format_cell(value: &Value, db_type: &str, dialect: &AnyDialect) -> Result<String, DecodeError> {
    match value {
        Value::Null => Ok(NULL_TEXT.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Int(i) => Ok(i.to_string()),
        Value::Float(f) => Ok(f.to_string()),
        Value::Str(s) => Ok(s.clone()),
        Value::Time(t) => Ok(t.format(TIME_FORMAT).to_string()),
        Value::Bytes(bytes) => match dialect.resolve_type(db_type, bytes)? {
            Value::Bytes(_) => Err(unsupported(value, db_type)),
            resolved => format_cell(&resolved, db_type, dialect),
        },
        Value::Json(_) | Value::List(_) => Err(unsupported(value, db_type)),
    }
}

fn unsupported(value: &Value, db_type: &str) -> DecodeError {
    DecodeError::UnsupportedKind {
        value_type: value.type_name(),
        column_type: db_type.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScalarResult {
    column: ColumnMeta,
    value: Value,
    dialect: AnyDialect,
}

impl ScalarResult {
    pub fn column(&self) -> &ColumnMeta {
        &self.column
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn text(&self) -> Result<String, DecodeError> {
        format_cell(&self.value, &self.column.db_type, &self.dialect)
    }
}

/// A single column: scan type and engine type are recorded once.
#[derive(Debug, Clone, PartialEq)]
pub struct ListResult {
    column: ColumnMeta,
    values: Vec<Value>,
    dialect: AnyDialect,
}

impl ListResult {
    pub fn column(&self) -> &ColumnMeta {
        &self.column
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

    pub fn get(&self, index: usize) -> Result<String, DecodeError> {
        let value = self
            .values
            .get(index)
            .ok_or(DecodeError::OutOfRange { row: index, column: 0 })?;
        format_cell(value, &self.column.db_type, &self.dialect)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableResult {
    columns: Vec<ColumnMeta>,
    rows: Vec<Vec<Value>>,
    dialect: AnyDialect,
}

impl TableResult {
    pub fn columns(&self) -> &[ColumnMeta] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Decode one cell on demand.
    pub fn get_row_column(&self, row: usize, column: usize) -> Result<String, DecodeError> {
        let out_of_range = DecodeError::OutOfRange { row, column };
        let value = self
            .rows
            .get(row)
            .and_then(|r| r.get(column))
            .ok_or_else(|| out_of_range.clone())?;
        let meta = self.columns.get(column).ok_or(out_of_range)?;
        format_cell(value, &meta.db_type, &self.dialect)
    }

    /// Like `get_row_column`, but a decode failure becomes the cell's text.
    pub fn cell_text(&self, row: usize, column: usize) -> String {
        self.get_row_column(row, column)
            .unwrap_or_else(|e| e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GenericResult {
    Scalar(ScalarResult),
    List(ListResult),
    Table(TableResult),
}

impl GenericResult {
    pub fn shape(&self) -> Shape {
        match self {
            GenericResult::Scalar(_) => Shape::Scalar,
            GenericResult::List(_) => Shape::List,
            GenericResult::Table(_) => Shape::Table,
        }
    }

    pub fn column_names(&self) -> Vec<String> {
        match self {
            GenericResult::Scalar(s) => vec![s.column.name.clone()],
            GenericResult::List(l) => vec![l.column.name.clone()],
            GenericResult::Table(t) => t.columns.iter().map(|c| c.name.clone()).collect(),
        }
    }

    /// Every cell as text, decode failures inlined as their message.
    pub fn rendered_rows(&self) -> Vec<Vec<String>> {
        let or_message = |r: Result<String, DecodeError>| r.unwrap_or_else(|e| e.to_string());
        match self {
            GenericResult::Scalar(s) => vec![vec![or_message(s.text())]],
            GenericResult::List(l) => (0..l.len()).map(|i| vec![or_message(l.get(i))]).collect(),
            GenericResult::Table(t) => (0..t.row_count())
                .map(|r| (0..t.columns.len()).map(|c| t.cell_text(r, c)).collect())
                .collect(),
        }
    }
}

/// Turn native rows into a generic result.
///
/// With no hint the column count decides: one column is a list, anything
/// else a table. A hint is honoured when the rows fit it: a scalar needs one
/// column and at most one row, a list one column, and a table always fits.
pub fn materialize(native: NativeRows, hint: Option<Shape>, dialect: AnyDialect) -> GenericResult {
    let NativeRows { mut columns, rows } = native;
    let single = columns.len() == 1;

    match hint {
        Some(Shape::Scalar) if single && rows.len() <= 1 => {
            let value = rows
                .into_iter()
                .next()
                .and_then(|r| r.into_iter().next())
                .unwrap_or(Value::Null);
            GenericResult::Scalar(ScalarResult {
                column: columns.remove(0),
                value,
                dialect,
            })
        }
        Some(Shape::Table) => GenericResult::Table(TableResult { columns, rows, dialect }),
        _ if single => GenericResult::List(ListResult {
            column: columns.remove(0),
            values: rows
                .into_iter()
                .map(|r| r.into_iter().next().unwrap_or(Value::Null))
                .collect(),
            dialect,
        }),
        _ => GenericResult::Table(TableResult { columns, rows, dialect }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ScanType;
    use crate::dialect::{CozoDialect, PostgresDialect};
    use chrono::{FixedOffset, TimeZone};
    use rstest::rstest;

    fn pg() -> AnyDialect {
        PostgresDialect.into()
    }

    fn col(name: &str, db_type: &str) -> ColumnMeta {
        ColumnMeta::new(name, ScanType::Unknown, db_type)
    }

    fn native(columns: &[(&str, &str)], rows: Vec<Vec<Value>>) -> NativeRows {
        NativeRows {
            columns: columns.iter().map(|(n, t)| col(n, t)).collect(),
            rows,
        }
    }

    #[rstest]
    fn test_single_column_is_list() {
        let rows = native(&[("id", "int4")], vec![vec![Value::Int(1)], vec![Value::Int(2)]]);
        let result = materialize(rows, None, pg());
        assert_eq!(result.shape(), Shape::List);
        let GenericResult::List(list) = result else { panic!("Expected list") };
        assert_eq!(list.column().db_type, "int4");
        assert_eq!(list.get(1).unwrap(), "2");
    }

    #[rstest]
    fn test_multi_column_is_table() {
        let rows = native(&[("id", "int4"), ("name", "text")], vec![vec![Value::Int(1), "a".into()]]);
        assert_eq!(materialize(rows, None, pg()).shape(), Shape::Table);
    }

    #[rstest]
    fn test_scalar_hint_on_single_cell() {
        let rows = native(&[("count", "int8")], vec![vec![Value::Int(42)]]);
        let result = materialize(rows, Some(Shape::Scalar), pg());
        let GenericResult::Scalar(s) = result else { panic!("Expected scalar") };
        assert_eq!(s.text().unwrap(), "42");
    }

    #[rstest]
    fn test_scalar_hint_without_rows_is_null() {
        let rows = native(&[("data_type", "text")], vec![]);
        let GenericResult::Scalar(s) = materialize(rows, Some(Shape::Scalar), pg()) else {
            panic!("Expected scalar")
        };
        assert_eq!(s.text().unwrap(), "null");
    }

    #[rstest]
    fn test_table_hint_keeps_single_column_as_table() {
        let rows = native(&[("id", "int4")], vec![vec![Value::Int(1)]]);
        assert_eq!(materialize(rows, Some(Shape::Table), pg()).shape(), Shape::Table);
    }

    #[rstest]
    fn test_unfit_hint_falls_back_to_column_count() {
        let rows = native(&[("a", "int4"), ("b", "int4")], vec![]);
        assert_eq!(materialize(rows, Some(Shape::List), pg()).shape(), Shape::Table);
    }

    #[rstest]
    #[case(Value::Null, "null")]
    #[case(Value::Bool(false), "false")]
    #[case(Value::Float(1.5), "1.5")]
    #[case(Value::Str("x".into()), "x")]
    fn test_format_primitives(#[case] value: Value, #[case] expected: &str) {
        assert_eq!(format_cell(&value, "any", &pg()).unwrap(), expected);
    }

    #[rstest]
    fn test_format_time() {
        let offset = FixedOffset::west_opt(5 * 3600).unwrap();
        let t = offset.with_ymd_and_hms(2023, 12, 31, 23, 59, 58).unwrap();
        assert_eq!(
            format_cell(&Value::Time(t), "timestamptz", &pg()).unwrap(),
            "2023-12-31 23:59:58.000000-05"
        );
    }

    #[rstest]
    fn test_format_bytes_resolved_by_dialect() {
        let bytes = uuid::Uuid::nil().as_bytes().to_vec();
        assert_eq!(
            format_cell(&Value::Bytes(bytes), "uuid", &pg()).unwrap(),
            "00000000-0000-0000-0000-000000000000"
        );
    }

    #[rstest]
    fn test_json_cell_is_decode_error() {
        let err = format_cell(&Value::Json(serde_json::json!([1])), "jsonb", &pg()).unwrap_err();
        assert_eq!(
            err,
            DecodeError::UnsupportedKind {
                value_type: "json",
                column_type: "jsonb".into()
            }
        );
    }

    #[rstest]
    fn test_bad_cell_does_not_poison_row() {
        let rows = native(
            &[("id", "int4"), ("blob", "geometry"), ("name", "text")],
            vec![vec![Value::Int(7), Value::Bytes(vec![1, 2, 3]), "ada".into()]],
        );
        let GenericResult::Table(table) = materialize(rows, None, pg()) else {
            panic!("Expected table")
        };
        assert!(table.get_row_column(0, 1).is_err());
        assert_eq!(table.get_row_column(0, 0).unwrap(), "7");
        assert_eq!(table.get_row_column(0, 2).unwrap(), "ada");
        assert!(table.cell_text(0, 1).contains("geometry"));
    }

    #[rstest]
    fn test_out_of_range_cell() {
        let rows = native(&[("a", "int4"), ("b", "int4")], vec![]);
        let GenericResult::Table(table) = materialize(rows, None, pg()) else {
            panic!("Expected table")
        };
        assert_eq!(
            table.get_row_column(0, 0),
            Err(DecodeError::OutOfRange { row: 0, column: 0 })
        );
    }

    #[rstest]
    fn test_rendered_rows_inline_errors() {
        let rows = native(&[("v", "json")], vec![vec![Value::Json(serde_json::json!(1))], vec![Value::Int(2)]]);
        let result = materialize(rows, None, CozoDialect.into());
        let rendered = result.rendered_rows();
        assert!(rendered[0][0].contains("Unsupported"));
        assert_eq!(rendered[1][0], "2");
    }
}
