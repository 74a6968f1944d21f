//! Fixed catalog of introspection requests.
//!
//! Each prefab carries only the key fields its lookup needs. Its success
//! status is a function of the variant, so a prefab cannot exist with a wrong
//! or missing status; the factories on `Request` are the intended way in.

use crate::result::Shape;

use super::response::Status;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prefab {
    /// Names of all databases visible to the connection.
    DatabaseNames,
    /// Names of user tables in `database`, or in the connected database when
    /// `database` is empty.
    TableNames { database: String },
    /// Column names of `table`, in declaration order.
    ColumnNames { table: String },
    /// Number of rows in `table`.
    RowCount { table: String },
    /// Column name, type, nullability and default of every column of `table`.
    TableSchema { table: String },
    /// Engine type name of `table.column`.
    ColumnType { table: String, column: String },
}

impl Prefab {
    pub fn success_status(&self) -> Status {
        match self {
            Prefab::DatabaseNames => Status::DATABASE_NAMES,
            Prefab::TableNames { .. } => Status::TABLE_NAMES,
            Prefab::ColumnNames { .. } => Status::COLUMN_NAMES,
            Prefab::RowCount { .. } => Status::ROW_COUNT,
            Prefab::TableSchema { .. } => Status::TABLE_SCHEMA,
            Prefab::ColumnType { .. } => Status::COLUMN_TYPE,
        }
    }

    pub fn expected_shape(&self) -> Shape {
        match self {
            Prefab::DatabaseNames | Prefab::TableNames { .. } | Prefab::ColumnNames { .. } => {
                Shape::List
            }
            Prefab::RowCount { .. } | Prefab::ColumnType { .. } => Shape::Scalar,
            Prefab::TableSchema { .. } => Shape::Table,
        }
    }

    /// Short name for logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Prefab::DatabaseNames => "database_names",
            Prefab::TableNames { .. } => "table_names",
            Prefab::ColumnNames { .. } => "column_names",
            Prefab::RowCount { .. } => "row_count",
            Prefab::TableSchema { .. } => "table_schema",
            Prefab::ColumnType { .. } => "column_type",
        }
    }
}
