//! Native engine contract.
//!
//! A `Connector` is the narrow capability surface the execution engine needs
//! from a concrete engine client: open, ping, close, and a text-keyed
//! query/exec pair. Everything engine-specific (wire protocol, value codecs)
//! stays behind this trait.

use std::fmt;

use super::context::Context;
use super::value::Value;
use super::DbError;

/// Kind a driver scanned a column into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanType {
    Bool,
    Int,
    Float,
    Text,
    Bytes,
    Time,
    Json,
    List,
    /// Column held only nulls, or the driver reported nothing usable.
    Unknown,
}

impl ScanType {
    /// Scan type implied by a decoded cell.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => ScanType::Unknown,
            Value::Bool(_) => ScanType::Bool,
            Value::Int(_) => ScanType::Int,
            Value::Float(_) => ScanType::Float,
            Value::Str(_) => ScanType::Text,
            Value::Bytes(_) => ScanType::Bytes,
            Value::Time(_) => ScanType::Time,
            Value::Json(_) => ScanType::Json,
            Value::List(_) => ScanType::List,
        }
    }
}

impl fmt::Display for ScanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ScanType::Bool => "bool",
            ScanType::Int => "int",
            ScanType::Float => "float",
            ScanType::Text => "text",
            ScanType::Bytes => "bytes",
            ScanType::Time => "time",
            ScanType::Json => "json",
            ScanType::List => "list",
            ScanType::Unknown => "unknown",
        })
    }
}

/// Column descriptor reported alongside native rows.
///
/// `db_type` is the engine's own type name (`uuid`, `int4`, ...). It is kept
/// because byte payloads can only be decoded with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMeta {
    pub name: String,
    pub scan_type: ScanType,
    pub db_type: String,
}

impl ColumnMeta {
    pub fn new(name: impl Into<String>, scan_type: ScanType, db_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scan_type,
            db_type: db_type.into(),
        }
    }
}

/// Rows as returned by a connector, before materialization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NativeRows {
    pub columns: Vec<ColumnMeta>,
    pub rows: Vec<Vec<Value>>,
}

/// Outcome of an affecting-rows execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecSummary {
    /// Rows touched, when the engine reports it.
    pub rows_affected: Option<u64>,
}

/// Capability contract every engine client implements.
///
/// Implementations own exactly one native handle and are not reentrant; the
/// engine serializes access to them.
pub trait Connector: Send {
    /// Engine name for logging and error messages.
    fn engine_name(&self) -> &'static str;

    fn is_open(&self) -> bool;

    fn open(&mut self, ctx: &Context) -> Result<(), DbError>;

    fn ping(&mut self, ctx: &Context) -> Result<(), DbError>;

    fn close(&mut self, ctx: &Context) -> Result<(), DbError>;

    /// Run a row-producing statement.
    fn query(&mut self, ctx: &Context, text: &str, args: &[Value]) -> Result<NativeRows, DbError>;

    /// Run a statement for its side effects.
    fn exec(&mut self, ctx: &Context, text: &str, args: &[Value]) -> Result<ExecSummary, DbError>;
}
