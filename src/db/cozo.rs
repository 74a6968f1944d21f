//! Cozo connector.
//!
//! Wraps an embedded `DbInstance`, either in memory or backed by a SQLite
//! file. Positional arguments are bound as named script parameters `p0`,
//! `p1`, ... which is what the Cozo dialect's placeholders refer to.

use std::collections::BTreeMap;
use std::path::PathBuf;

use cozo::{DataValue, DbInstance, NamedRows, Num, ScriptMutability};

use super::backend::{ColumnMeta, Connector, ExecSummary, NativeRows, ScanType};
use super::context::Context;
use super::value::Value;
use super::DbError;

const ENGINE: &str = "cozo";

const PING_SCRIPT: &str = "?[x] <- [[1]]";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Storage {
    Memory,
    Sqlite(PathBuf),
}

/// An embedded Cozo database, opened lazily.
pub struct CozoConnector {
    storage: Storage,
    db: Option<DbInstance>,
}

impl CozoConnector {
    /// In-memory database. Contents are lost on close.
    pub fn memory() -> Self {
        Self {
            storage: Storage::Memory,
            db: None,
        }
    }

    /// SQLite-backed database at `path`, created on open if missing.
    pub fn sqlite(path: PathBuf) -> Self {
        Self {
            storage: Storage::Sqlite(path),
            db: None,
        }
    }

    fn db(&self) -> Result<&DbInstance, DbError> {
        self.db.as_ref().ok_or(DbError::NotOpen { engine: ENGINE })
    }

    fn run(&self, text: &str, args: &[Value]) -> Result<NamedRows, DbError> {
        self.db()?
            .run_script(text, bind_params(args), ScriptMutability::Mutable)
            .map_err(|e| DbError::QueryFailed {
                message: format!("{:?}", e),
            })
    }
}

/// Named parameters for positional `args`.
fn bind_params(args: &[Value]) -> BTreeMap<String, DataValue> {
    args.iter()
        .enumerate()
        .map(|(i, arg)| (format!("p{i}"), to_data_value(arg)))
        .collect()
}

fn to_data_value(value: &Value) -> DataValue {
    match value {
        Value::Null => DataValue::Null,
        Value::Bool(b) => DataValue::Bool(*b),
        Value::Int(i) => DataValue::Num(Num::Int(*i)),
        Value::Float(f) => DataValue::Num(Num::Float(*f)),
        Value::Str(s) => DataValue::Str(s.as_str().into()),
        Value::Bytes(b) => DataValue::Bytes(b.clone()),
        // Seconds since the epoch, as Cozo's own time functions produce
        Value::Time(t) => DataValue::Num(Num::Float(t.timestamp_micros() as f64 / 1_000_000.0)),
        Value::Json(j) => DataValue::Str(j.to_string().into()),
        Value::List(items) => DataValue::List(items.iter().map(to_data_value).collect()),
    }
}

/// Convert a cell. Uuids are kept as their 16 raw bytes and json as its
/// serialized text, both resolved later by the dialect.
fn from_data_value(value: DataValue) -> Value {
    match value {
        DataValue::Null => Value::Null,
        DataValue::Bool(b) => Value::Bool(b),
        DataValue::Num(Num::Int(i)) => Value::Int(i),
        DataValue::Num(Num::Float(f)) => Value::Float(f),
        DataValue::Str(s) => Value::Str(s.to_string()),
        DataValue::Bytes(b) => Value::Bytes(b),
        DataValue::Uuid(u) => Value::Bytes(u.0.as_bytes().to_vec()),
        DataValue::Json(j) => Value::Bytes(j.0.to_string().into_bytes()),
        DataValue::List(items) => Value::List(items.into_iter().map(from_data_value).collect()),
        DataValue::Set(items) => Value::List(items.into_iter().map(from_data_value).collect()),
        other => Value::Str(format!("{:?}", other)),
    }
}

/// Engine type name of a cell, as the dialect expects it.
fn db_type_name(value: &DataValue) -> &'static str {
    match value {
        DataValue::Null => "null",
        DataValue::Bool(_) => "bool",
        DataValue::Num(Num::Int(_)) => "int",
        DataValue::Num(Num::Float(_)) => "float",
        DataValue::Str(_) => "string",
        DataValue::Bytes(_) => "bytes",
        DataValue::Uuid(_) => "uuid",
        DataValue::Json(_) => "json",
        DataValue::List(_) | DataValue::Set(_) => "list",
        DataValue::Regex(_) => "regex",
        DataValue::Vec(_) => "vector",
        DataValue::Validity(_) => "validity",
        DataValue::Bot => "bot",
    }
}

/// Cozo rows carry no column types. Each column is typed by its first
/// non-null cell.
fn to_native_rows(named: NamedRows) -> NativeRows {
    let columns = named
        .headers
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let first = named
                .rows
                .iter()
                .filter_map(|row| row.get(i))
                .find(|cell| !matches!(cell, DataValue::Null));
            match first {
                Some(cell) => ColumnMeta::new(
                    name.as_str(),
                    ScanType::of(&from_data_value(cell.clone())),
                    db_type_name(cell),
                ),
                None => ColumnMeta::new(name.as_str(), ScanType::Unknown, "null"),
            }
        })
        .collect();

    let rows = named
        .rows
        .into_iter()
        .map(|row| row.into_iter().map(from_data_value).collect())
        .collect();

    NativeRows { columns, rows }
}

impl Connector for CozoConnector {
    fn engine_name(&self) -> &'static str {
        ENGINE
    }

    fn is_open(&self) -> bool {
        self.db.is_some()
    }

    fn open(&mut self, _ctx: &Context) -> Result<(), DbError> {
        let opened = match &self.storage {
            Storage::Memory => DbInstance::new("mem", "", ""),
            Storage::Sqlite(path) => DbInstance::new("sqlite", path, ""),
        };
        let db = opened.map_err(|e| DbError::OpenFailed {
            engine: ENGINE,
            message: format!("{:?}", e),
        })?;
        self.db = Some(db);
        Ok(())
    }

    fn ping(&mut self, _ctx: &Context) -> Result<(), DbError> {
        self.run(PING_SCRIPT, &[])
            .map(|_| ())
            .map_err(|e| match e {
                DbError::QueryFailed { message } => DbError::PingFailed {
                    engine: ENGINE,
                    message,
                },
                other => other,
            })
    }

    fn close(&mut self, _ctx: &Context) -> Result<(), DbError> {
        self.db = None;
        Ok(())
    }

    fn query(&mut self, _ctx: &Context, text: &str, args: &[Value]) -> Result<NativeRows, DbError> {
        self.run(text, args).map(to_native_rows)
    }

    fn exec(&mut self, _ctx: &Context, text: &str, args: &[Value]) -> Result<ExecSummary, DbError> {
        self.run(text, args)?;
        // Cozo does not report affected rows
        Ok(ExecSummary { rows_affected: None })
    }
}
