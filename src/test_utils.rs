//! Shared test utilities.
//!
//! `MockConnector` stands in for a native engine: it returns scripted rows
//! and records every call so tests can assert what reached the engine.

use std::sync::{Arc, Mutex, OnceLock};

use crate::db::{
    ColumnMeta, Connector, Context, DbError, ExecSummary, NativeRows, ScanType, Stage, Value,
};

/// Serializes tests that touch the working directory or environment.
pub fn test_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

/// A call observed by `MockConnector`.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Open,
    Ping,
    Close,
    Query(String, Vec<Value>),
    Exec(String, Vec<Value>),
}

/// Shared view of the calls a mock received, usable after the mock is boxed.
pub type CallLog = Arc<Mutex<Vec<Call>>>;

#[derive(Debug, Default)]
pub struct MockConnector {
    open: bool,
    calls: CallLog,
    rows: NativeRows,
    rows_affected: Option<u64>,
    fail_ping: bool,
    fail_statements: Option<String>,
    cancel_on: Option<(Call, Context)>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(mut self, rows: NativeRows) -> Self {
        self.rows = rows;
        self
    }

    pub fn with_rows_affected(mut self, n: u64) -> Self {
        self.rows_affected = Some(n);
        self
    }

    pub fn failing_ping(mut self) -> Self {
        self.fail_ping = true;
        self
    }

    /// Every query and exec fails with `message`.
    pub fn failing_statements(mut self, message: &str) -> Self {
        self.fail_statements = Some(message.to_string());
        self
    }

    /// Cancel `ctx` as soon as `call` is received, after it succeeds.
    pub fn cancelling_on(mut self, call: Call, ctx: &Context) -> Self {
        self.cancel_on = Some((call, ctx.clone()));
        self
    }

    pub fn call_log(&self) -> CallLog {
        Arc::clone(&self.calls)
    }

    fn record(&self, call: Call) {
        if let Some((trigger, ctx)) = &self.cancel_on {
            if *trigger == call {
                ctx.cancel();
            }
        }
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    /// Statements notice a context cancelled while they run.
    fn statement_result(&self, ctx: &Context) -> Result<(), DbError> {
        if ctx.is_done() {
            return Err(DbError::Cancelled {
                stage: Stage::Execute,
            });
        }
        match &self.fail_statements {
            Some(message) => Err(DbError::QueryFailed {
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl Connector for MockConnector {
    fn engine_name(&self) -> &'static str {
        "mock"
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn open(&mut self, _ctx: &Context) -> Result<(), DbError> {
        self.record(Call::Open);
        self.open = true;
        Ok(())
    }

    fn ping(&mut self, _ctx: &Context) -> Result<(), DbError> {
        self.record(Call::Ping);
        if self.fail_ping {
            return Err(DbError::PingFailed {
                engine: "mock",
                message: "unreachable".into(),
            });
        }
        Ok(())
    }

    fn close(&mut self, _ctx: &Context) -> Result<(), DbError> {
        self.record(Call::Close);
        self.open = false;
        Ok(())
    }

    fn query(&mut self, ctx: &Context, text: &str, args: &[Value]) -> Result<NativeRows, DbError> {
        self.record(Call::Query(text.to_string(), args.to_vec()));
        self.statement_result(ctx)?;
        Ok(self.rows.clone())
    }

    fn exec(&mut self, ctx: &Context, text: &str, args: &[Value]) -> Result<ExecSummary, DbError> {
        self.record(Call::Exec(text.to_string(), args.to_vec()));
        self.statement_result(ctx)?;
        Ok(ExecSummary {
            rows_affected: self.rows_affected,
        })
    }
}

/// Native rows from `(name, db_type)` columns, scan types taken from the
/// first row.
pub fn native_rows(columns: &[(&str, &str)], rows: Vec<Vec<Value>>) -> NativeRows {
    let columns = columns
        .iter()
        .enumerate()
        .map(|(i, (name, db_type))| {
            let scan_type = rows
                .first()
                .and_then(|r| r.get(i))
                .map(ScanType::of)
                .unwrap_or(ScanType::Unknown);
            ColumnMeta::new(*name, scan_type, *db_type)
        })
        .collect();
    NativeRows { columns, rows }
}
