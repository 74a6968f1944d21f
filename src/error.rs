//! Error taxonomy for request execution.
//!
//! - construction: a request whose shape cannot be rendered at all
//! - render: the dialect cannot turn the request into text
//! - connection: open/ping/close failures, including observed cancellation
//! - native: the engine rejected the rendered statement
//! - decode: a single cell could not be turned into text
//!
//! Render and connection errors abort a request before it reaches the engine.
//! Decode errors are per cell and never fail the surrounding fetch.

use thiserror::Error;

use crate::db::{DbError, Value};
use crate::query::OperationKind;
use crate::request::Status;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("{dialect} has no template for {kind} operations")]
    NoTemplate { dialect: &'static str, kind: OperationKind },

    #[error("{dialect} has no statement for prefab {prefab}")]
    UnsupportedPrefab { dialect: &'static str, prefab: &'static str },

    #[error("{dialect} cannot render {feature}")]
    Unsupported { dialect: &'static str, feature: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Unsupported value of type {value_type} in column of type {column_type}")]
    UnsupportedKind { value_type: &'static str, column_type: String },

    #[error("Cannot resolve {column_type} from {len} bytes: {message}")]
    Unresolvable { column_type: String, len: usize, message: String },

    #[error("No cell at row {row}, column {column}")]
    OutOfRange { row: usize, column: usize },
}

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Malformed request: {message}")]
    Construction { message: String },

    #[error("Render failed: {0}")]
    Render(#[from] RenderError),

    #[error("Connection failed: {0}")]
    Connection(DbError),

    #[error("Executing `{text}` with {} args failed: {source}", .args.len())]
    Native {
        text: String,
        args: Vec<Value>,
        source: DbError,
    },

    #[error("Decode failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("Composite request failed with status {status}")]
    CompositeFailed { status: Status },
}

impl QueryError {
    /// True when the failure was a cancellation observed at a check point.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, QueryError::Connection(DbError::Cancelled { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Stage;
    use rstest::rstest;

    #[rstest]
    fn test_native_error_names_statement() {
        let err = QueryError::Native {
            text: "SELECT 1".into(),
            args: vec![Value::Int(1)],
            source: DbError::QueryFailed {
                message: "boom".into(),
            },
        };
        let msg = err.to_string();
        assert!(msg.contains("SELECT 1"));
        assert!(msg.contains("1 args"));
        assert!(msg.contains("boom"));
    }

    #[rstest]
    fn test_is_cancelled() {
        let err = QueryError::Connection(DbError::Cancelled { stage: Stage::Ping });
        assert!(err.is_cancelled());
        assert!(!QueryError::Construction { message: "x".into() }.is_cancelled());
    }
}
