//! Native engine layer.
//!
//! This module holds everything that touches a concrete engine:
//! - The `Connector` capability contract and the raw row shape it returns
//! - Engine-neutral `Value`s exchanged in both directions
//! - Cancellation `Context` and connection configuration
//! - The PostgreSQL and Cozo clients
//!
//! # Architecture
//!
//! Connectors never see requests, descriptors or dialects. They receive final
//! statement text plus positional arguments and hand back `NativeRows` whose
//! cells are decoded as far as the driver can manage. Cells the driver cannot
//! decode stay as raw bytes, tagged by column with the engine's type name, so
//! the dialect can resolve them later.

mod backend;
pub mod config;
mod context;
pub mod cozo;
pub mod escape;
pub mod postgres;
mod value;

pub use backend::{ColumnMeta, Connector, ExecSummary, NativeRows, ScanType};
pub use config::{ConnectionConfig, PostgresConfig};
pub use context::{Context, Stage};
pub use value::{TIME_FORMAT, Value};

use thiserror::Error;

/// Errors reported by connectors.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("Cancelled at {stage}")]
    Cancelled { stage: Stage },

    #[error("Failed to open {engine} connection: {message}")]
    OpenFailed { engine: &'static str, message: String },

    #[error("Ping to {engine} failed: {message}")]
    PingFailed { engine: &'static str, message: String },

    #[error("Failed to close {engine} connection: {message}")]
    CloseFailed { engine: &'static str, message: String },

    #[error("{engine} connection is not open")]
    NotOpen { engine: &'static str },

    #[error("Query failed: {message}")]
    QueryFailed { message: String },

    #[error("{engine} connection handle poisoned by an earlier panic")]
    Poisoned { engine: &'static str },
}
