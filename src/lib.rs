//! crossquery library - one request model over several database engines
//!
//! Callers build engine-neutral requests (reads, writes, introspection
//! prefabs, batches and chains), a dialect renders them for the target
//! engine, and the execution engine runs them and materializes rows into
//! scalar, list or table results.
//!
//! PostgreSQL and Cozo (in memory or SQLite-backed) are supported.

pub mod cli;
pub mod config;
pub mod db;
pub mod dialect;
pub mod engine;
pub mod error;
pub mod output;
pub mod query;
pub mod request;
pub mod result;

#[cfg(test)]
pub mod test_utils;
