//! Engine registry.
//!
//! Maps engine names to client factories. A registry is built once, checked
//! for duplicate names at construction, and passed by reference to whatever
//! assembles clients.

use std::collections::HashMap;

use thiserror::Error;

use crate::db::ConnectionConfig;
use crate::db::cozo::CozoConnector;
use crate::db::postgres::PostgresConnector;
use crate::dialect::{CozoDialect, PostgresDialect};

use super::Client;

/// Builds an unopened client from connection parameters.
pub type ClientFactory = fn(&ConnectionConfig) -> Result<Client, RegistryError>;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Engine '{name}' is registered more than once")]
    Duplicate { name: String },

    #[error("No engine registered as '{name}'")]
    UnknownEngine { name: String },

    #[error("Engine '{engine}' cannot use a {config} configuration")]
    ConfigMismatch { engine: &'static str, config: &'static str },

    #[error("Invalid {engine} configuration: {message}")]
    InvalidConfig { engine: &'static str, message: String },
}

#[derive(Debug, Clone)]
pub struct EngineRegistry {
    factories: HashMap<String, ClientFactory>,
}

impl EngineRegistry {
    /// Build a registry, rejecting duplicate names.
    pub fn new<I, S>(entries: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = (S, ClientFactory)>,
        S: Into<String>,
    {
        let mut factories = HashMap::new();
        for (name, factory) in entries {
            let name = name.into();
            if factories.contains_key(&name) {
                return Err(RegistryError::Duplicate { name });
            }
            factories.insert(name, factory);
        }
        Ok(Self { factories })
    }

    /// The built-in engines: `postgres` and `cozo`.
    pub fn with_defaults() -> Self {
        let mut factories: HashMap<String, ClientFactory> = HashMap::new();
        factories.insert("postgres".to_string(), postgres_client);
        factories.insert("cozo".to_string(), cozo_client);
        Self { factories }
    }

    /// Registered engine names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Build a client for the engine registered as `engine`.
    pub fn create_client(&self, engine: &str, config: &ConnectionConfig) -> Result<Client, RegistryError> {
        let factory = self
            .factories
            .get(engine)
            .ok_or_else(|| RegistryError::UnknownEngine {
                name: engine.to_string(),
            })?;
        factory(config)
    }

    /// Build a client for the engine `config` selects.
    pub fn connect(&self, config: &ConnectionConfig) -> Result<Client, RegistryError> {
        self.create_client(config.engine_name(), config)
    }
}

fn postgres_client(config: &ConnectionConfig) -> Result<Client, RegistryError> {
    match config {
        ConnectionConfig::Postgres(pg) => {
            let url = pg
                .build_connection_string()
                .map_err(|e| RegistryError::InvalidConfig {
                    engine: "postgres",
                    message: e.to_string(),
                })?;
            Ok(Client::new(Box::new(PostgresConnector::new(url)), PostgresDialect))
        }
        other => Err(RegistryError::ConfigMismatch {
            engine: "postgres",
            config: other.kind_name(),
        }),
    }
}

fn cozo_client(config: &ConnectionConfig) -> Result<Client, RegistryError> {
    let connector = match config {
        ConnectionConfig::CozoMem => CozoConnector::memory(),
        ConnectionConfig::CozoSqlite { path } => CozoConnector::sqlite(path.clone()),
        other => {
            return Err(RegistryError::ConfigMismatch {
                engine: "cozo",
                config: other.kind_name(),
            });
        }
    };
    Ok(Client::new(Box::new(connector), CozoDialect))
}
