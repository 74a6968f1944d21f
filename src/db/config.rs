//! Connection configuration for runtime engine selection.
//!
//! A `ConnectionConfig` only carries connection parameters; turning it into a
//! client is the engine registry's job.

use std::error::Error;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Which engine to talk to, and how to reach it.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionConfig {
    /// PostgreSQL server.
    Postgres(PostgresConfig),

    /// Embedded Cozo with SQLite storage.
    CozoSqlite { path: PathBuf },

    /// Embedded Cozo with in-memory storage.
    CozoMem,
}

/// PostgreSQL connection parameters.
///
/// Either `connection_string` is set and used verbatim, or the individual
/// fields are assembled into a libpq key/value string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostgresConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// 0 means the default port.
    #[serde(default)]
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(default)]
    pub ssl: bool,
}

const DEFAULT_POSTGRES_PORT: u16 = 5432;

impl PostgresConfig {
    pub fn from_connection_string(url: impl Into<String>) -> Self {
        Self {
            connection_string: Some(url.into()),
            ..Default::default()
        }
    }

    /// Build the string handed to the driver.
    ///
    /// # Errors
    /// Returns an error when neither a connection string nor a host is set.
    pub fn build_connection_string(&self) -> Result<String, Box<dyn Error>> {
        if let Some(url) = &self.connection_string {
            return Ok(url.clone());
        }

        let host = self
            .host
            .as_deref()
            .ok_or("PostgreSQL config needs either connection_string or host")?;
        let port = if self.port == 0 { DEFAULT_POSTGRES_PORT } else { self.port };

        let mut parts = vec![format!("host={host}"), format!("port={port}")];
        if let Some(user) = &self.user {
            parts.push(format!("user={}", quote_param(user)));
        }
        if let Some(password) = &self.password {
            parts.push(format!("password={}", quote_param(password)));
        }
        if let Some(database) = &self.database {
            parts.push(format!("dbname={}", quote_param(database)));
        }
        parts.push(format!("sslmode={}", if self.ssl { "require" } else { "disable" }));
        Ok(parts.join(" "))
    }
}

/// libpq key/value quoting: wrap in single quotes when needed, escaping `'`
/// and `\`.
fn quote_param(value: &str) -> String {
    if !value.is_empty() && !value.contains([' ', '\'', '\\']) {
        return value.to_string();
    }
    let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{escaped}'")
}

impl ConnectionConfig {
    /// Name of the engine this config selects, as known to the registry.
    pub fn engine_name(&self) -> &'static str {
        match self {
            Self::Postgres(_) => "postgres",
            Self::CozoSqlite { .. } | Self::CozoMem => "cozo",
        }
    }

    /// Short description of the variant for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Postgres(_) => "postgres",
            Self::CozoSqlite { .. } => "sqlite",
            Self::CozoMem => "memory",
        }
    }

    /// Parse from a connection URL or file path.
    ///
    /// Supported formats:
    /// - `postgres://...` or `postgresql://...` → Postgres
    /// - `sqlite:///path/to/db` → CozoSqlite
    /// - `:memory:` → CozoMem
    /// - anything else is a file path → CozoSqlite
    pub fn from_url(url: &str) -> Result<Self, Box<dyn Error>> {
        let url = url.trim();
        if url.is_empty() {
            return Err("Empty connection URL".into());
        }

        if url == ":memory:" {
            return Ok(Self::CozoMem);
        }

        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            return Ok(Self::Postgres(PostgresConfig::from_connection_string(url)));
        }

        if let Some(path) = url.strip_prefix("sqlite://") {
            return Ok(Self::CozoSqlite {
                path: PathBuf::from(path),
            });
        }

        Ok(Self::CozoSqlite {
            path: PathBuf::from(url),
        })
    }

    /// Load from environment variables.
    ///
    /// Checks in order:
    /// 1. DATABASE_URL
    /// 2. COZO_PATH
    pub fn from_env() -> Result<Option<Self>, Box<dyn Error>> {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            return Ok(Some(Self::from_url(&url)?));
        }

        if let Ok(path) = std::env::var("COZO_PATH") {
            return Ok(Some(Self::CozoSqlite {
                path: PathBuf::from(path),
            }));
        }

        Ok(None)
    }

    /// Resolve configuration from config file and environment.
    ///
    /// Priority: `.crossquery.json` > environment > in-memory Cozo.
    pub fn resolve() -> Result<Self, Box<dyn Error>> {
        if let Some(config_file) = crate::config::ConfigFile::load_if_present()? {
            return Ok(config_file.database.to_connection_config());
        }

        if let Some(config) = Self::from_env()? {
            return Ok(config);
        }

        Ok(Self::CozoMem)
    }
}
