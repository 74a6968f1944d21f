//! Configuration file handling for database connections.
//!
//! This module provides loading and parsing of `.crossquery.json` configuration
//! files. The file selects one engine with a type-tagged JSON object.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use crate::db::{ConnectionConfig, PostgresConfig};

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".crossquery.json";

/// Top-level configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    pub database: DatabaseConfigFile,
}

/// Engine selection as written in the file.
///
/// JSON format uses a "type" field with lowercase variant names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DatabaseConfigFile {
    /// Cozo on SQLite storage
    Sqlite { path: PathBuf },
    /// Cozo in memory
    #[serde(rename = "memory")]
    Mem,
    Postgres(PostgresConfig),
}

impl ConfigFile {
    /// Load `.crossquery.json` from the current directory, if there is one.
    pub fn load_if_present() -> Result<Option<Self>, Box<dyn Error>> {
        let path = PathBuf::from(CONFIG_FILE_NAME);
        if !path.exists() {
            return Ok(None);
        }
        Self::load_from(&path).map(Some)
    }

    pub fn load_from(path: &Path) -> Result<Self, Box<dyn Error>> {
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        let config: ConfigFile = serde_json::from_str(&content)
            .map_err(|e| format!("Invalid JSON in {}: {}", path.display(), e))?;
        Ok(config)
    }
}

impl DatabaseConfigFile {
    pub fn to_connection_config(&self) -> ConnectionConfig {
        match self {
            Self::Sqlite { path } => ConnectionConfig::CozoSqlite { path: path.clone() },
            Self::Mem => ConnectionConfig::CozoMem,
            Self::Postgres(pg_config) => ConnectionConfig::Postgres(pg_config.clone()),
        }
    }
}
