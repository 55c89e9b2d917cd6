//! Configuration type definitions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::operation::{Direction, OperationKind, DEFAULT_CHUNK_SIZE};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Database the fixtures are loaded into.
    pub target: TargetConfig,

    /// Load behavior.
    #[serde(default)]
    pub load: LoadConfig,
}

/// Target database configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Database type: "postgres", "mssql" or "mysql" (default: "postgres").
    #[serde(default = "default_postgres")]
    pub r#type: String,

    /// Database host.
    pub host: String,

    /// Database port (default depends on the type).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Database name.
    pub database: String,

    /// Username.
    pub user: String,

    /// Password.
    #[serde(default)]
    pub password: String,

    /// SSL mode: disable, require, verify-ca, verify-full (default: "require").
    #[serde(default = "default_require")]
    pub ssl_mode: String,
}

impl fmt::Debug for TargetConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetConfig")
            .field("type", &self.r#type)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("ssl_mode", &self.ssl_mode)
            .finish()
    }
}

/// Load behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    /// Maximum rows per INSERT statement (default: 100).
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Table order for the insert step (default: forward).
    #[serde(default)]
    pub direction: Direction,

    /// Operation to run (default: bulk_insert).
    #[serde(default)]
    pub operation: OperationKind,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            direction: Direction::default(),
            operation: OperationKind::default(),
        }
    }
}

fn default_postgres() -> String {
    "postgres".to_string()
}

fn default_require() -> String {
    "require".to_string()
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}
