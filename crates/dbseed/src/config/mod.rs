//! Configuration loading and validation.

mod types;
mod validation;

pub use types::*;

use crate::error::Result;
use std::path::Path;

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }
}

impl TargetConfig {
    /// Port to connect to, falling back to the engine's default.
    pub fn port(&self) -> u16 {
        self.port.unwrap_or_else(|| default_port(&self.r#type))
    }

    /// `host:port/database`, for logs.
    pub fn display_name(&self) -> String {
        format!("{}:{}/{}", self.host, self.port(), self.database)
    }
}

/// Default TCP port for a target type.
pub fn default_port(db_type: &str) -> u16 {
    match db_type {
        "mssql" => 1433,
        "mysql" => 3306,
        _ => 5432,
    }
}
