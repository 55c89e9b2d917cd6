//! Database driver implementations.
//!
//! - [`postgres`]: PostgreSQL via tokio-postgres
//! - [`mssql`]: Microsoft SQL Server via tiberius
//! - [`mysql`]: MySQL/MariaDB via mysql_async (`mysql` feature)
//! - [`dry_run`]: records calls without a server
//!
//! Each driver provides a `Dialect` and a `Connection` holding exactly one
//! session.

pub mod common;
pub mod dry_run;
pub mod mssql;
pub mod mysql;
pub mod postgres;

pub use common::{SslMode, TlsBuilder};
pub use dry_run::{DryRunConnection, Recorded};
pub use mssql::{MssqlConnection, MssqlDialect};
#[cfg(feature = "mysql")]
pub use mysql::MysqlConnection;
pub use mysql::MysqlDialect;
pub use postgres::{PostgresConnection, PostgresDialect};

use tracing::info;

use crate::config::TargetConfig;
use crate::core::traits::{Connection, Dialect};
use crate::error::{Result, SeedError};

/// Dialect for a target type name.
pub fn dialect_for(db_type: &str) -> Result<Box<dyn Dialect>> {
    match db_type {
        "postgres" => Ok(Box::new(PostgresDialect)),
        "mssql" => Ok(Box::new(MssqlDialect)),
        "mysql" => Ok(Box::new(MysqlDialect)),
        other => Err(SeedError::Config(format!("Unknown target type '{}'", other))),
    }
}

/// Open a session on the configured target.
pub async fn connect(config: &TargetConfig) -> Result<Box<dyn Connection>> {
    info!("Opening {} session on {}", config.r#type, config.display_name());
    match config.r#type.as_str() {
        "postgres" => Ok(Box::new(PostgresConnection::connect(config).await?)),
        "mssql" => Ok(Box::new(MssqlConnection::connect(config).await?)),
        #[cfg(feature = "mysql")]
        "mysql" => Ok(Box::new(MysqlConnection::connect(config).await?)),
        #[cfg(not(feature = "mysql"))]
        "mysql" => Err(SeedError::Config(
            "MySQL support is not compiled in; rebuild with --features mysql".into(),
        )),
        other => Err(SeedError::Config(format!("Unknown target type '{}'", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_for() {
        assert_eq!(dialect_for("postgres").unwrap().param_placeholder(3), "$3");
        assert_eq!(dialect_for("mssql").unwrap().param_placeholder(3), "@P3");
        assert_eq!(dialect_for("mysql").unwrap().param_placeholder(3), "?");
        assert!(matches!(dialect_for("oracle"), Err(SeedError::Config(_))));
    }
}
