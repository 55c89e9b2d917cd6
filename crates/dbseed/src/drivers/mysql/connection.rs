//! MySQL/MariaDB session used for fixture loading.

use async_trait::async_trait;
use mysql_async::prelude::*;
use mysql_async::{Conn, Opts, OptsBuilder, Params, SslOpts};
use tracing::{debug, info, warn};

use crate::config::TargetConfig;
use crate::core::schema::TableMetadata;
use crate::core::traits::{Connection, Dialect};
use crate::core::value::SqlValue;
use crate::drivers::common::SslMode;
use crate::error::{Result, SeedError};

use super::dialect::MysqlDialect;

const COLUMNS_SQL: &str = "SELECT COLUMN_NAME FROM information_schema.COLUMNS \
     WHERE TABLE_SCHEMA = COALESCE(?, DATABASE()) AND TABLE_NAME = ? \
     ORDER BY ORDINAL_POSITION";

const PRIMARY_KEY_SQL: &str = "SELECT COLUMN_NAME FROM information_schema.COLUMNS \
     WHERE TABLE_SCHEMA = COALESCE(?, DATABASE()) AND TABLE_NAME = ? AND COLUMN_KEY = 'PRI' \
     ORDER BY ORDINAL_POSITION";

/// A single mysql_async connection.
///
/// Primary keys need no special handling: explicit AUTO_INCREMENT values are
/// accepted and the counter moves past them on its own.
pub struct MysqlConnection {
    conn: Conn,
    dialect: MysqlDialect,
}

impl MysqlConnection {
    /// Connect using the target configuration.
    pub async fn connect(config: &TargetConfig) -> Result<Self> {
        let ssl_opts = match SslMode::parse(&config.ssl_mode)? {
            SslMode::Disable => {
                warn!("MySQL TLS is disabled. Credentials will be transmitted in plaintext.");
                None
            }
            SslMode::Require => Some(SslOpts::default().with_danger_accept_invalid_certs(true)),
            SslMode::VerifyCa | SslMode::VerifyFull => Some(SslOpts::default()),
        };

        let mut builder = OptsBuilder::default()
            .ip_or_hostname(&config.host)
            .tcp_port(config.port())
            .db_name(Some(&config.database))
            .user(Some(&config.user))
            .pass(Some(&config.password))
            .init(vec!["SET NAMES utf8mb4"]);
        if let Some(ssl) = ssl_opts {
            builder = builder.ssl_opts(ssl);
        }

        let context = format!("connecting to MySQL at {}", config.display_name());
        let conn = Conn::new(Opts::from(builder))
            .await
            .map_err(|e| SeedError::connection(e, &context))?;

        info!("Connected to MySQL target: {}", config.display_name());
        Ok(Self {
            conn,
            dialect: MysqlDialect,
        })
    }

    async fn column_list(&mut self, sql: &str, metadata: &TableMetadata) -> Result<Vec<String>> {
        let (schema, table) = metadata.split_name();
        let columns: Vec<String> = self
            .conn
            .exec(sql, (schema.map(str::to_string), table.to_string()))
            .await?;
        Ok(columns)
    }
}

#[async_trait]
impl Connection for MysqlConnection {
    fn dialect(&self) -> &dyn Dialect {
        &self.dialect
    }

    async fn table_metadata(&mut self, table: &str) -> Result<TableMetadata> {
        let mut metadata = TableMetadata::new(table, Vec::<String>::new());
        metadata.columns = self.column_list(COLUMNS_SQL, &metadata).await?;
        metadata.primary_keys = self.column_list(PRIMARY_KEY_SQL, &metadata).await?;
        debug!(
            "{}: {} columns, primary key {:?}",
            table,
            metadata.columns.len(),
            metadata.primary_keys
        );
        Ok(metadata)
    }

    async fn disable_primary_keys(&mut self, _table: &TableMetadata) -> Result<()> {
        Ok(())
    }

    async fn enable_primary_keys(&mut self, _table: &TableMetadata) -> Result<()> {
        Ok(())
    }

    async fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64> {
        if params.is_empty() {
            self.conn.query_drop(sql).await?;
        } else {
            let values: Vec<mysql_async::Value> = params.iter().map(sql_value_to_mysql).collect();
            self.conn.exec_drop(sql, Params::Positional(values)).await?;
        }
        Ok(self.conn.affected_rows())
    }
}

/// Convert a dataset value to a MySQL parameter.
///
/// Temporal, decimal and uuid values travel as strings and are parsed by the
/// server into the column type.
fn sql_value_to_mysql(value: &SqlValue) -> mysql_async::Value {
    match value {
        SqlValue::Null => mysql_async::Value::NULL,
        SqlValue::Bool(b) => mysql_async::Value::from(*b),
        SqlValue::I64(i) => mysql_async::Value::from(*i),
        SqlValue::F64(f) => mysql_async::Value::from(*f),
        SqlValue::Text(s) => mysql_async::Value::from(s.as_str()),
        SqlValue::Bytes(b) => mysql_async::Value::from(b.as_slice()),
        other => match other.as_text() {
            Some(text) => mysql_async::Value::from(text),
            None => mysql_async::Value::NULL,
        },
    }
}
