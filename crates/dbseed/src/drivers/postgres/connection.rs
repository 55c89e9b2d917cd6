//! PostgreSQL session used for fixture loading.

use async_trait::async_trait;
use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, Config as PgConfig, NoTls};
use tracing::{debug, info, warn};

use crate::config::TargetConfig;
use crate::core::schema::TableMetadata;
use crate::core::traits::{Connection, Dialect};
use crate::core::value::SqlValue;
use crate::drivers::common::TlsBuilder;
use crate::error::{Result, SeedError};

use super::dialect::PostgresDialect;
use super::params::PgParam;

const COLUMNS_SQL: &str = "SELECT column_name::text \
     FROM information_schema.columns \
     WHERE table_schema::text = COALESCE($1::text, current_schema()::text) \
       AND table_name::text = $2::text \
     ORDER BY ordinal_position";

const PRIMARY_KEY_SQL: &str = "SELECT kcu.column_name::text \
     FROM information_schema.table_constraints tc \
     JOIN information_schema.key_column_usage kcu \
       ON tc.constraint_name = kcu.constraint_name \
      AND tc.table_schema = kcu.table_schema \
      AND tc.table_name = kcu.table_name \
     WHERE tc.constraint_type = 'PRIMARY KEY' \
       AND tc.table_schema::text = COALESCE($1::text, current_schema()::text) \
       AND tc.table_name::text = $2::text \
     ORDER BY kcu.ordinal_position";

/// A single tokio-postgres client.
///
/// Primary keys are never switched off: PostgreSQL accepts explicit values for
/// serial and identity columns. Re-enabling moves each key's sequence past the
/// highest loaded value.
pub struct PostgresConnection {
    client: Client,
    dialect: PostgresDialect,
}

impl PostgresConnection {
    /// Connect using the target configuration.
    pub async fn connect(config: &TargetConfig) -> Result<Self> {
        let mut pg_config = PgConfig::new();
        pg_config
            .host(&config.host)
            .port(config.port())
            .dbname(&config.database)
            .user(&config.user)
            .password(&config.password)
            .application_name("dbseed");

        let context = format!("connecting to PostgreSQL at {}", config.display_name());
        let client = match TlsBuilder::parse(&config.ssl_mode)?.postgres_connector()? {
            None => {
                let (client, connection) = pg_config
                    .connect(NoTls)
                    .await
                    .map_err(|e| SeedError::connection(e, &context))?;
                tokio::spawn(async move {
                    if let Err(e) = connection.await {
                        warn!("PostgreSQL connection closed with error: {}", e);
                    }
                });
                client
            }
            Some(tls) => {
                let (client, connection) = pg_config
                    .connect(tls)
                    .await
                    .map_err(|e| SeedError::connection(e, &context))?;
                tokio::spawn(async move {
                    if let Err(e) = connection.await {
                        warn!("PostgreSQL connection closed with error: {}", e);
                    }
                });
                client
            }
        };

        info!("Connected to PostgreSQL target: {}", config.display_name());
        Ok(Self {
            client,
            dialect: PostgresDialect,
        })
    }

    async fn column_list(&self, sql: &str, metadata: &TableMetadata) -> Result<Vec<String>> {
        let (schema, table) = metadata.split_name();
        let rows = self.client.query(sql, &[&schema, &table]).await?;
        rows.iter()
            .map(|row| row.try_get::<_, String>(0).map_err(SeedError::from))
            .collect()
    }

    async fn resync_sequence(&self, metadata: &TableMetadata, column: &str) -> Result<()> {
        let table = self.dialect.quote_schema_object(&metadata.name);
        let row = self
            .client
            .query_one("SELECT pg_get_serial_sequence($1, $2)", &[&table, &column])
            .await?;
        let Some(sequence) = row.try_get::<_, Option<String>>(0)? else {
            return Ok(());
        };

        let sql = format!(
            "SELECT setval($1::text::regclass, COALESCE((SELECT MAX({}) FROM {}), 0) + 1, false)",
            self.dialect.quote_ident(column),
            table
        );
        debug!("{}: resetting {} past loaded values", metadata.name, sequence);
        self.client.query_one(&sql, &[&sequence]).await?;
        Ok(())
    }
}

#[async_trait]
impl Connection for PostgresConnection {
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

    async fn enable_primary_keys(&mut self, table: &TableMetadata) -> Result<()> {
        for column in &table.primary_keys {
            self.resync_sequence(table, column).await?;
        }
        Ok(())
    }

    async fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64> {
        if params.is_empty() {
            return Ok(self.client.execute(sql, &[]).await?);
        }
        let statement = self.client.prepare(sql).await?;
        let bound: Vec<PgParam<'_>> = params.iter().map(PgParam).collect();
        let refs: Vec<&(dyn ToSql + Sync)> = bound.iter().map(|p| p as &(dyn ToSql + Sync)).collect();
        Ok(self.client.execute(&statement, &refs).await?)
    }
}
