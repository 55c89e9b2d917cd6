//! SQL Server session used for fixture loading.

use async_trait::async_trait;
use tiberius::{AuthMethod, Client, Config, EncryptionLevel, Query, Row, ToSql};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::{debug, info};

use crate::config::TargetConfig;
use crate::core::schema::TableMetadata;
use crate::core::traits::{Connection, Dialect};
use crate::core::value::SqlValue;
use crate::drivers::common::SslMode;
use crate::error::{Result, SeedError};

use super::dialect::MssqlDialect;

const COLUMNS_SQL: &str = "SELECT COLUMN_NAME \
     FROM INFORMATION_SCHEMA.COLUMNS \
     WHERE TABLE_SCHEMA = COALESCE(@P1, SCHEMA_NAME()) AND TABLE_NAME = @P2 \
     ORDER BY ORDINAL_POSITION";

const PRIMARY_KEY_SQL: &str = "SELECT kcu.COLUMN_NAME \
     FROM INFORMATION_SCHEMA.TABLE_CONSTRAINTS tc \
     JOIN INFORMATION_SCHEMA.KEY_COLUMN_USAGE kcu \
       ON tc.CONSTRAINT_NAME = kcu.CONSTRAINT_NAME \
      AND tc.TABLE_SCHEMA = kcu.TABLE_SCHEMA \
      AND tc.TABLE_NAME = kcu.TABLE_NAME \
     WHERE tc.CONSTRAINT_TYPE = 'PRIMARY KEY' \
       AND tc.TABLE_SCHEMA = COALESCE(@P1, SCHEMA_NAME()) AND tc.TABLE_NAME = @P2 \
     ORDER BY kcu.ORDINAL_POSITION";

/// A single tiberius client.
///
/// Disabling primary keys turns on `IDENTITY_INSERT` so explicit identity
/// values are accepted. The setting is scoped to this session and to one table
/// at a time, which is why the client is never pooled.
pub struct MssqlConnection {
    client: Client<Compat<TcpStream>>,
    dialect: MssqlDialect,
    identity_insert: Option<String>,
}

impl MssqlConnection {
    /// Connect using the target configuration.
    pub async fn connect(config: &TargetConfig) -> Result<Self> {
        let tds_config = Self::build_config(config)?;
        let context = format!("connecting to SQL Server at {}", config.display_name());

        let tcp = TcpStream::connect(tds_config.get_addr())
            .await
            .map_err(|e| SeedError::connection(e, &context))?;
        tcp.set_nodelay(true).ok();

        let client = Client::connect(tds_config, tcp.compat_write())
            .await
            .map_err(|e| SeedError::connection(e, &context))?;

        info!("Connected to SQL Server target: {}", config.display_name());
        Ok(Self {
            client,
            dialect: MssqlDialect,
            identity_insert: None,
        })
    }

    fn build_config(config: &TargetConfig) -> Result<Config> {
        let mut tds = Config::new();
        tds.host(&config.host);
        tds.port(config.port());
        tds.database(&config.database);
        tds.application_name("dbseed");
        tds.authentication(AuthMethod::sql_server(&config.user, &config.password));

        let ssl_mode = SslMode::parse(&config.ssl_mode)?;
        if ssl_mode.encrypts() {
            if !ssl_mode.verifies_certificate() {
                tds.trust_cert();
            }
            tds.encryption(EncryptionLevel::Required);
        } else {
            tds.encryption(EncryptionLevel::NotSupported);
        }
        Ok(tds)
    }

    async fn column_list(&mut self, sql: &str, metadata: &TableMetadata) -> Result<Vec<String>> {
        let (schema, table) = metadata.split_name();
        let mut query = Query::new(sql);
        query.bind(schema.map(str::to_string));
        query.bind(table.to_string());
        let rows: Vec<Row> = query.query(&mut self.client).await?.into_first_result().await?;

        let mut columns = Vec::with_capacity(rows.len());
        for row in &rows {
            if let Some(name) = row.try_get::<&str, _>(0)? {
                columns.push(name.to_string());
            }
        }
        Ok(columns)
    }

    async fn has_identity(&mut self, quoted_table: &str) -> Result<bool> {
        let mut query = Query::new("SELECT OBJECTPROPERTY(OBJECT_ID(@P1), 'TableHasIdentity')");
        query.bind(quoted_table.to_string());
        let row = query.query(&mut self.client).await?.into_row().await?;
        let flag = match row {
            Some(row) => row.try_get::<i32, _>(0)?,
            None => None,
        };
        Ok(flag == Some(1))
    }

    async fn set_identity_insert(&mut self, quoted_table: &str, on: bool) -> Result<()> {
        let sql = format!(
            "SET IDENTITY_INSERT {} {}",
            quoted_table,
            if on { "ON" } else { "OFF" }
        );
        debug!("{}", sql);
        self.client.execute(sql, &[]).await?;
        Ok(())
    }
}

#[async_trait]
impl Connection for MssqlConnection {
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

    async fn disable_primary_keys(&mut self, table: &TableMetadata) -> Result<()> {
        let quoted = self.dialect.quote_schema_object(&table.name);
        if !self.has_identity(&quoted).await? {
            return Ok(());
        }
        self.set_identity_insert(&quoted, true).await?;
        self.identity_insert = Some(quoted);
        Ok(())
    }

    async fn enable_primary_keys(&mut self, _table: &TableMetadata) -> Result<()> {
        match self.identity_insert.take() {
            Some(quoted) => self.set_identity_insert(&quoted, false).await,
            None => Ok(()),
        }
    }

    async fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64> {
        let bound: Vec<Box<dyn ToSql>> = params.iter().map(sql_value_to_sql_param).collect();
        let refs: Vec<&dyn ToSql> = bound.iter().map(|b| b.as_ref()).collect();
        let result = self.client.execute(sql, &refs).await?;
        Ok(result.total())
    }
}

/// Convert a dataset value to a tiberius parameter.
///
/// Text is sent as NVARCHAR and converted by the server to the column type.
fn sql_value_to_sql_param(value: &SqlValue) -> Box<dyn ToSql> {
    match value {
        SqlValue::Null => Box::new(Option::<String>::None),
        SqlValue::Bool(b) => Box::new(*b),
        SqlValue::I64(i) => Box::new(*i),
        SqlValue::F64(f) => Box::new(*f),
        SqlValue::Text(s) => Box::new(s.clone()),
        SqlValue::Bytes(b) => Box::new(b.clone()),
        SqlValue::Uuid(u) => Box::new(*u),
        SqlValue::Decimal(d) => Box::new(*d),
        SqlValue::DateTime(dt) => Box::new(*dt),
        SqlValue::DateTimeOffset(dto) => Box::new(*dto),
        SqlValue::Date(d) => Box::new(*d),
        SqlValue::Time(t) => Box::new(*t),
    }
}
