//! Chunked multi-row INSERT of every dataset table.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::core::schema::TableMetadata;
use crate::core::traits::{Connection, DataSet, DataTable};
use crate::error::{Result, SeedError};

use super::chunk::{effective_chunk_size, ChunkPlanner};
use super::statement::{build_arguments, BulkStatementBuilder};
use super::{DatabaseOperation, Direction, LoadReport, TableReport};

/// Rows per INSERT statement unless configured otherwise.
pub const DEFAULT_CHUNK_SIZE: usize = 100;

/// Inserts every row of every table, one bounded multi-row INSERT per chunk.
///
/// Tables are processed one at a time in the configured direction and chunks
/// in ascending row order. The first failure aborts the run; statements that
/// already succeeded are not rolled back.
#[derive(Debug, Clone)]
pub struct BulkInsert {
    chunk_size: usize,
    direction: Direction,
}

impl Default for BulkInsert {
    fn default() -> Self {
        Self::new()
    }
}

impl BulkInsert {
    pub const NAME: &'static str = "BULK_INSERT";

    pub fn new() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            direction: Direction::Forward,
        }
    }

    /// Maximum rows per statement. Values below 1 are treated as 1.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    async fn load_table(&self, conn: &mut dyn Connection, table: &dyn DataTable) -> Result<TableReport> {
        if table.row_count() == 0 {
            debug!("{}: no rows, skipping", table.name());
            return Ok(TableReport::new(Self::NAME, table.name()));
        }

        let metadata = conn.table_metadata(table.name()).await?;
        let guard = PrimaryKeyGuard::acquire(conn, &metadata).await?;
        let outcome = self.insert_chunks(conn, table, &metadata).await;
        match guard {
            Some(guard) => guard.release(conn, outcome).await,
            None => outcome,
        }
    }

    async fn insert_chunks(
        &self,
        conn: &mut dyn Connection,
        table: &dyn DataTable,
        metadata: &TableMetadata,
    ) -> Result<TableReport> {
        let name = table.name();
        let limit = conn.dialect().max_parameters();
        let Some(chunk_size) = effective_chunk_size(self.chunk_size, metadata.column_count(), limit)
        else {
            return Err(SeedError::TooManyColumns {
                operation: Self::NAME.to_string(),
                table: name.to_string(),
                columns: metadata.column_count(),
                limit: limit.unwrap_or_default(),
            });
        };
        if chunk_size < self.chunk_size {
            debug!(
                "{}: chunk size lowered to {} to fit the {} parameter limit",
                name,
                chunk_size,
                conn.dialect().name()
            );
        }

        let mut builder = BulkStatementBuilder::new(conn.dialect(), metadata)?;
        let mut report = TableReport::new(Self::NAME, name);

        for chunk in ChunkPlanner::new(table.row_count(), chunk_size) {
            let Some(query) = builder.build(conn.dialect(), chunk.len) else {
                return Err(SeedError::NoColumns {
                    operation: Self::NAME.to_string(),
                    table: name.to_string(),
                });
            };

            let args = match build_arguments(table, &metadata.columns, chunk) {
                Ok(args) => args,
                Err(e) => return Err(SeedError::execution(Self::NAME, name, query, Vec::new(), e)),
            };

            debug!(
                "{}: inserting rows {}..{} ({} parameters)",
                name,
                chunk.start,
                chunk.end(),
                args.len()
            );
            if let Err(e) = conn.execute(&query, &args).await {
                return Err(SeedError::execution(Self::NAME, name, query, args, e));
            }
            report.record_statement(chunk.len);
        }

        Ok(report)
    }
}

#[async_trait]
impl DatabaseOperation for BulkInsert {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn execute(&self, conn: &mut dyn Connection, dataset: &dyn DataSet) -> Result<LoadReport> {
        info!(
            "{}: loading tables in {} order, up to {} rows per statement",
            Self::NAME,
            self.direction,
            self.chunk_size
        );
        let mut report = LoadReport::new();
        for table in self.direction.tables(dataset) {
            let table_report = self.load_table(conn, table).await?;
            if table_report.statements > 0 {
                info!(
                    "{}: {} rows in {} statements",
                    table_report.table, table_report.rows, table_report.statements
                );
            }
            report.push(table_report);
        }
        Ok(report)
    }
}

/// Primary keys disabled for the duration of one table load.
///
/// Must be handed back through [`PrimaryKeyGuard::release`], which re-enables
/// the keys whatever the load outcome was.
struct PrimaryKeyGuard<'m> {
    metadata: &'m TableMetadata,
    released: bool,
}

impl<'m> PrimaryKeyGuard<'m> {
    /// Disable primary keys if the table has any.
    async fn acquire(conn: &mut dyn Connection, metadata: &'m TableMetadata) -> Result<Option<Self>> {
        if !metadata.has_pk() {
            return Ok(None);
        }
        debug!("{}: disabling primary keys", metadata.name);
        conn.disable_primary_keys(metadata).await?;
        Ok(Some(Self {
            metadata,
            released: false,
        }))
    }

    /// Re-enable primary keys, then hand back the load outcome.
    ///
    /// A load failure takes precedence over a re-enable failure.
    async fn release<T>(mut self, conn: &mut dyn Connection, outcome: Result<T>) -> Result<T> {
        self.released = true;
        debug!("{}: re-enabling primary keys", self.metadata.name);
        let enabled = conn.enable_primary_keys(self.metadata).await;
        match (outcome, enabled) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(enable_err)) => {
                warn!(
                    "{}: failed to re-enable primary keys after load error: {}",
                    self.metadata.name, enable_err
                );
                Err(e)
            }
        }
    }
}

impl Drop for PrimaryKeyGuard<'_> {
    fn drop(&mut self) {
        if !self.released {
            warn!(
                "{}: load abandoned with primary keys still disabled",
                self.metadata.name
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::value::SqlValue;
    use crate::dataset::{MemoryDataSet, MemoryTable};
    use crate::drivers::{DryRunConnection, PostgresDialect, Recorded};

    fn accounts(rows: i64) -> MemoryTable {
        let mut table = MemoryTable::new("accounts", ["id", "balance"]);
        for i in 0..rows {
            table
                .add_row(vec![SqlValue::I64(i), SqlValue::I64(i * 10)])
                .unwrap();
        }
        table
    }

    fn conn_with_pk() -> DryRunConnection {
        DryRunConnection::new(PostgresDialect)
            .with_table(TableMetadata::new("accounts", ["id", "balance"]).with_primary_keys(["id"]))
    }

    #[tokio::test]
    async fn test_guard_wraps_table_load() {
        let ds = MemoryDataSet::new().with_table(accounts(5)).unwrap();
        let mut conn = conn_with_pk();

        let report = BulkInsert::new().execute(&mut conn, &ds).await.unwrap();
        assert_eq!(report.total_rows(), 5);
        assert_eq!(report.total_statements(), 1);

        let kinds: Vec<&str> = conn.recorded().iter().map(Recorded::kind).collect();
        assert_eq!(kinds, ["metadata", "disable_pk", "execute", "enable_pk"]);
    }

    #[tokio::test]
    async fn test_guard_reenables_after_failure() {
        let ds = MemoryDataSet::new().with_table(accounts(5)).unwrap();
        let mut conn = conn_with_pk().fail_on_statement(1, "boom");

        let err = BulkInsert::new().execute(&mut conn, &ds).await.unwrap_err();
        assert!(matches!(err, SeedError::Execution { .. }));
        assert!(matches!(conn.recorded().last(), Some(Recorded::EnablePrimaryKeys(t)) if t == "accounts"));
    }

    #[tokio::test]
    async fn test_load_error_wins_over_enable_error() {
        let ds = MemoryDataSet::new().with_table(accounts(5)).unwrap();
        let mut conn = conn_with_pk()
            .fail_on_statement(1, "duplicate key")
            .fail_enable_primary_keys("sequence missing");

        let err = BulkInsert::new().execute(&mut conn, &ds).await.unwrap_err();
        assert!(err.to_string().contains("duplicate key"));
    }

    #[tokio::test]
    async fn test_enable_error_surfaces_after_clean_load() {
        let ds = MemoryDataSet::new().with_table(accounts(5)).unwrap();
        let mut conn = conn_with_pk().fail_enable_primary_keys("sequence missing");

        let err = BulkInsert::new().execute(&mut conn, &ds).await.unwrap_err();
        assert!(err.to_string().contains("sequence missing"));
        assert!(!matches!(err, SeedError::Execution { .. }));
    }

    #[tokio::test]
    async fn test_chunk_size_clamped_by_parameter_limit() {
        let columns: Vec<String> = (0..1000).map(|c| format!("c{}", c)).collect();
        let mut table = MemoryTable::new("wide", columns.clone());
        for _ in 0..5 {
            table.add_row(vec![SqlValue::Null; 1000]).unwrap();
        }
        let ds = MemoryDataSet::new().with_table(table).unwrap();
        // SQL Server allows 2098 bind values: two 1000-column rows per statement
        let mut conn = DryRunConnection::new(crate::drivers::MssqlDialect)
            .with_table(TableMetadata::new("wide", columns));

        let report = BulkInsert::new().execute(&mut conn, &ds).await.unwrap();
        assert_eq!(report.total_statements(), 3);
        let sizes: Vec<usize> = conn.statements().map(|(_, params)| params.len()).collect();
        assert_eq!(sizes, [2000, 2000, 1000]);
    }

    fn wide_table(name: &str, columns: usize, rows: usize) -> (MemoryDataSet, TableMetadata) {
        let names: Vec<String> = (0..columns).map(|c| format!("c{}", c)).collect();
        let mut table = MemoryTable::new(name, names.clone());
        for _ in 0..rows {
            table.add_row(vec![SqlValue::I64(1); columns]).unwrap();
        }
        let ds = MemoryDataSet::new().with_table(table).unwrap();
        (ds, TableMetadata::new(name, names))
    }

    #[tokio::test]
    async fn test_full_chunk_stays_below_sql_server_limit() {
        // 21 columns * 100 rows = 2100 binds, over the limit
        let (ds, meta) = wide_table("orders", 21, 100);
        let mut conn = DryRunConnection::new(crate::drivers::MssqlDialect).with_table(meta);

        BulkInsert::new().execute(&mut conn, &ds).await.unwrap();
        let sizes: Vec<usize> = conn.statements().map(|(_, params)| params.len()).collect();
        assert_eq!(sizes, [2079, 21]);
        assert!(sizes.iter().all(|&n| n <= 2098));
    }

    #[tokio::test]
    async fn test_row_wider_than_parameter_limit_fails_up_front() {
        let (ds, meta) = wide_table("blob", 2099, 1);
        let mut conn = DryRunConnection::new(crate::drivers::MssqlDialect).with_table(meta);

        let err = BulkInsert::new().execute(&mut conn, &ds).await.unwrap_err();
        match &err {
            SeedError::TooManyColumns { table, columns, limit, .. } => {
                assert_eq!(table, "blob");
                assert_eq!(*columns, 2099);
                assert_eq!(*limit, 2098);
            }
            other => panic!("expected TooManyColumns, got {:?}", other),
        }
        assert_eq!(err.exit_code(), 3);
        assert_eq!(conn.statements().count(), 0);
    }
}
