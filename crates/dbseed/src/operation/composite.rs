//! Operations run back to back against the same connection.

use async_trait::async_trait;
use tracing::info;

use crate::core::traits::{Connection, DataSet};
use crate::error::Result;

use super::{BulkInsert, DatabaseOperation, Direction, LoadReport, Truncate};

/// Runs its members in order, stopping at the first failure.
pub struct Composite {
    name: &'static str,
    operations: Vec<Box<dyn DatabaseOperation>>,
}

impl Composite {
    pub fn new(name: &'static str, operations: Vec<Box<dyn DatabaseOperation>>) -> Self {
        Self { name, operations }
    }

    /// `CLEAN_INSERT`: empty every table (children first), then insert.
    pub fn clean_insert(chunk_size: usize, direction: Direction) -> Self {
        Self::new(
            "CLEAN_INSERT",
            vec![
                Box::new(Truncate::new()),
                Box::new(
                    BulkInsert::new()
                        .with_chunk_size(chunk_size)
                        .with_direction(direction),
                ),
            ],
        )
    }

    /// Member operation names in execution order.
    pub fn members(&self) -> Vec<&'static str> {
        self.operations.iter().map(|op| op.name()).collect()
    }
}

#[async_trait]
impl DatabaseOperation for Composite {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn execute(&self, conn: &mut dyn Connection, dataset: &dyn DataSet) -> Result<LoadReport> {
        let mut report = LoadReport::new();
        for operation in &self.operations {
            info!("{}: running {}", self.name, operation.name());
            report.merge(operation.execute(conn, dataset).await?);
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::TableMetadata;
    use crate::core::value::SqlValue;
    use crate::dataset::{MemoryDataSet, MemoryTable};
    use crate::drivers::{DryRunConnection, PostgresDialect};
    use crate::error::SeedError;

    fn dataset() -> MemoryDataSet {
        let parents = MemoryTable::new("parents", ["id"])
            .with_row([SqlValue::I64(1)])
            .unwrap();
        let children = MemoryTable::new("children", ["id", "parent_id"])
            .with_row([SqlValue::I64(10), SqlValue::I64(1)])
            .unwrap();
        MemoryDataSet::new()
            .with_table(parents)
            .unwrap()
            .with_table(children)
            .unwrap()
    }

    fn conn() -> DryRunConnection {
        DryRunConnection::new(PostgresDialect)
            .with_table(TableMetadata::new("parents", ["id"]))
            .with_table(TableMetadata::new("children", ["id", "parent_id"]))
    }

    #[tokio::test]
    async fn test_clean_insert_truncates_then_inserts() {
        let op = Composite::clean_insert(100, Direction::Forward);
        assert_eq!(op.members(), ["TRUNCATE", "BULK_INSERT"]);

        let mut conn = conn();
        let report = op.execute(&mut conn, &dataset()).await.unwrap();

        let sql: Vec<&str> = conn.statements().map(|(sql, _)| sql).collect();
        assert_eq!(
            sql,
            [
                "TRUNCATE TABLE \"children\", \"parents\"",
                "INSERT INTO \"parents\" (\"id\") VALUES ($1)",
                "INSERT INTO \"children\" (\"id\", \"parent_id\") VALUES ($1, $2)",
            ]
        );
        assert_eq!(report.tables.len(), 4);
        assert_eq!(report.total_rows(), 2);
    }

    #[tokio::test]
    async fn test_stops_at_failing_member() {
        let op = Composite::clean_insert(100, Direction::Forward);
        let mut conn = conn().fail_on_statement(1, "permission denied");

        let err = op.execute(&mut conn, &dataset()).await.unwrap_err();
        assert!(matches!(err, SeedError::Execution { ref operation, .. } if operation == "TRUNCATE"));
        assert_eq!(conn.statements().count(), 1);
    }
}
