//! Database operations that apply a dataset to a connection.
//!
//! [`BulkInsert`] is the workhorse: it splits each table into chunks and
//! sends one multi-row INSERT per chunk. [`Truncate`] empties tables and
//! [`Composite`] chains operations (`CLEAN_INSERT` is truncate followed by
//! bulk insert).

mod bulk_insert;
pub mod chunk;
mod composite;
pub mod statement;
mod truncate;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::traits::{Connection, DataSet, TableIter};
use crate::error::Result;

pub use bulk_insert::{BulkInsert, DEFAULT_CHUNK_SIZE};
pub use chunk::{effective_chunk_size, plan, Chunk, ChunkPlanner};
pub use composite::Composite;
pub use statement::{build_arguments, render_insert, BulkStatementBuilder};
pub use truncate::Truncate;

/// An operation applied to every table of a dataset.
#[async_trait]
pub trait DatabaseOperation: Send + Sync {
    /// Operation name used in logs and errors (e.g. `BULK_INSERT`).
    fn name(&self) -> &'static str;

    /// Apply the dataset. Stops at the first failure.
    async fn execute(&self, conn: &mut dyn Connection, dataset: &dyn DataSet) -> Result<LoadReport>;
}

/// Order in which dataset tables are visited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Dataset order (parents before children).
    #[default]
    Forward,
    /// Reverse dataset order.
    Reverse,
}

impl Direction {
    /// Tables of `dataset` in this direction.
    pub fn tables<'a>(&self, dataset: &'a dyn DataSet) -> TableIter<'a> {
        match self {
            Direction::Forward => dataset.iter(),
            Direction::Reverse => dataset.reverse_iter(),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Forward => write!(f, "forward"),
            Direction::Reverse => write!(f, "reverse"),
        }
    }
}

/// Operation selected in configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// Insert every row.
    #[default]
    BulkInsert,
    /// Truncate every table, then insert every row.
    CleanInsert,
    /// Truncate every table.
    Truncate,
}

impl OperationKind {
    /// Build the operation. `direction` applies to the insert step.
    pub fn build(self, chunk_size: usize, direction: Direction) -> Box<dyn DatabaseOperation> {
        match self {
            OperationKind::BulkInsert => Box::new(
                BulkInsert::new()
                    .with_chunk_size(chunk_size)
                    .with_direction(direction),
            ),
            OperationKind::CleanInsert => Box::new(Composite::clean_insert(chunk_size, direction)),
            OperationKind::Truncate => Box::new(Truncate::new()),
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::BulkInsert => write!(f, "bulk_insert"),
            OperationKind::CleanInsert => write!(f, "clean_insert"),
            OperationKind::Truncate => write!(f, "truncate"),
        }
    }
}

/// Outcome of one operation on one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableReport {
    pub operation: String,
    pub table: String,
    pub rows: u64,
    pub statements: u64,
}

impl TableReport {
    pub fn new(operation: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            table: table.into(),
            rows: 0,
            statements: 0,
        }
    }

    /// Count one executed statement covering `rows` rows.
    pub fn record_statement(&mut self, rows: usize) {
        self.rows += rows as u64;
        self.statements += 1;
    }
}

/// Per-table outcomes of a run, in the order tables were processed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub tables: Vec<TableReport>,
}

impl LoadReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, table: TableReport) {
        self.tables.push(table);
    }

    /// Append another report's tables after this one's.
    pub fn merge(&mut self, other: LoadReport) {
        self.tables.extend(other.tables);
    }

    /// Rows written across all tables.
    pub fn total_rows(&self) -> u64 {
        self.tables.iter().map(|t| t.rows).sum()
    }

    /// Statements executed across all tables.
    pub fn total_statements(&self) -> u64 {
        self.tables.iter().map(|t| t.statements).sum()
    }

    /// Serialize as pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{MemoryDataSet, MemoryTable};

    #[test]
    fn test_direction_selects_iterator() {
        let ds = MemoryDataSet::new()
            .with_table(MemoryTable::new("parents", ["id"]))
            .unwrap()
            .with_table(MemoryTable::new("children", ["id"]))
            .unwrap();
        let names = |d: Direction| d.tables(&ds).map(|t| t.name().to_string()).collect::<Vec<_>>();
        assert_eq!(names(Direction::Forward), ["parents", "children"]);
        assert_eq!(names(Direction::Reverse), ["children", "parents"]);
    }

    #[test]
    fn test_direction_serde() {
        assert_eq!(serde_yaml::from_str::<Direction>("reverse").unwrap(), Direction::Reverse);
        assert!(serde_yaml::from_str::<Direction>("sideways").is_err());
    }

    #[test]
    fn test_operation_kind_builds_named_operation() {
        assert_eq!(OperationKind::BulkInsert.build(10, Direction::Forward).name(), "BULK_INSERT");
        assert_eq!(OperationKind::CleanInsert.build(10, Direction::Forward).name(), "CLEAN_INSERT");
        assert_eq!(OperationKind::Truncate.build(10, Direction::Forward).name(), "TRUNCATE");
        assert_eq!(
            serde_yaml::from_str::<OperationKind>("clean_insert").unwrap(),
            OperationKind::CleanInsert
        );
    }

    #[test]
    fn test_report_merge_and_totals() {
        let mut first = LoadReport::new();
        let mut users = TableReport::new("BULK_INSERT", "users");
        users.record_statement(100);
        users.record_statement(50);
        first.push(users);

        let mut second = LoadReport::new();
        second.push(TableReport::new("BULK_INSERT", "empty"));
        first.merge(second);

        assert_eq!(first.tables.len(), 2);
        assert_eq!(first.total_rows(), 150);
        assert_eq!(first.total_statements(), 2);
        assert!(first.to_json().unwrap().contains("\"table\": \"users\""));
    }
}
