//! Empty every dataset table.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::core::identifier::validate_schema_object;
use crate::core::traits::{Connection, DataSet, TruncateStep};
use crate::error::{Result, SeedError};

use super::{DatabaseOperation, Direction, LoadReport, TableReport};

/// Removes all rows from each table named in the dataset, including tables
/// the dataset lists with no rows.
///
/// The tables are handed to the dialect's truncate plan in one call, so the
/// dialect can empty tables linked by foreign keys (a single multi-table
/// `TRUNCATE`, ordered `DELETE`s, or relaxed key checks). Reverse dataset
/// order puts children ahead of their parents.
#[derive(Debug, Clone)]
pub struct Truncate {
    direction: Direction,
}

impl Default for Truncate {
    fn default() -> Self {
        Self::new()
    }
}

impl Truncate {
    pub const NAME: &'static str = "TRUNCATE";

    pub fn new() -> Self {
        Self {
            direction: Direction::Reverse,
        }
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    async fn run_steps(
        &self,
        conn: &mut dyn Connection,
        steps: &[TruncateStep],
        all_tables: &str,
    ) -> Result<LoadReport> {
        let mut report = LoadReport::new();
        for step in steps {
            debug!("{}", step.sql);
            if let Err(e) = conn.execute(&step.sql, &[]).await {
                let table = if step.tables.is_empty() {
                    all_tables.to_string()
                } else {
                    step.tables.join(", ")
                };
                return Err(SeedError::execution(Self::NAME, table, &step.sql, Vec::new(), e));
            }
            // the statement is counted once, against the first table it empties
            for (i, table) in step.tables.iter().enumerate() {
                let mut table_report = TableReport::new(Self::NAME, table.as_str());
                table_report.statements = u64::from(i == 0);
                report.push(table_report);
            }
        }
        Ok(report)
    }
}

#[async_trait]
impl DatabaseOperation for Truncate {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn execute(&self, conn: &mut dyn Connection, dataset: &dyn DataSet) -> Result<LoadReport> {
        let tables: Vec<&str> = self.direction.tables(dataset).map(|t| t.name()).collect();
        if tables.is_empty() {
            return Ok(LoadReport::new());
        }
        for name in &tables {
            validate_schema_object(name)?;
        }

        info!("{}: emptying {} tables in {} order", Self::NAME, tables.len(), self.direction);
        let plan = conn.dialect().truncate_plan(&tables);
        let all_tables = tables.join(", ");
        let outcome = self.run_steps(conn, &plan.steps, &all_tables).await;

        let Some(cleanup) = plan.cleanup else {
            return outcome;
        };
        debug!("{}", cleanup);
        let cleaned = conn.execute(&cleanup, &[]).await;
        match (outcome, cleaned) {
            (Ok(report), Ok(_)) => Ok(report),
            (Ok(_), Err(e)) => Err(SeedError::execution(Self::NAME, all_tables, cleanup, Vec::new(), e)),
            (Err(e), Ok(_)) => Err(e),
            (Err(e), Err(cleanup_err)) => {
                warn!("{}: '{}' failed after truncate error: {}", Self::NAME, cleanup, cleanup_err);
                Err(e)
            }
        }
    }
}
