//! A connection that talks to no database.
//!
//! [`DryRunConnection`] records every call the operations make, answers
//! metadata lookups from tables registered up front, and can be told to fail.
//! The CLI uses it for `--dry-run`; the test suites use it to observe exactly
//! which statements and arguments an operation produces.

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::debug;

use crate::core::schema::TableMetadata;
use crate::core::traits::{Connection, DataSet, Dialect};
use crate::core::value::SqlValue;
use crate::error::{Result, SeedError};

/// One call made against a [`DryRunConnection`].
#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    Metadata(String),
    DisablePrimaryKeys(String),
    EnablePrimaryKeys(String),
    Execute { sql: String, params: Vec<SqlValue> },
}

impl Recorded {
    /// Short tag for assertions on call order.
    pub fn kind(&self) -> &'static str {
        match self {
            Recorded::Metadata(_) => "metadata",
            Recorded::DisablePrimaryKeys(_) => "disable_pk",
            Recorded::EnablePrimaryKeys(_) => "enable_pk",
            Recorded::Execute { .. } => "execute",
        }
    }
}

/// Records calls instead of sending them to a server.
pub struct DryRunConnection {
    dialect: Box<dyn Dialect>,
    tables: HashMap<String, TableMetadata>,
    recorded: Vec<Recorded>,
    executed: usize,
    fail_statement: Option<(usize, String)>,
    fail_enable: Option<String>,
}

impl DryRunConnection {
    pub fn new(dialect: impl Dialect + 'static) -> Self {
        Self::with_dialect(Box::new(dialect))
    }

    pub fn with_dialect(dialect: Box<dyn Dialect>) -> Self {
        Self {
            dialect,
            tables: HashMap::new(),
            recorded: Vec::new(),
            executed: 0,
            fail_statement: None,
            fail_enable: None,
        }
    }

    /// Register destination metadata for a table.
    ///
    /// Unregistered tables report no columns, like a table that does not exist.
    pub fn with_table(mut self, metadata: TableMetadata) -> Self {
        self.tables.insert(metadata.name.clone(), metadata);
        self
    }

    /// Register every dataset table as a destination with the same columns.
    pub fn with_dataset(mut self, dataset: &dyn DataSet) -> Self {
        for table in dataset.iter() {
            let metadata = table.metadata().clone();
            self.tables.insert(metadata.name.clone(), metadata);
        }
        self
    }

    /// Make the `n`th executed statement (1-based) fail with `message`.
    pub fn fail_on_statement(mut self, n: usize, message: impl Into<String>) -> Self {
        self.fail_statement = Some((n, message.into()));
        self
    }

    /// Make every primary key re-enable fail with `message`.
    pub fn fail_enable_primary_keys(mut self, message: impl Into<String>) -> Self {
        self.fail_enable = Some(message.into());
        self
    }

    /// Every call so far, in order.
    pub fn recorded(&self) -> &[Recorded] {
        &self.recorded
    }

    /// Executed statements with their arguments, in order.
    pub fn statements(&self) -> impl Iterator<Item = (&str, &[SqlValue])> {
        self.recorded.iter().filter_map(|r| match r {
            Recorded::Execute { sql, params } => Some((sql.as_str(), params.as_slice())),
            _ => None,
        })
    }
}

#[async_trait]
impl Connection for DryRunConnection {
    fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    async fn table_metadata(&mut self, table: &str) -> Result<TableMetadata> {
        self.recorded.push(Recorded::Metadata(table.to_string()));
        Ok(self
            .tables
            .get(table)
            .cloned()
            .unwrap_or_else(|| TableMetadata::new(table, Vec::<String>::new())))
    }

    async fn disable_primary_keys(&mut self, table: &TableMetadata) -> Result<()> {
        self.recorded
            .push(Recorded::DisablePrimaryKeys(table.name.clone()));
        Ok(())
    }

    async fn enable_primary_keys(&mut self, table: &TableMetadata) -> Result<()> {
        self.recorded
            .push(Recorded::EnablePrimaryKeys(table.name.clone()));
        match &self.fail_enable {
            Some(message) => Err(SeedError::connection(message, "dry run")),
            None => Ok(()),
        }
    }

    async fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64> {
        debug!("dry run: {} ({} parameters)", sql, params.len());
        self.recorded.push(Recorded::Execute {
            sql: sql.to_string(),
            params: params.to_vec(),
        });
        self.executed += 1;
        match &self.fail_statement {
            Some((n, message)) if *n == self.executed => {
                Err(SeedError::connection(message, "dry run"))
            }
            _ => Ok(0),
        }
    }
}
