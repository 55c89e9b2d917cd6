//! Core traits for database-agnostic fixture loading.
//!
//! - [`DataSet`] / [`DataTable`]: read-only source rows
//! - [`Connection`]: one exclusive session on the destination database
//! - [`Dialect`]: SQL syntax strategy for different database engines

use async_trait::async_trait;

use crate::error::Result;

use super::schema::TableMetadata;
use super::value::SqlValue;

/// Iterator over the tables of a dataset.
pub type TableIter<'a> = Box<dyn Iterator<Item = &'a dyn DataTable> + Send + 'a>;

/// A table of materialized rows.
pub trait DataTable: Send + Sync {
    /// Table name and ordered columns.
    fn metadata(&self) -> &TableMetadata;

    /// Number of rows.
    fn row_count(&self) -> usize;

    /// Value of `column` in row `row`.
    ///
    /// # Errors
    ///
    /// `SeedError::MissingColumn` when the table has no such column, and
    /// `SeedError::Dataset` when `row` is out of range.
    fn value(&self, row: usize, column: &str) -> Result<SqlValue>;

    /// Table name.
    fn name(&self) -> &str {
        &self.metadata().name
    }
}

/// An ordered collection of tables.
pub trait DataSet: Send + Sync {
    /// Tables in dataset order.
    fn iter(&self) -> TableIter<'_>;

    /// Tables in reverse dataset order.
    fn reverse_iter(&self) -> TableIter<'_>;

    /// Look up a table by name.
    fn table(&self, name: &str) -> Option<&dyn DataTable> {
        self.iter().find(|t| t.name() == name)
    }

    /// Names of all tables in dataset order.
    fn table_names(&self) -> Vec<String> {
        self.iter().map(|t| t.name().to_string()).collect()
    }
}

/// SQL syntax strategy for different database engines.
///
/// This is a **Strategy** pattern: implementations provide interchangeable
/// SQL syntax rules while statement building stays database-agnostic.
pub trait Dialect: Send + Sync {
    /// Get the dialect identifier (e.g., "mssql", "postgres").
    fn name(&self) -> &str;

    /// Quote an identifier (table name, column name, etc.).
    ///
    /// - MSSQL: `[identifier]`
    /// - PostgreSQL: `"identifier"`
    /// - MySQL: `` `identifier` ``
    fn quote_ident(&self, name: &str) -> String;

    /// Quote a possibly schema-qualified name, one dot-separated part at a time.
    fn quote_schema_object(&self, name: &str) -> String {
        name.split('.')
            .map(|part| self.quote_ident(part))
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Get a parameter placeholder for the given 1-based index.
    ///
    /// - MSSQL: `@P1`, `@P2`, etc.
    /// - PostgreSQL: `$1`, `$2`, etc.
    /// - MySQL: `?`
    fn param_placeholder(&self, index: usize) -> String;

    /// Maximum number of bind parameters a single statement may carry.
    fn max_parameters(&self) -> Option<usize> {
        None
    }

    /// Statements that remove every row of `tables`, given in the order they
    /// should be emptied (children before parents).
    ///
    /// The default truncates one table at a time, which servers reject for a
    /// table that a foreign key references.
    fn truncate_plan(&self, tables: &[&str]) -> TruncatePlan {
        TruncatePlan {
            steps: tables
                .iter()
                .map(|t| {
                    let sql = format!("TRUNCATE TABLE {}", self.quote_schema_object(t));
                    TruncateStep::new(sql, [*t])
                })
                .collect(),
            cleanup: None,
        }
    }
}

/// One statement of a [`TruncatePlan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TruncateStep {
    pub sql: String,
    /// Tables emptied by this statement; empty for session setup.
    pub tables: Vec<String>,
}

impl TruncateStep {
    pub fn new<I, S>(sql: impl Into<String>, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sql: sql.into(),
            tables: tables.into_iter().map(Into::into).collect(),
        }
    }

    /// A statement that empties no table.
    pub fn setup(sql: impl Into<String>) -> Self {
        Self::new(sql, Vec::<String>::new())
    }
}

/// How a dialect empties a set of tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TruncatePlan {
    /// Statements run in order.
    pub steps: Vec<TruncateStep>,
    /// Runs after the steps whether or not they succeeded.
    pub cleanup: Option<String>,
}

/// One exclusive session on the destination database.
///
/// Callers open and close connections; operations only borrow them.
#[async_trait]
pub trait Connection: Send {
    /// SQL dialect of this connection.
    fn dialect(&self) -> &dyn Dialect;

    /// Introspect the destination table.
    ///
    /// A table that does not exist is reported with no columns rather than
    /// as an error, so callers decide whether that matters.
    async fn table_metadata(&mut self, table: &str) -> Result<TableMetadata>;

    /// Relax primary key enforcement for a bulk load into `table`.
    async fn disable_primary_keys(&mut self, table: &TableMetadata) -> Result<()>;

    /// Undo [`Connection::disable_primary_keys`].
    async fn enable_primary_keys(&mut self, table: &TableMetadata) -> Result<()>;

    /// Prepare and execute a parameterized statement.
    ///
    /// Returns the number of affected rows.
    async fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64>;
}
