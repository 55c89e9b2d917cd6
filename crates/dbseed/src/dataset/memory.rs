//! In-memory dataset, the form every fixture reader produces.

use std::collections::HashMap;

use crate::core::schema::TableMetadata;
use crate::core::traits::{DataSet, DataTable, TableIter};
use crate::core::value::SqlValue;
use crate::error::{Result, SeedError};

/// A table whose rows are held in memory.
#[derive(Debug, Clone)]
pub struct MemoryTable {
    metadata: TableMetadata,
    column_index: HashMap<String, usize>,
    rows: Vec<Vec<SqlValue>>,
}

impl MemoryTable {
    /// Create an empty table with the given columns.
    pub fn new<I, S>(name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let metadata = TableMetadata::new(name, columns);
        let column_index = metadata
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();
        Self {
            metadata,
            column_index,
            rows: Vec::new(),
        }
    }

    /// Append a row. Values are in column order.
    pub fn add_row(&mut self, row: Vec<SqlValue>) -> Result<()> {
        if row.len() != self.metadata.column_count() {
            return Err(SeedError::Dataset(format!(
                "Table {}: row {} has {} values, expected {}",
                self.metadata.name,
                self.rows.len(),
                row.len(),
                self.metadata.column_count()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Builder-style [`MemoryTable::add_row`].
    pub fn with_row<I, V>(mut self, row: I) -> Result<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<SqlValue>,
    {
        self.add_row(row.into_iter().map(Into::into).collect())?;
        Ok(self)
    }
}

impl DataTable for MemoryTable {
    fn metadata(&self) -> &TableMetadata {
        &self.metadata
    }

    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn value(&self, row: usize, column: &str) -> Result<SqlValue> {
        let idx = *self
            .column_index
            .get(column)
            .ok_or_else(|| SeedError::MissingColumn {
                table: self.metadata.name.clone(),
                column: column.to_string(),
            })?;
        let values = self.rows.get(row).ok_or_else(|| {
            SeedError::Dataset(format!(
                "Table {}: row {} out of range ({} rows)",
                self.metadata.name,
                row,
                self.rows.len()
            ))
        })?;
        Ok(values[idx].clone())
    }
}

/// An ordered collection of in-memory tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryDataSet {
    tables: Vec<MemoryTable>,
}

impl MemoryDataSet {
    /// Create an empty dataset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a table. Table names must be unique.
    pub fn add_table(&mut self, table: MemoryTable) -> Result<()> {
        if self.tables.iter().any(|t| t.name() == table.name()) {
            return Err(SeedError::Dataset(format!(
                "Table {} is already part of the dataset",
                table.name()
            )));
        }
        self.tables.push(table);
        Ok(())
    }

    /// Builder-style [`MemoryDataSet::add_table`].
    pub fn with_table(mut self, table: MemoryTable) -> Result<Self> {
        self.add_table(table)?;
        Ok(self)
    }

    /// Number of tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Check if the dataset has no tables.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl DataSet for MemoryDataSet {
    fn iter(&self) -> TableIter<'_> {
        Box::new(self.tables.iter().map(|t| t as &dyn DataTable))
    }

    fn reverse_iter(&self) -> TableIter<'_> {
        Box::new(self.tables.iter().rev().map(|t| t as &dyn DataTable))
    }
}
