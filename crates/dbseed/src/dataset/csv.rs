//! CSV fixture reader: one file per table, header row supplies the columns.

use std::io::Read;
use std::path::Path;

use tracing::debug;

use crate::core::value::SqlValue;
use crate::error::{Result, SeedError};

use super::memory::{MemoryDataSet, MemoryTable};

/// Field value that loads as NULL unless configured otherwise.
pub const DEFAULT_NULL_MARKER: &str = "NULL";

/// Builds a dataset from CSV files, one table per file, in the order added.
#[derive(Debug)]
pub struct CsvDataSet {
    delimiter: u8,
    null_marker: String,
    dataset: MemoryDataSet,
}

impl Default for CsvDataSet {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvDataSet {
    /// Create a reader with `,` as delimiter and `NULL` as null marker.
    pub fn new() -> Self {
        Self {
            delimiter: b',',
            null_marker: DEFAULT_NULL_MARKER.to_string(),
            dataset: MemoryDataSet::new(),
        }
    }

    /// Use a different field delimiter.
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Use a different null marker.
    pub fn with_null_marker(mut self, marker: impl Into<String>) -> Self {
        self.null_marker = marker.into();
        self
    }

    /// Read `path` as the contents of `table`.
    pub fn add_table<P: AsRef<Path>>(&mut self, table: &str, path: P) -> Result<()> {
        let file = std::fs::File::open(path.as_ref())?;
        self.add_table_from_reader(table, file)?;
        debug!("Loaded CSV table {} from {}", table, path.as_ref().display());
        Ok(())
    }

    /// Read CSV data for `table` from any reader.
    pub fn add_table_from_reader<R: Read>(&mut self, table: &str, reader: R) -> Result<()> {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .from_reader(reader);

        let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
        if headers.is_empty() || headers.iter().any(String::is_empty) {
            return Err(SeedError::Dataset(format!(
                "Table {}: CSV header row is missing or has blank column names",
                table
            )));
        }

        let mut mem = MemoryTable::new(table, headers);
        for record in rdr.records() {
            let record = record?;
            let row = record
                .iter()
                .map(|field| {
                    if field == self.null_marker {
                        SqlValue::Null
                    } else {
                        SqlValue::Text(field.to_string())
                    }
                })
                .collect();
            mem.add_row(row)?;
        }

        self.dataset.add_table(mem)
    }

    /// Finish building and return the dataset.
    pub fn into_dataset(self) -> MemoryDataSet {
        self.dataset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::traits::{DataSet, DataTable};
    use std::io::Write;

    #[test]
    fn test_reads_header_and_rows() {
        let mut csv = CsvDataSet::new();
        csv.add_table_from_reader("users", "id,name\n1,alice\n2,NULL\n".as_bytes())
            .unwrap();
        let ds = csv.into_dataset();
        let users = ds.table("users").unwrap();
        assert_eq!(users.metadata().columns, ["id", "name"]);
        assert_eq!(users.row_count(), 2);
        assert_eq!(users.value(0, "id").unwrap(), SqlValue::from("1"));
        assert_eq!(users.value(1, "name").unwrap(), SqlValue::Null);
    }

    #[test]
    fn test_custom_null_marker_and_delimiter() {
        let mut csv = CsvDataSet::new().with_delimiter(b';').with_null_marker("");
        csv.add_table_from_reader("t", "a;b\nx;\n".as_bytes()).unwrap();
        let ds = csv.into_dataset();
        let t = ds.table("t").unwrap();
        assert_eq!(t.value(0, "a").unwrap(), SqlValue::from("x"));
        assert_eq!(t.value(0, "b").unwrap(), SqlValue::Null);
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let mut csv = CsvDataSet::new();
        assert!(csv
            .add_table_from_reader("t", "a,b\n1,2,3\n".as_bytes())
            .is_err());
    }

    #[test]
    fn test_tables_keep_insertion_order() {
        let dir = tempfile::tempdir().unwrap();
        let parents = dir.path().join("parents.csv");
        let children = dir.path().join("children.csv");
        writeln!(std::fs::File::create(&parents).unwrap(), "id\n1").unwrap();
        writeln!(std::fs::File::create(&children).unwrap(), "id,parent_id\n10,1").unwrap();

        let mut csv = CsvDataSet::new();
        csv.add_table("parents", &parents).unwrap();
        csv.add_table("children", &children).unwrap();
        assert_eq!(csv.into_dataset().table_names(), ["parents", "children"]);
    }
}
