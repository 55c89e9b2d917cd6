//! YAML fixture reader.
//!
//! ```yaml
//! users:
//!   - id: 1
//!     name: alice
//!   - id: 2
//!     name: bob
//!     email: bob@example.com
//! audit_log: []
//! ```
//!
//! Each top-level key is a table, in file order. Columns are the union of the
//! row keys in order of first appearance; a key missing from a row loads as NULL.

use std::path::Path;

use serde_yaml::{Mapping, Value};
use tracing::debug;

use crate::core::value::SqlValue;
use crate::error::{Result, SeedError};

use super::memory::{MemoryDataSet, MemoryTable};

/// Load a YAML fixture file.
pub fn load_yaml_dataset<P: AsRef<Path>>(path: P) -> Result<MemoryDataSet> {
    let content = std::fs::read_to_string(path.as_ref())?;
    let dataset = parse_yaml_dataset(&content)?;
    debug!(
        "Loaded {} tables from {}",
        dataset.len(),
        path.as_ref().display()
    );
    Ok(dataset)
}

/// Parse a YAML fixture document.
pub fn parse_yaml_dataset(yaml: &str) -> Result<MemoryDataSet> {
    if yaml.trim().is_empty() {
        return Ok(MemoryDataSet::new());
    }
    let root: Value = serde_yaml::from_str(yaml)?;
    let tables = match root {
        Value::Mapping(m) => m,
        Value::Null => Mapping::new(),
        _ => {
            return Err(SeedError::Dataset(
                "YAML dataset must be a mapping of table names to row lists".into(),
            ))
        }
    };

    let mut dataset = MemoryDataSet::new();
    for (key, rows) in tables {
        let name = match key {
            Value::String(s) => s,
            other => {
                return Err(SeedError::Dataset(format!(
                    "Table name must be a string, got {:?}",
                    other
                )))
            }
        };
        dataset.add_table(parse_table(&name, rows)?)?;
    }
    Ok(dataset)
}

fn parse_table(name: &str, rows: Value) -> Result<MemoryTable> {
    let rows = match rows {
        Value::Sequence(seq) => seq,
        Value::Null => Vec::new(),
        _ => {
            return Err(SeedError::Dataset(format!(
                "Table {}: expected a list of rows",
                name
            )))
        }
    };

    let mut maps = Vec::with_capacity(rows.len());
    let mut columns: Vec<String> = Vec::new();
    for (i, row) in rows.into_iter().enumerate() {
        let Value::Mapping(map) = row else {
            return Err(SeedError::Dataset(format!(
                "Table {}: row {} is not a mapping",
                name, i
            )));
        };
        let mut pairs = Vec::with_capacity(map.len());
        for (k, v) in map {
            let column = scalar_key(name, k)?;
            if !columns.contains(&column) {
                columns.push(column.clone());
            }
            pairs.push((column, yaml_to_sql_value(name, v)?));
        }
        maps.push(pairs);
    }

    let mut table = MemoryTable::new(name, columns.clone());
    for pairs in maps {
        let mut row = vec![SqlValue::Null; columns.len()];
        for (column, value) in pairs {
            if let Some(idx) = columns.iter().position(|c| *c == column) {
                row[idx] = value;
            }
        }
        table.add_row(row)?;
    }
    Ok(table)
}

fn scalar_key(table: &str, key: Value) -> Result<String> {
    match key {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(SeedError::Dataset(format!(
            "Table {}: column name must be a scalar, got {:?}",
            table, other
        ))),
    }
}

/// Convert a YAML scalar into a cell value.
fn yaml_to_sql_value(table: &str, value: Value) -> Result<SqlValue> {
    match value {
        Value::Null => Ok(SqlValue::Null),
        Value::Bool(b) => Ok(SqlValue::Bool(b)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(SqlValue::I64(i))
            } else if let Some(f) = n.as_f64() {
                Ok(SqlValue::F64(f))
            } else {
                // u64 beyond i64::MAX: keep the digits and let the database parse them
                Ok(SqlValue::Text(n.to_string()))
            }
        }
        Value::String(s) => Ok(SqlValue::Text(s)),
        Value::Tagged(tagged) => yaml_to_sql_value(table, tagged.value),
        Value::Sequence(_) | Value::Mapping(_) => Err(SeedError::Dataset(format!(
            "Table {}: nested lists and mappings are not supported as cell values",
            table
        ))),
    }
}
