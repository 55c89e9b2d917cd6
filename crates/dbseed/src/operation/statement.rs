//! Multi-row INSERT statements and their flattened argument lists.

use std::collections::HashMap;

use crate::core::identifier::{validate_identifier, validate_schema_object};
use crate::core::schema::TableMetadata;
use crate::core::traits::{DataTable, Dialect};
use crate::core::value::SqlValue;
use crate::error::Result;

use super::chunk::Chunk;

/// Render `INSERT INTO t (c1, c2) VALUES (p, p), (p, p)` for `rows` row groups.
///
/// Returns `None` when the destination has no columns or `rows` is 0.
/// The output depends only on the dialect, the metadata and `rows`.
pub fn render_insert(dialect: &dyn Dialect, metadata: &TableMetadata, rows: usize) -> Option<String> {
    let column_count = metadata.column_count();
    if column_count == 0 || rows == 0 {
        return None;
    }
    let mut sql = insert_prefix(dialect, metadata);
    append_row_groups(&mut sql, dialect, column_count, rows);
    Some(sql)
}

fn insert_prefix(dialect: &dyn Dialect, metadata: &TableMetadata) -> String {
    let columns: Vec<String> = metadata
        .columns
        .iter()
        .map(|c| dialect.quote_ident(c))
        .collect();
    format!(
        "INSERT INTO {} ({}) VALUES ",
        dialect.quote_schema_object(&metadata.name),
        columns.join(", ")
    )
}

fn append_row_groups(sql: &mut String, dialect: &dyn Dialect, column_count: usize, rows: usize) {
    let mut index = 1;
    for row in 0..rows {
        if row > 0 {
            sql.push_str(", ");
        }
        sql.push('(');
        for col in 0..column_count {
            if col > 0 {
                sql.push_str(", ");
            }
            sql.push_str(&dialect.param_placeholder(index));
            index += 1;
        }
        sql.push(')');
    }
}

/// Builds bulk INSERT statements for one destination table.
///
/// Statements are cached per row count; a table load needs at most two
/// (the full chunk and the remainder).
#[derive(Debug)]
pub struct BulkStatementBuilder {
    prefix: Option<String>,
    column_count: usize,
    cache: HashMap<usize, String>,
}

impl BulkStatementBuilder {
    /// Prepare a builder for `metadata`, validating every identifier.
    pub fn new(dialect: &dyn Dialect, metadata: &TableMetadata) -> Result<Self> {
        validate_schema_object(&metadata.name)?;
        for column in &metadata.columns {
            validate_identifier(column)?;
        }
        let prefix = (metadata.column_count() > 0).then(|| insert_prefix(dialect, metadata));
        Ok(Self {
            prefix,
            column_count: metadata.column_count(),
            cache: HashMap::new(),
        })
    }

    /// Statement for a chunk of `rows` rows, or `None` if the table has no columns.
    pub fn build(&mut self, dialect: &dyn Dialect, rows: usize) -> Option<String> {
        let prefix = self.prefix.as_ref()?;
        if rows == 0 {
            return None;
        }
        let column_count = self.column_count;
        let sql = self.cache.entry(rows).or_insert_with(|| {
            let mut sql = prefix.clone();
            append_row_groups(&mut sql, dialect, column_count, rows);
            sql
        });
        Some(sql.clone())
    }
}

/// Flatten a chunk's values in row order, each row in destination column order.
///
/// # Errors
///
/// Fails with `SeedError::MissingColumn` if the dataset table lacks one of
/// `columns`.
pub fn build_arguments(table: &dyn DataTable, columns: &[String], chunk: Chunk) -> Result<Vec<SqlValue>> {
    let mut args = Vec::with_capacity(chunk.len * columns.len());
    for row in chunk.rows() {
        for column in columns {
            args.push(table.value(row, column)?);
        }
    }
    Ok(args)
}
