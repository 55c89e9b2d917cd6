//! Table metadata shared by datasets and destination databases.

use serde::{Deserialize, Serialize};

/// Table metadata.
///
/// Dataset tables describe their own columns and report no primary keys;
/// destination metadata is introspected from the live database and is the
/// authority on column order for generated statements.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMetadata {
    /// Table name, optionally schema-qualified (`schema.table`).
    pub name: String,

    /// Column names in table order.
    pub columns: Vec<String>,

    /// Primary key column names.
    pub primary_keys: Vec<String>,
}

impl TableMetadata {
    /// Create metadata without primary keys.
    pub fn new<I, S>(name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            primary_keys: Vec::new(),
        }
    }

    /// Set the primary key columns.
    pub fn with_primary_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Check if the table has a primary key.
    pub fn has_pk(&self) -> bool {
        !self.primary_keys.is_empty()
    }

    /// Split a possibly qualified name into `(schema, table)`.
    pub fn split_name(&self) -> (Option<&str>, &str) {
        match self.name.rsplit_once('.') {
            Some((schema, table)) => (Some(schema), table),
            None => (None, self.name.as_str()),
        }
    }
}
