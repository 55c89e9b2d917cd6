//! Error types for the fixture loading library.

use thiserror::Error;

use crate::core::value::{format_args_list, SqlValue};

/// Main error type for load operations.
#[derive(Error, Debug)]
pub enum SeedError {
    /// Configuration error (invalid YAML, missing fields, bad CLI overrides, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// The destination table reports no columns but the dataset has rows for it.
    #[error("{operation} operation failed on table {table}: rows requested for insert, but no columns provided")]
    NoColumns { operation: String, table: String },

    /// One row of the table needs more bind parameters than a statement may carry.
    #[error("{operation} operation failed on table {table}: {columns} columns exceed the {limit} bind parameters allowed per statement")]
    TooManyColumns {
        operation: String,
        table: String,
        columns: usize,
        limit: usize,
    },

    /// A destination column has no counterpart in the dataset table.
    #[error("Column {column} does not exist in dataset table {table}")]
    MissingColumn { table: String, column: String },

    /// A statement failed while an operation was running.
    ///
    /// Carries everything needed to replay the failing batch by hand.
    #[error("{operation} operation failed on query: {query} using args: {} [table {table}]: {message}", format_args_list(.args))]
    Execution {
        operation: String,
        table: String,
        query: String,
        args: Vec<SqlValue>,
        message: String,
    },

    /// Malformed dataset input (YAML/CSV fixtures, row shape mismatches)
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// Failure to open or prepare a database session
    #[error("Connection error: {message}\n  Context: {context}")]
    Connection { message: String, context: String },

    /// PostgreSQL driver error outside of a chunk
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    /// SQL Server driver error outside of a chunk
    #[error("SQL Server error: {0}")]
    Mssql(#[from] tiberius::error::Error),

    /// MySQL driver error outside of a chunk
    #[cfg(feature = "mysql")]
    #[error("MySQL error: {0}")]
    Mysql(#[from] mysql_async::Error),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV parsing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl SeedError {
    /// Create a Connection error with context about where it occurred
    pub fn connection(message: impl ToString, context: impl Into<String>) -> Self {
        SeedError::Connection {
            message: message.to_string(),
            context: context.into(),
        }
    }

    /// Create an Execution error for a failed statement.
    pub fn execution(
        operation: impl Into<String>,
        table: impl Into<String>,
        query: impl Into<String>,
        args: Vec<SqlValue>,
        message: impl ToString,
    ) -> Self {
        SeedError::Execution {
            operation: operation.into(),
            table: table.into(),
            query: query.into(),
            args,
            message: message.to_string(),
        }
    }

    /// Process exit code for the CLI.
    pub fn exit_code(&self) -> u8 {
        match self {
            SeedError::Config(_) | SeedError::Yaml(_) => 2,
            SeedError::NoColumns { .. }
            | SeedError::TooManyColumns { .. }
            | SeedError::MissingColumn { .. }
            | SeedError::Dataset(_)
            | SeedError::Csv(_) => 3,
            SeedError::Execution { .. } => 4,
            SeedError::Connection { .. } => 5,
            _ => 1,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for load operations.
pub type Result<T> = std::result::Result<T, SeedError>;
