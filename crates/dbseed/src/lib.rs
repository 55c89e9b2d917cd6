//! # dbseed
//!
//! Chunked bulk loading of fixture datasets into PostgreSQL, SQL Server and
//! MySQL.
//!
//! A dataset (YAML, CSV or built in memory) is written table by table with
//! bounded multi-row INSERT statements:
//!
//! - **Chunking**: each table is split into runs of at most `chunk_size` rows,
//!   lowered further to respect the target's bind-parameter limit
//! - **Primary keys**: relaxed around each table load and always restored
//! - **Diagnostics**: a failing chunk reports the exact SQL and arguments
//! - **Companion operations**: `TRUNCATE` and `CLEAN_INSERT`
//!
//! ## Example
//!
//! ```rust,no_run
//! use dbseed::{drivers, load_yaml_dataset, BulkInsert, Config, DatabaseOperation};
//!
//! #[tokio::main]
//! async fn main() -> dbseed::Result<()> {
//!     let config = Config::load("dbseed.yaml")?;
//!     let dataset = load_yaml_dataset("fixtures/users.yaml")?;
//!     let mut conn = drivers::connect(&config.target).await?;
//!     let report = BulkInsert::new()
//!         .with_chunk_size(config.load.chunk_size)
//!         .execute(conn.as_mut(), &dataset)
//!         .await?;
//!     println!("Inserted {} rows", report.total_rows());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod dataset;
pub mod drivers;
pub mod error;
pub mod operation;

// Re-exports for convenient access
pub use crate::config::{Config, LoadConfig, TargetConfig};
pub use crate::core::{Connection, DataSet, DataTable, Dialect, SqlValue, TableMetadata};
pub use dataset::{load_yaml_dataset, parse_yaml_dataset, CsvDataSet, MemoryDataSet, MemoryTable};
pub use error::{Result, SeedError};
pub use operation::{
    BulkInsert, Composite, DatabaseOperation, Direction, LoadReport, OperationKind, TableReport,
    Truncate,
};
