//! Fixture datasets.
//!
//! Readers materialize fixture files into a [`MemoryDataSet`], which
//! implements the [`DataSet`](crate::core::DataSet) trait consumed by the
//! database operations.

pub mod csv;
pub mod memory;
pub mod yaml;

pub use self::csv::{CsvDataSet, DEFAULT_NULL_MARKER};
pub use memory::{MemoryDataSet, MemoryTable};
pub use yaml::{load_yaml_dataset, parse_yaml_dataset};
