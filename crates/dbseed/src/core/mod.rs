//! Core abstractions for database-agnostic fixture loading.
//!
//! - [`schema`]: table metadata shared by datasets and destinations
//! - [`value`]: SQL value representation
//! - [`traits`]: datasets, connections and dialects
//! - [`identifier`]: identifier validation and quoting
//!
//! Driver modules (`drivers/postgres`, `drivers/mssql`, ...) implement these
//! traits; operations only ever see the traits, so they are tested against
//! in-memory implementations.

pub mod identifier;
pub mod schema;
pub mod traits;
pub mod value;

pub use schema::TableMetadata;
pub use traits::{Connection, DataSet, DataTable, Dialect, TableIter, TruncatePlan, TruncateStep};
pub use value::SqlValue;
