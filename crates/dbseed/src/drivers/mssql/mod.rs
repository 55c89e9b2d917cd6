//! Microsoft SQL Server driver.

mod connection;
pub mod dialect;

pub use connection::MssqlConnection;
pub use dialect::MssqlDialect;
