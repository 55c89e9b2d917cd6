//! MySQL/MariaDB driver.
//!
//! The dialect is always available so statements can be planned without a
//! server; the connection needs the `mysql` feature.

#[cfg(feature = "mysql")]
mod connection;
pub mod dialect;

#[cfg(feature = "mysql")]
pub use connection::MysqlConnection;
pub use dialect::MysqlDialect;
