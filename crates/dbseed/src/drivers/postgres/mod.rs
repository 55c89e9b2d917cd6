//! PostgreSQL driver.

mod connection;
pub mod dialect;
pub mod params;

pub use connection::PostgresConnection;
pub use dialect::PostgresDialect;
pub use params::PgParam;
