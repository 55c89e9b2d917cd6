//! MSSQL SQL dialect (Strategy pattern).

use crate::core::identifier::quote_delimited;
use crate::core::traits::{Dialect, TruncatePlan, TruncateStep};

/// SQL Server accepts 2100 parameters per RPC call, and `sp_executesql`
/// spends two of them on the statement text and its parameter declarations.
pub const MSSQL_MAX_PARAMETERS: usize = 2098;

/// Microsoft SQL Server dialect implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct MssqlDialect;

impl MssqlDialect {
    /// Create a new MSSQL dialect instance.
    pub fn new() -> Self {
        Self
    }
}

impl Dialect for MssqlDialect {
    fn name(&self) -> &str {
        "mssql"
    }

    fn quote_ident(&self, name: &str) -> String {
        quote_delimited(name, '[', ']')
    }

    fn param_placeholder(&self, index: usize) -> String {
        format!("@P{}", index)
    }

    fn max_parameters(&self) -> Option<usize> {
        Some(MSSQL_MAX_PARAMETERS)
    }

    /// `TRUNCATE TABLE` is refused for any table a foreign key references, so
    /// rows are deleted table by table in the given order instead.
    fn truncate_plan(&self, tables: &[&str]) -> TruncatePlan {
        TruncatePlan {
            steps: tables
                .iter()
                .map(|t| TruncateStep::new(format!("DELETE FROM {}", self.quote_schema_object(t)), [*t]))
                .collect(),
            cleanup: None,
        }
    }
}
