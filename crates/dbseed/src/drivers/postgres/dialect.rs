//! PostgreSQL SQL dialect (Strategy pattern).

use crate::core::identifier::quote_delimited;
use crate::core::traits::{Dialect, TruncatePlan, TruncateStep};

/// Bind parameters per statement allowed by the wire protocol (Int16 count).
pub const POSTGRES_MAX_PARAMETERS: usize = 65535;

/// PostgreSQL dialect implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl PostgresDialect {
    /// Create a new PostgreSQL dialect instance.
    pub fn new() -> Self {
        Self
    }
}

impl Dialect for PostgresDialect {
    fn name(&self) -> &str {
        "postgres"
    }

    fn quote_ident(&self, name: &str) -> String {
        quote_delimited(name, '"', '"')
    }

    fn param_placeholder(&self, index: usize) -> String {
        format!("${}", index)
    }

    fn max_parameters(&self) -> Option<usize> {
        Some(POSTGRES_MAX_PARAMETERS)
    }

    /// One `TRUNCATE` naming every table, so foreign keys between them are
    /// allowed.
    fn truncate_plan(&self, tables: &[&str]) -> TruncatePlan {
        let names: Vec<String> = tables.iter().map(|t| self.quote_schema_object(t)).collect();
        TruncatePlan {
            steps: vec![TruncateStep::new(
                format!("TRUNCATE TABLE {}", names.join(", ")),
                tables.iter().copied(),
            )],
            cleanup: None,
        }
    }
}
