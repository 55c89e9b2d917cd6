//! MySQL SQL dialect (Strategy pattern).

use crate::core::identifier::quote_delimited;
use crate::core::traits::{Dialect, TruncatePlan, TruncateStep};

/// Maximum placeholders in a MySQL prepared statement.
pub const MYSQL_MAX_PARAMETERS: usize = 65535;

/// MySQL/MariaDB dialect implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct MysqlDialect;

impl MysqlDialect {
    /// Create a new MySQL dialect instance.
    pub fn new() -> Self {
        Self
    }
}

impl Dialect for MysqlDialect {
    fn name(&self) -> &str {
        "mysql"
    }

    fn quote_ident(&self, name: &str) -> String {
        quote_delimited(name, '`', '`')
    }

    fn param_placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    fn max_parameters(&self) -> Option<usize> {
        Some(MYSQL_MAX_PARAMETERS)
    }

    /// InnoDB refuses to truncate a referenced table while foreign key checks
    /// are on; they are switched off for the session and always restored.
    fn truncate_plan(&self, tables: &[&str]) -> TruncatePlan {
        let mut steps = vec![TruncateStep::setup("SET FOREIGN_KEY_CHECKS = 0")];
        steps.extend(tables.iter().map(|t| {
            TruncateStep::new(format!("TRUNCATE TABLE {}", self.quote_schema_object(t)), [*t])
        }));
        TruncatePlan {
            steps,
            cleanup: Some("SET FOREIGN_KEY_CHECKS = 1".to_string()),
        }
    }
}
