//! Configuration validation.

use super::Config;
use crate::drivers::SslMode;
use crate::error::{Result, SeedError};

const TARGET_TYPES: &[&str] = &["postgres", "mssql", "mysql"];

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    let target = &config.target;
    if !TARGET_TYPES.contains(&target.r#type.as_str()) {
        return Err(SeedError::Config(format!(
            "target.type must be one of {}, got '{}'",
            TARGET_TYPES.join(", "),
            target.r#type
        )));
    }
    if target.host.is_empty() {
        return Err(SeedError::Config("target.host is required".into()));
    }
    if target.database.is_empty() {
        return Err(SeedError::Config("target.database is required".into()));
    }
    if target.user.is_empty() {
        return Err(SeedError::Config("target.user is required".into()));
    }
    if target.port == Some(0) {
        return Err(SeedError::Config("target.port must be between 1 and 65535".into()));
    }
    SslMode::parse(&target.ssl_mode)?;

    if config.load.chunk_size == 0 {
        return Err(SeedError::Config("load.chunk_size must be at least 1".into()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LoadConfig, TargetConfig};

    fn valid_config() -> Config {
        Config {
            target: TargetConfig {
                r#type: "postgres".to_string(),
                host: "localhost".to_string(),
                port: Some(5432),
                database: "app_test".to_string(),
                user: "postgres".to_string(),
                password: "password".to_string(),
                ssl_mode: "disable".to_string(),
            },
            load: LoadConfig::default(),
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(validate(&valid_config()).is_ok());
    }

    #[test]
    fn test_unknown_target_type() {
        let mut config = valid_config();
        config.target.r#type = "oracle".to_string();
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("target.type"));
    }

    #[test]
    fn test_missing_host() {
        let mut config = valid_config();
        config.target.host = String::new();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_missing_database() {
        let mut config = valid_config();
        config.target.database = String::new();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_missing_user() {
        let mut config = valid_config();
        config.target.user = String::new();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_port() {
        let mut config = valid_config();
        config.target.port = Some(0);
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_invalid_ssl_mode() {
        let mut config = valid_config();
        config.target.ssl_mode = "sometimes".to_string();
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("ssl_mode"));
    }

    #[test]
    fn test_zero_chunk_size() {
        let mut config = valid_config();
        config.load.chunk_size = 0;
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("chunk_size"));
        assert_eq!(err.exit_code(), 2);
    }
}
