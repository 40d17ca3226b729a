//! Configuration validation
//!
//! Hard errors for settings the storage layer cannot run with, warnings for
//! risky production deployments.

use super::config::AppConfig;
use super::loader::profile;
use anyhow::{Context, Result};
use tracing::warn;

/// Validate the loaded configuration
pub fn validate_config(config: &AppConfig) -> Result<()> {
    config
        .storage
        .validate()
        .context("Invalid storage configuration")?;

    if !profile().eq_ignore_ascii_case("production") {
        return Ok(());
    }

    if config.server.host == "0.0.0.0" {
        warn!(
            "SECURITY WARNING: Server is binding to all interfaces (0.0.0.0) in production. \
             Consider binding to 127.0.0.1 and using a reverse proxy."
        );
    }

    if config.server.cors_origins.iter().any(|o| o == "*") {
        warn!("SECURITY WARNING: CORS allows any origin in production.");
    }

    if config.storage.backend.eq_ignore_ascii_case("redis")
        && config.storage.redis_url.starts_with("redis://")
        && !config.storage.redis_url.contains('@')
    {
        warn!(
            "SECURITY WARNING: Redis connection appears to have no authentication in production. \
             Consider enabling Redis AUTH."
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::config::ServerConfig;
    use raidesk_storage::StorageConfig;

    #[test]
    fn test_rejects_invalid_storage() {
        let config = AppConfig {
            server: ServerConfig::default(),
            storage: StorageConfig {
                backend: "mongodb".to_string(),
                ..StorageConfig::default()
            },
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_accepts_defaults() {
        let config = AppConfig {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
        };
        assert!(validate_config(&config).is_ok());
    }
}
