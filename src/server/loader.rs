//! Configuration loading
//!
//! Sources, lowest priority first:
//! 1. `config/default.toml`, compiled into the binary
//! 2. `config/{profile}` where the profile is `RAIDESK_ENV` (default `development`)
//! 3. `config/local`
//! 4. The file named by `RAIDESK_CONFIG`, which must exist when set
//! 5. `RAIDESK_*` variables, e.g. `RAIDESK_STORAGE__SESSION_TTL_SECS=3600`
//!
//! Layers 2 and 3 are optional and may be TOML, YAML or JSON.

use super::config::AppConfig;
use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Embedded default configuration (compiled into binary)
pub const DEFAULT_CONFIG: &str = include_str!("../../config/default.toml");

const ENV_PREFIX: &str = "RAIDESK";
const DEFAULT_PROFILE: &str = "development";

/// Deployment profile from `RAIDESK_ENV`
pub fn profile() -> String {
    std::env::var("RAIDESK_ENV").unwrap_or_else(|_| DEFAULT_PROFILE.to_string())
}

/// `RAIDESK_*` variable source; a single `_` follows the prefix, `__` separates keys
fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

fn build(profile: &str, explicit: Option<&Path>, env: Environment) -> Result<AppConfig> {
    let mut builder = Config::builder()
        .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
        .add_source(File::with_name(&format!("config/{}", profile)).required(false))
        .add_source(File::with_name("config/local").required(false));

    if let Some(path) = explicit {
        builder = builder.add_source(File::from(path).required(true));
    }

    builder
        .add_source(env)
        .build()
        .context("Failed to build configuration")?
        .try_deserialize()
        .context("Failed to deserialize configuration")
}

/// Load configuration for the current profile
pub fn load_config() -> Result<AppConfig> {
    let profile = profile();
    let explicit = std::env::var_os("RAIDESK_CONFIG").map(PathBuf::from);

    let config = build(&profile, explicit.as_deref(), environment())?;
    debug!(
        profile = %profile,
        file = ?explicit,
        backend = %config.storage.backend,
        "Configuration loaded"
    );
    Ok(config)
}
