//! Command handlers -- one module per subcommand

pub mod campaign;
pub mod config;
pub mod inject;
pub mod validate;

use std::path::{Path, PathBuf};

use tracing::debug;

use canfault_core::config::CanfaultConfig;

use crate::error::CliError;

/// Configuration file looked up when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "canfault.toml";

/// Resolve which configuration file to load, if any.
///
/// An explicit path is always used. Without one, `canfault.toml` is used when it
/// exists in the current directory.
pub async fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let default = PathBuf::from(DEFAULT_CONFIG_PATH);
    match tokio::fs::try_exists(&default).await {
        Ok(true) => Some(default),
        _ => None,
    }
}

/// Load the effective configuration: file (if any), env overrides, validation.
pub async fn load_config(explicit: Option<&Path>) -> Result<CanfaultConfig, CliError> {
    match resolve_config_path(explicit).await {
        Some(path) => Ok(CanfaultConfig::load(&path).await?),
        None => {
            debug!("no configuration file, using defaults");
            let mut config = CanfaultConfig::default();
            config.apply_env_overrides();
            config.validate()?;
            Ok(config)
        }
    }
}
