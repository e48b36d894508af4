//! Loading the configuration file.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::config::ServerConfig;

/// Environment variable naming an optional configuration file.
pub const CONFIG_PATH_ENV: &str = "DSSMCP_CONFIG";

/// Configuration file named by [`CONFIG_PATH_ENV`], if set and non-blank.
pub fn config_path_from_env() -> Option<PathBuf> {
    env::var(CONFIG_PATH_ENV)
        .ok()
        .filter(|path| !path.trim().is_empty())
        .map(PathBuf::from)
}

/// Parse a configuration file. Validation happens after overrides are applied.
pub fn load_config_from_path(path: &Path) -> anyhow::Result<ServerConfig> {
    let content = fs::read_to_string(path).with_context(|| format!("read config file {}", path.display()))?;
    let config: ServerConfig = serde_json::from_str(&content).with_context(|| format!("parse config file {}", path.display()))?;
    Ok(config)
}
