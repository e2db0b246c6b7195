// src/config.rs

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    constants::{DEFAULT_LOG_LEVEL, DEFAULT_MEMORY_PARAMS_DIR, DEFAULT_PARAMS_DIR},
    errors::ConfigError,
};

/// Where the stores live and how loudly to log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    /// Persistent parameter store directory.
    pub params_dir: PathBuf,
    /// Volatile store directory used for signals.
    pub memory_params_dir: PathBuf,
    /// One of `trace`, `debug`, `info`, `warn`, `error`.
    pub log_level: String,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            params_dir: PathBuf::from(DEFAULT_PARAMS_DIR),
            memory_params_dir: PathBuf::from(DEFAULT_MEMORY_PARAMS_DIR),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl PanelConfig {
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        debug!("{} -> Config saved.", path.display());
        Ok(())
    }
}

/// Reads the config at `path`, or writes and returns the defaults if there is
/// none yet. Missing fields take their default values.
pub fn load_or_default(path: &Path) -> Result<PanelConfig, ConfigError> {
    if path.exists() {
        let content = fs::read_to_string(path)?;
        let config: PanelConfig = toml::from_str(&content)?;
        debug!("{} -> Config loaded.", path.display());
        Ok(config)
    } else {
        let config = PanelConfig::default();
        config.save(path)?;
        info!("{} -> No config found, wrote defaults.", path.display());
        Ok(config)
    }
}
