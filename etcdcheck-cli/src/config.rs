///! CLI configuration management

use anyhow::{Context, Result};
use etcdcheck_core::logging::{LogRotation, LoggingConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_PATH: &str = "/etc/etcdcheck/config.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// etcdctl binary; looked up on PATH when unset
    pub etcdctl: Option<PathBuf>,
    /// Extra environment for etcdctl, e.g. ETCDCTL_CACERT / ETCDCTL_CERT / ETCDCTL_KEY
    pub env: BTreeMap<String, String>,
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
    pub log_rotation: LogRotation,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            etcdctl: None,
            env: BTreeMap::new(),
            log_level: "warn".to_string(),
            log_dir: None,
            log_rotation: LogRotation::Never,
        }
    }
}

impl Config {
    /// Load `path`, or the default location when none is given.
    /// Only a missing default file falls back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_PATH);
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };

        let contents = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config {}", config_path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config {}", config_path.display()))?;

        Ok(config)
    }

    pub fn logging(&self) -> LoggingConfig {
        LoggingConfig {
            level: self.log_level.clone(),
            directory: self.log_dir.clone(),
            rotation: self.log_rotation,
        }
    }
}
