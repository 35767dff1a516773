use anyhow::{Context, Result};
use idevctl_shared::config::ToolConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Overrides the config file location.
pub const CONFIG_ENV: &str = "IDEVCTL_CONFIG";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Global verbose/debug toggle, same as passing `--verbose`.
    #[serde(default)]
    pub verbose: bool,
    /// Pick the only attached device without prompting.
    #[serde(default = "default_true")]
    pub auto_select_single: bool,
    #[serde(default)]
    pub tools: ToolConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            verbose: false,
            auto_select_single: true,
            tools: ToolConfig::default(),
        }
    }
}

impl Config {
    /// Load from the default location, writing defaults there if absent.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_file_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            debug!("Loading config from: {:?}", config_path);
            let contents =
                std::fs::read_to_string(config_path).context("Failed to read config file")?;
            let config: Config =
                serde_json::from_str(&contents).context("Failed to parse config file")?;
            Ok(config)
        } else {
            debug!("Config file not found, using defaults");
            let config = Self::default();
            if let Err(e) = config.save_to(config_path) {
                warn!("Could not write default config: {e:#}");
            }
            Ok(config)
        }
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        let config_dir = config_path
            .parent()
            .context("Failed to get config directory")?;

        std::fs::create_dir_all(config_dir).context("Failed to create config directory")?;

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(config_path, contents).context("Failed to write config file")?;

        debug!("Config saved to: {:?}", config_path);
        Ok(())
    }

    fn config_file_path() -> Result<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Ok(PathBuf::from(path));
        }
        let config_dir = dirs::config_dir().context("Failed to get config directory")?;
        Ok(config_dir.join("idevctl").join("config.json"))
    }
}
