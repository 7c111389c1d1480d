// ABOUTME: Configuration management for the widgetkit command line
// ABOUTME: Handles loading and merging configuration from files and environment variables

use anyhow::Result;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::binding::factory::DEFAULT_BS_VERSION;
use crate::template::i18n::FALLBACK_LOCALE;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_locale")]
    pub default_locale: String,

    /// Bootstrap generation assumed by `attrBS`/`hasAttrBS` bindings
    #[serde(default = "default_bs_version")]
    pub bs_version: u8,

    #[serde(default)]
    pub template_vars: IndexMap<String, String>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

fn default_locale() -> String {
    FALLBACK_LOCALE.to_string()
}

fn default_bs_version() -> u8 {
    DEFAULT_BS_VERSION
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_locale: default_locale(),
            bs_version: default_bs_version(),
            template_vars: IndexMap::new(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file path or default locations
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p,
            None => Self::find_config_file(),
        };

        let mut config = if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)?;
            serde_yaml::from_str(&contents)
                .map_err(|e| anyhow::anyhow!("Invalid config file '{}': {}", config_path.display(), e))?
        } else {
            Config::default()
        };

        config.merge_env()?;
        Ok(config)
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> PathBuf {
        let possible_paths = [
            PathBuf::from("widgetkit.yaml"),
            PathBuf::from("widgetkit.yml"),
            PathBuf::from(".widgetkit.yaml"),
            PathBuf::from(".widgetkit.yml"),
        ];

        for path in possible_paths {
            if path.exists() {
                return path;
            }
        }

        if let Some(home_dir) = dirs::home_dir() {
            let home_config = home_dir.join(".widgetkit").join("config.yaml");
            if home_config.exists() {
                return home_config;
            }
        }

        // Default path (may not exist)
        PathBuf::from("widgetkit.yaml")
    }

    /// Merge environment variables into configuration
    fn merge_env(&mut self) -> Result<()> {
        if let Ok(locale) = std::env::var("WIDGETKIT_LOCALE") {
            self.default_locale = locale;
        }
        if let Ok(version) = std::env::var("WIDGETKIT_BS_VERSION") {
            self.bs_version = version
                .parse()
                .map_err(|_| anyhow::anyhow!("WIDGETKIT_BS_VERSION must be a number, got '{}'", version))?;
        }
        if let Ok(level) = std::env::var("WIDGETKIT_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("WIDGETKIT_LOG_FORMAT") {
            self.logging.format = format;
        }
        Ok(())
    }

    /// Merge additional variables into template variables
    pub fn merge_variables(&mut self, vars: IndexMap<String, String>) {
        self.template_vars.extend(vars);
    }
}
