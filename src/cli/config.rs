// ABOUTME: Configuration management for the stagehand application
// ABOUTME: Handles loading and merging configuration from files and environment variables

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::parser::EstimateConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Command invoked once per work item, with the item id appended.
    #[serde(default = "default_runner_command")]
    pub runner_command: String,

    /// Seconds a cancelled item process gets before a forced kill.
    #[serde(default = "default_grace_seconds")]
    pub grace_seconds: u64,

    #[serde(default)]
    pub estimates: EstimateConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

fn default_runner_command() -> String {
    "agent run".to_string()
}

fn default_grace_seconds() -> u64 {
    5
}

impl Default for Config {
    fn default() -> Self {
        Self {
            runner_command: default_runner_command(),
            grace_seconds: default_grace_seconds(),
            estimates: EstimateConfig::default(),
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
            None => Self::find_config_file()?,
        };

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)?;
            let mut config: Config = serde_yaml::from_str(&contents)?;
            config.merge_env()?;
            Ok(config)
        } else {
            let mut config = Config::default();
            config.merge_env()?;
            Ok(config)
        }
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Result<PathBuf> {
        let possible_paths = vec![
            PathBuf::from("stagehand.yaml"),
            PathBuf::from("stagehand.yml"),
            PathBuf::from(".stagehand.yaml"),
            PathBuf::from(".stagehand.yml"),
        ];

        if let Some(home_dir) = dirs::home_dir() {
            let home_config = home_dir.join(".stagehand").join("config.yaml");
            if home_config.exists() {
                return Ok(home_config);
            }
        }

        for path in possible_paths {
            if path.exists() {
                return Ok(path);
            }
        }

        // Default path (may not exist)
        Ok(PathBuf::from("stagehand.yaml"))
    }

    /// Merge environment variables into configuration
    fn merge_env(&mut self) -> Result<()> {
        if let Ok(command) = std::env::var("STAGEHAND_RUNNER") {
            self.runner_command = command;
        }
        if let Ok(grace) = std::env::var("STAGEHAND_GRACE_SECONDS") {
            self.grace_seconds = grace.parse()?;
        }
        if let Ok(minutes) = std::env::var("STAGEHAND_PER_ITEM_MINUTES") {
            self.estimates.per_item_minutes = minutes.parse()?;
        }
        if let Ok(agents) = std::env::var("STAGEHAND_AGENTS_PER_ITEM") {
            self.estimates.agents_per_item = agents.parse()?;
        }
        if let Ok(level) = std::env::var("STAGEHAND_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("STAGEHAND_LOG_FORMAT") {
            self.logging.format = format;
        }

        Ok(())
    }
}
