//! Configuration file (`finquest.json`)
//!
//! ```json
//! {
//!   "profile_store": "./profiles.json",
//!   "log_level": "info",
//!   "rewards": { "log_expense": 10, "complete_challenge": 50, "create_budget": 100 }
//! }
//! ```
//!
//! Every field is optional.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::errors::{CliError, CliResult};
use crate::leveling::RewardTable;
use crate::observability::Severity;

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path of the JSON profile store
    #[serde(default = "default_profile_store")]
    pub profile_store: PathBuf,

    /// Minimum severity written to the log
    #[serde(default = "default_log_level")]
    pub log_level: Severity,

    /// XP awarded for the fixed rewards
    #[serde(default)]
    pub rewards: RewardTable,
}

fn default_profile_store() -> PathBuf {
    PathBuf::from("./profiles.json")
}

fn default_log_level() -> Severity {
    Severity::Info
}

impl Default for Config {
    fn default() -> Self {
        Self {
            profile_store: default_profile_store(),
            log_level: default_log_level(),
            rewards: RewardTable::default(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if self.profile_store.as_os_str().is_empty() {
            return Err(CliError::config_error("profile_store must not be empty"));
        }

        if let Some(reward) = self.rewards.zero_reward() {
            return Err(CliError::config_error(format!(
                "Reward '{}' must be > 0",
                reward
            )));
        }

        Ok(())
    }

    /// Profile store path as Path
    pub fn store_path(&self) -> &Path {
        &self.profile_store
    }
}
