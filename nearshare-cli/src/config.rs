//! CLI Configuration
//!
//! Timing knobs for the simulators, stored as TOML in the user config
//! directory. Every field has a default, so a partial file is fine.

use anyhow::{Context, Result};
use nearshare_core::discovery::{DiscoveryConfig, DEFAULT_BASE_STEP, DEFAULT_MAX_JITTER};
use nearshare_core::transfer::{
    TransferConfig, DEFAULT_CONNECT_DELAY_MAX, DEFAULT_CONNECT_DELAY_MIN,
    DEFAULT_MAX_PROGRESS_STEP, DEFAULT_TICK_MAX, DEFAULT_TICK_MIN,
};
use nearshare_core::SimError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// CLI configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Discovery timing
    #[serde(default)]
    pub discovery: DiscoverySettings,

    /// Transfer timing
    #[serde(default)]
    pub transfer: TransferSettings,
}

/// Discovery timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoverySettings {
    /// Delay between consecutive reveals in milliseconds
    #[serde(default = "default_base_step_ms")]
    pub base_step_ms: u64,

    /// Maximum random extra delay per reveal in milliseconds
    #[serde(default = "default_max_jitter_ms")]
    pub max_jitter_ms: u64,

    /// Keep the visible list sorted by distance
    #[serde(default = "default_true")]
    pub sort_by_distance: bool,
}

/// Transfer timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferSettings {
    #[serde(default = "default_connect_delay_min_ms")]
    pub connect_delay_min_ms: u64,

    #[serde(default = "default_connect_delay_max_ms")]
    pub connect_delay_max_ms: u64,

    #[serde(default = "default_tick_min_ms")]
    pub tick_min_ms: u64,

    #[serde(default = "default_tick_max_ms")]
    pub tick_max_ms: u64,

    /// Largest progress step per tick, in percentage points
    #[serde(default = "default_max_progress_step")]
    pub max_progress_step: u8,
}

fn millis(duration: Duration) -> u64 {
    duration.as_millis() as u64
}

fn default_base_step_ms() -> u64 {
    millis(DEFAULT_BASE_STEP)
}

fn default_max_jitter_ms() -> u64 {
    millis(DEFAULT_MAX_JITTER)
}

fn default_true() -> bool {
    true
}

fn default_connect_delay_min_ms() -> u64 {
    millis(DEFAULT_CONNECT_DELAY_MIN)
}

fn default_connect_delay_max_ms() -> u64 {
    millis(DEFAULT_CONNECT_DELAY_MAX)
}

fn default_tick_min_ms() -> u64 {
    millis(DEFAULT_TICK_MIN)
}

fn default_tick_max_ms() -> u64 {
    millis(DEFAULT_TICK_MAX)
}

fn default_max_progress_step() -> u8 {
    DEFAULT_MAX_PROGRESS_STEP
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            base_step_ms: default_base_step_ms(),
            max_jitter_ms: default_max_jitter_ms(),
            sort_by_distance: true,
        }
    }
}

impl Default for TransferSettings {
    fn default() -> Self {
        Self {
            connect_delay_min_ms: default_connect_delay_min_ms(),
            connect_delay_max_ms: default_connect_delay_max_ms(),
            tick_min_ms: default_tick_min_ms(),
            tick_max_ms: default_tick_max_ms(),
            max_progress_step: default_max_progress_step(),
        }
    }
}

impl DiscoverySettings {
    pub fn to_config(&self) -> DiscoveryConfig {
        DiscoveryConfig {
            base_step: Duration::from_millis(self.base_step_ms),
            max_jitter: Duration::from_millis(self.max_jitter_ms),
            sort_by_distance: self.sort_by_distance,
        }
    }
}

impl TransferSettings {
    pub fn to_config(&self) -> TransferConfig {
        TransferConfig {
            connect_delay_min: Duration::from_millis(self.connect_delay_min_ms),
            connect_delay_max: Duration::from_millis(self.connect_delay_max_ms),
            tick_min: Duration::from_millis(self.tick_min_ms),
            tick_max: Duration::from_millis(self.tick_max_ms),
            max_progress_step: self.max_progress_step,
        }
    }
}

impl Config {
    /// Default location: `<config dir>/nearshare/config.toml`
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join("nearshare")
            .join("config.toml")
    }

    /// Load configuration from `path`, creating a default file if not found
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = path.map(Path::to_path_buf).unwrap_or_else(Self::default_path);

        if config_path.exists() {
            let contents =
                fs::read_to_string(&config_path).context("Failed to read config file")?;
            let config: Config =
                toml::from_str(&contents).context("Failed to parse config file")?;
            config.validate()?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(&config_path)?;
            info!("Created default configuration at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Reject ranges the simulators cannot honor
    pub fn validate(&self) -> Result<()> {
        let t = &self.transfer;
        if t.connect_delay_min_ms > t.connect_delay_max_ms {
            return Err(SimError::Configuration(
                "transfer.connect_delay_min_ms exceeds connect_delay_max_ms".to_string(),
            )
            .into());
        }
        if t.tick_min_ms == 0 || t.tick_min_ms > t.tick_max_ms {
            return Err(SimError::Configuration(
                "transfer.tick_min_ms must be positive and at most tick_max_ms".to_string(),
            )
            .into());
        }
        if t.max_progress_step == 0 || t.max_progress_step > 100 {
            return Err(SimError::Configuration(
                "transfer.max_progress_step must be within 1..=100".to_string(),
            )
            .into());
        }
        Ok(())
    }
}
