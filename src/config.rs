use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::grid::MapSize;

fn default_seed() -> u64 {
    7
}

fn default_starting_money() -> i64 {
    2_000
}

fn default_tick_interval_ms() -> u64 {
    1_000
}

fn default_true() -> bool {
    true
}

fn default_model() -> Option<String> {
    None
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_cooldown_secs() -> u64 {
    60
}

fn default_retry_secs() -> u64 {
    5
}

fn default_max_failures() -> u32 {
    3
}

fn default_news_interval_days() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Which rule set the colony runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Economy, power and housing only.
    Basic,
    /// Adds terrain heights, atmosphere and food.
    #[default]
    Extended,
}

impl Variant {
    pub fn has_life_support(self) -> bool {
        self == Variant::Extended
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColonyConfig {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default)]
    pub map_size: MapSize,
    #[serde(default)]
    pub variant: Variant,
    /// Enables the auto-builder and the remote narrative service.
    #[serde(default = "default_true")]
    pub ai_enabled: bool,
    #[serde(default = "default_starting_money")]
    pub starting_money: i64,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default)]
    pub ticks: Option<u64>,
    #[serde(default)]
    pub narrative: NarrativeConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrativeConfig {
    /// Base URL of an OpenAI-compatible server. Unset means offline.
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_model")]
    pub model: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
    #[serde(default = "default_retry_secs")]
    pub retry_secs: u64,
    #[serde(default = "default_max_failures")]
    pub max_failures: u32,
    #[serde(default = "default_news_interval_days")]
    pub news_interval_days: u64,
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            model: default_model(),
            timeout_secs: default_timeout_secs(),
            cooldown_secs: default_cooldown_secs(),
            retry_secs: default_retry_secs(),
            max_failures: default_max_failures(),
            news_interval_days: default_news_interval_days(),
        }
    }
}

impl NarrativeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl ColonyConfig {
    /// Configuration used when no file is given.
    pub fn red_plains() -> Self {
        Self {
            name: "red_plains".to_string(),
            description: None,
            seed: default_seed(),
            map_size: MapSize::default(),
            variant: Variant::Extended,
            ai_enabled: true,
            starting_money: default_starting_money(),
            tick_interval_ms: default_tick_interval_ms(),
            ticks: None,
            narrative: NarrativeConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    pub fn ticks(&self, override_ticks: Option<u64>) -> u64 {
        override_ticks.or(self.ticks).unwrap_or(120)
    }
}

pub struct ConfigLoader {
    base_dir: PathBuf,
}

impl ConfigLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<ColonyConfig> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read colony config {}", path.display()))?;
        let config: ColonyConfig = serde_yaml::from_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }
}
