//! Fleet configuration.
//!
//! Loaded from a TOML file. Every section falls back to its defaults, so an
//! empty file (or no file at all) gives a 60 second lifecycle tick with a 25%
//! battery gate for loading.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FleetConfig {
    pub database: DatabaseConfig,
    pub scheduler: SchedulerConfig,
    pub loading: LoadPolicy,
    pub lifecycle: LifecyclePolicy,
    pub logging: LoggingConfig,
    pub seed: SeedConfig,
}

impl FleetConfig {
    /// Load from `path`, or use defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            Self::from_toml_str(&content)?
        } else {
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values for consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.scheduler.interval_secs == 0 {
            errors.push("scheduler.interval_secs must be greater than 0");
        }
        if !(0..=100).contains(&self.loading.low_battery_threshold) {
            errors.push("loading.low_battery_threshold must be between 0 and 100");
        }
        if self.lifecycle.delivery_battery_cost < 0 {
            errors.push("lifecycle.delivery_battery_cost must not be negative");
        }
        if self.database.path.as_os_str().is_empty() {
            errors.push("database.path must not be empty");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(errors.join("; ")))
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("drone-fleet.db"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Seconds between lifecycle passes over the fleet
    pub interval_secs: u64,
}

impl SchedulerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { interval_secs: 60 }
    }
}

/// Rules applied when cargo is loaded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoadPolicy {
    /// An idle drone at or below this charge may not enter `Loading`
    pub low_battery_threshold: i32,
}

impl Default for LoadPolicy {
    fn default() -> Self {
        Self {
            low_battery_threshold: 25,
        }
    }
}

/// Rules applied by the lifecycle state machine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LifecyclePolicy {
    /// Battery percentage spent on `Delivering -> Delivered`
    pub delivery_battery_cost: i32,
    /// Stop the battery at 0 instead of letting it go negative
    pub clamp_battery_at_zero: bool,
}

impl Default for LifecyclePolicy {
    fn default() -> Self {
        Self {
            delivery_battery_cost: 10,
            clamp_battery_at_zero: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SeedConfig {
    /// Seed the demo drone and catalog into an empty store on start-up
    pub demo_catalog: bool,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self { demo_catalog: true }
    }
}
