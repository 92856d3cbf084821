// Configuration management

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::audio::SoundConfig;
use crate::error::{ConfigError, ConfigResult};

const APP_DIR: &str = "event-timer";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory for stored preferences; platform data dir when unset
    pub data_dir: Option<PathBuf>,

    /// How often the runner samples the stopwatch, in milliseconds
    pub tick_interval_ms: u64,

    /// Pause between consecutive rings of one alarm, in milliseconds
    pub ring_gap_ms: u64,

    /// How long the visual flash stays on, in milliseconds
    pub flash_duration_ms: u64,

    /// How long a toast stays visible, in milliseconds
    pub toast_duration_ms: u64,

    /// Audio output settings
    pub sound: SoundConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            tick_interval_ms: 100,
            ring_gap_ms: 500,
            flash_duration_ms: 1000,
            toast_duration_ms: 3000,
            sound: SoundConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file or create default
    pub fn load() -> ConfigResult<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from `path`, writing defaults there if it is missing
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&content)?)
        } else {
            let config = Self::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> ConfigResult<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Reject values the timer cannot run with
    pub fn validate(&self) -> ConfigResult<()> {
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "tick_interval_ms must be greater than zero".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.sound.volume) {
            return Err(ConfigError::InvalidValue(format!(
                "sound.volume must be between 0.0 and 1.0, got {}",
                self.sound.volume
            )));
        }
        Ok(())
    }

    /// Directory holding stored preferences
    pub fn data_dir(&self) -> ConfigResult<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => dirs::data_dir()
                .map(|dir| dir.join(APP_DIR))
                .ok_or(ConfigError::NoConfigDir),
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn ring_gap(&self) -> Duration {
        Duration::from_millis(self.ring_gap_ms)
    }

    pub fn flash_duration(&self) -> Duration {
        Duration::from_millis(self.flash_duration_ms)
    }

    pub fn toast_duration(&self) -> Duration {
        Duration::from_millis(self.toast_duration_ms)
    }

    /// Get the path to the configuration file
    fn config_path() -> ConfigResult<PathBuf> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;

        Ok(config_dir.join(APP_DIR).join("config.toml"))
    }
}
