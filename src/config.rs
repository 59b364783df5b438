// Monitor settings, optionally loaded from a JSON file
// Command-line arguments override whatever the file provides

use crate::serial::{PollerConfig, SerialConfig};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Settings for a monitoring session
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Serial device to open, e.g. /dev/rfcomm0 or COM5
    pub port: Option<String>,

    pub baud_rate: u32,

    /// Serial read timeout in milliseconds
    pub timeout_ms: u64,

    /// How often the display redraws, in milliseconds
    pub refresh_ms: u64,

    pub poller: PollerConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        let serial = SerialConfig::default();
        Self {
            port: None,
            baud_rate: serial.baud_rate,
            timeout_ms: serial.timeout.as_millis() as u64,
            refresh_ms: 250,
            poller: PollerConfig::default(),
        }
    }
}

impl MonitorConfig {
    /// Load settings from a JSON file; missing keys keep their defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        tracing::debug!("Loaded config from {}", path.as_ref().display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.baud_rate == 0 {
            return Err(ConfigError::Invalid("baud_rate must be non-zero".to_string()));
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::Invalid("timeout_ms must be non-zero".to_string()));
        }
        if self.poller.max_line_len == 0 {
            return Err(ConfigError::Invalid(
                "poller.max_line_len must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn serial_config(&self) -> SerialConfig {
        SerialConfig::new(self.baud_rate).with_timeout(Duration::from_millis(self.timeout_ms))
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_ms)
    }
}
