// src/settings.rs
//
// Optional settings file with per-key defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::io::serial::BaudRate;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("default_baud {0} is not one of the supported rates")]
    UnsupportedBaud(u32),
    #[error("{0} must be greater than zero")]
    ZeroInterval(&'static str),
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Settings {
    #[serde(default = "default_baud")]
    pub default_baud: u32,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_watchdog_interval_ms")]
    pub watchdog_interval_ms: u64,
    #[serde(default)]
    pub reassemble_partial_lines: bool,
    #[serde(default)]
    pub file_logging: bool,
}

fn default_baud() -> u32 {
    9600
}
fn default_poll_interval_ms() -> u64 {
    100
}
fn default_watchdog_interval_ms() -> u64 {
    1000
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_baud: default_baud(),
            poll_interval_ms: default_poll_interval_ms(),
            watchdog_interval_ms: default_watchdog_interval_ms(),
            reassemble_partial_lines: false,
            file_logging: false,
        }
    }
}

impl Settings {
    pub fn from_toml_str(path: &Path, contents: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(contents).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_toml_str(path, &contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(SettingsError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Load from the platform config dir, falling back to defaults on any error.
    pub fn load() -> Self {
        let Some(path) = settings_path() else {
            return Self::default();
        };
        match Self::load_from(&path) {
            Ok(settings) => settings,
            Err(e) => {
                tlog!("[settings] {}; using defaults", e);
                Self::default()
            }
        }
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if BaudRate::from_u32(self.default_baud).is_none() {
            return Err(SettingsError::UnsupportedBaud(self.default_baud));
        }
        if self.poll_interval_ms == 0 {
            return Err(SettingsError::ZeroInterval("poll_interval_ms"));
        }
        if self.watchdog_interval_ms == 0 {
            return Err(SettingsError::ZeroInterval("watchdog_interval_ms"));
        }
        Ok(())
    }

    pub fn baud(&self) -> BaudRate {
        BaudRate::from_u32(self.default_baud).unwrap_or_default()
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn watchdog_interval(&self) -> Duration {
        Duration::from_millis(self.watchdog_interval_ms)
    }
}

pub fn settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("byteme").join("settings.toml"))
}

pub fn logs_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("byteme")
        .join("logs")
}
