use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use std::future::Future;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;
use crate::transport::AckMode;

/// Persisted participant configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Name shown to peers in typing indicators.
    pub username: SmolStr,
    /// Quiet period before a pending batch is published.
    pub debounce_ms: u64,
    /// Upper bound on how long a batch may wait under continuous typing.
    /// `0` means trailing-edge only.
    pub max_wait_ms: u64,
    /// Delay before a remote `typing=false` clears the indicator.
    pub typing_grace_ms: u64,
    /// Make the local buffer read-only while a peer is typing.
    pub soft_lock: bool,
    /// Wait for transport acknowledgment on publish.
    pub ack: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            username: SmolStr::new_static("anonymous"),
            debounce_ms: 300,
            max_wait_ms: 2_000,
            typing_grace_ms: 500,
            soft_lock: true,
            ack: true,
        }
    }
}

/// Longest delay any timer setting may ask for.
pub const MAX_DELAY_MS: u64 = 60 * 60 * 1000;

impl Config {
    /// Loads the configuration from the provided loader.
    pub async fn load(loader: &impl Loader) -> Result<Self, ConfigError> {
        loader.load().await?.validate()
    }

    /// Saves the configuration using the provided saver.
    pub async fn save(&self, saver: &impl Saver) -> Result<(), ConfigError> {
        saver.save(self).await
    }

    /// Apply environment overrides on top of this configuration.
    ///
    /// Recognised variables:
    /// - `TANDEM_USERNAME`
    /// - `TANDEM_DEBOUNCE_MS`
    /// - `TANDEM_MAX_WAIT_MS` (`0` or `off` disables the ceiling)
    /// - `TANDEM_TYPING_GRACE_MS`
    /// - `TANDEM_SOFT_LOCK` (`true`/`false`)
    pub fn with_env(self) -> Result<Self, ConfigError> {
        self.with_vars(|var| std::env::var(var).ok())
    }

    fn with_vars(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        if let Some(name) = lookup("TANDEM_USERNAME") {
            self.username = name.into();
        }
        if let Some(value) = lookup("TANDEM_DEBOUNCE_MS") {
            self.debounce_ms = parse_env("TANDEM_DEBOUNCE_MS", value)?;
        }
        if let Some(value) = lookup("TANDEM_MAX_WAIT_MS") {
            self.max_wait_ms = if value.trim() == "off" {
                0
            } else {
                parse_env("TANDEM_MAX_WAIT_MS", value)?
            };
        }
        if let Some(value) = lookup("TANDEM_TYPING_GRACE_MS") {
            self.typing_grace_ms = parse_env("TANDEM_TYPING_GRACE_MS", value)?;
        }
        if let Some(value) = lookup("TANDEM_SOFT_LOCK") {
            self.soft_lock = parse_env("TANDEM_SOFT_LOCK", value)?;
        }
        self.validate()
    }

    /// Reject timer settings beyond [`MAX_DELAY_MS`].
    pub fn validate(self) -> Result<Self, ConfigError> {
        for (field, value) in [
            ("debounce_ms", self.debounce_ms),
            ("max_wait_ms", self.max_wait_ms),
            ("typing_grace_ms", self.typing_grace_ms),
        ] {
            if value > MAX_DELAY_MS {
                return Err(ConfigError::OutOfRange {
                    field,
                    value,
                    max: MAX_DELAY_MS,
                });
            }
        }
        Ok(self)
    }

    /// Engine-facing settings with durations resolved.
    pub fn sync_settings(&self) -> SyncSettings {
        SyncSettings {
            username: self.username.clone(),
            debounce: Duration::from_millis(self.debounce_ms),
            max_wait: (self.max_wait_ms > 0).then(|| Duration::from_millis(self.max_wait_ms)),
            typing_grace: Duration::from_millis(self.typing_grace_ms),
            soft_lock: self.soft_lock,
            ack: if self.ack {
                AckMode::Confirmed
            } else {
                AckMode::FireAndForget
            },
        }
    }
}

fn parse_env<T: std::str::FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnv { var, value })
}

/// Settings consumed by a sync session.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncSettings {
    pub username: SmolStr,
    pub debounce: Duration,
    pub max_wait: Option<Duration>,
    pub typing_grace: Duration,
    pub soft_lock: bool,
    pub ack: AckMode,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Config::default().sync_settings()
    }
}

/// The trait for loading configuration data.
pub trait Loader {
    /// Loads the configuration data.
    fn load(&self) -> impl Future<Output = Result<Config, ConfigError>> + Send;
}

/// The trait for saving configuration data.
pub trait Saver {
    /// Saves the configuration data.
    fn save(&self, config: &Config) -> impl Future<Output = Result<(), ConfigError>> + Send;
}

/// An implementation of [`Loader`] and [`Saver`] that reads and writes a configuration file.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Create a new [`FileStore`] with the given path.
    ///
    /// The format follows the file extension: `.json` or `.toml`.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn format(&self) -> Result<Format, ConfigError> {
        match self.path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Format::Json),
            Some("toml") => Ok(Format::Toml),
            _ => Err(ConfigError::UnsupportedFormat {
                path: self.path.clone(),
            }),
        }
    }

    fn io_error(&self, source: std::io::Error) -> ConfigError {
        ConfigError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

enum Format {
    Json,
    Toml,
}

impl Loader for FileStore {
    async fn load(&self) -> Result<Config, ConfigError> {
        let format = self.format()?;
        let raw = std::fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;
        match format {
            Format::Json => serde_json::from_str(&raw).map_err(|e| ConfigError::Parse {
                message: e.to_string(),
            }),
            Format::Toml => toml::from_str(&raw).map_err(|e| ConfigError::Parse {
                message: e.to_string(),
            }),
        }
    }
}

impl Saver for FileStore {
    async fn save(&self, config: &Config) -> Result<(), ConfigError> {
        let raw = match self.format()? {
            Format::Json => {
                serde_json::to_string_pretty(config).map_err(|e| ConfigError::Parse {
                    message: e.to_string(),
                })?
            }
            Format::Toml => toml::to_string_pretty(config).map_err(|e| ConfigError::Parse {
                message: e.to_string(),
            })?,
        };
        std::fs::write(&self.path, raw).map_err(|e| self.io_error(e))
    }
}
