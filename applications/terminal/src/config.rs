/// Application configuration
use crate::error::{AppError, Result};
use cadenza_core::PlayerOptions;
use cadenza_playback::SyncConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File read when no `--config` path is given (optional)
pub const DEFAULT_CONFIG_FILE: &str = "cadenza.toml";

/// Prefix of environment overrides, e.g. `CADENZA_SESSION__SEEK_TIMEOUT_MS`
pub const ENV_PREFIX: &str = "CADENZA";

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub carousel: CarouselSettings,

    #[serde(default)]
    pub session: SessionSettings,

    #[serde(default)]
    pub player: PlayerOptions,

    #[serde(default)]
    pub simulator: SimulatorSettings,

    #[serde(default)]
    pub catalog: CatalogSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CarouselSettings {
    #[serde(default = "default_page_width")]
    pub page_width: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SessionSettings {
    #[serde(default = "default_command_timeout_ms")]
    pub command_timeout_ms: u64,

    #[serde(default = "default_seek_timeout_ms")]
    pub seek_timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SimulatorSettings {
    /// Length of every simulated track
    #[serde(default = "default_track_seconds")]
    pub track_seconds: f64,

    /// Interval between progress events
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct CatalogSettings {
    /// TOML catalog replacing the built-in one
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl AppConfig {
    /// Load configuration from a file and the environment
    ///
    /// An explicit path must exist. Without one, `cadenza.toml` in the
    /// working directory is read if present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(AppError::Config(format!(
                        "config file not found: {}",
                        path.display()
                    )));
                }
                settings = settings.add_source(config::File::from(path));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        // Double underscore separates sections so keys may contain `_`
        settings = settings.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = settings.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !(self.carousel.page_width.is_finite() && self.carousel.page_width > 0.0) {
            return Err(AppError::Config(format!(
                "carousel.page_width must be positive, got {}",
                self.carousel.page_width
            )));
        }

        if self.session.command_timeout_ms == 0 || self.session.seek_timeout_ms == 0 {
            return Err(AppError::Config(
                "session timeouts must be greater than zero".to_string(),
            ));
        }

        if !(self.simulator.track_seconds.is_finite() && self.simulator.track_seconds > 0.0) {
            return Err(AppError::Config(format!(
                "simulator.track_seconds must be positive, got {}",
                self.simulator.track_seconds
            )));
        }

        if self.simulator.tick_ms == 0 {
            return Err(AppError::Config(
                "simulator.tick_ms must be greater than zero".to_string(),
            ));
        }

        let buffers = [
            self.player.min_buffer,
            self.player.max_buffer,
            self.player.play_buffer,
        ];
        if buffers.iter().any(|b| !b.is_finite() || *b < 0.0) {
            return Err(AppError::Config(
                "player buffer sizes must be non-negative".to_string(),
            ));
        }
        if self.player.min_buffer > self.player.max_buffer {
            return Err(AppError::Config(format!(
                "player.min_buffer ({}) exceeds player.max_buffer ({})",
                self.player.min_buffer, self.player.max_buffer
            )));
        }

        Ok(())
    }

    /// Session settings for the playback library
    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            page_width: self.carousel.page_width,
            command_timeout_ms: self.session.command_timeout_ms,
            seek_timeout_ms: self.session.seek_timeout_ms,
            player: self.player.clone(),
        }
    }
}

impl SimulatorSettings {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

// Default values
fn default_page_width() -> f64 {
    1.0
}

fn default_command_timeout_ms() -> u64 {
    5000
}

fn default_seek_timeout_ms() -> u64 {
    2000
}

fn default_track_seconds() -> f64 {
    30.0
}

fn default_tick_ms() -> u64 {
    1000
}

impl Default for CarouselSettings {
    fn default() -> Self {
        Self {
            page_width: default_page_width(),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            command_timeout_ms: default_command_timeout_ms(),
            seek_timeout_ms: default_seek_timeout_ms(),
        }
    }
}

impl Default for SimulatorSettings {
    fn default() -> Self {
        Self {
            track_seconds: default_track_seconds(),
            tick_ms: default_tick_ms(),
        }
    }
}
