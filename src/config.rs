//! Settings loaded from `gesture-pacman.toml`, every key optional.
//!
//! `PACMAN_TICK_MS` and `PACMAN_FPS` override the timing section when set to
//! a positive integer.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::Result;

pub const DEFAULT_CONFIG_FILE: &str = "gesture-pacman.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub timing: TimingConfig,
    pub game: GameSettings,
    pub log: LogConfig,
}

/// Where the gesture recognizer lives.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub base_url: String,
    pub video_url: String,
    pub no_video_url: String,
    pub csrf_token: Option<String>,
    pub request_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            video_url: "http://127.0.0.1:5000/video_feed".to_string(),
            no_video_url: "http://127.0.0.1:5000/video_off".to_string(),
            csrf_token: None,
            request_timeout_ms: 2000,
        }
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub player_tick_ms: u64,
    pub scared_ms: u64,
    pub render_fps: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            player_tick_ms: 500,
            scared_ms: 10_000,
            render_fps: 60,
        }
    }
}

impl TimingConfig {
    pub fn player_tick(&self) -> Duration {
        Duration::from_millis(self.player_tick_ms.max(1))
    }

    pub fn scared(&self) -> Duration {
        Duration::from_millis(self.scared_ms)
    }

    pub fn frame_time(&self) -> Duration {
        Duration::from_micros(1_000_000 / self.render_fps.max(1))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    pub seed: Option<u64>,
    /// ASCII maze replacing the classic one.
    pub maze_file: Option<PathBuf>,
    /// Drive the player from the keyboard instead of the recognizer.
    pub offline: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub file: PathBuf,
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("gesture-pacman.log"),
            filter: "info".to_string(),
        }
    }
}

impl Config {
    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Reads `path`, or the default file in the working directory when no
    /// path is given. A missing default file yields the defaults; a missing
    /// explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::parse(&std::fs::read_to_string(path)?)?,
            None => match std::fs::read_to_string(DEFAULT_CONFIG_FILE) {
                Ok(text) => Self::parse(&text)?,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
                Err(e) => return Err(e.into()),
            },
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        let positive = |key: &str| {
            var(key)
                .and_then(|v| v.parse::<u64>().ok())
                .filter(|v| *v > 0)
        };
        if let Some(ms) = positive("PACMAN_TICK_MS") {
            self.timing.player_tick_ms = ms;
        }
        if let Some(fps) = positive("PACMAN_FPS") {
            self.timing.render_fps = fps;
        }
    }
}
