//! Application configuration

use crate::utils::error::{Result, TubefetchError};
use crate::utils::logging::LogLevel;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Directory where finished files land
    pub output_dir: PathBuf,

    /// Log verbosity
    pub log_level: LogLevel,

    /// User agent sent with every request
    pub user_agent: String,

    /// Connect timeout in seconds
    pub connect_timeout_secs: u64,

    /// Explicit ffmpeg binary, looked up on PATH when absent
    pub ffmpeg_path: Option<PathBuf>,

    /// Where split downloads keep their intermediate streams, the system
    /// temp directory when absent
    pub temp_dir: Option<PathBuf>,

    /// Append the `eurl` parameter to stream info requests so embedding
    /// restrictions do not apply
    pub embed_bypass: bool,

    /// Minimum delay between two progress notifications (milliseconds)
    pub progress_interval_ms: u64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            log_level: LogLevel::Info,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string(),
            connect_timeout_secs: 30,
            ffmpeg_path: None,
            temp_dir: None,
            embed_bypass: true,
            progress_interval_ms: 500,
        }
    }
}

impl AppSettings {
    /// Default location: `<config dir>/tubefetch/settings.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tubefetch").join("settings.json"))
    }

    /// Read settings from a JSON file. Missing keys fall back to defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let settings: AppSettings = serde_json::from_str(&raw)
            .map_err(|e| TubefetchError::Config(format!("{}: {}", path.display(), e)))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load from `path` when given, else from the default location if it
    /// exists, else defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.user_agent.trim().is_empty() {
            return Err(TubefetchError::Config("user_agent must not be empty".into()));
        }
        if self.connect_timeout_secs == 0 {
            return Err(TubefetchError::Config(
                "connect_timeout_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }
}
