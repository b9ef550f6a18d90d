// SPDX-License-Identifier: GPL-3.0-only

//! User configuration
//!
//! Stored as TOML at `<config_dir>/filtercam/config.toml`. Every field is
//! optional in the file; missing fields take their defaults.
//!
//! ```toml
//! output_dir = "/home/me/Pictures/FilterCam"
//! ai_endpoint = "https://ai.example.com"
//! ai_timeout_secs = 120
//! max_recording_secs = 60
//! export_quality = "High"
//!
//! [watermark]
//! opacity = 0.7
//! scale = 0.3
//! margin = 20
//! ```

use crate::constants::{ExportQuality, recording, upload, watermark};
use crate::errors::{AppError, AppResult};
use crate::media::WatermarkSettings;
use crate::storage::{default_output_dir, default_work_dir};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

const CONFIG_DIR: &str = "filtercam";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Media library root
    pub output_dir: PathBuf,
    /// Captured and intermediate assets
    pub work_dir: PathBuf,
    /// AI image/video service base URL; AI filters fail without it
    pub ai_endpoint: Option<String>,
    /// Subscription backend base URL
    pub api_url: Option<String>,
    /// Client-side timeout of the AI request, clamped to 1..=600
    pub ai_timeout_secs: u64,
    /// Recording limit, clamped to 1..=60
    pub max_recording_secs: u32,
    /// Upper bound on output quality; the entitlement may lower it further
    pub export_quality: ExportQuality,
    /// Photos wider than this are downscaled before upload
    pub upload_width: u32,
    pub watermark: WatermarkSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            work_dir: default_work_dir(),
            ai_endpoint: None,
            api_url: None,
            ai_timeout_secs: upload::DEFAULT_TIMEOUT_SECS,
            max_recording_secs: recording::MAX_SECONDS,
            export_quality: ExportQuality::High,
            upload_width: upload::DEFAULT_WIDTH,
            watermark: WatermarkSettings::default(),
        }
    }
}

impl Config {
    /// Default config file location
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Load from the default location; defaults when there is none
    pub fn load() -> AppResult<Self> {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load from `path`; a missing file yields defaults
    pub fn load_from(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;
        debug!(path = %path.display(), "Config loaded");
        Ok(config.normalized())
    }

    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| AppError::Config(format!("cannot serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn normalized(mut self) -> Self {
        self.max_recording_secs = self.max_recording_secs.clamp(1, recording::MAX_SECONDS);
        self.ai_timeout_secs = self.ai_timeout_secs.clamp(1, upload::MAX_TIMEOUT_SECS);
        self.upload_width = self.upload_width.max(1);
        self.watermark.opacity = self.watermark.opacity.clamp(0.0, 1.0);
        self.watermark.scale = self
            .watermark
            .scale
            .clamp(watermark::MIN_SCALE, watermark::MAX_SCALE);
        self
    }
}
