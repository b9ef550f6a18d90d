// SPDX-License-Identifier: GPL-3.0-only

//! Camera collaborator and device configuration
//!
//! [`CameraDevice`] is the seam to the platform camera. The headless build
//! ships [`FileCamera`], which stands in for a sensor by copying a source file
//! into the work directory on every capture.

use super::CaptureMode;
use crate::constants::{VideoResolution, file_formats};
use crate::errors::{CaptureError, Permission};
use crate::media::AssetRef;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

/// Which camera faces the subject
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CameraFacing {
    #[default]
    Back,
    Front,
}

impl CameraFacing {
    pub fn toggle(self) -> Self {
        match self {
            CameraFacing::Back => CameraFacing::Front,
            CameraFacing::Front => CameraFacing::Back,
        }
    }
}

/// Flash operating mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FlashMode {
    /// Flash LED is off
    #[default]
    Off,
    /// Flash fires during photo capture
    On,
}

impl FlashMode {
    pub fn toggle(self) -> Self {
        match self {
            FlashMode::Off => FlashMode::On,
            FlashMode::On => FlashMode::Off,
        }
    }
}

/// Options for a single photo
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhotoOptions {
    /// Encoder quality (0.0 - 1.0)
    pub quality: f32,
    pub flash: FlashMode,
    pub facing: CameraFacing,
}

/// Options for a video recording
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoOptions {
    pub max_duration_secs: u32,
    pub max_file_size: u64,
    pub resolution: VideoResolution,
    pub facing: CameraFacing,
}

/// Device camera/microphone capture API
#[async_trait]
pub trait CameraDevice: Send + Sync {
    /// Ask for everything `mode` needs; the first refused permission is returned
    async fn request_permissions(&self, mode: CaptureMode) -> Result<(), Permission>;

    async fn capture_photo(&self, options: &PhotoOptions) -> Result<AssetRef, CaptureError>;

    async fn start_video(&self, options: &VideoOptions) -> Result<(), CaptureError>;

    async fn stop_video(&self) -> Result<AssetRef, CaptureError>;
}

/// Camera backed by an image or video file
///
/// Photos require an image source and videos a video source.
#[derive(Debug)]
pub struct FileCamera {
    source: PathBuf,
    work_dir: PathBuf,
    recording: Mutex<bool>,
}

impl FileCamera {
    pub fn new(source: impl Into<PathBuf>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            work_dir: work_dir.into(),
            recording: Mutex::new(false),
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    fn source_extension(&self) -> String {
        AssetRef::new(&self.source).extension()
    }

    fn set_recording(&self, value: bool) -> bool {
        let mut recording = self
            .recording
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        std::mem::replace(&mut *recording, value)
    }

    async fn copy_source(&self, prefix: &str) -> Result<AssetRef, CaptureError> {
        tokio::fs::create_dir_all(&self.work_dir)
            .await
            .map_err(|e| CaptureError::Device(format!("cannot create work directory: {}", e)))?;

        let target = self.work_dir.join(format!(
            "{}_{}.{}",
            prefix,
            Uuid::new_v4().simple(),
            self.source_extension()
        ));
        tokio::fs::copy(&self.source, &target).await.map_err(|e| {
            CaptureError::Device(format!("cannot read {}: {}", self.source.display(), e))
        })?;

        debug!(source = %self.source.display(), target = %target.display(), "File camera captured");
        Ok(AssetRef::new(target))
    }
}

#[async_trait]
impl CameraDevice for FileCamera {
    async fn request_permissions(&self, _mode: CaptureMode) -> Result<(), Permission> {
        // Reading the source file is the only access a file camera needs
        if tokio::fs::metadata(&self.source).await.is_ok() {
            Ok(())
        } else {
            Err(Permission::Camera)
        }
    }

    async fn capture_photo(&self, options: &PhotoOptions) -> Result<AssetRef, CaptureError> {
        if !file_formats::is_image_extension(&self.source_extension()) {
            return Err(CaptureError::Device(format!(
                "{} is not an image",
                self.source.display()
            )));
        }
        info!(quality = options.quality, flash = ?options.flash, facing = ?options.facing, "Capturing photo");
        self.copy_source("capture").await
    }

    async fn start_video(&self, options: &VideoOptions) -> Result<(), CaptureError> {
        if !file_formats::is_video_extension(&self.source_extension()) {
            return Err(CaptureError::Device(format!(
                "{} is not a video",
                self.source.display()
            )));
        }
        if self.set_recording(true) {
            return Err(CaptureError::Device("camera is already recording".to_string()));
        }
        info!(
            resolution = options.resolution.label(),
            max_secs = options.max_duration_secs,
            "Video recording started"
        );
        Ok(())
    }

    async fn stop_video(&self) -> Result<AssetRef, CaptureError> {
        if !self.set_recording(false) {
            return Err(CaptureError::Device("camera is not recording".to_string()));
        }
        info!("Video recording stopped");
        self.copy_source("recording").await
    }
}
