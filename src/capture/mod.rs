// SPDX-License-Identifier: GPL-3.0-only

//! Capture session management
//!
//! [`CaptureManager`] owns the camera configuration, the current
//! [`CaptureSession`] and the recording sub-state machine. It moves between
//! two phases:
//!
//! - **awaiting capture**: no raw asset yet; photos can be taken or a
//!   recording started
//! - **captured**: a session with a raw asset exists; further captures are
//!   refused until [`CaptureManager::retake`] or a mode switch
//!
//! Recording (video mode only) runs `idle → recording → stopping → captured`.
//! The per-second tick auto-stops the recording when the timer reaches its
//! limit, exactly as if the user had stopped it.

pub mod device;
pub mod recording;

pub use device::{CameraDevice, CameraFacing, FileCamera, FlashMode, PhotoOptions, VideoOptions};
pub use recording::{RecordingState, RecordingTimer, Ticker, TimerStep};

use crate::constants::{ExportQuality, recording as limits};
use crate::errors::{AppResult, CaptureError, RecordingError};
use crate::filters::FilterPreset;
use crate::media::AssetRef;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// What is being captured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureMode {
    #[default]
    Photo,
    Video,
}

impl FromStr for CaptureMode {
    type Err = CaptureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "photo" => Ok(CaptureMode::Photo),
            "video" => Ok(CaptureMode::Video),
            other => Err(CaptureError::InvalidMode(other.to_string())),
        }
    }
}

impl std::fmt::Display for CaptureMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureMode::Photo => write!(f, "photo"),
            CaptureMode::Video => write!(f, "video"),
        }
    }
}

/// One acquisition and its raw result
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureSession {
    pub id: Uuid,
    pub mode: CaptureMode,
    pub raw_asset: Option<AssetRef>,
    pub selected_filter: Option<FilterPreset>,
    pub created_at: DateTime<Utc>,
}

/// Device-facing camera configuration
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CameraSettings {
    pub facing: CameraFacing,
    pub flash: FlashMode,
    pub export_quality: ExportQuality,
}

/// Result of feeding one tick into the manager
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Nothing is recording; the tick was stale
    Idle,
    /// Still recording
    Recording { elapsed_secs: u32 },
    /// The limit was reached and the recording became a captured session
    AutoStopped(CaptureSession),
}

#[derive(Debug)]
enum Phase {
    AwaitingCapture,
    Captured(CaptureSession),
}

/// Owner of the capture session and the recording timer
pub struct CaptureManager {
    camera: Arc<dyn CameraDevice>,
    mode: CaptureMode,
    settings: CameraSettings,
    phase: Phase,
    recording: RecordingState,
    max_recording_secs: u32,
    selected_filter: Option<FilterPreset>,
}

impl CaptureManager {
    pub fn new(camera: Arc<dyn CameraDevice>) -> Self {
        Self {
            camera,
            mode: CaptureMode::default(),
            settings: CameraSettings::default(),
            phase: Phase::AwaitingCapture,
            recording: RecordingState::Idle,
            max_recording_secs: limits::MAX_SECONDS,
            selected_filter: None,
        }
    }

    /// Recording limit in seconds, clamped to `1..=60`
    pub fn with_max_recording_secs(mut self, secs: u32) -> Self {
        self.max_recording_secs = RecordingTimer::new(secs).max_secs();
        self
    }

    pub fn mode(&self) -> CaptureMode {
        self.mode
    }

    pub fn settings(&self) -> CameraSettings {
        self.settings
    }

    /// The captured session, if any
    pub fn session(&self) -> Option<&CaptureSession> {
        match &self.phase {
            Phase::Captured(session) => Some(session),
            Phase::AwaitingCapture => None,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.recording.is_recording()
    }

    pub fn recording_elapsed_secs(&self) -> Option<u32> {
        self.recording.elapsed_secs()
    }

    pub fn max_recording_secs(&self) -> u32 {
        self.max_recording_secs
    }

    /// Filter attached to the next captured session
    pub fn select_filter(&mut self, filter: Option<FilterPreset>) {
        self.selected_filter = filter;
    }

    pub fn selected_filter(&self) -> Option<&FilterPreset> {
        self.selected_filter.as_ref()
    }

    pub fn toggle_facing(&mut self) -> CameraFacing {
        self.settings.facing = self.settings.facing.toggle();
        self.settings.facing
    }

    pub fn toggle_flash(&mut self) -> FlashMode {
        self.settings.flash = self.settings.flash.toggle();
        self.settings.flash
    }

    pub fn set_export_quality(&mut self, quality: ExportQuality) {
        self.settings.export_quality = quality;
    }

    /// Switch mode and discard any session or recording
    pub async fn start_capture(&mut self, mode: CaptureMode) {
        self.abandon_recording().await;
        self.phase = Phase::AwaitingCapture;
        self.mode = mode;
        info!(mode = %mode, "Capture started");
    }

    /// Parse `mode` and switch to it; an unknown mode changes nothing
    pub async fn start_capture_str(&mut self, mode: &str) -> AppResult<CaptureMode> {
        let mode = mode.parse::<CaptureMode>()?;
        self.start_capture(mode).await;
        Ok(mode)
    }

    /// Record the raw asset of the current capture
    ///
    /// Calling it again before a reset returns the existing session unchanged.
    pub fn complete_capture(&mut self, raw_asset: AssetRef) -> CaptureSession {
        if let Phase::Captured(session) = &self.phase {
            if session.raw_asset.as_ref() != Some(&raw_asset) {
                debug!(asset = %raw_asset, "Ignoring second capture; session already captured");
            }
            return session.clone();
        }

        let session = CaptureSession {
            id: Uuid::new_v4(),
            mode: self.mode,
            raw_asset: Some(raw_asset),
            selected_filter: self.selected_filter.clone(),
            created_at: Utc::now(),
        };
        info!(session = %session.id, mode = %session.mode, "Capture completed");
        self.phase = Phase::Captured(session.clone());
        session
    }

    /// Discard the session and any recording; always succeeds
    pub async fn retake(&mut self) {
        self.abandon_recording().await;
        self.phase = Phase::AwaitingCapture;
        debug!("Retake: awaiting capture");
    }

    /// Take a photo and complete the capture with it
    pub async fn capture_photo(&mut self) -> AppResult<CaptureSession> {
        if self.mode != CaptureMode::Photo {
            return Err(CaptureError::NotPhotoMode.into());
        }
        if self.session().is_some() {
            return Err(CaptureError::AlreadyCaptured.into());
        }
        self.ensure_permissions().await?;

        let options = PhotoOptions {
            quality: self.settings.export_quality.capture_quality(),
            flash: self.settings.flash,
            facing: self.settings.facing,
        };
        let asset = self.camera.capture_photo(&options).await?;
        Ok(self.complete_capture(asset))
    }

    /// Start recording; the receiver yields one signal per second
    ///
    /// Each signal must be fed back through [`CaptureManager::tick`]. The
    /// camera is only stopped at the limit from inside `tick`, so a caller
    /// that stops draining the receiver must call
    /// [`CaptureManager::stop_recording`] itself. The channel closes when the
    /// recording ends.
    pub async fn start_recording(&mut self) -> AppResult<mpsc::UnboundedReceiver<()>> {
        if self.mode != CaptureMode::Video {
            return Err(RecordingError::WrongMode.into());
        }
        if !matches!(self.recording, RecordingState::Idle) {
            return Err(RecordingError::AlreadyRecording.into());
        }
        if self.session().is_some() {
            return Err(CaptureError::AlreadyCaptured.into());
        }
        self.ensure_permissions().await?;

        let options = VideoOptions {
            max_duration_secs: self.max_recording_secs,
            max_file_size: limits::MAX_FILE_SIZE_BYTES,
            resolution: self.settings.export_quality.video_resolution(),
            facing: self.settings.facing,
        };
        self.camera.start_video(&options).await?;

        let (ticker, ticks) = Ticker::spawn(limits::TICK_INTERVAL);
        self.recording = RecordingState::start(RecordingTimer::new(self.max_recording_secs), ticker);
        info!(max_secs = self.max_recording_secs, "Recording started");
        Ok(ticks)
    }

    /// Advance the recording timer by one second
    pub async fn tick(&mut self) -> AppResult<TickOutcome> {
        let step = match &mut self.recording {
            RecordingState::Recording { timer, .. } => timer.advance(),
            _ => return Ok(TickOutcome::Idle),
        };

        match step {
            TimerStep::Running(elapsed_secs) => Ok(TickOutcome::Recording { elapsed_secs }),
            TimerStep::LimitReached => {
                info!(max_secs = self.max_recording_secs, "Recording limit reached, stopping");
                let session = self.finish_recording().await?;
                Ok(TickOutcome::AutoStopped(session))
            }
        }
    }

    /// Stop the recording before the limit and complete the capture
    pub async fn stop_recording(&mut self) -> AppResult<CaptureSession> {
        if !self.recording.is_recording() {
            return Err(RecordingError::NotRecording.into());
        }
        self.finish_recording().await
    }

    async fn finish_recording(&mut self) -> AppResult<CaptureSession> {
        let timer = self.recording.begin_stop();
        let result = self.camera.stop_video().await;
        self.recording.stop();

        let asset = result?;
        if let Some(timer) = timer {
            info!(elapsed_secs = timer.elapsed_secs(), "Recording stopped");
        }
        Ok(self.complete_capture(asset))
    }

    async fn abandon_recording(&mut self) {
        if self.recording.begin_stop().is_some() {
            if let Err(err) = self.camera.stop_video().await {
                warn!(error = %err, "Failed to stop abandoned recording");
            }
            self.recording.stop();
            debug!("Recording abandoned");
        }
    }

    async fn ensure_permissions(&self) -> Result<(), CaptureError> {
        self.camera
            .request_permissions(self.mode)
            .await
            .map_err(|permission| {
                warn!(%permission, "Permission denied");
                CaptureError::PermissionDenied(permission)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_mode_is_rejected() {
        assert!(matches!(
            "panorama".parse::<CaptureMode>(),
            Err(CaptureError::InvalidMode(mode)) if mode == "panorama"
        ));
        assert_eq!("video".parse::<CaptureMode>().unwrap(), CaptureMode::Video);
    }

    #[test]
    fn complete_capture_is_idempotent() {
        let camera = Arc::new(FileCamera::new("/tmp/none.jpg", "/tmp"));
        let mut manager = CaptureManager::new(camera);

        let first = manager.complete_capture(AssetRef::new("/tmp/a.jpg"));
        let second = manager.complete_capture(AssetRef::new("/tmp/a.jpg"));
        assert_eq!(first, second);

        let third = manager.complete_capture(AssetRef::new("/tmp/b.jpg"));
        assert_eq!(first, third);
    }

    #[tokio::test]
    async fn retake_clears_the_session() {
        let camera = Arc::new(FileCamera::new("/tmp/none.jpg", "/tmp"));
        let mut manager = CaptureManager::new(camera);
        let first = manager.complete_capture(AssetRef::new("/tmp/a.jpg"));

        manager.retake().await;
        assert!(manager.session().is_none());

        let second = manager.complete_capture(AssetRef::new("/tmp/a.jpg"));
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn recording_requires_video_mode() {
        let camera = Arc::new(FileCamera::new("/tmp/none.mp4", "/tmp"));
        let mut manager = CaptureManager::new(camera);
        assert!(matches!(
            manager.start_recording().await,
            Err(crate::errors::AppError::Recording(RecordingError::WrongMode))
        ));
    }

    #[test]
    fn session_serializes_with_camel_case_fields() {
        let camera = Arc::new(FileCamera::new("/tmp/none.jpg", "/tmp"));
        let mut manager = CaptureManager::new(camera);
        let session = manager.complete_capture(AssetRef::new("/tmp/a.jpg"));

        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["id"], session.id.to_string());
        assert!(json.get("rawAsset").is_some());
        assert!(json.get("createdAt").is_some());
    }
}
