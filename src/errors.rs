// SPDX-License-Identifier: MPL-2.0

//! Error types for the capture and processing core
//!
//! Errors fall into two groups:
//!
//! - **Rejections** ([`AppError`]): local validation failures returned as `Err`
//!   before any state is touched (invalid mode, missing asset, entitlement
//!   denial, busy pipeline).
//! - **Attempt failures** ([`ProcessingError`]): collaborator failures that end a
//!   processing attempt in `failed`. They are recorded in
//!   [`ProcessingState::error_detail`](crate::pipelines::ProcessingState) rather
//!   than returned.

use crate::pipelines::ProcessingStatus;
use thiserror::Error;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone, Error)]
pub enum AppError {
    /// Capture-related errors
    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),
    /// Recording-related errors
    #[error("Recording error: {0}")]
    Recording(#[from] RecordingError),
    /// The selected filter requires an entitlement the user does not have
    #[error("Filter '{filter_id}' requires a premium subscription")]
    EntitlementDenied { filter_id: String },
    /// No filter with this id exists in the catalog
    #[error("Filter not found: {0}")]
    FilterNotFound(String),
    /// A processing attempt is active or has not been reset yet
    #[error("Processing pipeline is {0}; reset it before starting a new attempt")]
    PipelineBusy(ProcessingStatus),
    /// The attempt was superseded by a reset while it was running
    #[error("Processing attempt was superseded by a reset")]
    Superseded,
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
    /// Subscription backend errors
    #[error("Subscription error: {0}")]
    Subscription(String),
    /// Auth session / credential store errors
    #[error("Session error: {0}")]
    Session(String),
    /// Storage/filesystem errors
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Permission requested from the platform before capturing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Camera,
    Microphone,
    MediaLibrary,
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Permission::Camera => write!(f, "camera"),
            Permission::Microphone => write!(f, "microphone"),
            Permission::MediaLibrary => write!(f, "media library"),
        }
    }
}

/// Capture-specific errors
#[derive(Debug, Clone, Error)]
pub enum CaptureError {
    /// Capture mode is not one of photo/video
    #[error("Invalid capture mode: {0}")]
    InvalidMode(String),
    /// The session has no raw asset to process
    #[error("No captured asset to process")]
    MissingAsset,
    /// The platform refused a permission
    #[error("Permission denied: {0}")]
    PermissionDenied(Permission),
    /// Photo requested while in video mode
    #[error("Photo capture is only available in photo mode")]
    NotPhotoMode,
    /// A captured asset is pending; retake before capturing again
    #[error("A capture is already pending; retake first")]
    AlreadyCaptured,
    /// The camera collaborator failed
    #[error("Camera failure: {0}")]
    Device(String),
}

/// Recording-specific errors
#[derive(Debug, Clone, Error)]
pub enum RecordingError {
    /// Recording already in progress
    #[error("Recording already in progress")]
    AlreadyRecording,
    /// Stop requested with no active recording
    #[error("No recording in progress")]
    NotRecording,
    /// Recording requested outside video mode
    #[error("Recording is only available in video mode")]
    WrongMode,
}

/// Reasons a processing attempt ends in `failed`
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProcessingError {
    /// Local parametric transform failed
    #[error("Filter transform failed: {0}")]
    Transform(String),
    /// Remote AI service reported a failure; the reason is kept verbatim
    #[error("{0}")]
    Remote(String),
    /// The result could not be saved to the media library
    #[error("Failed to save result: {0}")]
    Persistence(String),
    /// Cancellation was requested while processing
    #[error("Processing cancelled")]
    Cancelled,
}

/// Errors reported by local media collaborators
#[derive(Debug, Clone, Error)]
pub enum MediaError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Image error: {0}")]
    Image(String),
    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

/// Failure reported by the remote AI service
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{reason}")]
pub struct RemoteFailure {
    pub reason: String,
}

impl RemoteFailure {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl From<std::io::Error> for MediaError {
    fn from(err: std::io::Error) -> Self {
        MediaError::Io(err.to_string())
    }
}

impl From<image::ImageError> for MediaError {
    fn from(err: image::ImageError) -> Self {
        MediaError::Image(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}
