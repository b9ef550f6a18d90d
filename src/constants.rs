// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Export quality presets
///
/// Premium subscriptions unlock full-quality export; everyone else gets the
/// compressed standard preset. Variants are ordered from lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum ExportQuality {
    /// Compressed export (default)
    #[default]
    Standard,
    /// Full-quality export
    High,
}

impl ExportQuality {
    /// Get all preset variants for iteration
    pub const ALL: [ExportQuality; 2] = [ExportQuality::Standard, ExportQuality::High];

    /// Get display name for the preset
    pub fn display_name(&self) -> &'static str {
        match self {
            ExportQuality::Standard => "Standard",
            ExportQuality::High => "High",
        }
    }

    /// Capture quality handed to the camera (0.0 - 1.0)
    pub fn capture_quality(&self) -> f32 {
        match self {
            ExportQuality::Standard => 0.8,
            ExportQuality::High => 1.0,
        }
    }

    /// JPEG quality used when writing processed photos (1-100)
    pub fn jpeg_quality(&self) -> u8 {
        match self {
            ExportQuality::Standard => 80,
            ExportQuality::High => 100,
        }
    }

    /// Video resolution requested from the camera
    pub fn video_resolution(&self) -> VideoResolution {
        match self {
            ExportQuality::Standard => VideoResolution::P720,
            ExportQuality::High => VideoResolution::P2160,
        }
    }
}

/// Video capture resolutions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VideoResolution {
    P720,
    P2160,
}

impl VideoResolution {
    pub fn label(&self) -> &'static str {
        match self {
            VideoResolution::P720 => "720p",
            VideoResolution::P2160 => "2160p",
        }
    }
}

/// Recording limits
pub mod recording {
    use super::Duration;

    /// Hard upper bound on a single recording, in seconds
    pub const MAX_SECONDS: u32 = 60;

    /// Period of the recording-duration tick
    pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

    /// Maximum size of a single recording
    pub const MAX_FILE_SIZE_BYTES: u64 = 100 * 1024 * 1024;
}

/// Progress values published by the processing pipeline
///
/// The local transform has no natural progress signal, so progress moves in
/// fixed jumps between pipeline steps.
pub mod progress {
    pub const STARTED: u8 = 0;
    /// Upload payload prepared and dispatched to the AI service
    pub const UPLOAD_PREPARED: u8 = 20;
    /// Filter step finished (local transform or AI response)
    pub const FILTERED: u8 = 50;
    /// Watermark step finished (or skipped)
    pub const WATERMARKED: u8 = 80;
    pub const COMPLETED: u8 = 100;
}

/// Upload encoding for the remote AI service
pub mod upload {
    /// Photos are downscaled to this width before upload
    pub const DEFAULT_WIDTH: u32 = 1080;
    /// JPEG quality of the upload payload
    pub const JPEG_QUALITY: u8 = 80;
    /// Client-side timeout of the AI request
    pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
    /// Longest accepted AI request timeout
    pub const MAX_TIMEOUT_SECS: u64 = 600;
}

/// Watermark overlay defaults
pub mod watermark {
    pub const DEFAULT_OPACITY: f32 = 0.7;
    /// Badge width relative to the image width
    pub const DEFAULT_SCALE: f32 = 0.3;
    /// Accepted range of the relative badge width
    pub const MIN_SCALE: f32 = 0.05;
    pub const MAX_SCALE: f32 = 1.0;
    /// Distance from the bottom-right corner in pixels
    pub const DEFAULT_MARGIN: u32 = 20;
}

/// Session refresh policy
pub mod session {
    /// Refresh the auth token this long before it expires
    pub const REFRESH_MARGIN_SECS: i64 = 60;
}

/// Number of entries kept in the recently-used filter list
pub const RECENT_FILTERS_LIMIT: usize = 5;

/// Supported file extensions for the file-backed camera
pub mod file_formats {
    /// Supported image file extensions
    pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp"];

    /// Supported video file extensions
    pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "webm", "avi", "mov"];

    pub fn is_image_extension(ext: &str) -> bool {
        IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
    }

    pub fn is_video_extension(ext: &str) -> bool {
        VIDEO_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
    }
}

/// Application information utilities
pub mod app_info {
    /// Get the application version from build-time environment
    pub fn version() -> &'static str {
        env!("FILTERCAM_BUILD_VERSION")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_jumps_are_monotonic() {
        let steps = [
            progress::STARTED,
            progress::UPLOAD_PREPARED,
            progress::FILTERED,
            progress::WATERMARKED,
            progress::COMPLETED,
        ];
        assert!(steps.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn extension_checks_ignore_case() {
        assert!(file_formats::is_image_extension("JPG"));
        assert!(file_formats::is_video_extension("mov"));
        assert!(!file_formats::is_image_extension("mp4"));
    }
}
