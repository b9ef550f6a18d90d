// SPDX-License-Identifier: MPL-2.0

//! Integration tests for constants module

use filtercam::constants::{ExportQuality, VideoResolution, recording};

#[test]
fn test_export_quality_values() {
    // Test that all presets exist (Standard, High)
    assert_eq!(ExportQuality::ALL.len(), 2);
    assert_eq!(ExportQuality::default(), ExportQuality::Standard);
}

#[test]
fn test_export_quality_ordering() {
    // Test that presets are ordered from lowest to highest quality
    let mut prev_quality = 0u8;
    for preset in ExportQuality::ALL {
        let quality = preset.jpeg_quality();
        assert!(
            quality > prev_quality,
            "Presets should be ordered from lowest to highest"
        );
        prev_quality = quality;
    }
}

#[test]
fn test_high_quality_capture_settings() {
    assert_eq!(ExportQuality::Standard.capture_quality(), 0.8);
    assert_eq!(ExportQuality::High.capture_quality(), 1.0);
    assert_eq!(ExportQuality::Standard.video_resolution(), VideoResolution::P720);
    assert_eq!(ExportQuality::High.video_resolution().label(), "2160p");
}

#[test]
fn test_export_quality_display_names() {
    // Test that all presets have non-empty display names
    for preset in ExportQuality::ALL {
        let name = preset.display_name();
        assert!(
            !name.is_empty(),
            "Preset {:?} has empty display name",
            preset
        );
    }
}

#[test]
fn test_recording_limits() {
    assert_eq!(recording::MAX_SECONDS, 60);
    assert_eq!(recording::TICK_INTERVAL.as_secs(), 1);
    assert_eq!(recording::MAX_FILE_SIZE_BYTES, 100 * 1024 * 1024);
}
