// SPDX-License-Identifier: MPL-2.0

//! Integration tests for configuration module

use filtercam::constants::ExportQuality;
use filtercam::{AppError, Config};

#[test]
fn test_config_default() {
    // Test that default config can be created
    let config = Config::default();

    // Check sensible defaults
    assert_eq!(config.max_recording_secs, 60);
    assert_eq!(config.ai_timeout_secs, 120);
    assert_eq!(config.upload_width, 1080);
    assert!(config.ai_endpoint.is_none(), "AI service is opt-in");
    assert!(config.output_dir.ends_with("FilterCam"));
    assert_eq!(config.export_quality, ExportQuality::High, "entitlement decides");
}

#[test]
fn test_missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_partial_file_overrides_only_given_fields() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
ai_endpoint = "https://ai.example.com"
export_quality = "High"

[watermark]
opacity = 0.5
"#,
    )
    .unwrap();

    let config = Config::load_from(&path).unwrap();
    assert_eq!(config.ai_endpoint.as_deref(), Some("https://ai.example.com"));
    assert_eq!(config.export_quality, ExportQuality::High);
    assert_eq!(config.watermark.opacity, 0.5);
    assert_eq!(config.watermark.margin, 20);
    assert_eq!(config.max_recording_secs, 60);
}

#[test]
fn test_recording_limit_is_clamped() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "max_recording_secs = 600\n").unwrap();

    let config = Config::load_from(&path).unwrap();
    assert_eq!(config.max_recording_secs, 60);
}

#[test]
fn test_timeout_and_watermark_scale_are_clamped() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        "ai_timeout_secs = 0\n\n[watermark]\nscale = 4.0\n",
    )
    .unwrap();

    let config = Config::load_from(&path).unwrap();
    assert_eq!(config.ai_timeout_secs, 1);
    assert_eq!(config.watermark.scale, 1.0);

    std::fs::write(&path, "ai_timeout_secs = 86400\n\n[watermark]\nscale = 0.0\n").unwrap();
    let config = Config::load_from(&path).unwrap();
    assert_eq!(config.ai_timeout_secs, 600);
    assert_eq!(config.watermark.scale, 0.05);
}

#[test]
fn test_malformed_file_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "max_recording_secs = \"soon\"\n").unwrap();

    assert!(matches!(Config::load_from(&path), Err(AppError::Config(_))));
}

#[test]
fn test_save_then_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");
    let config = Config {
        api_url: Some("https://api.example.com".to_string()),
        max_recording_secs: 30,
        ..Config::default()
    };

    config.save_to(&path).unwrap();
    assert_eq!(Config::load_from(&path).unwrap(), config);
}
