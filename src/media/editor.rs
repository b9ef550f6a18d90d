// SPDX-License-Identifier: GPL-3.0-only

//! On-device image transforms
//!
//! [`LocalMediaEditor`] implements [`MediaEditor`] on top of the `image` crate.
//! Every decode/encode runs in a blocking task so the async caller is never
//! stalled by pixel work. Results are written as new files in the work
//! directory; sources are never modified.

use super::AssetRef;
use super::adjust::apply_adjustments;
use crate::capture::CaptureMode;
use crate::config::Config;
use crate::constants::{ExportQuality, upload, watermark};
use crate::errors::MediaError;
use crate::filters::Adjustment;
use crate::pipelines::MediaEditor;
use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage, RgbImage};
use serde::{Deserialize, Serialize};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

/// Watermark overlay settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatermarkSettings {
    /// Mark image (PNG with alpha); a plain badge is drawn when unset
    pub image: Option<PathBuf>,
    /// Opacity multiplier applied to the mark (0.0 - 1.0)
    pub opacity: f32,
    /// Mark width relative to the photo width
    pub scale: f32,
    /// Distance from the bottom-right corner in pixels
    pub margin: u32,
}

impl Default for WatermarkSettings {
    fn default() -> Self {
        Self {
            image: None,
            opacity: watermark::DEFAULT_OPACITY,
            scale: watermark::DEFAULT_SCALE,
            margin: watermark::DEFAULT_MARGIN,
        }
    }
}

/// Media editor writing JPEG results into a work directory
///
/// Output quality is the lower of the configured ceiling and the quality the
/// caller's entitlement allows.
#[derive(Debug, Clone)]
pub struct LocalMediaEditor {
    work_dir: PathBuf,
    max_quality: ExportQuality,
    upload_width: u32,
    watermark: WatermarkSettings,
}

impl LocalMediaEditor {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
            max_quality: ExportQuality::High,
            upload_width: upload::DEFAULT_WIDTH,
            watermark: WatermarkSettings::default(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            work_dir: config.work_dir.clone(),
            max_quality: config.export_quality,
            upload_width: config.upload_width,
            watermark: config.watermark.clone(),
        }
    }

    pub fn with_max_quality(mut self, quality: ExportQuality) -> Self {
        self.max_quality = quality;
        self
    }

    /// Quality actually written for a request allowed up to `allowed`
    pub fn effective_quality(&self, allowed: ExportQuality) -> ExportQuality {
        allowed.min(self.max_quality)
    }

    pub fn with_upload_width(mut self, width: u32) -> Self {
        self.upload_width = width.max(1);
        self
    }

    pub fn with_watermark(mut self, settings: WatermarkSettings) -> Self {
        self.watermark = settings;
        self
    }

    fn output_path(&self, prefix: &str, extension: &str) -> PathBuf {
        self.work_dir
            .join(format!("{}_{}.{}", prefix, Uuid::new_v4().simple(), extension))
    }
}

#[async_trait]
impl MediaEditor for LocalMediaEditor {
    async fn apply_adjustments(
        &self,
        source: &AssetRef,
        adjustments: &[Adjustment],
        quality: ExportQuality,
    ) -> Result<AssetRef, MediaError> {
        if source.is_video() {
            return Err(MediaError::Unsupported(
                "parametric adjustments on video".to_string(),
            ));
        }

        let source_path = source.path().to_path_buf();
        let output = self.output_path("filtered", "jpg");
        let work_dir = self.work_dir.clone();
        let quality = self.effective_quality(quality).jpeg_quality();
        let adjustments = adjustments.to_vec();

        debug!(source = %source, steps = adjustments.len(), quality, "Applying adjustments");

        let written = tokio::task::spawn_blocking(move || -> Result<PathBuf, MediaError> {
            std::fs::create_dir_all(&work_dir)?;
            let mut image = image::open(&source_path)?.to_rgb8();
            apply_adjustments(&mut image, &adjustments);
            write_jpeg(&image, &output, quality)?;
            Ok(output)
        })
        .await
        .map_err(|e| MediaError::Io(format!("adjustment task failed: {}", e)))??;

        Ok(AssetRef::new(written))
    }

    async fn watermark(
        &self,
        source: &AssetRef,
        quality: ExportQuality,
    ) -> Result<AssetRef, MediaError> {
        if source.is_video() {
            return Err(MediaError::Unsupported("watermarking video".to_string()));
        }

        let source_path = source.path().to_path_buf();
        let output = self.output_path("watermarked", "jpg");
        let work_dir = self.work_dir.clone();
        let quality = self.effective_quality(quality).jpeg_quality();
        let settings = self.watermark.clone();

        let written = tokio::task::spawn_blocking(move || -> Result<PathBuf, MediaError> {
            std::fs::create_dir_all(&work_dir)?;
            let mut base = image::open(&source_path)?.to_rgba8();
            overlay_mark(&mut base, &settings)?;
            let flattened = image::DynamicImage::ImageRgba8(base).to_rgb8();
            write_jpeg(&flattened, &output, quality)?;
            Ok(output)
        })
        .await
        .map_err(|e| MediaError::Io(format!("watermark task failed: {}", e)))??;

        info!(output = %written.display(), "Watermark applied");
        Ok(AssetRef::new(written))
    }

    async fn encode_for_upload(
        &self,
        source: &AssetRef,
        mode: CaptureMode,
    ) -> Result<Vec<u8>, MediaError> {
        if mode == CaptureMode::Video {
            return Ok(tokio::fs::read(source.path()).await?);
        }

        let source_path = source.path().to_path_buf();
        let width = self.upload_width;

        let payload = tokio::task::spawn_blocking(move || -> Result<Vec<u8>, MediaError> {
            let mut image = image::open(&source_path)?;
            if image.width() > width {
                image = image.resize(width, u32::MAX, FilterType::Lanczos3);
            }
            let mut buffer = Vec::new();
            let encoder = JpegEncoder::new_with_quality(&mut buffer, upload::JPEG_QUALITY);
            image.to_rgb8().write_with_encoder(encoder)?;
            Ok(buffer)
        })
        .await
        .map_err(|e| MediaError::Io(format!("upload encoding task failed: {}", e)))??;

        debug!(bytes = payload.len(), "Upload payload prepared");
        Ok(payload)
    }

    async fn import_payload(
        &self,
        payload: Vec<u8>,
        mode: CaptureMode,
    ) -> Result<AssetRef, MediaError> {
        let extension = match mode {
            CaptureMode::Photo => "jpg",
            CaptureMode::Video => "mp4",
        };
        tokio::fs::create_dir_all(&self.work_dir).await?;
        let path = self.output_path("processed", extension);
        tokio::fs::write(&path, payload).await?;
        Ok(AssetRef::new(path))
    }
}

fn write_jpeg(image: &RgbImage, path: &Path, quality: u8) -> Result<(), MediaError> {
    let file = std::fs::File::create(path)?;
    let mut writer = BufWriter::new(file);
    let encoder = JpegEncoder::new_with_quality(&mut writer, quality);
    image.write_with_encoder(encoder)?;
    Ok(())
}

/// Blend the watermark into the bottom-right corner of `base`
fn overlay_mark(base: &mut RgbaImage, settings: &WatermarkSettings) -> Result<(), MediaError> {
    let target_width = ((base.width() as f32 * settings.scale).round() as u32).clamp(1, base.width());

    let mark = match &settings.image {
        Some(path) => {
            let source = image::open(path)?.to_rgba8();
            let target_height = (source.height() as u64 * target_width as u64
                / source.width().max(1) as u64)
                .max(1) as u32;
            imageops::resize(&source, target_width, target_height, FilterType::Lanczos3)
        }
        None => badge(target_width),
    };

    let opacity = settings.opacity.clamp(0.0, 1.0);
    let mut mark = mark;
    for pixel in mark.pixels_mut() {
        pixel[3] = (pixel[3] as f32 * opacity).round() as u8;
    }

    let x = base.width().saturating_sub(mark.width() + settings.margin);
    let y = base.height().saturating_sub(mark.height() + settings.margin);
    imageops::overlay(base, &mark, x as i64, y as i64);
    Ok(())
}

/// Plain framed badge used when no mark image is configured
fn badge(width: u32) -> RgbaImage {
    let height = (width / 4).max(1);
    let frame = 2;
    RgbaImage::from_fn(width, height, |x, y| {
        let on_frame = x < frame
            || y < frame
            || x >= width.saturating_sub(frame)
            || y >= height.saturating_sub(frame);
        if on_frame {
            Rgba([20, 20, 20, 255])
        } else {
            Rgba([255, 255, 255, 255])
        }
    })
}
