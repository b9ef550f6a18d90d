// SPDX-License-Identifier: MPL-2.0

//! Media library backed by a directory, and default storage locations

use crate::capture::CaptureMode;
use crate::errors::MediaError;
use crate::media::AssetRef;
use crate::pipelines::MediaLibrary;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

/// Default folder name for saved photos and videos
const DEFAULT_SAVE_FOLDER: &str = "FilterCam";

/// Default folder name for intermediate assets
const WORK_FOLDER: &str = "filtercam";

/// Default media library directory (`~/Pictures/FilterCam`)
pub fn default_output_dir() -> PathBuf {
    dirs::picture_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
        .join(DEFAULT_SAVE_FOLDER)
}

/// Default directory for captured and intermediate assets
pub fn default_work_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(WORK_FOLDER)
}

/// Media library that copies results into a directory
#[derive(Debug, Clone)]
pub struct FileMediaLibrary {
    output_dir: PathBuf,
}

impl FileMediaLibrary {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn target_path(&self, asset: &AssetRef, mode: CaptureMode) -> PathBuf {
        let prefix = match mode {
            CaptureMode::Photo => "IMG",
            CaptureMode::Video => "VID",
        };
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let unique = Uuid::new_v4().simple().to_string();
        let extension = match asset.extension() {
            ext if ext.is_empty() => match mode {
                CaptureMode::Photo => "jpg".to_string(),
                CaptureMode::Video => "mp4".to_string(),
            },
            ext => ext,
        };
        self.output_dir.join(format!(
            "{}_{}_{}.{}",
            prefix,
            timestamp,
            &unique[..8],
            extension
        ))
    }
}

#[async_trait]
impl MediaLibrary for FileMediaLibrary {
    async fn save(&self, asset: &AssetRef, mode: CaptureMode) -> Result<(), MediaError> {
        tokio::fs::create_dir_all(&self.output_dir).await?;
        let target = self.target_path(asset, mode);
        tokio::fs::copy(asset.path(), &target).await?;
        info!(path = %target.display(), "Saved to media library");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_copies_with_mode_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("processed.jpg");
        std::fs::write(&source, b"jpeg").unwrap();
        let library = FileMediaLibrary::new(dir.path().join("library"));

        library
            .save(&AssetRef::new(&source), CaptureMode::Photo)
            .await
            .unwrap();

        let saved: Vec<_> = std::fs::read_dir(library.output_dir())
            .unwrap()
            .flatten()
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(saved.len(), 1);
        assert!(saved[0].starts_with("IMG_"));
        assert!(saved[0].ends_with(".jpg"));
    }

    #[tokio::test]
    async fn missing_asset_fails() {
        let dir = tempfile::tempdir().unwrap();
        let library = FileMediaLibrary::new(dir.path());
        let result = library
            .save(&AssetRef::new(dir.path().join("gone.mp4")), CaptureMode::Video)
            .await;
        assert!(matches!(result, Err(MediaError::Io(_))));
    }
}
