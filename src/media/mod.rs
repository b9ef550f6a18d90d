// SPDX-License-Identifier: GPL-3.0-only

//! Media handles and the concrete media collaborators
//!
//! - [`AssetRef`]: opaque handle to a captured or produced file
//! - [`adjust`]: pure parametric adjustment math on RGB buffers
//! - [`editor`]: [`LocalMediaEditor`], the on-device image-transform collaborator
//! - [`remote`]: [`HttpAiFilterService`], the remote AI filter collaborator

pub mod adjust;
pub mod editor;
pub mod remote;

pub use editor::{LocalMediaEditor, WatermarkSettings};
pub use remote::HttpAiFilterService;

use crate::constants::file_formats;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Opaque reference to a media file
///
/// The core never inspects the contents behind a reference; only collaborators
/// do.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetRef(PathBuf);

impl AssetRef {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Lowercased file extension, empty if none
    pub fn extension(&self) -> String {
        self.0
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default()
    }

    pub fn is_video(&self) -> bool {
        file_formats::is_video_extension(&self.extension())
    }
}

impl std::fmt::Display for AssetRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_detection_uses_extension() {
        assert!(AssetRef::new("/tmp/clip.MP4").is_video());
        assert!(!AssetRef::new("/tmp/photo.jpg").is_video());
        assert_eq!(AssetRef::new("/tmp/noext").extension(), "");
    }
}
