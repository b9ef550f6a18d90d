// SPDX-License-Identifier: GPL-3.0-only

//! External collaborators used by the processing pipeline
//!
//! The pipeline only sequences these calls. Concrete implementations live in
//! [`crate::media`] and [`crate::storage`]; tests supply fakes.

use crate::capture::CaptureMode;
use crate::constants::ExportQuality;
use crate::errors::{MediaError, RemoteFailure};
use crate::filters::Adjustment;
use crate::media::AssetRef;
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Local image-transform API
#[async_trait]
pub trait MediaEditor: Send + Sync {
    /// Apply `adjustments` in order, producing a new asset
    ///
    /// `quality` is the highest export quality the current entitlement allows.
    async fn apply_adjustments(
        &self,
        source: &AssetRef,
        adjustments: &[Adjustment],
        quality: ExportQuality,
    ) -> Result<AssetRef, MediaError>;

    /// Overlay the watermark, producing a new asset
    async fn watermark(
        &self,
        source: &AssetRef,
        quality: ExportQuality,
    ) -> Result<AssetRef, MediaError>;

    /// Compressed bytes sent to the remote AI service
    async fn encode_for_upload(
        &self,
        source: &AssetRef,
        mode: CaptureMode,
    ) -> Result<Vec<u8>, MediaError>;

    /// Store a payload returned by the remote AI service as a new asset
    async fn import_payload(
        &self,
        payload: Vec<u8>,
        mode: CaptureMode,
    ) -> Result<AssetRef, MediaError>;
}

/// One request to the remote AI filter service
#[derive(Debug, Clone, PartialEq)]
pub struct AiRequest {
    pub mode: CaptureMode,
    pub filter_id: String,
    pub model_id: String,
    pub payload: Vec<u8>,
    pub settings: BTreeMap<String, f32>,
}

/// Processed payload returned by the remote AI filter service
#[derive(Debug, Clone, PartialEq)]
pub struct AiResponse {
    pub payload: Vec<u8>,
}

/// Remote AI filter/video service
///
/// A single request/response exchange. Implementations report failures with
/// the reason given by the service, which ends the attempt verbatim.
#[async_trait]
pub trait AiFilterService: Send + Sync {
    async fn process(&self, request: AiRequest) -> Result<AiResponse, RemoteFailure>;
}

/// Permanent media store
#[async_trait]
pub trait MediaLibrary: Send + Sync {
    async fn save(&self, asset: &AssetRef, mode: CaptureMode) -> Result<(), MediaError>;
}
