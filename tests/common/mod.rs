// SPDX-License-Identifier: MPL-2.0

//! Collaborator fakes shared by the integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use filtercam::capture::{CameraDevice, CaptureMode, CaptureSession, PhotoOptions, VideoOptions};
use filtercam::constants::ExportQuality;
use filtercam::errors::{CaptureError, MediaError, Permission, RemoteFailure};
use filtercam::filters::{Adjustment, FilterPreset};
use filtercam::media::AssetRef;
use filtercam::pipelines::{
    AiFilterService, AiRequest, AiResponse, MediaEditor, MediaLibrary, ProcessingPipeline,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use uuid::Uuid;

pub const RAW_PHOTO: &str = "/raw/photo.jpg";
pub const RAW_CLIP: &str = "/raw/clip.mp4";
pub const AI_RESULT: &str = "/work/ai_result.jpg";

/// Editor that derives output names from the input and never touches disk
///
/// Video inputs are unsupported, like the real editor. With an import gate
/// set, `import_payload` waits for one `notify_one` before answering.
#[derive(Default)]
pub struct FakeEditor {
    pub fail_watermark: AtomicBool,
    pub fail_adjust: AtomicBool,
    pub adjust_calls: Mutex<Vec<Vec<Adjustment>>>,
    pub watermark_calls: AtomicUsize,
    pub qualities: Mutex<Vec<ExportQuality>>,
    pub import_gate: Mutex<Option<Arc<Notify>>>,
    pub imports_started: AtomicUsize,
}

#[async_trait]
impl MediaEditor for FakeEditor {
    async fn apply_adjustments(
        &self,
        source: &AssetRef,
        adjustments: &[Adjustment],
        quality: ExportQuality,
    ) -> Result<AssetRef, MediaError> {
        self.adjust_calls.lock().unwrap().push(adjustments.to_vec());
        self.qualities.lock().unwrap().push(quality);
        if self.fail_adjust.load(Ordering::SeqCst) {
            return Err(MediaError::Image("corrupt input".to_string()));
        }
        Ok(AssetRef::new(format!("{}.adjusted.jpg", source)))
    }

    async fn watermark(
        &self,
        source: &AssetRef,
        quality: ExportQuality,
    ) -> Result<AssetRef, MediaError> {
        self.watermark_calls.fetch_add(1, Ordering::SeqCst);
        self.qualities.lock().unwrap().push(quality);
        if source.is_video() {
            return Err(MediaError::Unsupported("watermarking video".to_string()));
        }
        if self.fail_watermark.load(Ordering::SeqCst) {
            return Err(MediaError::Image("font missing".to_string()));
        }
        Ok(AssetRef::new(format!("{}.wm.jpg", source)))
    }

    async fn encode_for_upload(
        &self,
        _source: &AssetRef,
        _mode: CaptureMode,
    ) -> Result<Vec<u8>, MediaError> {
        Ok(b"upload".to_vec())
    }

    async fn import_payload(
        &self,
        _payload: Vec<u8>,
        _mode: CaptureMode,
    ) -> Result<AssetRef, MediaError> {
        self.imports_started.fetch_add(1, Ordering::SeqCst);
        let gate = self.import_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        Ok(AssetRef::new(AI_RESULT))
    }
}

/// AI service answering from a queue of scripted results
///
/// An empty queue answers with a fixed payload. With a gate set, every call
/// waits for one `notify_one` before answering.
#[derive(Default)]
pub struct FakeAi {
    pub script: Mutex<VecDeque<Result<Vec<u8>, String>>>,
    pub requests: Mutex<Vec<AiRequest>>,
    pub gate: Option<Arc<Notify>>,
}

impl FakeAi {
    pub fn failing(reason: &str) -> Self {
        let ai = Self::default();
        ai.script.lock().unwrap().push_back(Err(reason.to_string()));
        ai
    }

    pub fn gated(gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl AiFilterService for FakeAi {
    async fn process(&self, request: AiRequest) -> Result<AiResponse, RemoteFailure> {
        self.requests.lock().unwrap().push(request);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Err(reason)) => Err(RemoteFailure::new(reason)),
            Some(Ok(payload)) => Ok(AiResponse { payload }),
            None => Ok(AiResponse {
                payload: b"styled".to_vec(),
            }),
        }
    }
}

#[derive(Default)]
pub struct FakeLibrary {
    pub fail: AtomicBool,
    pub saved: Mutex<Vec<AssetRef>>,
}

impl FakeLibrary {
    pub fn saved(&self) -> Vec<AssetRef> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaLibrary for FakeLibrary {
    async fn save(&self, asset: &AssetRef, _mode: CaptureMode) -> Result<(), MediaError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(MediaError::Io("disk full".to_string()));
        }
        self.saved.lock().unwrap().push(asset.clone());
        Ok(())
    }
}

/// Camera returning fixed assets
#[derive(Default)]
pub struct FakeCamera {
    pub denied: Mutex<Option<Permission>>,
    pub photos: AtomicUsize,
    pub stops: AtomicUsize,
    pub last_video_options: Mutex<Option<VideoOptions>>,
}

#[async_trait]
impl CameraDevice for FakeCamera {
    async fn request_permissions(&self, _mode: CaptureMode) -> Result<(), Permission> {
        match *self.denied.lock().unwrap() {
            Some(permission) => Err(permission),
            None => Ok(()),
        }
    }

    async fn capture_photo(&self, _options: &PhotoOptions) -> Result<AssetRef, CaptureError> {
        self.photos.fetch_add(1, Ordering::SeqCst);
        Ok(AssetRef::new(RAW_PHOTO))
    }

    async fn start_video(&self, options: &VideoOptions) -> Result<(), CaptureError> {
        *self.last_video_options.lock().unwrap() = Some(*options);
        Ok(())
    }

    async fn stop_video(&self) -> Result<AssetRef, CaptureError> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        Ok(AssetRef::new(RAW_CLIP))
    }
}

/// Pipeline wired to fakes, keeping handles on each of them
pub struct Harness {
    pub editor: Arc<FakeEditor>,
    pub ai: Arc<FakeAi>,
    pub library: Arc<FakeLibrary>,
    pub pipeline: Arc<ProcessingPipeline>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_ai(FakeAi::default())
    }

    pub fn with_ai(ai: FakeAi) -> Self {
        let editor = Arc::new(FakeEditor::default());
        let ai = Arc::new(ai);
        let library = Arc::new(FakeLibrary::default());
        let pipeline = Arc::new(ProcessingPipeline::new(
            editor.clone(),
            ai.clone(),
            library.clone(),
        ));
        Self {
            editor,
            ai,
            library,
            pipeline,
        }
    }
}

pub fn photo_session(filter: Option<FilterPreset>) -> CaptureSession {
    CaptureSession {
        id: Uuid::new_v4(),
        mode: CaptureMode::Photo,
        raw_asset: Some(AssetRef::new(RAW_PHOTO)),
        selected_filter: filter,
        created_at: Utc::now(),
    }
}

pub fn video_session(filter: Option<FilterPreset>) -> CaptureSession {
    CaptureSession {
        mode: CaptureMode::Video,
        raw_asset: Some(AssetRef::new(RAW_CLIP)),
        ..photo_session(filter)
    }
}
