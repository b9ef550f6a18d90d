// SPDX-License-Identifier: GPL-3.0-only

//! Top-level sequencing of capture, filter selection and processing
//!
//! The orchestrator has no business logic of its own. It consults the
//! entitlement gate when a filter is chosen, hands each captured session to
//! the processing pipeline, and keeps the list of recently used filters.
//!
//! Processing runs to completion inside the capture calls. Observers that need
//! progress, or want to cancel meanwhile, use [`Orchestrator::pipeline_handle`]
//! from another task.

use crate::capture::{CameraFacing, CaptureManager, CaptureMode, CaptureSession, FlashMode, TickOutcome};
use crate::entitlement::{EntitlementSnapshot, is_allowed};
use crate::errors::{AppError, AppResult, CaptureError};
use crate::filters::{FilterCatalog, FilterPreset, RecentFilters};
use crate::media::AssetRef;
use crate::pipelines::{ProcessingPipeline, ProcessingState, ProcessingStatus};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// A catalog entry with its gate decision
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterListing<'a> {
    pub preset: &'a FilterPreset,
    pub allowed: bool,
}

/// What a recording tick led to
#[derive(Debug, Clone, PartialEq)]
pub enum RecordingTick {
    /// No recording is active
    Idle,
    Recording { elapsed_secs: u32 },
    /// The limit stopped the recording and the result was processed
    Finished(ProcessingState),
}

pub struct Orchestrator {
    catalog: FilterCatalog,
    capture: CaptureManager,
    pipeline: Arc<ProcessingPipeline>,
    entitlement: EntitlementSnapshot,
    recent: RecentFilters,
}

impl Orchestrator {
    pub fn new(
        catalog: FilterCatalog,
        capture: CaptureManager,
        pipeline: Arc<ProcessingPipeline>,
        entitlement: EntitlementSnapshot,
    ) -> Self {
        let mut orchestrator = Self {
            catalog,
            capture,
            pipeline,
            entitlement: EntitlementSnapshot::free(),
            recent: RecentFilters::default(),
        };
        orchestrator.set_entitlement(entitlement);
        orchestrator
    }

    pub fn catalog(&self) -> &FilterCatalog {
        &self.catalog
    }

    pub fn capture(&self) -> &CaptureManager {
        &self.capture
    }

    pub fn entitlement(&self) -> &EntitlementSnapshot {
        &self.entitlement
    }

    /// Every preset in listing order, marked allowed or locked
    pub fn filters(&self) -> Vec<FilterListing<'_>> {
        self.catalog
            .list()
            .iter()
            .map(|preset| FilterListing {
                preset,
                allowed: is_allowed(preset, &self.entitlement),
            })
            .collect()
    }

    /// Select a filter for the next capture
    ///
    /// A locked filter is refused and the previous selection is kept.
    pub fn select_filter(&mut self, id: &str) -> AppResult<&FilterPreset> {
        let preset = self.catalog.get(id)?;
        if !is_allowed(preset, &self.entitlement) {
            warn!(filter = %id, tier = %self.entitlement.tier, "Premium filter requires an upgrade");
            return Err(AppError::EntitlementDenied {
                filter_id: id.to_string(),
            });
        }

        info!(filter = %id, "Filter selected");
        self.capture.select_filter(Some(preset.clone()));
        Ok(preset)
    }

    pub fn clear_filter(&mut self) {
        self.capture.select_filter(None);
    }

    pub fn selected_filter(&self) -> Option<&FilterPreset> {
        self.capture.selected_filter()
    }

    /// Replace the entitlement after a subscription change
    ///
    /// Export quality follows `highRes`; a selection that is no longer
    /// allowed is dropped.
    pub fn set_entitlement(&mut self, entitlement: EntitlementSnapshot) {
        self.capture.set_export_quality(entitlement.export_quality());

        if let Some(selected) = self.capture.selected_filter()
            && !is_allowed(selected, &entitlement)
        {
            info!(filter = %selected.id, "Selected filter no longer allowed, clearing");
            self.capture.select_filter(None);
        }

        self.entitlement = entitlement;
    }

    /// Switch mode, discarding the session and returning processing to idle
    ///
    /// Refused while an attempt is processing.
    pub async fn start_capture(&mut self, mode: CaptureMode) -> AppResult<()> {
        self.ensure_not_processing()?;
        self.capture.start_capture(mode).await;
        self.pipeline.reset();
        Ok(())
    }

    /// [`Orchestrator::start_capture`] from a mode name
    pub async fn start_capture_str(&mut self, mode: &str) -> AppResult<CaptureMode> {
        let mode = mode.parse::<CaptureMode>()?;
        self.start_capture(mode).await?;
        Ok(mode)
    }

    /// Discard the session and any processing result
    pub async fn retake(&mut self) {
        self.capture.retake().await;
        self.pipeline.reset();
    }

    /// Take a photo and process it
    pub async fn capture_photo(&mut self) -> AppResult<ProcessingState> {
        self.ensure_not_processing()?;
        let session = self.capture.capture_photo().await?;
        self.process(session).await
    }

    /// Hand an externally captured asset to the pipeline
    ///
    /// A second call before retake is a no-op returning the current state.
    pub async fn complete_capture(&mut self, raw_asset: AssetRef) -> AppResult<ProcessingState> {
        if self.capture.session().is_some() {
            self.capture.complete_capture(raw_asset);
            return Ok(self.pipeline.state());
        }
        self.ensure_not_processing()?;
        let session = self.capture.complete_capture(raw_asset);
        self.process(session).await
    }

    /// Start recording; every signal from the receiver must be passed to
    /// [`Orchestrator::on_tick`], which enforces the hard limit
    pub async fn start_recording(&mut self) -> AppResult<mpsc::UnboundedReceiver<()>> {
        self.ensure_not_processing()?;
        self.capture.start_recording().await
    }

    /// Feed one recording tick; at the limit the recording is processed
    pub async fn on_tick(&mut self) -> AppResult<RecordingTick> {
        match self.capture.tick().await? {
            TickOutcome::Idle => Ok(RecordingTick::Idle),
            TickOutcome::Recording { elapsed_secs } => Ok(RecordingTick::Recording { elapsed_secs }),
            TickOutcome::AutoStopped(session) => {
                let state = self.process(session).await?;
                Ok(RecordingTick::Finished(state))
            }
        }
    }

    /// Stop recording early and process the result
    pub async fn stop_recording(&mut self) -> AppResult<ProcessingState> {
        let session = self.capture.stop_recording().await?;
        self.process(session).await
    }

    /// Run the pipeline again on the current session
    pub async fn retry(&mut self) -> AppResult<ProcessingState> {
        let session = self
            .capture
            .session()
            .cloned()
            .ok_or(CaptureError::MissingAsset)?;
        let state = self.pipeline.retry(&session, &self.entitlement).await?;
        self.note_completion(&session, &state);
        Ok(state)
    }

    pub fn cancel_processing(&self) -> bool {
        self.pipeline.cancel()
    }

    pub fn reset_processing(&self) {
        self.pipeline.reset();
    }

    pub fn processing_state(&self) -> ProcessingState {
        self.pipeline.state()
    }

    /// Single observer of processing state changes
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<ProcessingState> {
        self.pipeline.subscribe()
    }

    pub fn unsubscribe(&self) {
        self.pipeline.unsubscribe();
    }

    /// Shared pipeline, for cancelling or observing from another task
    pub fn pipeline_handle(&self) -> Arc<ProcessingPipeline> {
        Arc::clone(&self.pipeline)
    }

    pub fn toggle_facing(&mut self) -> CameraFacing {
        self.capture.toggle_facing()
    }

    pub fn toggle_flash(&mut self) -> FlashMode {
        self.capture.toggle_flash()
    }

    /// Recently used filter ids, newest first
    pub fn recent_filters(&self) -> Vec<&str> {
        self.recent.ids().collect()
    }

    async fn process(&mut self, session: CaptureSession) -> AppResult<ProcessingState> {
        let pipeline = Arc::clone(&self.pipeline);
        let state = pipeline.process(&session, &self.entitlement).await?;
        self.note_completion(&session, &state);
        Ok(state)
    }

    fn note_completion(&mut self, session: &CaptureSession, state: &ProcessingState) {
        if state.status == ProcessingStatus::Completed
            && let Some(filter) = &session.selected_filter
        {
            self.recent.record(&filter.id);
        }
    }

    fn ensure_not_processing(&self) -> AppResult<()> {
        let status = self.pipeline.state().status;
        if status == ProcessingStatus::Processing {
            return Err(AppError::PipelineBusy(status));
        }
        Ok(())
    }
}
