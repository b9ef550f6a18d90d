// SPDX-License-Identifier: GPL-3.0-only

//! The processing state machine
//!
//! The pipeline owns the single [`ProcessingState`] record and is its only
//! writer. Each `process` call is an *attempt* identified by a generation
//! number; [`ProcessingPipeline::reset`] bumps the generation so a superseded
//! attempt can never write its late result.
//!
//! Progress is reported in discrete steps:
//!
//! | Step                        | Progress |
//! |-----------------------------|----------|
//! | attempt started             | 0        |
//! | upload prepared (AI only)   | 20       |
//! | filter applied              | 50       |
//! | watermark step done         | 80       |
//! | saved                       | 100      |
//!
//! Every change is pushed to the current subscriber in the order it happens.

use super::collaborators::{AiFilterService, AiRequest, MediaEditor, MediaLibrary};
use super::state::{ProcessingState, ProcessingStatus};
use crate::capture::{CaptureMode, CaptureSession};
use crate::constants::progress;
use crate::entitlement::{Capability, EntitlementSnapshot, is_allowed};
use crate::errors::{AppError, AppResult, CaptureError, ProcessingError};
use crate::filters::{FilterKind, FilterPreset};
use crate::media::AssetRef;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Sequences filter → watermark → save for a captured asset
pub struct ProcessingPipeline {
    editor: Arc<dyn MediaEditor>,
    ai: Arc<dyn AiFilterService>,
    library: Arc<dyn MediaLibrary>,
    slot: Mutex<Slot>,
}

struct Slot {
    state: ProcessingState,
    generation: u64,
    cancel: Option<Arc<AtomicBool>>,
    /// Set once the AI service answered; cancellation is refused from then on
    response_received: bool,
    subscriber: Option<mpsc::UnboundedSender<ProcessingState>>,
}

impl Slot {
    fn publish(&mut self) {
        if let Some(tx) = &self.subscriber
            && tx.send(self.state.clone()).is_err()
        {
            debug!("Processing subscriber dropped");
            self.subscriber = None;
        }
    }
}

/// Handle on the attempt currently being run
struct Attempt {
    generation: u64,
    cancel: Arc<AtomicBool>,
}

/// Why an attempt stopped early
enum Halt {
    Failed(ProcessingError),
    Superseded,
}

impl From<ProcessingError> for Halt {
    fn from(err: ProcessingError) -> Self {
        Halt::Failed(err)
    }
}

impl ProcessingPipeline {
    pub fn new(
        editor: Arc<dyn MediaEditor>,
        ai: Arc<dyn AiFilterService>,
        library: Arc<dyn MediaLibrary>,
    ) -> Self {
        Self {
            editor,
            ai,
            library,
            slot: Mutex::new(Slot {
                state: ProcessingState::idle(),
                generation: 0,
                cancel: None,
                response_received: false,
                subscriber: None,
            }),
        }
    }

    fn slot(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the current state
    pub fn state(&self) -> ProcessingState {
        self.slot().state.clone()
    }

    /// Register the single state observer, replacing any previous one
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<ProcessingState> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.slot().subscriber = Some(tx);
        rx
    }

    /// Drop the observer; its receiver ends after the states already queued
    pub fn unsubscribe(&self) {
        self.slot().subscriber = None;
    }

    /// Return to `idle`, discarding any result
    ///
    /// An attempt still running is cancelled and its outcome is dropped.
    pub fn reset(&self) {
        let mut slot = self.slot();
        if let Some(cancel) = slot.cancel.take() {
            cancel.store(true, Ordering::SeqCst);
            info!("Reset superseded the running processing attempt");
        }
        slot.generation += 1;
        slot.response_received = false;
        slot.state = ProcessingState::idle();
        slot.publish();
    }

    /// Request cancellation of the running attempt
    ///
    /// Advisory: the flag is checked between steps and cannot abort a remote
    /// call already in flight. Returns `false` when nothing is processing or
    /// once the AI service has answered; that attempt runs to completion.
    pub fn cancel(&self) -> bool {
        let slot = self.slot();
        if slot.response_received {
            debug!("Cancellation refused, AI response already received");
            return false;
        }
        match (&slot.cancel, slot.state.status) {
            (Some(cancel), ProcessingStatus::Processing) => {
                cancel.store(true, Ordering::SeqCst);
                info!("Processing cancellation requested");
                true
            }
            _ => false,
        }
    }

    /// Reset a terminal attempt and run the pipeline again on `session`
    pub async fn retry(
        &self,
        session: &CaptureSession,
        entitlement: &EntitlementSnapshot,
    ) -> AppResult<ProcessingState> {
        {
            let status = self.slot().state.status;
            if status == ProcessingStatus::Processing {
                return Err(AppError::PipelineBusy(status));
            }
        }
        self.reset();
        self.process(session, entitlement).await
    }

    /// Run one processing attempt to a terminal state
    ///
    /// Local validation errors are returned before any state change. Failures
    /// of collaborators end the attempt in `failed` and are returned inside
    /// `Ok`. `Err(AppError::Superseded)` means a reset happened meanwhile.
    pub async fn process(
        &self,
        session: &CaptureSession,
        entitlement: &EntitlementSnapshot,
    ) -> AppResult<ProcessingState> {
        let raw = session
            .raw_asset
            .as_ref()
            .ok_or(CaptureError::MissingAsset)?;

        if let Some(filter) = &session.selected_filter
            && !is_allowed(filter, entitlement)
        {
            warn!(filter = %filter.id, tier = %entitlement.tier, "Filter not allowed for subscription");
            return Err(AppError::EntitlementDenied {
                filter_id: filter.id.clone(),
            });
        }

        let attempt = self.begin()?;
        info!(
            session = %session.id,
            mode = %session.mode,
            filter = session.selected_filter.as_ref().map(|f| f.id.as_str()).unwrap_or("none"),
            "Processing started"
        );

        let outcome = self.run(&attempt, session, raw, entitlement).await;
        match outcome {
            Ok(asset) => self.finish(&attempt, Ok(asset)),
            Err(Halt::Failed(err)) => self.finish(&attempt, Err(err)),
            Err(Halt::Superseded) => {
                debug!("Processing attempt superseded");
                Err(AppError::Superseded)
            }
        }
    }

    async fn run(
        &self,
        attempt: &Attempt,
        session: &CaptureSession,
        raw: &AssetRef,
        entitlement: &EntitlementSnapshot,
    ) -> Result<AssetRef, Halt> {
        let filtered = match &session.selected_filter {
            None => raw.clone(),
            Some(filter) => match &filter.kind {
                FilterKind::Basic { adjustments } => {
                    if adjustments.is_identity() || session.mode == CaptureMode::Video {
                        raw.clone()
                    } else {
                        self.editor
                            .apply_adjustments(
                                raw,
                                &adjustments.ordered(),
                                entitlement.export_quality(),
                            )
                            .await
                            .map_err(|e| ProcessingError::Transform(e.to_string()))?
                    }
                }
                FilterKind::Ai { model_id } => {
                    self.run_remote(attempt, session.mode, raw, filter, model_id)
                        .await?
                }
            },
        };
        self.advance(attempt, progress::FILTERED)?;

        check_cancel(attempt)?;
        let finished = if entitlement.has(Capability::NoWatermark) {
            filtered
        } else {
            match self.editor.watermark(&filtered, entitlement.export_quality()).await {
                Ok(marked) => marked,
                Err(e) => {
                    warn!(error = %e, "Watermark failed, keeping the unwatermarked result");
                    self.record_warning(attempt, format!("Watermark skipped: {}", e))?;
                    filtered
                }
            }
        };
        self.advance(attempt, progress::WATERMARKED)?;

        check_cancel(attempt)?;
        self.library
            .save(&finished, session.mode)
            .await
            .map_err(|e| ProcessingError::Persistence(e.to_string()))?;

        Ok(finished)
    }

    async fn run_remote(
        &self,
        attempt: &Attempt,
        mode: CaptureMode,
        raw: &AssetRef,
        filter: &FilterPreset,
        model_id: &str,
    ) -> Result<AssetRef, Halt> {
        check_cancel(attempt)?;
        let payload = self
            .editor
            .encode_for_upload(raw, mode)
            .await
            .map_err(|e| ProcessingError::Transform(e.to_string()))?;
        self.advance(attempt, progress::UPLOAD_PREPARED)?;

        info!(filter = %filter.id, bytes = payload.len(), "Sending asset to AI service");
        let request = AiRequest {
            mode,
            filter_id: filter.id.clone(),
            model_id: model_id.to_string(),
            payload,
            settings: filter.settings(),
        };
        let response = self
            .ai
            .process(request)
            .await
            .map_err(|failure| ProcessingError::Remote(failure.reason))?;

        self.mark_response_received(attempt)?;
        // Honours a cancel requested while the call was in flight
        check_cancel(attempt)?;
        let asset = self
            .editor
            .import_payload(response.payload, mode)
            .await
            .map_err(|e| ProcessingError::Transform(e.to_string()))?;
        Ok(asset)
    }

    fn begin(&self) -> AppResult<Attempt> {
        let mut slot = self.slot();
        if slot.state.status != ProcessingStatus::Idle {
            return Err(AppError::PipelineBusy(slot.state.status));
        }

        slot.generation += 1;
        let cancel = Arc::new(AtomicBool::new(false));
        slot.cancel = Some(Arc::clone(&cancel));
        slot.response_received = false;
        slot.state = ProcessingState {
            status: ProcessingStatus::Processing,
            progress: progress::STARTED,
            ..ProcessingState::default()
        };
        slot.publish();

        Ok(Attempt {
            generation: slot.generation,
            cancel,
        })
    }

    fn mark_response_received(&self, attempt: &Attempt) -> Result<(), Halt> {
        let mut slot = self.slot();
        if slot.generation != attempt.generation {
            return Err(Halt::Superseded);
        }
        slot.response_received = true;
        Ok(())
    }

    fn advance(&self, attempt: &Attempt, value: u8) -> Result<(), Halt> {
        let mut slot = self.slot();
        if slot.generation != attempt.generation {
            return Err(Halt::Superseded);
        }
        slot.state.progress = value;
        debug!(progress = value, "Processing progress");
        slot.publish();
        Ok(())
    }

    fn record_warning(&self, attempt: &Attempt, warning: String) -> Result<(), Halt> {
        let mut slot = self.slot();
        if slot.generation != attempt.generation {
            return Err(Halt::Superseded);
        }
        slot.state.warnings.push(warning);
        Ok(())
    }

    fn finish(
        &self,
        attempt: &Attempt,
        outcome: Result<AssetRef, ProcessingError>,
    ) -> AppResult<ProcessingState> {
        let mut slot = self.slot();
        if slot.generation != attempt.generation {
            debug!("Dropping result of superseded processing attempt");
            return Err(AppError::Superseded);
        }

        slot.cancel = None;
        slot.response_received = false;
        match outcome {
            Ok(asset) => {
                info!(output = %asset, warnings = slot.state.warnings.len(), "Processing completed");
                slot.state.status = ProcessingStatus::Completed;
                slot.state.progress = progress::COMPLETED;
                slot.state.output_asset = Some(asset);
            }
            Err(err) => {
                error!(error = %err, "Processing failed");
                slot.state.status = ProcessingStatus::Failed;
                slot.state.error_detail = Some(err.to_string());
                slot.state.output_asset = None;
            }
        }
        slot.publish();
        Ok(slot.state.clone())
    }
}

fn check_cancel(attempt: &Attempt) -> Result<(), Halt> {
    if attempt.cancel.load(Ordering::SeqCst) {
        Err(Halt::Failed(ProcessingError::Cancelled))
    } else {
        Ok(())
    }
}
