// SPDX-License-Identifier: GPL-3.0-only

//! Processing pipeline
//!
//! A processing attempt turns the raw asset of a [`CaptureSession`](crate::capture::CaptureSession)
//! into a saved result:
//!
//! ```text
//! ┌────────────┐     ┌─────────────────────┐     ┌───────────┐     ┌───────────┐
//! │ Raw asset  │ ──▶ │ Filter              │ ──▶ │ Watermark │ ──▶ │ Media     │
//! │            │     │ - basic: on-device  │     │ (free     │     │ library   │
//! │            │     │ - ai: remote call   │     │  tier)    │     │           │
//! └────────────┘     └─────────────────────┘     └───────────┘     └───────────┘
//! ```
//!
//! The pipeline is a small state machine (`idle → processing → completed | failed`)
//! guarded so only one attempt runs at a time. Terminal states stay put until
//! [`ProcessingPipeline::reset`] is called.
//!
//! # Modules
//!
//! - [`collaborators`]: traits for the editor, the AI service and the media library
//! - [`state`]: [`ProcessingState`] and [`ProcessingStatus`]
//! - [`processing`]: [`ProcessingPipeline`] itself

pub mod collaborators;
pub mod processing;
pub mod state;

pub use collaborators::{AiFilterService, AiRequest, AiResponse, MediaEditor, MediaLibrary};
pub use processing::ProcessingPipeline;
pub use state::{ProcessingState, ProcessingStatus};
