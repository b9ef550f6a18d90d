// SPDX-License-Identifier: MPL-2.0

//! FilterCam - headless capture, filter and processing core
//!
//! This library sequences camera capture, filter selection, on-device or
//! remote AI filtering, watermarking and saving to the media library.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`filters`]: Filter catalog and presets
//! - [`entitlement`]: Subscription tiers and the filter gate
//! - [`capture`]: Capture sessions, recording timer and camera collaborator
//! - [`pipelines`]: The processing state machine
//! - [`media`]: Asset handles, image transforms and the AI service client
//! - [`orchestrator`]: Glue between all of the above
//! - [`subscription`] / [`session`]: Entitlement refresh and auth credentials
//! - [`config`]: User configuration handling
//! - [`storage`]: Media library on the filesystem
//!
//! # Example
//!
//! ```ignore
//! let mut app = Orchestrator::new(catalog, capture, pipeline, EntitlementSnapshot::free());
//! app.select_filter("vivid")?;
//! let state = app.capture_photo().await?;
//! ```

pub mod capture;
pub mod config;
pub mod constants;
pub mod entitlement;
pub mod errors;
pub mod filters;
pub mod media;
pub mod orchestrator;
pub mod pipelines;
pub mod session;
pub mod storage;
pub mod subscription;

// Re-export commonly used types
pub use capture::{CaptureManager, CaptureMode, CaptureSession};
pub use config::Config;
pub use entitlement::{Capability, EntitlementSnapshot, Tier};
pub use errors::{AppError, AppResult};
pub use filters::{FilterCatalog, FilterPreset};
pub use orchestrator::Orchestrator;
pub use pipelines::{ProcessingPipeline, ProcessingState, ProcessingStatus};
