// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! This module provides command-line functionality for:
//! - Listing filters and whether the current tier unlocks them
//! - Taking a photo and processing it
//! - Recording a video and processing it
//!
//! A file stands in for the camera: photos copy a source image and recordings
//! copy a source clip when they stop.

use filtercam::capture::{CaptureManager, CaptureMode, FileCamera};
use filtercam::config::Config;
use filtercam::entitlement::{EntitlementSnapshot, Tier};
use filtercam::filters::FilterCatalog;
use filtercam::media::{HttpAiFilterService, LocalMediaEditor};
use filtercam::orchestrator::{Orchestrator, RecordingTick};
use filtercam::pipelines::{ProcessingPipeline, ProcessingState, ProcessingStatus};
use filtercam::session::{FileCredentialStore, HttpSessionRefresher, restore_session};
use filtercam::storage::FileMediaLibrary;
use filtercam::subscription::{HttpSubscriptionBackend, SubscriptionManager};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

type CliResult = Result<(), Box<dyn std::error::Error>>;

/// List all filters with their lock state
pub fn list_filters(tier: Option<Tier>) -> CliResult {
    let rt = tokio::runtime::Runtime::new()?;
    let config = Config::load()?;
    let entitlement = rt.block_on(resolve_entitlement(&config, tier));

    let catalog = FilterCatalog::builtin();
    println!("Filters ({} tier):", entitlement.tier);
    println!();
    for preset in catalog.list() {
        let marker = if filtercam::entitlement::is_allowed(preset, &entitlement) {
            " "
        } else {
            "🔒"
        };
        let kind = if preset.is_ai() { "ai" } else { "basic" };
        println!("  {} {:<14} {:<14} [{}]", marker, preset.id, preset.display_name, kind);
    }

    Ok(())
}

/// Capture a photo from `source` and process it
pub fn take_photo(
    source: PathBuf,
    filter: Option<String>,
    tier: Option<Tier>,
    output: Option<PathBuf>,
) -> CliResult {
    let config = load_config(output)?;
    let rt = tokio::runtime::Runtime::new()?;

    rt.block_on(async {
        let entitlement = resolve_entitlement(&config, tier).await;
        let mut app = build_orchestrator(&config, source, entitlement)?;
        if let Some(id) = filter.as_deref() {
            let preset = app.select_filter(id)?;
            println!("Filter: {}", preset.display_name);
        }

        app.start_capture(CaptureMode::Photo).await?;
        let progress = spawn_progress_printer(&app);
        let state = app.capture_photo().await;
        finish_progress(&app, progress).await;
        report(state?, &config)
    })
}

/// Record a clip from `source` for `duration` seconds and process it
pub fn record_video(
    source: PathBuf,
    duration: u32,
    filter: Option<String>,
    tier: Option<Tier>,
    output: Option<PathBuf>,
) -> CliResult {
    let config = load_config(output)?;
    let rt = tokio::runtime::Runtime::new()?;

    // Set up Ctrl+C handler
    let stop_flag = Arc::new(AtomicBool::new(false));
    let stop_flag_clone = stop_flag.clone();
    ctrlc::set_handler(move || {
        stop_flag_clone.store(true, Ordering::SeqCst);
    })?;

    rt.block_on(async {
        let entitlement = resolve_entitlement(&config, tier).await;
        let mut app = build_orchestrator(&config, source, entitlement)?;
        if let Some(id) = filter.as_deref() {
            let preset = app.select_filter(id)?;
            println!("Filter: {}", preset.display_name);
        }

        app.start_capture(CaptureMode::Video).await?;
        let mut ticks = app.start_recording().await?;
        let progress = spawn_progress_printer(&app);

        println!();
        println!("Recording... (press Ctrl+C to stop early)");

        let mut poll = tokio::time::interval(Duration::from_millis(100));
        let state = loop {
            tokio::select! {
                tick = ticks.recv() => {
                    if tick.is_none() {
                        break None;
                    }
                    match app.on_tick().await? {
                        RecordingTick::Recording { elapsed_secs } => {
                            print!("\rRecording: {:02}:{:02}", elapsed_secs / 60, elapsed_secs % 60);
                            std::io::Write::flush(&mut std::io::stdout())?;
                            if elapsed_secs >= duration {
                                println!();
                                break Some(app.stop_recording().await?);
                            }
                        }
                        RecordingTick::Finished(state) => {
                            println!();
                            println!("Recording limit reached");
                            break Some(state);
                        }
                        RecordingTick::Idle => break None,
                    }
                }
                _ = poll.tick() => {
                    if stop_flag.load(Ordering::SeqCst) {
                        println!();
                        println!("Stopping early...");
                        break Some(app.stop_recording().await?);
                    }
                }
            }
        };
        finish_progress(&app, progress).await;

        match state {
            Some(state) => report(state, &config),
            None => Err("recording ended without a result".into()),
        }
    })
}

fn load_config(output: Option<PathBuf>) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = Config::load()?;
    if let Some(dir) = output {
        config.output_dir = dir;
    }
    Ok(config)
}

/// Entitlement from `--tier`, else from the subscription backend, else free
async fn resolve_entitlement(config: &Config, tier: Option<Tier>) -> EntitlementSnapshot {
    if let Some(tier) = tier {
        return EntitlementSnapshot::for_tier(tier);
    }
    let Some(api_url) = config.api_url.as_deref() else {
        return EntitlementSnapshot::free();
    };

    let session = match FileCredentialStore::default_path() {
        Some(path) => {
            let store = FileCredentialStore::new(path);
            match HttpSessionRefresher::new(api_url) {
                Ok(refresher) => restore_session(&store, &refresher, chrono::Utc::now())
                    .await
                    .unwrap_or_else(|err| {
                        warn!(error = %err, "Cannot restore stored session");
                        None
                    }),
                Err(err) => {
                    warn!(error = %err, "Session refresh unavailable");
                    None
                }
            }
        }
        None => None,
    };
    if session.is_none() {
        debug!("No valid session; checking subscription anonymously");
    }

    match HttpSubscriptionBackend::new(api_url, session.as_ref()) {
        Ok(backend) => SubscriptionManager::new(Arc::new(backend)).start().await,
        Err(err) => {
            warn!(error = %err, "Subscription backend unavailable");
            EntitlementSnapshot::free()
        }
    }
}

fn build_orchestrator(
    config: &Config,
    source: PathBuf,
    entitlement: EntitlementSnapshot,
) -> Result<Orchestrator, Box<dyn std::error::Error>> {
    let camera = Arc::new(FileCamera::new(source, &config.work_dir));
    let editor = Arc::new(LocalMediaEditor::from_config(config));
    let ai = Arc::new(HttpAiFilterService::new(
        config.ai_endpoint.clone(),
        Duration::from_secs(config.ai_timeout_secs),
    )?);
    let library = Arc::new(FileMediaLibrary::new(&config.output_dir));

    let pipeline = Arc::new(ProcessingPipeline::new(editor, ai, library));
    let capture = CaptureManager::new(camera).with_max_recording_secs(config.max_recording_secs);

    Ok(Orchestrator::new(
        FilterCatalog::builtin(),
        capture,
        pipeline,
        entitlement,
    ))
}

fn spawn_progress_printer(app: &Orchestrator) -> JoinHandle<()> {
    let mut states = app.subscribe();
    tokio::spawn(async move {
        while let Some(state) = states.recv().await {
            if state.status == ProcessingStatus::Processing {
                println!("Processing: {:>3}%", state.progress);
            }
        }
    })
}

/// Close the progress stream and let the printer flush what is queued
async fn finish_progress(app: &Orchestrator, progress: JoinHandle<()>) {
    app.unsubscribe();
    if let Err(err) = progress.await {
        warn!(error = %err, "Progress printer failed");
    }
}

fn report(state: ProcessingState, config: &Config) -> CliResult {
    for warning in &state.warnings {
        println!("Warning: {}", warning);
    }
    println!("{}", state.user_message());

    match state.status {
        ProcessingStatus::Completed => {
            println!("Saved to: {}", config.output_dir.display());
            Ok(())
        }
        _ => Err(state
            .error_detail
            .unwrap_or_else(|| format!("processing ended in {}", state.status))
            .into()),
    }
}
