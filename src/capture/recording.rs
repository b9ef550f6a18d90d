// SPDX-License-Identifier: GPL-3.0-only

//! Recording sub-state machine and its duration timer
//!
//! While recording, a [`Ticker`] task emits one signal per second. The owner
//! feeds each signal back through [`RecordingTimer::advance`]; the ticker is
//! dropped (and its task stopped) as soon as the state leaves `Recording`, so
//! no tick outlives the recording it belongs to.

use crate::constants::recording::MAX_SECONDS;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::debug;

/// Outcome of a single timer tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerStep {
    /// Still below the limit
    Running(u32),
    /// The limit was reached on this tick
    LimitReached,
}

/// Elapsed seconds of the current recording, bounded by `max_secs`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordingTimer {
    elapsed_secs: u32,
    max_secs: u32,
}

impl RecordingTimer {
    /// `max_secs` is clamped to `1..=60`
    pub fn new(max_secs: u32) -> Self {
        Self {
            elapsed_secs: 0,
            max_secs: max_secs.clamp(1, MAX_SECONDS),
        }
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.elapsed_secs
    }

    pub fn max_secs(&self) -> u32 {
        self.max_secs
    }

    /// Count one second
    ///
    /// Elapsed time never exceeds the limit; reaching it is reported exactly
    /// once.
    pub fn advance(&mut self) -> TimerStep {
        if self.elapsed_secs >= self.max_secs {
            return TimerStep::LimitReached;
        }
        self.elapsed_secs += 1;
        if self.elapsed_secs == self.max_secs {
            TimerStep::LimitReached
        } else {
            TimerStep::Running(self.elapsed_secs)
        }
    }
}

/// Background task emitting a signal every `period`
///
/// Stopped explicitly with [`Ticker::stop`] or implicitly on drop.
#[derive(Debug)]
pub struct Ticker {
    stop_sender: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl Ticker {
    /// Spawn the tick task; the first signal fires one `period` from now
    pub fn spawn(period: Duration) -> (Self, mpsc::UnboundedReceiver<()>) {
        let (tick_tx, tick_rx) = mpsc::unbounded_channel();
        let (stop_tx, mut stop_rx) = oneshot::channel();

        let handle = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut interval = tokio::time::interval_at(start, period);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if tick_tx.send(()).is_err() {
                            break;
                        }
                    }
                    _ = &mut stop_rx => break,
                }
            }
            debug!("Recording ticker stopped");
        });

        (
            Self {
                stop_sender: Some(stop_tx),
                handle,
            },
            tick_rx,
        )
    }

    pub fn stop(&mut self) {
        if let Some(tx) = self.stop_sender.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
        self.handle.abort();
    }
}

/// Recording state machine: idle → recording → stopping → idle
#[derive(Debug, Default)]
pub enum RecordingState {
    /// Not recording
    #[default]
    Idle,
    /// Actively recording
    Recording {
        timer: RecordingTimer,
        ticker: Option<Ticker>,
    },
    /// Waiting for the camera to finalize the file
    Stopping,
}

impl RecordingState {
    pub fn start(timer: RecordingTimer, ticker: Ticker) -> Self {
        RecordingState::Recording {
            timer,
            ticker: Some(ticker),
        }
    }

    pub fn is_recording(&self) -> bool {
        matches!(self, RecordingState::Recording { .. })
    }

    pub fn elapsed_secs(&self) -> Option<u32> {
        match self {
            RecordingState::Recording { timer, .. } => Some(timer.elapsed_secs()),
            _ => None,
        }
    }

    /// Move to `Stopping`, cancelling the ticker
    pub fn begin_stop(&mut self) -> Option<RecordingTimer> {
        match std::mem::replace(self, RecordingState::Stopping) {
            RecordingState::Recording { timer, ticker } => {
                drop(ticker);
                Some(timer)
            }
            previous => {
                *self = previous;
                None
            }
        }
    }

    /// Back to `Idle` (drops any ticker)
    pub fn stop(&mut self) -> Self {
        std::mem::replace(self, RecordingState::Idle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_stops_exactly_at_limit() {
        let mut timer = RecordingTimer::new(60);
        for second in 1..60 {
            assert_eq!(timer.advance(), TimerStep::Running(second));
        }
        assert_eq!(timer.elapsed_secs(), 59);
        assert_eq!(timer.advance(), TimerStep::LimitReached);
        assert_eq!(timer.elapsed_secs(), 60);
        assert_eq!(timer.advance(), TimerStep::LimitReached);
        assert_eq!(timer.elapsed_secs(), 60);
    }

    #[test]
    fn limit_is_clamped() {
        assert_eq!(RecordingTimer::new(600).max_secs(), 60);
        assert_eq!(RecordingTimer::new(0).max_secs(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn ticker_emits_until_dropped() {
        let (ticker, mut rx) = Ticker::spawn(Duration::from_secs(1));
        rx.recv().await.unwrap();
        rx.recv().await.unwrap();
        drop(ticker);
        assert!(rx.recv().await.is_none());
    }

    #[test]
    fn begin_stop_outside_recording_keeps_state() {
        let mut state = RecordingState::Idle;
        assert!(state.begin_stop().is_none());
        assert!(matches!(state, RecordingState::Idle));
    }
}
