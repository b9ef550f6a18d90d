// SPDX-License-Identifier: GPL-3.0-only

use crate::media::AssetRef;
use serde::Serialize;

/// Status of the current processing attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    #[default]
    Idle,
    Processing,
    Completed,
    Failed,
}

impl ProcessingStatus {
    /// `completed` or `failed`
    pub fn is_terminal(self) -> bool {
        matches!(self, ProcessingStatus::Completed | ProcessingStatus::Failed)
    }
}

impl std::fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessingStatus::Idle => write!(f, "idle"),
            ProcessingStatus::Processing => write!(f, "processing"),
            ProcessingStatus::Completed => write!(f, "completed"),
            ProcessingStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Observable state of the processing pipeline
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingState {
    pub status: ProcessingStatus,
    /// 0 - 100
    pub progress: u8,
    /// Failure reason; set only in `failed`
    pub error_detail: Option<String>,
    /// Saved result; set only in `completed`
    pub output_asset: Option<AssetRef>,
    /// Non-fatal problems (e.g. a skipped watermark)
    pub warnings: Vec<String>,
}

impl ProcessingState {
    pub fn idle() -> Self {
        Self::default()
    }

    /// Message for end users
    ///
    /// Failure detail is appended only in debug builds.
    pub fn user_message(&self) -> String {
        match self.status {
            ProcessingStatus::Idle => "Ready".to_string(),
            ProcessingStatus::Processing => format!("Processing… {}%", self.progress),
            ProcessingStatus::Completed => "Saved to your library".to_string(),
            ProcessingStatus::Failed => {
                let generic = "Something went wrong. Please try again.";
                match &self.error_detail {
                    Some(detail) if cfg!(debug_assertions) => format!("{} ({})", generic, detail),
                    _ => generic.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_the_reset_state() {
        let state = ProcessingState::default();
        assert_eq!(state.status, ProcessingStatus::Idle);
        assert_eq!(state.progress, 0);
        assert!(state.error_detail.is_none());
        assert!(state.output_asset.is_none());
        assert!(state.warnings.is_empty());
    }

    #[test]
    fn failed_message_mentions_retry() {
        let state = ProcessingState {
            status: ProcessingStatus::Failed,
            error_detail: Some("model overloaded".to_string()),
            ..ProcessingState::default()
        };
        let message = state.user_message();
        assert!(message.starts_with("Something went wrong"));
        if cfg!(debug_assertions) {
            assert!(message.contains("model overloaded"));
        } else {
            assert!(!message.contains("model overloaded"));
        }
    }

    #[test]
    fn only_completed_and_failed_are_terminal() {
        assert!(!ProcessingStatus::Idle.is_terminal());
        assert!(!ProcessingStatus::Processing.is_terminal());
        assert!(ProcessingStatus::Completed.is_terminal());
        assert!(ProcessingStatus::Failed.is_terminal());
    }
}
