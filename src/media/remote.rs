// SPDX-License-Identifier: GPL-3.0-only

//! HTTP client for the remote AI filter service
//!
//! Photos are posted to `{endpoint}/filter` and videos to `{endpoint}/video`
//! as JSON with a base64 payload:
//!
//! ```text
//! → {"image": "<base64>", "filter": "anime", "model": "anime", "settings": {}}
//! ← {"processedImage": "<base64>"}
//! ```
//!
//! A non-success response surfaces its `message` field when present. The
//! request is bounded by the configured timeout; there is no retry.

use crate::capture::CaptureMode;
use crate::errors::{AppError, AppResult, RemoteFailure};
use crate::pipelines::{AiFilterService, AiRequest, AiResponse};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, warn};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
struct FilterRequestBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    video: Option<String>,
    filter: &'a str,
    model: &'a str,
    settings: &'a BTreeMap<String, f32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FilterResponseBody {
    processed_image: Option<String>,
    processed_video: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// AI filter collaborator speaking JSON over HTTP
#[derive(Debug, Clone)]
pub struct HttpAiFilterService {
    client: reqwest::Client,
    endpoint: Option<String>,
    timeout: Duration,
}

impl HttpAiFilterService {
    /// `endpoint` is the service base URL; without one every request fails
    pub fn new(endpoint: Option<String>, timeout: Duration) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.map(|e| e.trim_end_matches('/').to_string()),
            timeout,
        })
    }

    fn describe(&self, err: reqwest::Error) -> RemoteFailure {
        if err.is_timeout() {
            RemoteFailure::new(format!(
                "AI service timed out after {}s",
                self.timeout.as_secs()
            ))
        } else {
            RemoteFailure::new(format!("AI service unreachable: {}", err))
        }
    }
}

#[async_trait]
impl AiFilterService for HttpAiFilterService {
    async fn process(&self, request: AiRequest) -> Result<AiResponse, RemoteFailure> {
        let endpoint = self
            .endpoint
            .as_deref()
            .ok_or_else(|| RemoteFailure::new("AI service not configured"))?;

        let encoded = STANDARD.encode(&request.payload);
        let (url, body) = match request.mode {
            CaptureMode::Photo => (
                format!("{}/filter", endpoint),
                FilterRequestBody {
                    image: Some(encoded),
                    video: None,
                    filter: &request.filter_id,
                    model: &request.model_id,
                    settings: &request.settings,
                },
            ),
            CaptureMode::Video => (
                format!("{}/video", endpoint),
                FilterRequestBody {
                    image: None,
                    video: Some(encoded),
                    filter: &request.filter_id,
                    model: &request.model_id,
                    settings: &request.settings,
                },
            ),
        };

        debug!(url = %url, filter = %request.filter_id, "Posting AI filter request");
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.describe(e))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|b| b.message)
                .unwrap_or_else(|| format!("AI service returned {}", status));
            warn!(%status, reason = %message, "AI filter request failed");
            return Err(RemoteFailure::new(message));
        }

        let parsed: FilterResponseBody = response.json().await.map_err(|e| self.describe(e))?;
        let payload = match request.mode {
            CaptureMode::Photo => parsed.processed_image,
            CaptureMode::Video => parsed.processed_video,
        }
        .ok_or_else(|| RemoteFailure::new("AI service returned no processed media"))?;

        let bytes = STANDARD
            .decode(payload.as_bytes())
            .map_err(|e| RemoteFailure::new(format!("Invalid AI service payload: {}", e)))?;
        Ok(AiResponse { payload: bytes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_endpoint_is_a_remote_failure() {
        let service = HttpAiFilterService::new(None, Duration::from_secs(5)).unwrap();
        let request = AiRequest {
            mode: CaptureMode::Photo,
            filter_id: "anime".to_string(),
            model_id: "anime".to_string(),
            payload: vec![0xff, 0xd8],
            settings: BTreeMap::new(),
        };

        let failure = service.process(request).await.unwrap_err();
        assert_eq!(failure.reason, "AI service not configured");
    }

    #[test]
    fn photo_body_uses_image_field() {
        let settings = BTreeMap::from([("saturation".to_string(), 1.5_f32)]);
        let body = FilterRequestBody {
            image: Some("AAEC".to_string()),
            video: None,
            filter: "anime",
            model: "anime",
            settings: &settings,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["image"], "AAEC");
        assert!(json.get("video").is_none());
        assert_eq!(json["settings"]["saturation"], 1.5);
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let service =
            HttpAiFilterService::new(Some("https://ai.example.com/".to_string()), Duration::from_secs(5))
                .unwrap();
        assert_eq!(service.endpoint.as_deref(), Some("https://ai.example.com"));
    }
}
