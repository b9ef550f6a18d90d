// SPDX-License-Identifier: GPL-3.0-only

//! Subscription state mirrored from the backend
//!
//! [`SubscriptionManager`] is the only producer of [`EntitlementSnapshot`]
//! values. It refreshes on start and after every purchase/restore/cancel/plan
//! change, then hands the new snapshot to the orchestrator.

use crate::entitlement::{EntitlementSnapshot, Tier};
use crate::errors::{AppError, AppResult};
use crate::session::AuthSession;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// `GET /subscription/status` response
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStatus {
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default)]
    pub subscription_type: Option<String>,
    #[serde(default)]
    pub current_plan: Option<String>,
}

impl SubscriptionStatus {
    pub fn tier(&self) -> Tier {
        self.subscription_type
            .as_deref()
            .map(Tier::from_subscription_type)
            .unwrap_or_default()
    }

    pub fn entitlement(&self) -> EntitlementSnapshot {
        EntitlementSnapshot::for_tier(self.tier())
    }
}

/// One purchasable price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Price {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Amount in the smallest currency unit
    #[serde(default)]
    pub amount: Option<u64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub interval: Option<String>,
}

#[derive(Deserialize)]
struct PricesBody {
    #[serde(default)]
    prices: Vec<Price>,
}

#[derive(Deserialize)]
struct MessageBody {
    message: Option<String>,
}

/// Remote subscription backend
///
/// Mutations return the backend's message, if it sent one.
#[async_trait]
pub trait SubscriptionBackend: Send + Sync {
    async fn status(&self) -> AppResult<SubscriptionStatus>;
    async fn prices(&self) -> AppResult<Vec<Price>>;
    async fn verify_purchase(&self, receipt: &serde_json::Value) -> AppResult<Option<String>>;
    async fn restore(&self) -> AppResult<Option<String>>;
    async fn cancel(&self) -> AppResult<Option<String>>;
    async fn upgrade(&self, price_id: &str) -> AppResult<Option<String>>;
    async fn downgrade(&self, price_id: &str) -> AppResult<Option<String>>;
}

/// REST client for `/subscription/*`
#[derive(Debug, Clone)]
pub struct HttpSubscriptionBackend {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpSubscriptionBackend {
    pub fn new(base_url: &str, session: Option<&AuthSession>) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: session.map(|s| s.token.clone()),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/subscription/{}", self.base_url, path)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> AppResult<T> {
        let response = self
            .authorize(self.client.get(self.url(path)))
            .send()
            .await
            .map_err(request_error)?;
        let response = check_status(response, path).await?;
        response.json::<T>().await.map_err(request_error)
    }

    async fn post(&self, path: &str, body: Option<serde_json::Value>) -> AppResult<Option<String>> {
        let mut request = self.authorize(self.client.post(self.url(path)));
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await.map_err(request_error)?;
        let response = check_status(response, path).await?;
        let message = response
            .json::<MessageBody>()
            .await
            .ok()
            .and_then(|b| b.message);
        Ok(message)
    }
}

fn request_error(err: reqwest::Error) -> AppError {
    AppError::Subscription(format!("request failed: {}", err))
}

async fn check_status(response: reqwest::Response, path: &str) -> AppResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response
        .json::<MessageBody>()
        .await
        .ok()
        .and_then(|b| b.message)
        .unwrap_or_else(|| format!("{} returned {}", path, status));
    Err(AppError::Subscription(message))
}

#[async_trait]
impl SubscriptionBackend for HttpSubscriptionBackend {
    async fn status(&self) -> AppResult<SubscriptionStatus> {
        self.get_json("status").await
    }

    async fn prices(&self) -> AppResult<Vec<Price>> {
        let body: PricesBody = self.get_json("prices").await?;
        Ok(body.prices)
    }

    async fn verify_purchase(&self, receipt: &serde_json::Value) -> AppResult<Option<String>> {
        self.post("verify-purchase", Some(receipt.clone())).await
    }

    async fn restore(&self) -> AppResult<Option<String>> {
        self.post("restore", None).await
    }

    async fn cancel(&self) -> AppResult<Option<String>> {
        self.post("cancel", None).await
    }

    async fn upgrade(&self, price_id: &str) -> AppResult<Option<String>> {
        self.post("upgrade", Some(serde_json::json!({ "newPriceId": price_id })))
            .await
    }

    async fn downgrade(&self, price_id: &str) -> AppResult<Option<String>> {
        self.post("downgrade", Some(serde_json::json!({ "newPriceId": price_id })))
            .await
    }
}

/// Keeps the current entitlement in sync with the backend
pub struct SubscriptionManager {
    backend: Arc<dyn SubscriptionBackend>,
    status: Option<SubscriptionStatus>,
    snapshot: EntitlementSnapshot,
}

impl SubscriptionManager {
    /// Starts on the free tier until the first refresh succeeds
    pub fn new(backend: Arc<dyn SubscriptionBackend>) -> Self {
        Self {
            backend,
            status: None,
            snapshot: EntitlementSnapshot::free(),
        }
    }

    pub fn snapshot(&self) -> &EntitlementSnapshot {
        &self.snapshot
    }

    pub fn status(&self) -> Option<&SubscriptionStatus> {
        self.status.as_ref()
    }

    /// Initial refresh at session start
    pub async fn start(&mut self) -> EntitlementSnapshot {
        self.refresh().await
    }

    /// Re-read the status; a failure keeps the previous snapshot
    pub async fn refresh(&mut self) -> EntitlementSnapshot {
        match self.backend.status().await {
            Ok(status) => {
                let snapshot = status.entitlement();
                if snapshot != self.snapshot {
                    info!(tier = %snapshot.tier, "Entitlement changed");
                }
                self.snapshot = snapshot;
                self.status = Some(status);
            }
            Err(err) => {
                warn!(error = %err, "Subscription refresh failed, keeping previous entitlement");
            }
        }
        self.snapshot.clone()
    }

    pub async fn prices(&self) -> AppResult<Vec<Price>> {
        self.backend.prices().await
    }

    pub async fn verify_purchase(&mut self, receipt: &serde_json::Value) -> AppResult<Option<String>> {
        let message = self.backend.verify_purchase(receipt).await?;
        self.after_change("verify-purchase").await;
        Ok(message)
    }

    pub async fn restore(&mut self) -> AppResult<Option<String>> {
        let message = self.backend.restore().await?;
        self.after_change("restore").await;
        Ok(message)
    }

    pub async fn cancel(&mut self) -> AppResult<Option<String>> {
        let message = self.backend.cancel().await?;
        self.after_change("cancel").await;
        Ok(message)
    }

    pub async fn upgrade(&mut self, price_id: &str) -> AppResult<Option<String>> {
        let message = self.backend.upgrade(price_id).await?;
        self.after_change("upgrade").await;
        Ok(message)
    }

    pub async fn downgrade(&mut self, price_id: &str) -> AppResult<Option<String>> {
        let message = self.backend.downgrade(price_id).await?;
        self.after_change("downgrade").await;
        Ok(message)
    }

    async fn after_change(&mut self, action: &str) {
        debug!(action, "Subscription changed, refreshing");
        self.refresh().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entitlement::Capability;
    use std::sync::Mutex;

    /// Backend whose status flips to premium after an upgrade
    #[derive(Default)]
    struct FakeBackend {
        premium: Mutex<bool>,
        offline: Mutex<bool>,
    }

    #[async_trait]
    impl SubscriptionBackend for FakeBackend {
        async fn status(&self) -> AppResult<SubscriptionStatus> {
            if *self.offline.lock().unwrap() {
                return Err(AppError::Subscription("offline".to_string()));
            }
            let premium = *self.premium.lock().unwrap();
            Ok(SubscriptionStatus {
                is_premium: premium,
                subscription_type: Some(if premium { "premium" } else { "basic" }.to_string()),
                current_plan: None,
            })
        }

        async fn prices(&self) -> AppResult<Vec<Price>> {
            Ok(Vec::new())
        }

        async fn verify_purchase(&self, _receipt: &serde_json::Value) -> AppResult<Option<String>> {
            Ok(None)
        }

        async fn restore(&self) -> AppResult<Option<String>> {
            Ok(None)
        }

        async fn cancel(&self) -> AppResult<Option<String>> {
            *self.premium.lock().unwrap() = false;
            Ok(Some("Subscription cancelled".to_string()))
        }

        async fn upgrade(&self, _price_id: &str) -> AppResult<Option<String>> {
            *self.premium.lock().unwrap() = true;
            Ok(None)
        }

        async fn downgrade(&self, _price_id: &str) -> AppResult<Option<String>> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn upgrade_refreshes_entitlement() {
        let backend = Arc::new(FakeBackend::default());
        let mut manager = SubscriptionManager::new(backend);

        assert_eq!(manager.start().await.tier, Tier::Free);
        manager.upgrade("price_premium").await.unwrap();
        assert!(manager.snapshot().has(Capability::AiFilters));

        let message = manager.cancel().await.unwrap();
        assert_eq!(message.as_deref(), Some("Subscription cancelled"));
        assert_eq!(manager.snapshot().tier, Tier::Free);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_snapshot() {
        let backend = Arc::new(FakeBackend::default());
        *backend.premium.lock().unwrap() = true;
        let mut manager = SubscriptionManager::new(backend.clone());
        manager.start().await;

        *backend.offline.lock().unwrap() = true;
        let snapshot = manager.refresh().await;
        assert_eq!(snapshot.tier, Tier::Premium);
    }

    #[test]
    fn status_parses_backend_shape() {
        let status: SubscriptionStatus = serde_json::from_str(
            r#"{"isPremium": true, "subscriptionType": "premium", "currentPlan": "monthly"}"#,
        )
        .unwrap();
        assert_eq!(status.tier(), Tier::Premium);
        assert_eq!(SubscriptionStatus::default().tier(), Tier::Free);
    }
}
