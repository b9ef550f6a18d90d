// SPDX-License-Identifier: GPL-3.0-only

//! Auth session and secure credential storage
//!
//! The session is a plain value loaded from a [`CredentialStore`] and handed
//! to whoever needs it (the subscription backend). Nothing reads it from
//! ambient state.
//!
//! [`restore_session`] is the entry point at startup: it loads the stored
//! session and, within a minute of expiry, exchanges the refresh token for a
//! new one through a [`SessionRefresher`].

use crate::constants::session::REFRESH_MARGIN_SECS;
use crate::errors::{AppError, AppResult};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info, warn};

/// Keys used in the credential store
pub mod keys {
    pub const USER_TOKEN: &str = "userToken";
    pub const REFRESH_TOKEN: &str = "refreshToken";
    pub const SESSION_EXPIRY: &str = "sessionExpiry";
}

/// Secure key/value storage for credentials
pub trait CredentialStore: Send + Sync {
    fn get(&self, key: &str) -> AppResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> AppResult<()>;
    fn delete(&self, key: &str) -> AppResult<()>;
}

/// In-process store, lost on exit
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> AppResult<()> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.remove(key);
        Ok(())
    }
}

/// JSON file store readable only by the owner
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// `<data_dir>/filtercam/credentials.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join("filtercam").join("credentials.json"))
    }

    fn read_all(&self) -> AppResult<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        serde_json::from_str(&content)
            .map_err(|e| AppError::Session(format!("corrupt credential store: {}", e)))
    }

    fn write_all(&self, values: &BTreeMap<String, String>) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(values)
            .map_err(|e| AppError::Session(e.to_string()))?;

        // Written beside the target and renamed over it, so the tokens never
        // sit in a file readable by others
        let staging = self.path.with_extension("json.tmp");
        match std::fs::remove_file(&staging) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => return Err(e.into()),
            _ => {}
        }
        let mut file = owner_only().open(&staging)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
        drop(file);
        std::fs::rename(&staging, &self.path)?;
        Ok(())
    }

    fn update(&self, apply: impl FnOnce(&mut BTreeMap<String, String>)) -> AppResult<()> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut values = self.read_all()?;
        apply(&mut values);
        self.write_all(&values)
    }
}

/// Options creating a new file with mode 0600 on unix
fn owner_only() -> OpenOptions {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options
}

impl CredentialStore for FileCredentialStore {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.read_all()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        self.update(|values| {
            values.insert(key.to_string(), value.to_string());
        })
    }

    fn delete(&self, key: &str) -> AppResult<()> {
        self.update(|values| {
            values.remove(key);
        })
    }
}

/// Signed-in user session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub token: String,
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl AuthSession {
    /// Read the session from `store`; `None` when signed out
    pub fn load(store: &dyn CredentialStore) -> AppResult<Option<Self>> {
        let Some(token) = store.get(keys::USER_TOKEN)? else {
            return Ok(None);
        };
        let Some(expiry) = store.get(keys::SESSION_EXPIRY)? else {
            debug!("Stored token has no expiry, treating as signed out");
            return Ok(None);
        };
        let expires_at = parse_expiry(&expiry)?;

        Ok(Some(Self {
            token,
            refresh_token: store.get(keys::REFRESH_TOKEN)?,
            expires_at,
        }))
    }

    pub fn save(&self, store: &dyn CredentialStore) -> AppResult<()> {
        store.set(keys::USER_TOKEN, &self.token)?;
        store.set(keys::SESSION_EXPIRY, &self.expires_at.to_rfc3339())?;
        match &self.refresh_token {
            Some(refresh) => store.set(keys::REFRESH_TOKEN, refresh)?,
            None => store.delete(keys::REFRESH_TOKEN)?,
        }
        info!(expires_at = %self.expires_at, "Session saved");
        Ok(())
    }

    /// Remove every session key
    pub fn clear(store: &dyn CredentialStore) -> AppResult<()> {
        store.delete(keys::USER_TOKEN)?;
        store.delete(keys::REFRESH_TOKEN)?;
        store.delete(keys::SESSION_EXPIRY)?;
        info!("Session cleared");
        Ok(())
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// True within one minute of expiry
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(REFRESH_MARGIN_SECS) >= self.expires_at
    }
}

fn parse_expiry(value: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| AppError::Session(format!("invalid session expiry: {}", e)))
}

/// Exchanges a refresh token for a new session
#[async_trait]
pub trait SessionRefresher: Send + Sync {
    async fn refresh(&self, refresh_token: &str) -> AppResult<AuthSession>;
}

const REFRESH_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// `POST {api_url}/auth/refresh`
#[derive(Debug, Clone)]
pub struct HttpSessionRefresher {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshBody {
    token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    expiry: String,
}

#[derive(Deserialize)]
struct MessageBody {
    message: Option<String>,
}

impl HttpSessionRefresher {
    pub fn new(base_url: &str) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(REFRESH_TIMEOUT)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl SessionRefresher for HttpSessionRefresher {
    async fn refresh(&self, refresh_token: &str) -> AppResult<AuthSession> {
        let response = self
            .client
            .post(format!("{}/auth/refresh", self.base_url))
            .json(&serde_json::json!({ "refreshToken": refresh_token }))
            .send()
            .await
            .map_err(|e| AppError::Session(format!("refresh request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<MessageBody>()
                .await
                .ok()
                .and_then(|b| b.message)
                .unwrap_or_else(|| format!("Session refresh failed ({})", status));
            return Err(AppError::Session(message));
        }

        let body: RefreshBody = response
            .json()
            .await
            .map_err(|e| AppError::Session(format!("invalid refresh response: {}", e)))?;
        Ok(AuthSession {
            token: body.token,
            refresh_token: body.refresh_token,
            expires_at: parse_expiry(&body.expiry)?,
        })
    }
}

/// Load the stored session, refreshing it when it is about to expire
///
/// A refreshed session is written back to `store`. A failed refresh signs the
/// user out and yields `None`, as does an expired session without a refresh
/// token.
pub async fn restore_session(
    store: &dyn CredentialStore,
    refresher: &dyn SessionRefresher,
    now: DateTime<Utc>,
) -> AppResult<Option<AuthSession>> {
    let Some(session) = AuthSession::load(store)? else {
        return Ok(None);
    };
    if !session.needs_refresh(now) {
        return Ok(Some(session));
    }

    let Some(refresh_token) = session.refresh_token.clone() else {
        if session.is_expired(now) {
            info!("Session expired and cannot be refreshed");
            AuthSession::clear(store)?;
            return Ok(None);
        }
        return Ok(Some(session));
    };

    match refresher.refresh(&refresh_token).await {
        Ok(mut renewed) => {
            renewed.refresh_token.get_or_insert(refresh_token);
            renewed.save(store)?;
            info!(expires_at = %renewed.expires_at, "Session refreshed");
            Ok(Some(renewed))
        }
        Err(err) => {
            warn!(error = %err, "Session refresh failed, signing out");
            AuthSession::clear(store)?;
            Ok(None)
        }
    }
}
