//! The Transitland API key and the requests built from it.

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use super::error::{CredentialError, StorageError};
use super::storage::{CREDENTIAL_KEY, CredentialStorage};

/// Sentinel meaning "no key configured yet". Never a working credential.
pub const PLACEHOLDER_KEY: &str = "YOUR_API_KEY_HERE";

/// Key substituted at build time, if any.
const BUILD_TIME_KEY: &str = match option_env!("TRANSITLAND_API_KEY") {
    Some(key) => key,
    None => PLACEHOLDER_KEY,
};

/// Classification of the current credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialState {
    Absent,
    Placeholder,
    Valid,
}

/// Single source of truth for the transit service credential.
///
/// Shared by `Arc` between the orchestrator and the web layer. Reads never
/// touch storage; only construction and `set` do.
#[derive(Debug)]
pub struct CredentialStore {
    key: RwLock<Option<String>>,
    storage: Arc<dyn CredentialStorage>,
    /// Held across the memory update and the persist in `set`, so memory
    /// and storage agree on the last write.
    writer: Mutex<()>,
}

impl CredentialStore {
    /// Load the credential: persisted storage first, then the build-time key.
    pub fn load(storage: Arc<dyn CredentialStorage>) -> Self {
        Self::load_with_fallback(storage, BUILD_TIME_KEY)
    }

    /// Like `load`, with an explicit stand-in for the build-time key.
    pub(crate) fn load_with_fallback(storage: Arc<dyn CredentialStorage>, fallback: &str) -> Self {
        let persisted = match storage.read(CREDENTIAL_KEY) {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(e) => {
                warn!(error = %e, "failed to read persisted credential");
                None
            }
        };

        let key = match persisted {
            Some(key) => {
                debug!("credential loaded from persisted storage");
                Some(key)
            }
            None => {
                let key = resolve_fallback(fallback);
                debug!(found = key.is_some(), "credential resolved from build-time key");
                key
            }
        };

        Self {
            key: RwLock::new(key),
            storage,
            writer: Mutex::new(()),
        }
    }

    /// Store a key in memory and persisted storage (last write wins).
    ///
    /// An empty key clears the credential and removes the persisted entry.
    /// The in-memory value changes even when persisting fails.
    pub fn set(&self, key: &str) -> Result<(), StorageError> {
        let _writer = self.writer.lock();

        if key.is_empty() {
            *self.key.write() = None;
            info!("credential cleared");
            return self.storage.remove(CREDENTIAL_KEY);
        }

        *self.key.write() = Some(key.to_string());
        info!(configured = self.is_configured(), "credential updated");
        self.storage.write(CREDENTIAL_KEY, key)
    }

    /// The current key, if any.
    pub fn get(&self) -> Option<String> {
        self.key.read().clone()
    }

    pub fn state(&self) -> CredentialState {
        match self.key.read().as_deref() {
            None => CredentialState::Absent,
            Some(PLACEHOLDER_KEY) => CredentialState::Placeholder,
            Some(_) => CredentialState::Valid,
        }
    }

    /// True iff a key is present and isn't the placeholder.
    pub fn is_configured(&self) -> bool {
        self.state() == CredentialState::Valid
    }

    /// JSON request headers, plus a bearer `Authorization` when configured.
    ///
    /// A key that can't be represented as a header value is left out rather
    /// than sent mangled.
    pub fn build_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(key) = self.configured_key() {
            match HeaderValue::from_str(&format!("Bearer {key}")) {
                Ok(mut value) => {
                    value.set_sensitive(true);
                    headers.insert(AUTHORIZATION, value);
                }
                Err(_) => warn!("credential is not a valid header value; omitting Authorization"),
            }
        }

        headers
    }

    /// Build a request URL: `api_key` first when configured, then every
    /// non-null parameter in the order given.
    ///
    /// String values are appended as-is; other values use their JSON text.
    pub fn build_url(&self, endpoint: &str, params: &[(&str, Value)]) -> Result<Url, CredentialError> {
        let mut url = Url::parse(endpoint).map_err(|e| CredentialError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })?;

        {
            let mut query = url.query_pairs_mut();
            if let Some(key) = self.configured_key() {
                query.append_pair("api_key", &key);
            }
            for (name, value) in params {
                match value {
                    Value::Null => {}
                    Value::String(s) => {
                        query.append_pair(name, s);
                    }
                    other => {
                        query.append_pair(name, &other.to_string());
                    }
                }
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }

        Ok(url)
    }

    fn configured_key(&self) -> Option<String> {
        self.get().filter(|key| key != PLACEHOLDER_KEY)
    }
}

/// The build-time key, with the placeholder resolved to absent.
fn resolve_fallback(raw: &str) -> Option<String> {
    if raw.is_empty() || raw == PLACEHOLDER_KEY {
        None
    } else {
        Some(raw.to_string())
    }
}
