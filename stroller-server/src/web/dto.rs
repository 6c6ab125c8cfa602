//! Data transfer objects for the HTTP API.

use serde::{Deserialize, Serialize};

use crate::credentials::{CredentialState, CredentialStore};
use crate::domain::{RouteRequest, RouteResult};
use crate::orchestrator::LookupState;

/// Value a checked HTML checkbox submits.
const CHECKBOX_ON: &str = "on";

/// The route form as submitted by the browser.
///
/// Unchecked checkboxes are absent from the submission.
#[derive(Debug, Default)]
pub struct RouteForm {
    pub from_address: String,
    pub to_address: String,
    pub stroller_accessible: Option<String>,
    pub elevator_access: Option<String>,
}

impl RouteForm {
    /// Build from `application/x-www-form-urlencoded` pairs.
    ///
    /// Unknown fields are ignored; a repeated field keeps its last value.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut form = Self::default();
        for (name, value) in pairs {
            match name {
                "fromAddress" => form.from_address = value.to_string(),
                "toAddress" => form.to_address = value.to_string(),
                "strollerAccessible" => form.stroller_accessible = Some(value.to_string()),
                "elevatorAccess" => form.elevator_access = Some(value.to_string()),
                _ => {}
            }
        }
        form
    }
}

impl From<RouteForm> for RouteRequest {
    fn from(form: RouteForm) -> Self {
        RouteRequest::new(form.from_address, form.to_address)
            .with_stroller_accessible(form.stroller_accessible.as_deref() == Some(CHECKBOX_ON))
            .with_elevator_access(form.elevator_access.as_deref() == Some(CHECKBOX_ON))
    }
}

/// JSON rendering of a [`LookupState`].
#[derive(Debug, Serialize)]
pub struct LookupStateResponse {
    /// `idle`, `loading`, `success` or `failure`
    pub status: &'static str,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<RouteResult>,

    /// Machine-readable failure reason
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Failure message for display
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<&LookupState> for LookupStateResponse {
    fn from(state: &LookupState) -> Self {
        let failure = state.failure();
        Self {
            status: state.status(),
            result: state.result().cloned(),
            reason: failure.map(|f| f.reason().to_string()),
            message: failure.map(|f| f.user_message()),
        }
    }
}

/// Request to set the API key. An empty key clears it.
#[derive(Debug, Deserialize)]
pub struct CredentialRequest {
    pub key: String,
}

/// Credential status. The key itself is never returned.
#[derive(Debug, Serialize)]
pub struct CredentialResponse {
    pub configured: bool,
    pub state: CredentialState,
}

impl From<&CredentialStore> for CredentialResponse {
    fn from(store: &CredentialStore) -> Self {
        let state = store.state();
        Self {
            configured: state == CredentialState::Valid,
            state,
        }
    }
}

/// Result of a cancel request.
#[derive(Debug, Serialize)]
pub struct CancelResponse {
    /// Whether a loading attempt was cancelled
    pub cancelled: bool,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}
