//! Lifecycle state published by the orchestrator.

use crate::capabilities::{GeocodeError, RouteQueryError};
use crate::domain::{RouteResult, ValidationError};

/// Why an attempt ended without a route.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupFailure {
    /// Origin or destination was blank
    #[error("validation")]
    Validation(ValidationError),

    /// No usable API key at dispatch time
    #[error("no-credential")]
    NoCredential,

    /// The attempt was cancelled while loading
    #[error("cancelled")]
    Cancelled,

    /// Either geocode lookup failed
    #[error("{0}")]
    Geocode(GeocodeError),

    /// The route query failed
    #[error("{0}")]
    RouteQuery(RouteQueryError),
}

impl LookupFailure {
    /// Machine-readable reason: `validation`, `no-credential`, `cancelled`,
    /// or the underlying lookup message.
    pub fn reason(&self) -> &str {
        match self {
            LookupFailure::Validation(_) => "validation",
            LookupFailure::NoCredential => "no-credential",
            LookupFailure::Cancelled => "cancelled",
            LookupFailure::Geocode(e) => e.message(),
            LookupFailure::RouteQuery(e) => e.message(),
        }
    }

    /// Sentence suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            LookupFailure::Validation(_) => {
                "Please enter both starting and destination addresses.".to_string()
            }
            LookupFailure::NoCredential => {
                "Transitland API key not configured. Please set up your API key.".to_string()
            }
            LookupFailure::Cancelled => "The route search was cancelled.".to_string(),
            LookupFailure::Geocode(e) => e.message().to_string(),
            LookupFailure::RouteQuery(e) => e.message().to_string(),
        }
    }
}

/// Where the single route-finding attempt currently stands.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LookupState {
    #[default]
    Idle,
    Loading,
    Success(RouteResult),
    Failure(LookupFailure),
}

impl LookupState {
    pub fn is_loading(&self) -> bool {
        matches!(self, LookupState::Loading)
    }

    /// True for `Success` and `Failure`.
    pub fn is_finished(&self) -> bool {
        matches!(self, LookupState::Success(_) | LookupState::Failure(_))
    }

    pub fn result(&self) -> Option<&RouteResult> {
        match self {
            LookupState::Success(result) => Some(result),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&LookupFailure> {
        match self {
            LookupState::Failure(failure) => Some(failure),
            _ => None,
        }
    }

    /// Short status name: `idle`, `loading`, `success` or `failure`.
    pub fn status(&self) -> &'static str {
        match self {
            LookupState::Idle => "idle",
            LookupState::Loading => "loading",
            LookupState::Success(_) => "success",
            LookupState::Failure(_) => "failure",
        }
    }
}
