//! Route requests submitted by the UI.

use serde::{Deserialize, Serialize};

/// Why a route request was rejected before any lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationError {
    #[error("origin address must not be empty")]
    EmptyOrigin,

    #[error("destination address must not be empty")]
    EmptyDestination,
}

/// Accessibility preferences forwarded to the route query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteQueryOptions {
    pub stroller_accessible: bool,
    pub elevator_access: bool,
}

/// A start/destination pair plus accessibility preferences.
///
/// This is the only input the orchestrator accepts from the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRequest {
    pub origin: String,
    pub destination: String,
    #[serde(default)]
    pub stroller_accessible: bool,
    #[serde(default)]
    pub elevator_access: bool,
}

impl RouteRequest {
    /// Create a request with no accessibility preferences.
    pub fn new(origin: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            stroller_accessible: false,
            elevator_access: false,
        }
    }

    pub fn with_stroller_accessible(mut self, yes: bool) -> Self {
        self.stroller_accessible = yes;
        self
    }

    pub fn with_elevator_access(mut self, yes: bool) -> Self {
        self.elevator_access = yes;
        self
    }

    /// Check that both addresses are non-empty after trimming.
    ///
    /// The origin is checked first, so a request with both fields blank
    /// reports `EmptyOrigin`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.origin.trim().is_empty() {
            return Err(ValidationError::EmptyOrigin);
        }
        if self.destination.trim().is_empty() {
            return Err(ValidationError::EmptyDestination);
        }
        Ok(())
    }

    /// Origin address with surrounding whitespace removed.
    pub fn origin(&self) -> &str {
        self.origin.trim()
    }

    /// Destination address with surrounding whitespace removed.
    pub fn destination(&self) -> &str {
        self.destination.trim()
    }

    pub fn query_options(&self) -> RouteQueryOptions {
        RouteQueryOptions {
            stroller_accessible: self.stroller_accessible,
            elevator_access: self.elevator_access,
        }
    }
}
