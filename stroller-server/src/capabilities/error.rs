//! Capability error types.

use crate::domain::{InvalidCoordinate, InvalidRouteOption};

/// A geocoding lookup failed.
///
/// The message is shown to the user as-is, so it should read as a sentence.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct GeocodeError {
    message: String,
}

impl GeocodeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<InvalidCoordinate> for GeocodeError {
    fn from(err: InvalidCoordinate) -> Self {
        Self::new(err.to_string())
    }
}

/// A route query failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct RouteQueryError {
    message: String,
}

impl RouteQueryError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<InvalidRouteOption> for RouteQueryError {
    fn from(err: InvalidRouteOption) -> Self {
        Self::new(err.to_string())
    }
}
