//! Route results returned by the route query.

use serde::Serialize;

/// Error returned when a route option has no stops.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("route option for {line_name} must have at least one stop")]
pub struct InvalidRouteOption {
    line_name: String,
}

/// One line ridden as part of a route.
///
/// Guaranteed to list at least one stop.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteOption {
    line_name: String,
    direction: String,
    stops: Vec<String>,
}

impl RouteOption {
    pub fn new(
        line_name: impl Into<String>,
        direction: impl Into<String>,
        stops: Vec<String>,
    ) -> Result<Self, InvalidRouteOption> {
        let line_name = line_name.into();
        if stops.is_empty() {
            return Err(InvalidRouteOption { line_name });
        }
        Ok(Self {
            line_name,
            direction: direction.into(),
            stops,
        })
    }

    pub fn line_name(&self) -> &str {
        &self.line_name
    }

    pub fn direction(&self) -> &str {
        &self.direction
    }

    /// Stops in riding order.
    pub fn stops(&self) -> &[String] {
        &self.stops
    }
}

/// Accessibility metadata for a whole route.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Accessibility {
    pub stroller_friendly: bool,
    pub has_elevators: bool,
}

/// A complete route between two coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteResult {
    pub duration_minutes: u32,
    /// Never negative.
    pub distance_miles: f64,
    pub transfer_count: u32,
    pub accessibility: Accessibility,
    /// Lines ridden, in order.
    pub options: Vec<RouteOption>,
}
