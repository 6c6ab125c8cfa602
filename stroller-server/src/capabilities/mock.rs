//! Mock capabilities for running without a transit data provider.
//!
//! Both mocks are deterministic: the same inputs always produce the same
//! coordinates and routes, which keeps the geocode cache meaningful and
//! makes the UI reproducible during development.

use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::domain::{Accessibility, Coordinate, RouteOption, RouteQueryOptions, RouteResult};

use super::error::{GeocodeError, RouteQueryError};
use super::{Geocoder, RouteQuery};

/// Centre of the mock geocoding area (lower Manhattan).
const MOCK_CENTRE: (f64, f64) = (40.7128, -74.0060);

/// Total width in degrees of the box mock coordinates fall in.
const MOCK_SPREAD_DEGREES: f64 = 0.1;

/// Default simulated latency for the route query.
pub const DEFAULT_ROUTE_LATENCY: Duration = Duration::from_millis(1500);

/// Mock geocoder returning coordinates around New York City.
///
/// Unknown addresses map to a point within ±0.05° of the centre derived
/// from a hash of the normalized address. Specific addresses can be pinned
/// to a coordinate or made to fail.
#[derive(Debug, Clone, Default)]
pub struct MockGeocoder {
    fixed: HashMap<String, Coordinate>,
    failures: HashMap<String, String>,
}

impl MockGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always resolve `address` to `coordinate`.
    pub fn with_fixed(mut self, address: &str, coordinate: Coordinate) -> Self {
        self.fixed.insert(normalize(address), coordinate);
        self
    }

    /// Always fail to resolve `address` with `message`.
    pub fn with_failure(mut self, address: &str, message: impl Into<String>) -> Self {
        self.failures.insert(normalize(address), message.into());
        self
    }
}

#[async_trait]
impl Geocoder for MockGeocoder {
    #[instrument(skip(self))]
    async fn geocode(&self, address: &str) -> Result<Coordinate, GeocodeError> {
        let key = normalize(address);

        if let Some(message) = self.failures.get(&key) {
            return Err(GeocodeError::new(message.clone()));
        }
        if let Some(coordinate) = self.fixed.get(&key) {
            return Ok(*coordinate);
        }

        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        let hash = hasher.finish();

        let lat = MOCK_CENTRE.0 + spread(hash);
        let lon = MOCK_CENTRE.1 + spread(hash >> 16);
        let coordinate = Coordinate::new(lat, lon)?;
        debug!(%coordinate, "mock geocoded");
        Ok(coordinate)
    }
}

/// Configuration for the mock route query.
#[derive(Debug, Clone)]
pub struct MockRouteQueryConfig {
    /// Delay before the route is returned.
    pub latency: Duration,
}

impl Default for MockRouteQueryConfig {
    fn default() -> Self {
        Self {
            latency: DEFAULT_ROUTE_LATENCY,
        }
    }
}

impl MockRouteQueryConfig {
    /// Set the simulated latency.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

/// Mock route query returning a fixed two-line route.
///
/// The accessibility flags echo the requested options. Distance is the
/// great-circle distance (at least one mile) and duration grows with it.
#[derive(Debug, Clone, Default)]
pub struct MockRouteQuery {
    config: MockRouteQueryConfig,
}

impl MockRouteQuery {
    pub fn new(config: MockRouteQueryConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl RouteQuery for MockRouteQuery {
    #[instrument(skip(self))]
    async fn route_query(
        &self,
        from: Coordinate,
        to: Coordinate,
        options: RouteQueryOptions,
    ) -> Result<RouteResult, RouteQueryError> {
        if !self.config.latency.is_zero() {
            tokio::time::sleep(self.config.latency).await;
        }

        let route_options = vec![
            RouteOption::new(
                "L Train",
                "Manhattan-bound",
                stops(&["Bedford Ave", "1st Ave", "Union Square"]),
            )?,
            RouteOption::new(
                "4/5/6 Express",
                "Uptown",
                stops(&["Union Square", "Grand Central", "Times Square"]),
            )?,
        ];

        let distance_miles = (from.distance_miles(&to).max(1.0) * 10.0).round() / 10.0;
        let duration_minutes = 15 + (distance_miles * 4.0).round() as u32;

        Ok(RouteResult {
            duration_minutes,
            distance_miles,
            transfer_count: route_options.len().saturating_sub(1) as u32,
            accessibility: Accessibility {
                stroller_friendly: options.stroller_accessible,
                has_elevators: options.elevator_access,
            },
            options: route_options,
        })
    }
}

fn normalize(address: &str) -> String {
    address.trim().to_lowercase()
}

/// Map 16 bits of `bits` onto [-spread/2, spread/2].
fn spread(bits: u64) -> f64 {
    let unit = (bits & 0xFFFF) as f64 / 65535.0;
    (unit - 0.5) * MOCK_SPREAD_DEGREES
}

fn stops(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| (*s).to_string()).collect()
}
