//! Lookup capabilities injected into the orchestrator.
//!
//! The orchestrator never talks to a network itself. It is handed a
//! [`Geocoder`] and a [`RouteQuery`] at construction; the binary wires the
//! deterministic mocks from [`mock`], tests wire their own doubles, and a
//! real client can be substituted without touching the state machine.

mod error;
pub mod mock;

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{Coordinate, RouteQueryOptions, RouteResult};

pub use error::{GeocodeError, RouteQueryError};
pub use mock::{DEFAULT_ROUTE_LATENCY, MockGeocoder, MockRouteQuery, MockRouteQueryConfig};

/// Resolves a free-text address to a coordinate.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<Coordinate, GeocodeError>;
}

/// Finds a transit route between two coordinates.
#[async_trait]
pub trait RouteQuery: Send + Sync {
    async fn route_query(
        &self,
        from: Coordinate,
        to: Coordinate,
        options: RouteQueryOptions,
    ) -> Result<RouteResult, RouteQueryError>;
}

#[async_trait]
impl<T: Geocoder + ?Sized> Geocoder for Arc<T> {
    async fn geocode(&self, address: &str) -> Result<Coordinate, GeocodeError> {
        (**self).geocode(address).await
    }
}

#[async_trait]
impl<T: RouteQuery + ?Sized> RouteQuery for Arc<T> {
    async fn route_query(
        &self,
        from: Coordinate,
        to: Coordinate,
        options: RouteQueryOptions,
    ) -> Result<RouteResult, RouteQueryError> {
        (**self).route_query(from, to, options).await
    }
}
