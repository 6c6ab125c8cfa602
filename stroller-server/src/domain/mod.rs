//! Domain types for the stroller-friendly route finder.
//!
//! Value types here validate their invariants at construction time, so
//! the orchestrator and the capabilities can pass them around without
//! re-checking.

mod coordinate;
mod request;
mod route;

pub use coordinate::{Coordinate, InvalidCoordinate};
pub use request::{RouteQueryOptions, RouteRequest, ValidationError};
pub use route::{Accessibility, InvalidRouteOption, RouteOption, RouteResult};
