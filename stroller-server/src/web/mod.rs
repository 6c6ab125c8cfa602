//! Web layer for the stroller transit planner.
//!
//! Serves the route form and renders lookup results.

mod dto;
mod routes;
mod state;
pub mod templates;

pub use dto::*;
pub use routes::create_router;
pub use state::AppState;
pub use templates::*;
