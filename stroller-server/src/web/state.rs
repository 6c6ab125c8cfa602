//! Application state for the web layer.

use std::sync::Arc;

use crate::credentials::CredentialStore;
use crate::orchestrator::RouteOrchestrator;

/// Shared application state.
///
/// Handlers reach the credential store through the same `Arc` the
/// orchestrator checks against.
#[derive(Clone)]
pub struct AppState {
    /// Route lookup lifecycle
    pub orchestrator: Arc<RouteOrchestrator>,

    /// Transit service credential
    pub credentials: Arc<CredentialStore>,
}

impl AppState {
    /// Create a new app state.
    pub fn new(orchestrator: RouteOrchestrator) -> Self {
        let credentials = orchestrator.credentials().clone();
        Self {
            orchestrator: Arc::new(orchestrator),
            credentials,
        }
    }
}
