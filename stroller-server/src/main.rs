use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use stroller_server::cache::CachedGeocoder;
use stroller_server::capabilities::{MockGeocoder, MockRouteQuery};
use stroller_server::config::ServerConfig;
use stroller_server::credentials::dev_env::load_dev_env;
use stroller_server::credentials::{CredentialStore, FileStorage};
use stroller_server::orchestrator::RouteOrchestrator;
use stroller_server::web::{AppState, create_router};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("stroller_server=info,tower_http=info")),
        )
        .init();

    let config = ServerConfig::from_env()?;

    // Load the credential: persisted key, then build-time key, then dev env file
    let storage = Arc::new(FileStorage::new(config.storage_path.clone()));
    let credentials = Arc::new(CredentialStore::load(storage));
    if let Err(e) = load_dev_env(&config.dev_env_path, &credentials) {
        warn!(error = %e, "dev env key not loaded");
    }
    if !credentials.is_configured() {
        warn!("Transitland API key not configured; route searches will fail until one is set");
    }
    info!(base_url = config.endpoints.base_url(), "using Transitland endpoints");

    // Mock capabilities stand in for the transit data provider
    let geocoder = CachedGeocoder::new(MockGeocoder::new(), &config.cache);
    let route_query = MockRouteQuery::new(config.route_query.clone());

    let orchestrator = RouteOrchestrator::new(credentials, Arc::new(geocoder), Arc::new(route_query));
    let state = AppState::new(orchestrator);

    let app = create_router(state, &config.static_dir);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    info!(addr = %config.addr, "Stroller Transit listening on http://{}", config.addr);
    axum::serve(listener, app).await?;

    Ok(())
}
