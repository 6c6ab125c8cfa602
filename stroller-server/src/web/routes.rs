//! HTTP route handlers.

use askama::Template;
use axum::body::Bytes;
use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::credentials::StorageError;
use crate::domain::RouteRequest;
use crate::orchestrator::RunError;

use super::dto::*;
use super::state::AppState;
use super::templates::*;

/// Create the application router.
///
/// `static_dir` is the path to the static assets directory.
pub fn create_router(state: AppState, static_dir: &str) -> Router {
    Router::new()
        .route("/", get(index_page))
        .route("/health", get(health))
        .route("/route", post(find_route))
        .route("/route/cancel", post(cancel_route))
        .route("/api/state", get(lookup_state))
        .route("/api/credential", get(credential_status).post(set_credential))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Index page with the route form and the current result.
async fn index_page(State(state): State<AppState>) -> impl IntoResponse {
    let template = IndexTemplate {
        configured: state.credentials.is_configured(),
        result: ResultView::from_state(&state.orchestrator.state()),
    };
    Html(
        template
            .render()
            .unwrap_or_else(|e| format!("Template error: {}", e)),
    )
}

/// Check if request accepts HTML.
fn accepts_html(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("text/html"))
}

/// Check if the request body is JSON.
fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"))
}

/// Parse a route request from a JSON or URL-encoded form body.
fn parse_route_request(headers: &HeaderMap, body: &Bytes) -> Result<RouteRequest, AppError> {
    if is_json(headers) {
        return serde_json::from_slice(body).map_err(|e| {
            warn!(error = %e, "invalid route request JSON");
            AppError::BadRequest {
                message: format!("Invalid JSON: {e}"),
            }
        });
    }

    let pairs: Vec<_> = url::form_urlencoded::parse(body).collect();
    let form = RouteForm::from_pairs(pairs.iter().map(|(k, v)| (k.as_ref(), v.as_ref())));
    Ok(form.into())
}

/// Run a route search and return the state it ended in.
async fn find_route(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let request = parse_route_request(&headers, &body)?;
    let outcome = state.orchestrator.run(request).await?;

    // Return HTML or JSON based on Accept header
    if accepts_html(&headers) {
        let template = RouteResultTemplate {
            result: ResultView::from_state(&outcome),
        };
        let html = template.render().map_err(|e| AppError::Internal {
            message: format!("Template error: {}", e),
        })?;

        Ok(Html(html).into_response())
    } else {
        Ok(Json(LookupStateResponse::from(&outcome)).into_response())
    }
}

/// Cancel the in-flight route search.
async fn cancel_route(State(state): State<AppState>) -> Json<CancelResponse> {
    Json(CancelResponse {
        cancelled: state.orchestrator.cancel(),
    })
}

/// Current lookup state.
async fn lookup_state(State(state): State<AppState>) -> Json<LookupStateResponse> {
    Json(LookupStateResponse::from(&state.orchestrator.state()))
}

/// Whether a usable API key is configured.
async fn credential_status(State(state): State<AppState>) -> Json<CredentialResponse> {
    Json(CredentialResponse::from(state.credentials.as_ref()))
}

/// Set (or with an empty key, clear) the API key.
async fn set_credential(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<CredentialResponse>, AppError> {
    let req: CredentialRequest = serde_json::from_slice(&body).map_err(|e| AppError::BadRequest {
        message: format!("Invalid JSON: {e}"),
    })?;

    state.credentials.set(req.key.trim())?;

    Ok(Json(CredentialResponse::from(state.credentials.as_ref())))
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    Conflict { message: String },
    Internal { message: String },
}

impl From<RunError> for AppError {
    fn from(e: RunError) -> Self {
        match e {
            RunError::AlreadyInProgress => AppError::Conflict {
                message: e.to_string(),
            },
        }
    }
}

impl From<StorageError> for AppError {
    fn from(e: StorageError) -> Self {
        AppError::Internal {
            message: e.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::Conflict { message } => (StatusCode::CONFLICT, message),
            AppError::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        if status.is_server_error() {
            error!(%status, %message, "request failed");
        } else {
            warn!(%status, %message, "request rejected");
        }

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}
