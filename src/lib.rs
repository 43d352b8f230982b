use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
};

use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;

// Module for routing segregation (Public, Admin).
pub mod routes;
use routes::{admin, public};

// --- Public Re-exports ---

// Makes core state types easily accessible to the main application entry point (main.rs).
pub use config::AppConfig;
pub use error::AppError;
pub use repository::{RepositoryState, SqliteRepository, connect_pool};

/// AppState
///
/// Implements the **Unified State Pattern**. This is the single, thread-safe, and
/// immutable container holding all essential application services and configuration,
/// constructed once at startup and injected into every handler — no ambient globals.
#[derive(Clone)]
pub struct AppState {
    /// Repository Layer: Abstracts database access via the SQLite connection pool.
    pub repo: RepositoryState,
    /// Configuration: The loaded, immutable environment configuration.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// These implementations allow extractors to selectively pull components from the
// shared AppState; the session extractors need the repository (user lookup) and
// the config (cookie signing secret) without seeing the rest of the state.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the application's entire routing structure, applies the
/// observability middleware, and registers the application state.
pub fn create_router(state: AppState) -> Router {
    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 1. Base Router Assembly
    let base_router = Router::new()
        // Public Routes: the reading surface and the identity gateways.
        .merge(public::public_routes())
        // Admin Routes: merged at the root (the original URL layout keeps
        // /new-post, /edit-post, /delete at the top level); each handler is
        // guarded by the AdminUser extractor rather than a path prefix.
        .merge(admin::admin_routes())
        // Apply the Unified State to all routes.
        .with_state(state);

    // 2. Observability and Correlation Layers (Applied outermost/first)
    base_router.layer(
        ServiceBuilder::new()
            // 2a. Request ID Generation: a unique UUID for every incoming request.
            .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
            // 2b. Request Tracing: wraps the request/response lifecycle in a span
            // carrying the generated request ID.
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(trace_span_logger)
                    .on_response(
                        DefaultOnResponse::new()
                            .level(Level::INFO)
                            .latency_unit(tower_http::LatencyUnit::Millis),
                    ),
            )
            // 2c. Request ID Propagation: returns x-request-id to the client.
            .layer(PropagateRequestIdLayer::new(x_request_id)),
    )
}

/// trace_span_logger
///
/// Helper used by `TraceLayer` to customize span creation: the `x-request-id`
/// header (if present) joins the HTTP method and URI in the structured logging
/// metadata, so every log line for a single request is correlated by one ID.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
