//! REST API exposing reconciled records to the presentation layer.
//!
//! Endpoints:
//! - `GET /api/records` - current versioned snapshot; `?limit=N` raises
//!   the poller's fetch limit for subsequent ticks (additive load-more)
//! - `GET /api/health` - liveness probe
//!
//! Everything else the dashboard does (auth, bot control, config edits,
//! log streaming) lives outside this service.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::info;

use crate::poller::{LimitHandle, SnapshotStore};

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ServerState {
    pub store: Arc<SnapshotStore>,
    pub limit: LimitHandle,
}

impl ServerState {
    pub fn new(store: Arc<SnapshotStore>, limit: LimitHandle) -> Self {
        Self { store, limit }
    }
}

/// Query parameters for the records endpoint.
#[derive(Debug, Deserialize)]
pub struct RecordsParams {
    /// Requested fetch limit. Values above the current one widen the
    /// poll window; lower values are ignored.
    pub limit: Option<u32>,
}

/// GET /api/records - the current snapshot.
async fn get_records(
    State(state): State<Arc<ServerState>>,
    Query(params): Query<RecordsParams>,
) -> impl IntoResponse {
    if let Some(limit) = params.limit {
        state.limit.raise(limit);
    }
    Json(state.store.snapshot())
}

/// GET /api/health - liveness probe.
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Configuration for the REST API server.
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// Port to listen on.
    pub port: u16,
    /// Enable CORS for frontend development.
    pub enable_cors: bool,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            port: 3010,
            enable_cors: true,
        }
    }
}

/// Create the API router with all endpoints.
pub fn create_api_router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/records", get(get_records))
        .with_state(state)
}

/// Run the API server until the process exits.
pub async fn run_api_server(config: ApiServerConfig, state: ServerState) -> anyhow::Result<()> {
    let app = create_api_router(Arc::new(state));

    let app = if config.enable_cors {
        use tower_http::cors::{Any, CorsLayer};
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app.layer(cors)
    } else {
        app
    };

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(port = config.port, "Reconciliation API server started");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Spawn the API server as a background task.
pub fn spawn_api_server(
    config: ApiServerConfig,
    state: ServerState,
) -> tokio::task::JoinHandle<anyhow::Result<()>> {
    tokio::spawn(async move { run_api_server(config, state).await })
}
