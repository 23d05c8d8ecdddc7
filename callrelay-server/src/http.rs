//! callrelay HTTP API
//!
//! Axum server for the voice-platform webhook and the dashboard read
//! endpoints. Each endpoint is a thin axum handler delegating to a function in
//! `subsystems` that returns `(StatusCode, Value)`, so the logic is testable
//! without the router.
//!
//! Endpoints:
//! - POST /webhook/vapi-call: normalize a call event and create a CRM contact
//! - GET  /api/ghl/contacts: CRM contacts for the dashboard
//! - GET  /api/monday: merged board items for the dashboard
//! - GET  /health: liveness plus which integrations are configured
//! - anything else: static dashboard files, SPA fallback to index.html

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use callrelay_core::{BoardAggregator, CrmGateway, RelayConfig, RelayError};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::subsystems::{dashboard, webhook};

/// Shared state for all HTTP handlers
pub struct AppState {
    pub crm: CrmGateway,
    pub boards: BoardAggregator,
    pub public_dir: PathBuf,
}

impl AppState {
    /// Resolve each integration to configured or degraded once, at startup.
    pub fn from_config(config: &RelayConfig) -> Result<Self, RelayError> {
        Ok(Self {
            crm: CrmGateway::from_config(&config.crm)?,
            boards: BoardAggregator::from_config(&config.board)?,
            public_dir: PathBuf::from(&config.http.public_dir),
        })
    }
}

/// Build the Axum router with all endpoints
pub fn build_router(state: Arc<AppState>) -> Router {
    let dashboard_files = ServeDir::new(&state.public_dir)
        .fallback(ServeFile::new(state.public_dir.join("index.html")));

    Router::new()
        .route("/webhook/vapi-call", post(webhook_handler))
        .route("/api/ghl/contacts", get(contacts_handler))
        .route("/api/monday", get(boards_handler))
        .route("/health", get(health_handler))
        .fallback_service(dashboard_files)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server on the configured address.
/// Gracefully shuts down when the broadcast shutdown signal fires.
pub async fn start_http_server(
    config: RelayConfig,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    let addr = format!("{}:{}", config.http.host, config.http.port);
    let state = Arc::new(AppState::from_config(&config)?);

    let app = build_router(state);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("callrelay listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
            tracing::info!("HTTP server shutting down...");
        })
        .await?;

    Ok(())
}

/// Health body. Pure, no IO.
pub fn health_inner(state: &AppState) -> serde_json::Value {
    serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "crm_configured": state.crm.is_configured(),
        "board_configured": state.boards.is_configured(),
    })
}

// ============================================================================
// Axum handler wrappers (thin, delegating to subsystems)
// ============================================================================

/// Takes the raw body rather than `Json<_>` so that senders which omit the
/// content type still get a reply instead of a 415.
pub async fn webhook_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let content_type = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok());
    let (status, body) = match webhook::parse_call_event(content_type, &body) {
        Ok(payload) => webhook::relay_call_event(&state.crm, payload).await,
        Err(e) => webhook::reject_body(&e),
    };
    (status, Json(body))
}

pub async fn contacts_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (status, body) = dashboard::contacts_view(&state.crm).await;
    (status, Json(body))
}

pub async fn boards_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (status, body) = dashboard::boards_view(&state.boards).await;
    (status, Json(body))
}

pub async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (StatusCode::OK, Json(health_inner(&state)))
}
