//! HTTP API for the Majordomo service.
//!
//! This module provides the REST API endpoints for:
//! - Health monitoring
//! - Chat turns, one-shot and streamed over SSE
//! - The capability catalog
//! - Remote provider connections
//! - Runtime settings

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post, put},
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::{I18nError, ServiceError};
use crate::llm::OPENAI_COMPAT_PROVIDER;
use crate::service::AssistantService;

pub mod chat;
pub mod remote;
pub mod settings;
pub mod tools;
use chat::{send_handler, stream_handler};
use remote::{
    connect_handler, connections_handler, disconnect_handler, servers_handler, status_handler,
};
use settings::{get_settings_handler, update_settings_handler};
use tools::list_tools_handler;

/// Application state
pub struct AppState {
    pub service: Arc<AssistantService>,
    pub start_time: Instant,
}

impl AppState {
    /// Create an i18n-aware error from a service error
    pub fn i18n_error(&self, error: ServiceError) -> I18nError {
        I18nError::new(error, self.service.i18n.clone(), "en")
    }
}

/// Build the API router
pub fn router(service: Arc<AssistantService>) -> Router {
    let state = Arc::new(AppState {
        service,
        start_time: Instant::now(),
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Chat endpoints
        .route("/chat/send", post(send_handler))
        .route("/chat/stream", post(stream_handler))
        // Capability catalog
        .route("/tools", get(list_tools_handler))
        // Remote provider endpoints
        .route("/remote/servers", get(servers_handler))
        .route("/remote/connections", get(connections_handler))
        .route("/remote/connect", post(connect_handler))
        .route("/remote/disconnect", post(disconnect_handler))
        .route("/remote/status/{provider_id}", get(status_handler))
        // Settings endpoints
        .route("/settings", get(get_settings_handler))
        .route("/settings", put(update_settings_handler));

    Router::new()
        .route("/health", get(health_handler))
        .nest("/api", api_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// === Health ===

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let missing_key = {
        let dynamic = state.service.runtime_config.dynamic();
        dynamic.llm.default_provider == OPENAI_COMPAT_PROVIDER
            && dynamic.openai_compat.api_key.is_empty()
    };

    let status = if missing_key {
        state.service.i18n.format(
            "en",
            "health-status-degraded",
            &[("reason", "no LLM API key configured")],
        )
    } else {
        state.service.i18n.get("en", "health-status-healthy", None)
    };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        remote_connections: state.service.connected_remote_count(),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    uptime_seconds: u64,
    remote_connections: usize,
}
