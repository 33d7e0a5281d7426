//! Remote provider endpoints: directory, connections, connect and disconnect.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::I18nError;
use crate::remote::{ConnectReport, ConnectionSummary, DisconnectReport, ServerSummary};

use super::AppState;

/// Request body for POST /api/remote/connect
#[derive(Debug, Deserialize)]
pub struct ConnectRequest {
    pub provider_id: String,
    #[serde(default)]
    pub credential: Option<String>,
}

/// Request body for POST /api/remote/disconnect
#[derive(Debug, Deserialize)]
pub struct DisconnectRequest {
    pub provider_id: String,
}

/// Connect outcome plus a readable summary
#[derive(Debug, Serialize)]
pub struct ConnectResponse {
    #[serde(flatten)]
    pub report: ConnectReport,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct DisconnectResponse {
    #[serde(flatten)]
    pub report: DisconnectReport,
    pub message: String,
}

/// GET /api/remote/servers - every known provider with its state
pub async fn servers_handler(State(state): State<Arc<AppState>>) -> Json<Vec<ServerSummary>> {
    Json(state.service.known_servers())
}

/// GET /api/remote/connections - live connections only
pub async fn connections_handler(
    State(state): State<Arc<AppState>>,
) -> Json<Vec<ConnectionSummary>> {
    Json(state.service.remote_connections())
}

/// POST /api/remote/connect
pub async fn connect_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ConnectRequest>,
) -> Result<Json<ConnectResponse>, I18nError> {
    let report = state
        .service
        .connect_remote(&request.provider_id, request.credential)
        .await
        .map_err(|e| state.i18n_error(e))?;

    let message = match &report.error {
        None => state.service.i18n.format(
            "en",
            "remote-connected",
            &[
                ("provider", request.provider_id.as_str()),
                ("count", report.capability_count.to_string().as_str()),
            ],
        ),
        Some(error) => error.clone(),
    };

    Ok(Json(ConnectResponse { report, message }))
}

/// POST /api/remote/disconnect
pub async fn disconnect_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DisconnectRequest>,
) -> Json<DisconnectResponse> {
    let report = state.service.disconnect_remote(&request.provider_id);
    let message = match &report.error {
        None => state.service.i18n.format(
            "en",
            "remote-disconnected",
            &[("provider", request.provider_id.as_str())],
        ),
        Some(error) => error.clone(),
    };

    Json(DisconnectResponse { report, message })
}

/// GET /api/remote/status/{provider_id}
pub async fn status_handler(
    State(state): State<Arc<AppState>>,
    Path(provider_id): Path<String>,
) -> Json<ConnectionSummary> {
    Json(state.service.remote_status(&provider_id))
}
