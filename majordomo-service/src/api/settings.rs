//! Settings API endpoints for reading and overriding runtime configuration.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::api::AppState;
use crate::error::I18nError;

/// Response for GET /api/settings
#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    /// All current settings (merged: defaults + DB overrides)
    pub settings: HashMap<String, serde_json::Value>,
    /// Which keys have DB overrides (vs using defaults)
    pub overridden: Vec<String>,
}

/// Request body for PUT /api/settings
#[derive(Debug, Deserialize)]
pub struct UpdateSettingsRequest {
    /// Settings to update (key -> value). Use null to delete/revert to default.
    pub settings: HashMap<String, serde_json::Value>,
}

/// GET /api/settings - retrieve all settings with their current values
pub async fn get_settings_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SettingsResponse>, I18nError> {
    let db_settings = state
        .service
        .db
        .get_all_settings()
        .map_err(|e| state.i18n_error(e))?;

    let settings = state.service.runtime_config.dynamic().to_key_value_map();

    let mut overridden: Vec<String> = db_settings.keys().cloned().collect();
    overridden.sort();

    Ok(Json(SettingsResponse {
        settings,
        overridden,
    }))
}

/// PUT /api/settings - update settings (triggers hot reload)
pub async fn update_settings_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<UpdateSettingsRequest>,
) -> Result<Json<SettingsResponse>, I18nError> {
    state
        .service
        .update_settings(request.settings)
        .map_err(|e| state.i18n_error(e))?;

    get_settings_handler(State(state)).await
}
