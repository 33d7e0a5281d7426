//! Capability catalog endpoint.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::service::{CatalogEntry, group_by_category};

use super::AppState;

/// Query parameters for listing tools
#[derive(Deserialize)]
pub struct ListToolsParams {
    #[serde(default = "default_include_remote")]
    pub include_remote: bool,
}

fn default_include_remote() -> bool {
    true
}

/// One category of the catalog
#[derive(Serialize)]
pub struct ToolGroup {
    pub category: String,
    pub tools: Vec<CatalogEntry>,
}

#[derive(Serialize)]
pub struct ListToolsResponse {
    pub total: usize,
    pub groups: Vec<ToolGroup>,
}

/// GET /api/tools - the catalog grouped by category
pub async fn list_tools_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListToolsParams>,
) -> Json<ListToolsResponse> {
    let catalog = state.service.catalog(params.include_remote);

    Json(ListToolsResponse {
        total: catalog.len(),
        groups: group_by_category(&catalog)
            .into_iter()
            .map(|(category, tools)| ToolGroup { category, tools })
            .collect(),
    })
}
