//! Mapping refresh endpoint
//!
//! `POST /relabel/network?network_name=<name>` reloads the mapping table
//! from the topology service. Without `network_name` the configured default
//! network is used.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::handlers::AppState;

/// Query parameters of the refresh endpoint
#[derive(Debug, Default, Deserialize)]
pub struct NetworkParams {
    #[serde(default)]
    pub network_name: Option<String>,
}

/// Response after a successful refresh
#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub status: String,
    pub network_name: String,
    pub nodes: usize,
}

/// Refresh handler
///
/// # Response
///
/// - `200 OK` with the loaded network and node count
/// - `400 Bad Request` for an unusable network name
/// - `502 Bad Gateway` when the topology service fails or its response has
///   no `tp_name_table`; the previous mapping stays active
pub async fn handler(
    State(state): State<AppState>,
    Query(params): Query<NetworkParams>,
) -> AppResult<Json<RefreshResponse>> {
    let summary = state
        .refresher()
        .refresh(params.network_name.as_deref())
        .await?;

    Ok(Json(RefreshResponse {
        status: "updated".to_string(),
        network_name: summary.network_name,
        nodes: summary.nodes,
    }))
}
