//! Health check endpoint
//!
//! Provides a simple health check for monitoring and load balancers.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use crate::handlers::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: &'static str,
    /// Mapping table status: "loaded" or "absent"
    pub mapping: &'static str,
    /// Network of the loaded mapping table
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_name: Option<String>,
    /// Nodes in the loaded mapping table
    pub nodes: usize,
}

/// Health check handler
///
/// Always returns 200 OK: without a mapping table the proxy still serves
/// scrapes (unrelabeled, with `relabel_success 0`).
pub async fn handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let response = match state.store().get() {
        Some(mapping) => HealthResponse {
            status: "OK",
            mapping: "loaded",
            network_name: Some(mapping.network_name().to_string()),
            nodes: mapping.table().len(),
        },
        None => HealthResponse {
            status: "OK",
            mapping: "absent",
            network_name: None,
            nodes: 0,
        },
    };

    (StatusCode::OK, Json(response))
}
