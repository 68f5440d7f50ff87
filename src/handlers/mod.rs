//! HTTP request handlers for cadvisor-relabel

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::mapping::MappingStore;
use crate::mapping::refresh::MappingRefresher;
use crate::metrics::Metrics;
use crate::upstream::UpstreamClient;
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod health;
pub mod internal;
pub mod metrics;
pub mod network;

/// Application state shared across all handlers
///
/// All fields are Arc'd for cheap cloning across Axum handlers.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    upstream: Arc<UpstreamClient>,
    store: Arc<MappingStore>,
    refresher: Arc<MappingRefresher>,
    metrics: Arc<Metrics>,
}

impl AppState {
    /// Create a new AppState with an empty mapping store
    pub fn new(config: Arc<Config>) -> AppResult<Self> {
        let store = Arc::new(MappingStore::new());
        let upstream = Arc::new(UpstreamClient::new(&config)?);
        let metrics = Arc::new(Metrics::new().map_err(|e| {
            AppError::Internal(format!("Failed to register metrics: {}", e))
        })?);
        let refresher = Arc::new(MappingRefresher::new(
            upstream.clone(),
            store.clone(),
            metrics.clone(),
            config.topology.default_network.clone(),
        ));

        Ok(Self {
            config,
            upstream,
            store,
            refresher,
            metrics,
        })
    }

    /// Get reference to the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get reference to the upstream HTTP client
    pub fn upstream(&self) -> &UpstreamClient {
        &self.upstream
    }

    /// Get reference to the mapping store
    pub fn store(&self) -> &MappingStore {
        &self.store
    }

    /// Get the mapping refresher (Arc'd so it can drive background refreshes)
    pub fn refresher(&self) -> &Arc<MappingRefresher> {
        &self.refresher
    }

    /// Get reference to the proxy's own metrics
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}

/// Build the HTTP router with all endpoints
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/metrics", get(metrics::handler))
        .route("/relabel/network", post(network::handler))
        .route("/health", get(health::handler))
        .route("/internal/metrics", get(internal::handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
