//! Outbound HTTP calls to the metrics source and the topology service

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::mapping::{MappingTable, TopologyResponse};
use std::time::Duration;

/// HTTP client for the two upstream services
///
/// Holds one pooled `reqwest::Client`; every call carries its own timeout so
/// a stalled upstream fails the request instead of hanging it.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    metrics_url: String,
    topology_base_url: String,
    source_timeout: Duration,
    topology_timeout: Duration,
}

impl UpstreamClient {
    /// Create a client from validated configuration
    pub fn new(config: &Config) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("cadvisor-relabel/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            metrics_url: config.source.url.clone(),
            topology_base_url: config.topology.base_url(),
            source_timeout: Duration::from_secs(config.source.timeout_seconds),
            topology_timeout: Duration::from_secs(config.topology.timeout_seconds),
        })
    }

    /// URL scraped for raw container metrics
    pub fn metrics_url(&self) -> &str {
        &self.metrics_url
    }

    /// URL of the mapping table for a network
    pub fn topology_url(&self, network_name: &str) -> String {
        format!(
            "{}/topologies/{}/ns_convert_table",
            self.topology_base_url, network_name
        )
    }

    /// Fetch the raw exposition text from the metrics source
    pub async fn fetch_metrics(&self) -> AppResult<String> {
        self.get_text(&self.metrics_url, self.source_timeout).await
    }

    /// Fetch and validate the mapping table of a network
    pub async fn fetch_mapping(&self, network_name: &str) -> AppResult<MappingTable> {
        let url = self.topology_url(network_name);
        let body = self.get_text(&url, self.topology_timeout).await?;
        TopologyResponse::from_json(&body)
    }

    async fn get_text(&self, url: &str, timeout: Duration) -> AppResult<String> {
        let response = self
            .http
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| fetch_error(url, timeout, e))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            tracing::warn!(url = %url, status = %status, "Upstream returned non-200 status");
            return Err(AppError::UpstreamStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| fetch_error(url, timeout, e))?;

        tracing::debug!(url = %url, bytes = body.len(), "Fetched upstream body");
        Ok(body)
    }
}

fn fetch_error(url: &str, timeout: Duration, e: reqwest::Error) -> AppError {
    let reason = if e.is_timeout() {
        format!("timed out after {} seconds", timeout.as_secs())
    } else {
        e.to_string()
    };
    AppError::Fetch {
        url: url.to_string(),
        reason,
    }
}
