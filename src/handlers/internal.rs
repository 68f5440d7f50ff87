//! Proxy self-metrics endpoint
//!
//! Exposes the proxy's own counters in Prometheus text format on
//! `/internal/metrics`, separate from the relabeled `/metrics` output.

use axum::{extract::State, http::StatusCode};

use crate::handlers::AppState;

/// Self-metrics handler
///
/// # Response
///
/// - `200 OK` with metrics in Prometheus text format
/// - `500 Internal Server Error` if metrics collection fails
pub async fn handler(State(state): State<AppState>) -> (StatusCode, String) {
    match state.metrics().gather() {
        Ok(output) => (StatusCode::OK, output),
        Err(e) => {
            tracing::error!(error = %e, "Failed to gather proxy metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to gather metrics: {}", e),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::relabel::{RelabelReport, ScrapeOutcome};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_internal_handler_returns_prometheus_format() {
        let config: Config = toml::from_str(
            "[source]\nurl = \"http://127.0.0.1:1/metrics\"\n[topology]\nhost = \"127.0.0.1:1\"\n",
        )
        .expect("should parse test config");
        let state = AppState::new(Arc::new(config)).expect("should create AppState");

        state
            .metrics()
            .record_scrape(ScrapeOutcome::Passthrough, &RelabelReport::default(), 3.0)
            .expect("should record");

        let (status, body) = handler(State(state)).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("# HELP relabel_proxy_scrapes_total"));
        assert!(body.contains("relabel_proxy_scrapes_total{outcome=\"passthrough\"} 1"));
    }
}
