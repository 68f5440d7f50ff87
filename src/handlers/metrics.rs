//! Relabeled metrics endpoint
//!
//! `GET /metrics` fetches the metrics source, relabels it with the current
//! mapping table and returns exposition text ending in a
//! `relabel_success 0|1` line. The response is always `200 OK`: fetch,
//! parse and timeout failures show up as `relabel_success 0` with an empty
//! body so the scraper keeps getting a well-formed document.

use axum::{
    extract::State,
    http::{StatusCode, header},
};
use std::time::{Duration, Instant};

use crate::handlers::AppState;
use crate::mapping::LoadedMapping;
use crate::relabel::{ScrapeOutput, render_scrape};

/// Content type of the Prometheus text format
pub const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Relabeled scrape handler
///
/// # Example
///
/// ```bash
/// curl http://localhost:5000/metrics
/// # HELP container_network_receive_bytes Cumulative count of bytes received
/// # TYPE container_network_receive_bytes counter
/// container_network_receive_bytes_total{interface="GigabitEthernet0/0/0",name="clab-emulated-r1"} 1024
/// relabel_success 1
/// ```
pub async fn handler(
    State(state): State<AppState>,
) -> (StatusCode, [(header::HeaderName, &'static str); 1], String) {
    let started = Instant::now();
    let budget = Duration::from_secs(state.config().server.request_timeout_seconds);

    let output = match tokio::time::timeout(budget, scrape(&state)).await {
        Ok(output) => output,
        Err(_) => {
            tracing::warn!(
                timeout_seconds = budget.as_secs(),
                "Scrape exceeded request timeout, answering with relabel_success 0"
            );
            ScrapeOutput::fetch_failed()
        }
    };

    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
    if let Err(e) = state
        .metrics()
        .record_scrape(output.outcome, &output.report, elapsed_ms)
    {
        tracing::warn!(error = %e, "Failed to record scrape metrics");
    }

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, EXPOSITION_CONTENT_TYPE)],
        output.into_response_body(),
    )
}

async fn scrape(state: &AppState) -> ScrapeOutput {
    let raw = match state.upstream().fetch_metrics().await {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(
                url = %state.upstream().metrics_url(),
                error = %e,
                "Failed to fetch metrics source, serving empty scrape"
            );
            return ScrapeOutput::fetch_failed();
        }
    };

    // One snapshot for the whole request; a concurrent refresh does not affect it.
    let mapping = state.store().get();
    render_scrape(
        &raw,
        mapping.as_deref().map(LoadedMapping::table),
        state.config().relabel.timestamp_format,
    )
}
