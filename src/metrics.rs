//! Prometheus metrics about the proxy itself
//!
//! Tracks scrape outcomes, how many samples were relabeled and how mapping
//! refreshes went. Served on `/internal/metrics`, never mixed into the
//! relabeled `/metrics` output.

use crate::relabel::{RelabelReport, ScrapeOutcome};
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;

/// Result of a mapping refresh, for metric labels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Success,
    /// Topology service unreachable, timed out or answered non-200
    FetchError,
    /// Response lacked `tp_name_table` or had the wrong shape
    ValidationError,
}

impl RefreshOutcome {
    /// Convert outcome to Prometheus label string
    pub fn as_str(&self) -> &'static str {
        match self {
            RefreshOutcome::Success => "success",
            RefreshOutcome::FetchError => "fetch_error",
            RefreshOutcome::ValidationError => "validation_error",
        }
    }
}

/// Metrics collector for the proxy
#[derive(Clone)]
pub struct Metrics {
    pub registry: Arc<Registry>,
    scrapes_total: IntCounterVec,
    rewritten_samples: IntCounter,
    mapping_refreshes: IntCounterVec,
    mapping_nodes: IntGauge,
    scrape_duration: Histogram,
}

impl Metrics {
    /// Create a new Metrics instance
    ///
    /// Registers all metrics with a new Prometheus registry.
    ///
    /// # Errors
    ///
    /// Returns an error if metric registration fails (e.g., duplicate names).
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        // Cardinality: 4 outcomes
        let scrapes_total = IntCounterVec::new(
            Opts::new(
                "relabel_proxy_scrapes_total",
                "Total number of scrape requests by outcome",
            ),
            &["outcome"],
        )?;

        let rewritten_samples = IntCounter::with_opts(Opts::new(
            "relabel_proxy_rewritten_samples_total",
            "Total number of samples whose interface label was rewritten",
        ))?;

        // Cardinality: 3 outcomes
        let mapping_refreshes = IntCounterVec::new(
            Opts::new(
                "relabel_proxy_mapping_refreshes_total",
                "Total number of mapping table refresh attempts by outcome",
            ),
            &["outcome"],
        )?;

        let mapping_nodes = IntGauge::with_opts(Opts::new(
            "relabel_proxy_mapping_nodes",
            "Number of nodes in the currently loaded mapping table",
        ))?;

        let scrape_duration = Histogram::with_opts(
            HistogramOpts::new(
                "relabel_proxy_scrape_duration_ms",
                "Time to fetch, relabel and serialize one scrape in milliseconds",
            )
            .buckets(vec![
                5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0,
            ]),
        )?;

        registry.register(Box::new(scrapes_total.clone()))?;
        registry.register(Box::new(rewritten_samples.clone()))?;
        registry.register(Box::new(mapping_refreshes.clone()))?;
        registry.register(Box::new(mapping_nodes.clone()))?;
        registry.register(Box::new(scrape_duration.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            scrapes_total,
            rewritten_samples,
            mapping_refreshes,
            mapping_nodes,
            scrape_duration,
        })
    }

    /// Record a finished scrape
    ///
    /// # Errors
    ///
    /// Returns an error if the metric is not registered or `duration_ms` is
    /// NaN, infinite or negative.
    pub fn record_scrape(
        &self,
        outcome: ScrapeOutcome,
        report: &RelabelReport,
        duration_ms: f64,
    ) -> Result<(), prometheus::Error> {
        if !duration_ms.is_finite() || duration_ms < 0.0 {
            return Err(prometheus::Error::Msg(format!(
                "Scrape duration must be finite and non-negative, got: {}",
                duration_ms
            )));
        }

        self.scrapes_total
            .get_metric_with_label_values(&[outcome.as_str()])?
            .inc();
        self.rewritten_samples.inc_by(report.rewritten as u64);
        self.scrape_duration.observe(duration_ms);
        Ok(())
    }

    /// Record a mapping refresh attempt
    pub fn record_refresh(&self, outcome: RefreshOutcome) -> Result<(), prometheus::Error> {
        self.mapping_refreshes
            .get_metric_with_label_values(&[outcome.as_str()])?
            .inc();
        Ok(())
    }

    /// Set the node count of the loaded mapping table
    pub fn set_mapping_nodes(&self, nodes: usize) {
        self.mapping_nodes.set(nodes as i64);
    }

    /// Current value of the mapping node gauge
    pub fn mapping_nodes(&self) -> i64 {
        self.mapping_nodes.get()
    }

    /// Number of scrapes recorded with an outcome
    pub fn scrape_count(&self, outcome: ScrapeOutcome) -> u64 {
        self.scrapes_total
            .get_metric_with_label_values(&[outcome.as_str()])
            .map(|c| c.get())
            .unwrap_or(0)
    }

    /// Number of refreshes recorded with an outcome
    pub fn refresh_count(&self, outcome: RefreshOutcome) -> u64 {
        self.mapping_refreshes
            .get_metric_with_label_values(&[outcome.as_str()])
            .map(|c| c.get())
            .unwrap_or(0)
    }

    pub fn rewritten_samples_count(&self) -> u64 {
        self.rewritten_samples.get()
    }

    /// Gather all metrics in Prometheus text format
    pub fn gather(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| prometheus::Error::Msg(format!("Metrics output is not UTF-8: {}", e)))
    }
}
