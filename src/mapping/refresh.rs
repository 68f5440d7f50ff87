//! Loading mapping tables from the topology service
//!
//! A refresh fetches the `ns_convert_table` of one network and, only if the
//! response carries a well-formed `tp_name_table`, swaps it into the
//! [`MappingStore`]. Any failure leaves the previous table (or its absence)
//! in place.

use super::{LoadedMapping, MappingStore};
use crate::error::{AppError, AppResult};
use crate::metrics::{Metrics, RefreshOutcome};
use crate::upstream::UpstreamClient;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Check that a network name can be placed in the topology URL path
pub fn validate_network_name(name: &str) -> AppResult<()> {
    if name.is_empty() {
        return Err(AppError::Validation("network name must not be empty".to_string()));
    }
    if name == "." || name == ".." {
        return Err(AppError::Validation(format!(
            "network name '{}' is a path segment",
            name
        )));
    }
    if let Some(c) = name
        .chars()
        .find(|c| c.is_whitespace() || c.is_control() || matches!(*c, '/' | '?' | '#' | '%'))
    {
        return Err(AppError::Validation(format!(
            "network name '{}' contains invalid character {:?}",
            name, c
        )));
    }
    Ok(())
}

/// Outcome of a successful refresh
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshSummary {
    pub network_name: String,
    /// Number of nodes in the new table
    pub nodes: usize,
}

/// Refreshes the mapping store from the topology service
pub struct MappingRefresher {
    upstream: Arc<UpstreamClient>,
    store: Arc<MappingStore>,
    metrics: Arc<Metrics>,
    default_network: String,
    /// Held while a new table is stored and the node gauge updated
    update: Mutex<()>,
}

impl MappingRefresher {
    pub fn new(
        upstream: Arc<UpstreamClient>,
        store: Arc<MappingStore>,
        metrics: Arc<Metrics>,
        default_network: impl Into<String>,
    ) -> Self {
        Self {
            upstream,
            store,
            metrics,
            default_network: default_network.into(),
            update: Mutex::new(()),
        }
    }

    /// Network refreshed when the caller does not name one
    pub fn default_network(&self) -> &str {
        &self.default_network
    }

    /// Network of the loaded table, or the default network if none is loaded
    pub fn active_network(&self) -> String {
        self.store
            .get()
            .map(|m| m.network_name().to_string())
            .unwrap_or_else(|| self.default_network.clone())
    }

    /// Fetch the table for `network_name` (default network if `None`) and store it
    ///
    /// # Errors
    ///
    /// - `Validation` if the network name cannot be used in a URL
    /// - `Fetch` / `UpstreamStatus` if the topology service call fails
    /// - `RefreshValidation` if the response has no usable `tp_name_table`
    ///
    /// The store is left untouched on every error.
    pub async fn refresh(&self, network_name: Option<&str>) -> AppResult<RefreshSummary> {
        let network_name = network_name.unwrap_or(self.default_network.as_str());
        validate_network_name(network_name)?;

        let result = self.upstream.fetch_mapping(network_name).await;
        let outcome = match &result {
            Ok(_) => RefreshOutcome::Success,
            Err(AppError::RefreshValidation(_)) => RefreshOutcome::ValidationError,
            Err(_) => RefreshOutcome::FetchError,
        };
        if let Err(e) = self.metrics.record_refresh(outcome) {
            tracing::warn!(error = %e, "Failed to record mapping refresh metric");
        }

        let table = match result {
            Ok(table) => table,
            Err(e) => {
                tracing::warn!(
                    network_name = %network_name,
                    url = %self.upstream.topology_url(network_name),
                    error = %e,
                    "Mapping refresh failed, keeping previous mapping table"
                );
                return Err(e);
            }
        };

        let nodes = table.len();
        {
            let _update = self.update.lock().await;
            self.store.replace(LoadedMapping::new(network_name, table));
            self.metrics.set_mapping_nodes(nodes);
        }

        tracing::info!(
            network_name = %network_name,
            nodes,
            "Mapping table updated"
        );

        Ok(RefreshSummary {
            network_name: network_name.to_string(),
            nodes,
        })
    }

    /// Start periodic refreshing in the background
    ///
    /// Every `interval` the network of the loaded table (or the default
    /// network) is refreshed. Failures are logged and the loop carries on.
    /// A second task watches the loop and logs if it ever stops.
    pub fn start_periodic_refresh(self: Arc<Self>, interval: Duration) {
        let handle = tokio::spawn(async move {
            tracing::info!(
                interval_seconds = interval.as_secs(),
                "Starting periodic mapping refresh"
            );

            loop {
                tokio::time::sleep(interval).await;

                let network_name = self.active_network();
                tracing::debug!(network_name = %network_name, "Running scheduled mapping refresh");
                // Errors are already logged and counted by refresh()
                let _ = self.refresh(Some(&network_name)).await;
            }
        });

        tokio::spawn(async move {
            match handle.await {
                Ok(_) => {
                    tracing::error!(
                        "Periodic mapping refresh task terminated unexpectedly. \
                        The mapping table will only change through /relabel/network."
                    );
                }
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        "Periodic mapping refresh task panicked. \
                        The mapping table will only change through /relabel/network."
                    );
                }
            }
        });
    }
}
