//! Command-line interface for cadvisor-relabel
//!
//! Provides argument parsing and subcommand handling for the proxy binary.

use crate::exposition::TimestampFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Relabeling proxy between Prometheus and cAdvisor
#[derive(Parser)]
#[command(name = "cadvisor-relabel")]
#[command(version)]
#[command(about = "Relabeling proxy between Prometheus and cAdvisor")]
#[command(
    long_about = "cadvisor-relabel scrapes a cAdvisor metrics endpoint and rewrites the \
    interface label of container network byte counters from emulated interface names to \
    the model interface names published by the topology service."
)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml", global = true)]
    pub config: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate a template configuration file
    Config {
        /// Output file path (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Relabel a saved scrape offline and print the result
    Relabel {
        /// File holding exposition text, as served by the metrics source
        #[arg(short, long)]
        input: PathBuf,

        /// File holding the topology service's JSON response
        #[arg(short, long)]
        mapping: PathBuf,

        /// Timestamp rendering: "legacy" or "millis"
        #[arg(short, long, default_value = "legacy")]
        timestamp_format: TimestampFormat,
    },
}

/// Generate template configuration content
pub fn generate_config_template() -> &'static str {
    r#"# cadvisor-relabel configuration
#
# CADVISOR_URL, NETOMOX_EXP_HOST, NETWORK_NAME and LOG_LEVEL override the
# matching settings below when set.

[server]
# IP address to bind to (0.0.0.0 for all interfaces, 127.0.0.1 for localhost only)
host = "0.0.0.0"

# Port to listen on
port = 5000

# Upper bound for serving one /metrics request, in seconds (max 300)
request_timeout_seconds = 30

[source]
# Metrics endpoint of cAdvisor
url = "http://cadvisor:8080/metrics"
timeout_seconds = 10

[topology]
# netomox-exp host[:port]; http:// is assumed when no scheme is given
host = "netomox-exp:9292"

# Network whose ns_convert_table is loaded at startup and by
# POST /relabel/network without a network_name
default_network = "mddo-bgp"
timeout_seconds = 10

# Reload the mapping table every N seconds (0 disables periodic reloads)
refresh_interval_seconds = 0

# Load the default network's mapping table before serving
load_on_startup = true

[relabel]
# "legacy": seconds with the decimal point removed
# "millis": integer milliseconds
timestamp_format = "legacy"

[observability]
# Log level: "trace", "debug", "info", "warn", "error"
log_level = "info"
"#
}
