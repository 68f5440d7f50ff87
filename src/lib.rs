//! cadvisor-relabel - Relabeling proxy between Prometheus and cAdvisor
//!
//! This library fetches cAdvisor's exposition text, rewrites the `interface`
//! label of container network byte counters from emulated interface names
//! to model interface names taken from a topology service, and serves the
//! result with a trailing `relabel_success` marker.

pub mod cli;
pub mod config;
pub mod error;
pub mod exposition;
pub mod handlers;
pub mod mapping;
pub mod metrics;
pub mod relabel;
pub mod telemetry;
pub mod upstream;
