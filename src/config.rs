//! Configuration management for cadvisor-relabel
//!
//! Parses TOML configuration files and provides typed access to settings.
//! A handful of environment variables override file values so the proxy can
//! run in a container with no config file at all:
//!
//! | Variable           | Overrides                  |
//! |--------------------|----------------------------|
//! | `CADVISOR_URL`     | `source.url`               |
//! | `NETOMOX_EXP_HOST` | `topology.host`            |
//! | `NETWORK_NAME`     | `topology.default_network` |
//! | `LOG_LEVEL`        | `observability.log_level`  |

use crate::error::{AppError, AppResult};
use crate::exposition::TimestampFormat;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Longest accepted timeout for any outbound or inbound request
pub const MAX_TIMEOUT_SECONDS: u64 = 300;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub topology: TopologyConfig,
    #[serde(default)]
    pub relabel: RelabelConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_request_timeout() -> u64 {
    30
}

/// Metrics source (cAdvisor) settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceConfig {
    /// Full URL of the source's metrics endpoint
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_upstream_timeout")]
    pub timeout_seconds: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            timeout_seconds: default_upstream_timeout(),
        }
    }
}

fn default_upstream_timeout() -> u64 {
    10
}

/// Topology service (netomox-exp) settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TopologyConfig {
    /// `host[:port]`, optionally with an `http://` or `https://` scheme
    #[serde(default)]
    pub host: String,
    /// Network loaded at startup and when a refresh names no network
    #[serde(default = "default_network")]
    pub default_network: String,
    #[serde(default = "default_upstream_timeout")]
    pub timeout_seconds: u64,
    /// Periodic refresh interval; 0 disables periodic refresh
    #[serde(default)]
    pub refresh_interval_seconds: u64,
    #[serde(default = "default_load_on_startup")]
    pub load_on_startup: bool,
}

impl TopologyConfig {
    /// Base URL of the topology service, with a scheme
    pub fn base_url(&self) -> String {
        let host = self.host.trim_end_matches('/');
        if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("http://{}", host)
        }
    }
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            default_network: default_network(),
            timeout_seconds: default_upstream_timeout(),
            refresh_interval_seconds: 0,
            load_on_startup: default_load_on_startup(),
        }
    }
}

fn default_network() -> String {
    "mddo-bgp".to_string()
}

fn default_load_on_startup() -> bool {
    true
}

/// Output settings of the relabeling pipeline
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RelabelConfig {
    #[serde(default)]
    pub timestamp_format: TimestampFormat,
}

/// Observability configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let path_display = path.as_ref().display().to_string();
        let config = Self::parse_file(path.as_ref())?;

        config
            .validate()
            .map_err(|e| AppError::ConfigValidationFailed {
                path: path_display,
                reason: e.to_string(),
            })?;

        Ok(config)
    }

    /// Load configuration for the server process
    ///
    /// Reads `path` when it exists (defaults otherwise), applies the
    /// environment overrides and validates the result.
    pub fn load<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let path = path.as_ref();
        let path_display = path.display().to_string();

        let mut config = if path.exists() {
            Self::parse_file(path)?
        } else {
            tracing::debug!(
                path = %path_display,
                "Configuration file not found, using defaults and environment"
            );
            Self::default()
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());

        config
            .validate()
            .map_err(|e| AppError::ConfigValidationFailed {
                path: path_display,
                reason: e.to_string(),
            })?;

        Ok(config)
    }

    fn parse_file(path: &Path) -> AppResult<Self> {
        let path_display = path.display().to_string();

        let content =
            std::fs::read_to_string(path).map_err(|source| AppError::ConfigFileRead {
                path: path_display.clone(),
                source,
            })?;

        toml::from_str(&content).map_err(|source| AppError::ConfigParseFailed {
            path: path_display,
            source,
        })
    }

    /// Apply environment overrides using `lookup` to read variables
    ///
    /// Empty values are ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = read("CADVISOR_URL") {
            self.source.url = url;
        }
        if let Some(host) = read("NETOMOX_EXP_HOST") {
            self.topology.host = host;
        }
        if let Some(network) = read("NETWORK_NAME") {
            self.topology.default_network = network;
        }
        if let Some(level) = read("LOG_LEVEL") {
            self.observability.log_level = level;
        }
    }

    /// Validate configuration after parsing
    ///
    /// This is called automatically by `from_file()` and `load()`, but can
    /// also be called explicitly when constructing Config via other means
    /// (e.g., in tests).
    pub fn validate(&self) -> AppResult<()> {
        if self.source.url.trim().is_empty() {
            return Err(AppError::Config(
                "source.url is not set. Set it in the config file or via CADVISOR_URL \
                (e.g. http://cadvisor:8080/metrics)."
                    .to_string(),
            ));
        }
        if !self.source.url.starts_with("http://") && !self.source.url.starts_with("https://") {
            return Err(AppError::Config(format!(
                "source.url '{}' must start with 'http://' or 'https://'",
                self.source.url
            )));
        }

        if self.topology.host.trim().is_empty() {
            return Err(AppError::Config(
                "topology.host is not set. Set it in the config file or via NETOMOX_EXP_HOST \
                (e.g. netomox-exp:9292)."
                    .to_string(),
            ));
        }

        crate::mapping::refresh::validate_network_name(&self.topology.default_network).map_err(
            |e| AppError::Config(format!("topology.default_network is invalid: {}", e)),
        )?;

        for (name, timeout) in [
            ("server.request_timeout_seconds", self.server.request_timeout_seconds),
            ("source.timeout_seconds", self.source.timeout_seconds),
            ("topology.timeout_seconds", self.topology.timeout_seconds),
        ] {
            if timeout == 0 {
                return Err(AppError::Config(format!(
                    "{} must be greater than 0",
                    name
                )));
            }
            if timeout > MAX_TIMEOUT_SECONDS {
                return Err(AppError::Config(format!(
                    "{} cannot exceed {} seconds, got {}",
                    name, MAX_TIMEOUT_SECONDS, timeout
                )));
            }
        }

        Ok(())
    }
}

impl FromStr for Config {
    type Err = AppError;

    fn from_str(toml_str: &str) -> Result<Self, Self::Err> {
        let config: Config =
            toml::from_str(toml_str).map_err(|source| AppError::ConfigParseFailed {
                path: "<string>".to_string(),
                source,
            })?;

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const TEST_CONFIG: &str = r#"
[server]
host = "127.0.0.1"
port = 5000
request_timeout_seconds = 30

[source]
url = "http://cadvisor:8080/metrics"
timeout_seconds = 5

[topology]
host = "netomox-exp:9292"
default_network = "mddo-bgp"
refresh_interval_seconds = 60

[relabel]
timestamp_format = "millis"

[observability]
log_level = "debug"
"#;

    const MINIMAL_CONFIG: &str = r#"
[source]
url = "http://cadvisor:8080/metrics"

[topology]
host = "netomox-exp:9292"
"#;

    #[test]
    fn test_config_from_str_parses_successfully() {
        let config = Config::from_str(TEST_CONFIG).expect("should parse config");
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.source.url, "http://cadvisor:8080/metrics");
        assert_eq!(config.source.timeout_seconds, 5);
        assert_eq!(config.topology.host, "netomox-exp:9292");
        assert_eq!(config.topology.refresh_interval_seconds, 60);
        assert_eq!(config.relabel.timestamp_format, TimestampFormat::Millis);
        assert_eq!(config.observability.log_level, "debug");
    }

    #[test]
    fn test_config_minimal_uses_defaults() {
        let config = Config::from_str(MINIMAL_CONFIG).expect("should parse config");
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.source.timeout_seconds, 10);
        assert_eq!(config.topology.default_network, "mddo-bgp");
        assert_eq!(config.topology.refresh_interval_seconds, 0);
        assert!(config.topology.load_on_startup);
        assert_eq!(config.relabel.timestamp_format, TimestampFormat::Legacy);
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn test_config_missing_source_url_fails() {
        let err = Config::from_str("[topology]\nhost = \"x:1\"").expect_err("should fail");
        assert!(err.to_string().contains("source.url"));
    }

    #[test]
    fn test_config_source_url_requires_scheme() {
        let toml = MINIMAL_CONFIG.replace("http://cadvisor:8080/metrics", "cadvisor:8080/metrics");
        let err = Config::from_str(&toml).expect_err("should fail");
        assert!(err.to_string().contains("must start with"));
    }

    #[test]
    fn test_config_missing_topology_host_fails() {
        let err = Config::from_str("[source]\nurl = \"http://c:1/metrics\"").expect_err("should fail");
        assert!(err.to_string().contains("topology.host"));
    }

    #[test]
    fn test_config_zero_timeout_fails() {
        let toml = format!("{}timeout_seconds = 0\n", MINIMAL_CONFIG);
        let err = Config::from_str(&toml).expect_err("should fail");
        assert!(err.to_string().contains("topology.timeout_seconds must be greater than 0"));
    }

    #[test]
    fn test_config_excessive_timeout_fails() {
        let toml = format!("{}\n[server]\nrequest_timeout_seconds = 301\n", MINIMAL_CONFIG);
        let err = Config::from_str(&toml).expect_err("should fail");
        assert!(err.to_string().contains("cannot exceed 300 seconds"));
    }

    #[test]
    fn test_config_invalid_default_network_fails() {
        let toml = format!("{}default_network = \"a/b\"\n", MINIMAL_CONFIG);
        let err = Config::from_str(&toml).expect_err("should fail");
        assert!(err.to_string().contains("default_network"));
    }

    #[test]
    fn test_config_unknown_timestamp_format_fails_to_parse() {
        let toml = format!("{}\n[relabel]\ntimestamp_format = \"seconds\"\n", MINIMAL_CONFIG);
        assert!(matches!(
            Config::from_str(&toml),
            Err(AppError::ConfigParseFailed { .. })
        ));
    }

    #[test]
    fn test_env_overrides_replace_file_values() {
        let mut config = Config::from_str(MINIMAL_CONFIG).expect("should parse config");
        let env: HashMap<&str, &str> = [
            ("CADVISOR_URL", "http://other:8080/metrics"),
            ("NETOMOX_EXP_HOST", "topo:9000"),
            ("NETWORK_NAME", "mddo-ospf"),
            ("LOG_LEVEL", ""),
        ]
        .into_iter()
        .collect();

        config.apply_env_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.source.url, "http://other:8080/metrics");
        assert_eq!(config.topology.host, "topo:9000");
        assert_eq!(config.topology.default_network, "mddo-ospf");
        // Empty values are ignored
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn test_topology_base_url_adds_scheme_when_missing() {
        let mut topology = TopologyConfig {
            host: "netomox-exp:9292".to_string(),
            ..TopologyConfig::default()
        };
        assert_eq!(topology.base_url(), "http://netomox-exp:9292");

        topology.host = "https://topo.example.com/".to_string();
        assert_eq!(topology.base_url(), "https://topo.example.com");
    }
}
