//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! federator. All types derive Serde traits for deserialization from config
//! files; every field has a default so minimal configs stay minimal.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::dynamic::RouterTls;

/// Root configuration for the federator.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct FederationConfig {
    /// Traefik instances to poll.
    pub upstreams: Vec<UpstreamSpec>,

    /// Router selection and merge defaults.
    pub routers: RouterConfig,

    /// Output sinks.
    pub output: OutputConfig,

    /// Poll loop settings.
    pub server: ServerConfig,

    /// Logging settings.
    pub log: LogConfig,

    /// Prometheus exporter settings.
    pub metrics: MetricsConfig,
}

/// One upstream Traefik instance.
///
/// URLs are kept verbatim: the published load balancer target is exactly
/// `server_url` as written.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct UpstreamSpec {
    /// Identifier for this upstream, used as the published name prefix.
    pub name: String,

    /// Traefik admin/dashboard URL (e.g., "http://100.64.1.2:8080").
    pub admin_url: String,

    /// URL traffic is routed to (e.g., "http://100.64.1.2:80").
    pub server_url: String,
}

/// How routers are filtered and rewritten.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct RouterConfig {
    pub selector: SelectionCriteria,
    pub defaults: MergeDefaults,
    pub merge_policy: MergePolicy,
}

/// Filter applied to every upstream's router list.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct SelectionCriteria {
    /// Keep only routers registered by this provider (e.g., "docker").
    pub provider: Option<String>,

    /// Keep only routers in this status.
    pub status: String,
}

impl Default for SelectionCriteria {
    fn default() -> Self {
        Self {
            provider: None,
            status: DEFAULT_STATUS.to_string(),
        }
    }
}

/// Status selected when none is configured.
pub const DEFAULT_STATUS: &str = "enabled";

/// Values applied to every published router.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct MergeDefaults {
    #[serde(alias = "entryPoints")]
    pub entrypoints: Vec<String>,

    pub middlewares: Vec<String>,

    pub tls: Option<RouterTls>,
}

/// What happens to a router's own entry points and middlewares when the
/// corresponding default list is empty.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// Defaults replace the upstream values; without defaults they are dropped.
    #[default]
    ReplaceOrDrop,

    /// Defaults replace the upstream values; without defaults the upstream
    /// values are kept.
    Inherit,
}

/// Output sink configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    pub http: HttpOutputConfig,
    pub file: FileOutputConfig,
}

/// Query interface configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct HttpOutputConfig {
    /// Serve the aggregated configuration over HTTP.
    pub enabled: bool,

    /// Listen port (all interfaces).
    pub port: u16,

    /// Path the configuration is served on.
    pub path: String,
}

impl Default for HttpOutputConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: 8080,
            path: "/config".to_string(),
        }
    }
}

/// File sink configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct FileOutputConfig {
    /// Persist the aggregated configuration to disk.
    pub enabled: bool,

    /// Output file path.
    pub path: String,

    /// Rewrite interval.
    #[serde(with = "duration_str")]
    pub interval: Duration,
}

impl Default for FileOutputConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: String::new(),
            interval: Duration::from_secs(30),
        }
    }
}

/// Poll loop configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    /// Time between aggregation cycles.
    #[serde(with = "duration_str")]
    pub poll_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(10),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: String,

    /// Output format.
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Plain,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Plain,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct MetricsConfig {
    /// Enable the Prometheus endpoint.
    pub enabled: bool,

    /// Metrics endpoint bind address.
    pub address: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Durations written as "10s", "1m30s", "500ms".
mod duration_str {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&humantime::format_duration(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(raw.trim()).map_err(serde::de::Error::custom)
    }
}
