//! Configuration for the exporter.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

pub use onos_exporter_common::{LogFormat, LoggingConfig};

/// Collector names accepted under `collectors`.
pub const ONOS_E2T: &str = "onos-e2t";
pub const ONOS_TOPO: &str = "onos-topo";
pub const ONOS_PROFILE: &str = "onos-profile";

/// All known collector names.
pub const COLLECTOR_NAMES: [&str; 3] = [ONOS_E2T, ONOS_TOPO, ONOS_PROFILE];

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] onos_exporter_common::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Complete exporter configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExporterConfig {
    /// HTTP exposition and scheduling settings.
    #[serde(default)]
    pub exporter: ServerConfig,

    /// Collector targets keyed by collector name.
    #[serde(default)]
    pub collectors: BTreeMap<String, CollectorConfig>,

    /// Profile engine settings.
    #[serde(default)]
    pub profile: ProfileConfig,

    /// Subscription collector settings.
    #[serde(default)]
    pub subscriptions: SubscriptionConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Exposition endpoint and collection interval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on (default: "0.0.0.0:9861").
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Path for metrics endpoint (default: "/metrics").
    #[serde(default = "default_path")]
    pub path: String,

    /// Seconds between collection cycles (default: 15).
    #[serde(default = "default_interval")]
    pub interval_secs: u64,
}

fn default_listen() -> String {
    "0.0.0.0:9861".to_string()
}

fn default_path() -> String {
    "/metrics".to_string()
}

fn default_interval() -> u64 {
    15
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            path: default_path(),
            interval_secs: default_interval(),
        }
    }
}

/// Target of a single collector.
///
/// For `onos-profile` the address is a comma-delimited list of hosts and the
/// TLS fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Service address, e.g. "onos-topo:5150".
    #[serde(default)]
    pub address: String,

    /// Client certificate (PEM).
    #[serde(default)]
    pub cert_path: String,

    /// Client key (PEM).
    #[serde(default)]
    pub key_path: String,

    /// Dial without TLS.
    #[serde(default)]
    pub no_tls: bool,
}

impl CollectorConfig {
    /// Create a plaintext target for the given address.
    pub fn insecure(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            no_tls: true,
            ..Default::default()
        }
    }
}

/// Profile engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileConfig {
    /// Port of the pprof debug server on every profiled host.
    #[serde(default = "default_profile_port")]
    pub port: u16,

    /// Sampling duration requested from the cpu endpoint.
    #[serde(default = "default_cpu_seconds")]
    pub cpu_seconds: u64,

    /// Report nodes below this fraction of the total weight are dropped.
    #[serde(default = "default_node_fraction")]
    pub node_fraction: f64,
}

fn default_profile_port() -> u16 {
    6060
}

fn default_cpu_seconds() -> u64 {
    2
}

fn default_node_fraction() -> f64 {
    0.005
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            port: default_profile_port(),
            cpu_seconds: default_cpu_seconds(),
            node_fraction: default_node_fraction(),
        }
    }
}

/// Subscription collector settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubscriptionConfig {
    /// How the numeric subscription revision is rendered.
    #[serde(default)]
    pub revision_format: RevisionFormat,
}

/// Rendering of a subscription revision label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevisionFormat {
    /// Base-10 digits.
    #[default]
    Decimal,
    /// The revision taken as a Unicode scalar value (legacy label format).
    CodePoint,
}

impl ExporterConfig {
    /// Load configuration from a JSON5 file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config: ExporterConfig = onos_exporter_common::load_config(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a JSON5 string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: ExporterConfig = onos_exporter_common::parse_config(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// Empty collector addresses are accepted here; collectors report them
    /// when they run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self
            .exporter
            .listen
            .parse::<std::net::SocketAddr>()
            .is_err()
        {
            return Err(ConfigError::Validation(format!(
                "Invalid listen address: {}",
                self.exporter.listen
            )));
        }

        if !self.exporter.path.starts_with('/') {
            return Err(ConfigError::Validation(
                "Metrics path must start with /".to_string(),
            ));
        }

        if self.exporter.interval_secs == 0 {
            return Err(ConfigError::Validation(
                "interval_secs must be > 0".to_string(),
            ));
        }

        for name in self.collectors.keys() {
            if !COLLECTOR_NAMES.contains(&name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "Unknown collector '{}' (expected one of {})",
                    name,
                    COLLECTOR_NAMES.join(", ")
                )));
            }
        }

        if self.profile.cpu_seconds == 0 {
            return Err(ConfigError::Validation(
                "cpu_seconds must be > 0".to_string(),
            ));
        }

        if !(0.0..1.0).contains(&self.profile.node_fraction) {
            return Err(ConfigError::Validation(
                "node_fraction must be in [0, 1)".to_string(),
            ));
        }

        Ok(())
    }
}
