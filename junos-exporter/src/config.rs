//! Configuration for the Junos exporter.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] json5::Error),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Configuration was not loaded from a file")]
    NoSource,
}

/// Complete exporter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExporterConfig {
    /// Address to listen on (default: "0.0.0.0:9326").
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Path for the scrape endpoint (default: "/metrics").
    #[serde(default = "default_path")]
    pub path: String,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Device profiles, selected per scrape with the `module` parameter.
    #[serde(default)]
    pub modules: HashMap<String, ModuleConfig>,
}

fn default_listen() -> String {
    "0.0.0.0:9326".to_string()
}

fn default_path() -> String {
    "/metrics".to_string()
}

/// A device profile: credentials, transport and the telemetry to collect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleConfig {
    /// Device credentials.
    pub auth: Credentials,

    /// Telemetry domains to collect.
    #[serde(default = "default_metrics")]
    pub metrics: Vec<MetricKind>,

    /// REST API transport settings.
    #[serde(default)]
    pub rest: RestConfig,
}

fn default_metrics() -> Vec<MetricKind> {
    vec![
        MetricKind::Interface,
        MetricKind::Environment,
        MetricKind::VirtualChassis,
        MetricKind::RoutingEngine,
    ]
}

/// Authentication credentials.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    /// Username for authentication.
    pub username: String,

    /// Password for authentication.
    #[serde(default)]
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Telemetry domains a module can collect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Interface,
    Environment,
    VirtualChassis,
    RoutingEngine,
    Storage,
    Bgp,
}

impl MetricKind {
    /// All kinds, in the order a scrape collects them.
    pub const ALL: [MetricKind; 6] = [
        MetricKind::Interface,
        MetricKind::Environment,
        MetricKind::VirtualChassis,
        MetricKind::RoutingEngine,
        MetricKind::Storage,
        MetricKind::Bgp,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Interface => "interface",
            MetricKind::Environment => "environment",
            MetricKind::VirtualChassis => "virtual_chassis",
            MetricKind::RoutingEngine => "routing_engine",
            MetricKind::Storage => "storage",
            MetricKind::Bgp => "bgp",
        }
    }
}

/// Junos REST API transport settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestConfig {
    /// URL scheme (default: http).
    #[serde(default)]
    pub scheme: Scheme,

    /// Port used when the target does not carry one (default: 3000).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Per-RPC timeout in seconds (default: 30).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Skip TLS certificate verification (not recommended for production).
    #[serde(default)]
    pub skip_verify: bool,
}

fn default_port() -> u16 {
    3000
}

fn default_timeout() -> u64 {
    30
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            scheme: Scheme::default(),
            port: default_port(),
            timeout_secs: default_timeout(),
            skip_verify: false,
        }
    }
}

/// URL scheme for the REST API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    #[default]
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format: "text" or "json".
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl ExporterConfig {
    /// Load configuration from a JSON5 file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from a JSON5 string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: ExporterConfig = json5::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Look up a module by name.
    pub fn module(&self, name: &str) -> Option<&ModuleConfig> {
        self.modules.get(name)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.listen.parse::<std::net::SocketAddr>().is_err() {
            return Err(ConfigError::Validation(format!(
                "Invalid listen address: {}",
                self.listen
            )));
        }

        if !self.path.starts_with('/') {
            return Err(ConfigError::Validation(
                "Metrics path must start with /".to_string(),
            ));
        }

        for (name, module) in &self.modules {
            module.validate(name)?;
        }

        Ok(())
    }
}

impl ModuleConfig {
    fn validate(&self, name: &str) -> Result<(), ConfigError> {
        if self.auth.username.is_empty() {
            return Err(ConfigError::Validation(format!(
                "Module '{}': username must not be empty",
                name
            )));
        }

        if self.metrics.is_empty() {
            return Err(ConfigError::Validation(format!(
                "Module '{}': metrics must not be empty",
                name
            )));
        }

        // A kind listed twice would declare its series twice
        let mut seen = HashSet::new();
        for kind in &self.metrics {
            if !seen.insert(kind) {
                return Err(ConfigError::Validation(format!(
                    "Module '{}': metric kind '{}' listed more than once",
                    name,
                    kind.as_str()
                )));
            }
        }

        if self.rest.timeout_secs == 0 {
            return Err(ConfigError::Validation(format!(
                "Module '{}': timeout_secs must be > 0",
                name
            )));
        }

        Ok(())
    }

    /// Selected kinds in collection order, whatever order the file lists them in.
    pub fn metric_kinds(&self) -> Vec<MetricKind> {
        MetricKind::ALL
            .into_iter()
            .filter(|kind| self.metrics.contains(kind))
            .collect()
    }
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            path: default_path(),
            logging: LoggingConfig::default(),
            modules: HashMap::new(),
        }
    }
}

/// The live configuration, swappable at runtime.
///
/// Scrapes take a snapshot with [`ConfigHandle::current`] and keep it for
/// their whole run; a reload only affects scrapes that start afterwards.
#[derive(Debug)]
pub struct ConfigHandle {
    source: Option<PathBuf>,
    current: RwLock<Arc<ExporterConfig>>,
}

impl ConfigHandle {
    /// Wrap a configuration that has no backing file.
    pub fn new(config: ExporterConfig) -> Self {
        Self {
            source: None,
            current: RwLock::new(Arc::new(config)),
        }
    }

    /// Load and validate a configuration file, remembering its path for reloads.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let config = ExporterConfig::load_from_file(&path)?;
        Ok(Self {
            source: Some(path),
            current: RwLock::new(Arc::new(config)),
        })
    }

    /// Snapshot of the current configuration.
    pub fn current(&self) -> Arc<ExporterConfig> {
        self.current.read().clone()
    }

    /// Replace the current configuration.
    pub fn replace(&self, config: ExporterConfig) {
        *self.current.write() = Arc::new(config);
    }

    /// Re-read the backing file. On failure the previous configuration stays active.
    pub fn reload(&self) -> Result<(), ConfigError> {
        let path = self.source.as_ref().ok_or(ConfigError::NoSource)?;

        match ExporterConfig::load_from_file(path) {
            Ok(config) => {
                info!(
                    path = %path.display(),
                    modules = config.modules.len(),
                    "Configuration reloaded"
                );
                self.replace(config);
                Ok(())
            }
            Err(e) => {
                error!(
                    path = %path.display(),
                    error = %e,
                    "Configuration reload failed, keeping previous configuration"
                );
                Err(e)
            }
        }
    }
}
