//! Configuration for beacon-daemon

use beacon_registry::{ListPolicy, LivenessPolicy, StalePolicy};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

/// Main daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Registry and liveness configuration
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Maximum request body size in bytes
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            enable_cors: true,
            request_timeout_secs: default_request_timeout(),
            max_body_size: default_max_body_size(),
        }
    }
}

/// Registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Seconds without a heartbeat before a broadcaster is stale
    #[serde(default = "default_liveness_timeout")]
    pub liveness_timeout_secs: u64,

    /// Seconds between liveness sweeps
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    /// Demote stale broadcasters to inactive, or evict them
    #[serde(default)]
    pub stale_policy: StalePolicy,

    /// Seconds an inactive broadcaster is kept; 0 keeps it until deregistered
    #[serde(default = "default_inactive_retention")]
    pub inactive_retention_secs: u64,

    /// Include inactive broadcasters in list responses
    #[serde(default = "default_true")]
    pub list_inactive: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            liveness_timeout_secs: default_liveness_timeout(),
            sweep_interval_secs: default_sweep_interval(),
            stale_policy: StalePolicy::default(),
            inactive_retention_secs: default_inactive_retention(),
            list_inactive: true,
        }
    }
}

impl RegistryConfig {
    pub fn liveness_policy(&self) -> LivenessPolicy {
        LivenessPolicy {
            timeout: Duration::from_secs(self.liveness_timeout_secs),
            stale_policy: self.stale_policy,
            inactive_retention: match self.inactive_retention_secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
        }
    }

    pub fn list_policy(&self) -> ListPolicy {
        ListPolicy {
            include_inactive: self.list_inactive,
        }
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Default value helpers
fn default_true() -> bool {
    true
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 5000))
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_body_size() -> usize {
    64 * 1024
}

fn default_liveness_timeout() -> u64 {
    15
}

fn default_sweep_interval() -> u64 {
    5
}

fn default_inactive_retention() -> u64 {
    300
}

fn default_log_level() -> String {
    "info".to_string()
}

impl DaemonConfig {
    /// Load configuration: defaults, then the optional file, then
    /// `BEACON__SECTION__KEY` environment variables
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        // Add default configuration
        builder = builder.add_source(config::Config::try_from(&DaemonConfig::default())?);

        // Add file configuration if provided
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("BEACON")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config: DaemonConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the liveness monitor cannot run with
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.registry.liveness_timeout_secs == 0 {
            return Err(config::ConfigError::Message(
                "registry.liveness_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.registry.sweep_interval_secs == 0 {
            return Err(config::ConfigError::Message(
                "registry.sweep_interval_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DaemonConfig::default();
        assert_eq!(config.server.listen_addr.port(), 5000);
        assert!(config.server.enable_cors);
        assert_eq!(config.registry.stale_policy, StalePolicy::MarkInactive);
        assert!(config.registry.list_inactive);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_liveness_policy_conversion() {
        let mut registry = RegistryConfig::default();
        let policy = registry.liveness_policy();
        assert_eq!(policy.timeout, Duration::from_secs(15));
        assert_eq!(policy.inactive_retention, Some(Duration::from_secs(300)));

        registry.inactive_retention_secs = 0;
        assert_eq!(registry.liveness_policy().inactive_retention, None);
        assert_eq!(registry.sweep_interval(), Duration::from_secs(5));
    }

    #[test]
    fn test_validate_rejects_zero_durations() {
        let mut config = DaemonConfig::default();
        config.registry.sweep_interval_secs = 0;
        assert!(config.validate().is_err());

        let mut config = DaemonConfig::default();
        config.registry.liveness_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deserialize_partial_registry_section() {
        let config: DaemonConfig = serde_json::from_str(
            r#"{"registry": {"stale_policy": "evict", "list_inactive": false}}"#,
        )
        .unwrap();
        assert_eq!(config.registry.stale_policy, StalePolicy::Evict);
        assert!(!config.registry.list_inactive);
        assert_eq!(config.registry.liveness_timeout_secs, 15);
        assert_eq!(config.server.listen_addr.port(), 5000);
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let config = DaemonConfig::load(None).unwrap();
        assert_eq!(config.registry.sweep_interval_secs, 5);
        assert_eq!(config.logging.level, "info");
    }
}
