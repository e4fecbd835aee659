//! Exporter configuration: TOML file plus environment overrides.

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Environment variables consulted after the config file is loaded.
///
/// Each is also read with [`ENV_PREFIX`] prepended, the form deployed
/// exporters already use; the prefixed name wins when both are set.
pub const ENV_PREFIX: &str = "PEPPAMON_";
pub const ENV_HOSTNAME: &str = "VERSA_ANALYTICS_HOSTNAME";
pub const ENV_USERNAME: &str = "VERSA_ANALYTICS_USERNAME";
pub const ENV_PASSWORD: &str = "VERSA_ANALYTICS_PASSWORD";
pub const ENV_SCHEME: &str = "VERSA_ANALYTICS_SCHEME";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExporterConfig {
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub collector: CollectorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    #[serde(default)]
    pub hostname: String,
    #[serde(default = "default_scheme")]
    pub scheme: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// The analytics nodes usually ship self-signed certificates.
    #[serde(default = "default_true")]
    pub accept_invalid_certs: bool,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            hostname: String::new(),
            scheme: default_scheme(),
            username: String::new(),
            password: String::new(),
            timeout_secs: default_timeout_secs(),
            accept_invalid_certs: true,
        }
    }
}

impl AnalyticsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// `{scheme}://{hostname}` without a trailing slash.
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.scheme, self.hostname.trim_end_matches('/'))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Upper bound on concurrent upstream fetches per cycle. 0 = unbounded.
    #[serde(default)]
    pub max_in_flight: usize,
    /// Prefix prepended to every exported metric name.
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            max_in_flight: 0,
            namespace: default_namespace(),
        }
    }
}

fn default_scheme() -> String {
    "https".to_string()
}

fn default_timeout_secs() -> u64 {
    600
}

fn default_true() -> bool {
    true
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 2112))
}

fn default_namespace() -> String {
    "versa_analytics".to_string()
}

impl ExporterConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Apply `PEPPAMON_VERSA_ANALYTICS_*` / `VERSA_ANALYTICS_*` overrides
    /// from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary lookup; empty values are ignored.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let get = |key: &str| {
            non_empty(&format!("{ENV_PREFIX}{key}")).or_else(|| non_empty(key))
        };

        if let Some(v) = get(ENV_HOSTNAME) {
            self.analytics.hostname = v;
        }
        if let Some(v) = get(ENV_USERNAME) {
            self.analytics.username = v;
        }
        if let Some(v) = get(ENV_PASSWORD) {
            self.analytics.password = v;
        }
        if let Some(v) = get(ENV_SCHEME) {
            self.analytics.scheme = v;
        }
    }

    /// Check that everything needed to reach the backend is present.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.analytics.hostname.trim().is_empty() {
            return Err(ConfigError::Missing("analytics.hostname"));
        }
        if self.analytics.username.trim().is_empty() {
            return Err(ConfigError::Missing("analytics.username"));
        }
        if !matches!(self.analytics.scheme.as_str(), "http" | "https") {
            return Err(ConfigError::Invalid {
                key: "analytics.scheme",
                reason: format!("expected http or https, got {:?}", self.analytics.scheme),
            });
        }
        if self.collector.namespace.is_empty()
            || self.collector.namespace.starts_with(|c: char| c.is_ascii_digit())
            || !self
                .collector
                .namespace
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(ConfigError::Invalid {
                key: "collector.namespace",
                reason: format!("{:?} is not a valid metric prefix", self.collector.namespace),
            });
        }
        Ok(())
    }
}
