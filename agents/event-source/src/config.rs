//! Configuration for the Event Source Agent
//!
//! Loaded from a YAML, TOML or JSON file (chosen by extension), then
//! overridden by environment variables:
//!
//! - `EVENT_SOURCE_DEVICE_MANAGER_URLS` - comma-separated base URLs
//! - `EVENT_SOURCE_EVENT_CENTER_URLS` - comma-separated base URLs
//! - `EVENT_SOURCE_REQUEST_TIMEOUT_MS`
//! - `PORT`

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

pub const ENV_DEVICE_MANAGER_URLS: &str = "EVENT_SOURCE_DEVICE_MANAGER_URLS";
pub const ENV_EVENT_CENTER_URLS: &str = "EVENT_SOURCE_EVENT_CENTER_URLS";
pub const ENV_REQUEST_TIMEOUT_MS: &str = "EVENT_SOURCE_REQUEST_TIMEOUT_MS";
pub const ENV_PORT: &str = "PORT";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Collaborator endpoint pools
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServicesConfig {
    /// Device directory instances
    pub device_manager: Vec<String>,

    /// Event store instances
    pub event_center: Vec<String>,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            device_manager: vec!["http://localhost:8081".to_string()],
            event_center: vec!["http://localhost:8082".to_string()],
        }
    }
}

/// HTTP bind address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Top-level agent configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventSourceConfig {
    pub services: ServicesConfig,

    /// Per-request timeout for collaborator calls, in milliseconds
    pub request_timeout_ms: u64,

    pub server: ServerConfig,
}

impl Default for EventSourceConfig {
    fn default() -> Self {
        Self {
            services: ServicesConfig::default(),
            request_timeout_ms: 5000,
            server: ServerConfig::default(),
        }
    }
}

impl EventSourceConfig {
    /// Create a new config builder
    pub fn builder() -> EventSourceConfigBuilder {
        EventSourceConfigBuilder::new()
    }

    /// Defaults overridden by the environment
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load a config file, apply environment overrides and validate
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parse a config file without overrides or validation
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        Self::parse(&content, &extension)
    }

    /// Parse config text in the given format (`yaml`, `yml`, `toml`, `json`)
    pub fn parse(content: &str, format: &str) -> Result<Self> {
        match format {
            "yaml" | "yml" => {
                serde_yaml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            "toml" => toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string())),
            "json" => {
                serde_json::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            other => Err(ConfigError::UnsupportedFormat(other.to_string())),
        }
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// Unparseable numeric values are ignored with a warning.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(urls) = lookup(ENV_DEVICE_MANAGER_URLS) {
            self.services.device_manager = split_urls(&urls);
        }
        if let Some(urls) = lookup(ENV_EVENT_CENTER_URLS) {
            self.services.event_center = split_urls(&urls);
        }
        if let Some(value) = lookup(ENV_REQUEST_TIMEOUT_MS) {
            match value.trim().parse() {
                Ok(timeout) => self.request_timeout_ms = timeout,
                Err(_) => tracing::warn!(
                    variable = ENV_REQUEST_TIMEOUT_MS,
                    value = %value,
                    "Ignoring invalid timeout override"
                ),
            }
        }
        if let Some(value) = lookup(ENV_PORT) {
            match value.trim().parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!(
                    variable = ENV_PORT,
                    value = %value,
                    "Ignoring invalid port override"
                ),
            }
        }
    }

    /// Check the pools and timeout
    pub fn validate(&self) -> Result<()> {
        if self.services.device_manager.is_empty() {
            return Err(ConfigError::Invalid(
                "services.device_manager must list at least one instance".to_string(),
            ));
        }
        if self.services.event_center.is_empty() {
            return Err(ConfigError::Invalid(
                "services.event_center must list at least one instance".to_string(),
            ));
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// `host:port` to bind the HTTP server on
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn split_urls(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(|url| url.trim_end_matches('/').to_string())
        .collect()
}

/// Builder for EventSourceConfig
pub struct EventSourceConfigBuilder {
    config: EventSourceConfig,
}

impl EventSourceConfigBuilder {
    /// Create a new builder with defaults
    pub fn new() -> Self {
        Self {
            config: EventSourceConfig::default(),
        }
    }

    /// Set the device manager pool
    pub fn device_manager<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.services.device_manager = urls.into_iter().map(Into::into).collect();
        self
    }

    /// Set the event center pool
    pub fn event_center<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.services.event_center = urls.into_iter().map(Into::into).collect();
        self
    }

    pub fn request_timeout_ms(mut self, timeout: u64) -> Self {
        self.config.request_timeout_ms = timeout;
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.server.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    /// Build the configuration
    pub fn build(self) -> EventSourceConfig {
        self.config
    }
}

impl Default for EventSourceConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
