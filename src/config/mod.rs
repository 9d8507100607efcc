//! Configuration loading and management

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::schema::SchemaDescription;
use crate::storage::SeedData;

/// Environment variable overriding `server.host`
pub const ENV_HOST: &str = "BLOG_GRAPH_HOST";
/// Environment variable overriding `server.port`
pub const ENV_PORT: &str = "BLOG_GRAPH_PORT";
/// Environment variable overriding `log_level`
pub const ENV_LOG: &str = "BLOG_GRAPH_LOG";

/// Network settings of the HTTP server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind (e.g., "127.0.0.1", "0.0.0.0")
    pub host: String,

    /// TCP port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 4000,
        }
    }
}

impl ServerConfig {
    /// Address in `host:port` form
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Complete application configuration
///
/// Every field has a default, so an empty file is a valid configuration.
///
/// ```yaml
/// server:
///   host: 0.0.0.0
///   port: 8080
/// log_level: debug
/// schema_path: schema.yaml
/// seed_path: seed.yaml
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,

    /// Default `tracing` filter directive, used when `RUST_LOG` is unset
    pub log_level: String,

    /// YAML schema description replacing the built-in one
    pub schema_path: Option<String>,

    /// YAML seed data replacing the built-in demo records
    pub seed_path: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            log_level: "info".to_string(),
            schema_path: None,
            seed_path: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path))?;
        Self::from_yaml_str(&content).with_context(|| format!("Invalid config file '{}'", path))
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        // serde_yaml reads an empty document as null
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Apply `BLOG_GRAPH_*` overrides from the process environment
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(ENV_HOST) {
            self.server.host = host;
        }
        if let Some(port) = lookup(ENV_PORT) {
            self.server.port = port
                .parse()
                .with_context(|| format!("{} must be a port number, got '{}'", ENV_PORT, port))?;
        }
        if let Some(level) = lookup(ENV_LOG) {
            self.log_level = level;
        }
        Ok(())
    }

    /// The configured schema description, or the built-in one
    pub fn schema_description(&self) -> Result<SchemaDescription> {
        match &self.schema_path {
            Some(path) => Ok(SchemaDescription::from_yaml_file(path)?),
            None => Ok(SchemaDescription::blog()),
        }
    }

    /// The configured seed data, or the built-in demo records
    pub fn seed_data(&self) -> Result<SeedData> {
        match &self.seed_path {
            Some(path) => Ok(SeedData::from_yaml_file(path)?),
            None => Ok(SeedData::demo()),
        }
    }
}
