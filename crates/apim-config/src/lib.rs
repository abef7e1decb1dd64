//! API Management Configuration
//!
//! TOML-based configuration with environment variable overrides.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

mod loader;

pub use loader::ConfigLoader;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Root application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub mongodb: MongoConfig,
    pub storage: StorageConfig,
    pub management: ManagementConfig,

    /// Log format: "text" or "json"
    pub log_format: String,

    /// Enable development mode (seeds a default user, relaxes CORS)
    pub dev_mode: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            mongodb: MongoConfig::default(),
            storage: StorageConfig::default(),
            management: ManagementConfig::default(),
            log_format: "text".to_string(),
            dev_mode: false,
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub port: u16,
    pub host: String,
    pub cors_origins: Vec<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: 8083,
            host: "0.0.0.0".to_string(),
            cors_origins: vec!["http://localhost:4000".to_string()],
        }
    }
}

/// MongoDB configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            uri: "mongodb://localhost:27017".to_string(),
            database: "apim".to_string(),
        }
    }
}

/// Which persistence backend the repositories use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Mongodb,
    Memory,
}

impl std::str::FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mongodb" | "mongo" => Ok(StorageBackend::Mongodb),
            "memory" | "in-memory" => Ok(StorageBackend::Memory),
            other => Err(ConfigError::ValidationError(format!(
                "unknown storage backend '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Mongodb,
        }
    }
}

/// Management plane behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagementConfig {
    /// Organization used when a request carries no organization header
    pub default_organization_id: String,
    /// Environment used when a request carries no environment
    pub default_environment_id: String,
    /// Label attached to deployments triggered by reconciliation
    pub deployment_label: String,
    pub migration: MigrationConfig,
}

impl Default for ManagementConfig {
    fn default() -> Self {
        Self {
            default_organization_id: "DEFAULT".to_string(),
            default_environment_id: "DEFAULT".to_string(),
            deployment_label: "Automatic deployment".to_string(),
            migration: MigrationConfig::default(),
        }
    }
}

/// V2 to V4 migration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationConfig {
    /// Policies with no V4 equivalent; any flow step using one blocks migration
    pub incompatible_policies: Vec<String>,
    /// V2 endpoint types that map onto the V4 http-proxy connector
    pub http_endpoint_types: Vec<String>,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            incompatible_policies: vec![
                "cloud-events".to_string(),
                "data-logging-masking".to_string(),
                "policy-assign-metrics".to_string(),
            ],
            http_endpoint_types: vec![
                "http".to_string(),
                "http1".to_string(),
                "http2".to_string(),
                "grpc".to_string(),
            ],
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with environment variable override
    pub fn load() -> Result<Self, ConfigError> {
        ConfigLoader::new().load()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.management.default_organization_id.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "management.default_organization_id must not be empty".to_string(),
            ));
        }
        if self.management.default_environment_id.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "management.default_environment_id must not be empty".to_string(),
            ));
        }
        if self.storage.backend == StorageBackend::Mongodb && self.mongodb.uri.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "mongodb.uri is required with the mongodb storage backend".to_string(),
            ));
        }
        Ok(())
    }

    /// Generate an example TOML configuration
    pub fn example_toml() -> String {
        r#"# API Management Configuration
# APIM_* environment variables override these settings

log_format = "text"  # text or json
dev_mode = false

[http]
port = 8083
host = "0.0.0.0"
cors_origins = ["http://localhost:4000"]

[mongodb]
uri = "mongodb://localhost:27017"
database = "apim"

[storage]
backend = "mongodb"  # mongodb or memory

[management]
default_organization_id = "DEFAULT"
default_environment_id = "DEFAULT"
deployment_label = "Automatic deployment"

[management.migration]
incompatible_policies = ["cloud-events", "data-logging-masking", "policy-assign-metrics"]
http_endpoint_types = ["http", "http1", "http2", "grpc"]
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_example_toml_parses() {
        let config: AppConfig = toml::from_str(&AppConfig::example_toml()).unwrap();
        assert_eq!(config.http.port, 8083);
        assert_eq!(config.storage.backend, StorageBackend::Mongodb);
        assert_eq!(config.management.default_environment_id, "DEFAULT");
        assert!(config
            .management
            .migration
            .incompatible_policies
            .contains(&"cloud-events".to_string()));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[storage]\nbackend = \"memory\"\n").unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.mongodb.database, "apim");
        assert_eq!(config.management.deployment_label, "Automatic deployment");
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[http\nport = ").unwrap();

        let err = AppConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_empty_environment_rejected() {
        let mut config = AppConfig::default();
        config.management.default_environment_id = " ".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_storage_backend_from_str() {
        assert_eq!("memory".parse::<StorageBackend>().unwrap(), StorageBackend::Memory);
        assert_eq!("Mongo".parse::<StorageBackend>().unwrap(), StorageBackend::Mongodb);
        assert!("redis".parse::<StorageBackend>().is_err());
    }
}
