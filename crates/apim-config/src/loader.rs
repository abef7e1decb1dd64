//! Configuration loader with file and environment variable support

use crate::{AppConfig, ConfigError};
use std::env;
use std::path::PathBuf;
use tracing::info;

/// Standard config file search paths
const CONFIG_PATHS: &[&str] = &[
    "apim.toml",
    "config.toml",
    "./config/apim.toml",
    "/etc/apim/apim.toml",
];

/// Configuration loader
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Create a loader with a specific config file path
    pub fn with_path<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            config_path: Some(path.into()),
        }
    }

    /// Load configuration from file (if found) with environment variable overrides
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        self.load_with(|key| env::var(key).ok())
    }

    /// Same as [`load`](Self::load) with an explicit variable lookup.
    pub fn load_with<F>(&self, lookup: F) -> Result<AppConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = AppConfig::default();

        if let Some(path) = self.find_config_file(&lookup) {
            info!(?path, "Loading configuration from file");
            config = AppConfig::from_file(&path)?;
        }

        apply_overrides(&mut config, &lookup)?;
        config.validate()?;

        Ok(config)
    }

    fn find_config_file<F>(&self, lookup: &F) -> Option<PathBuf>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = &self.config_path {
            if path.exists() {
                return Some(path.clone());
            }
        }

        if let Some(path) = lookup("APIM_CONFIG").map(PathBuf::from) {
            if path.exists() {
                return Some(path);
            }
        }

        CONFIG_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn apply_overrides<F>(config: &mut AppConfig, lookup: &F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    // HTTP
    if let Some(val) = lookup("APIM_HTTP_PORT") {
        config.http.port = val
            .parse()
            .map_err(|_| ConfigError::ValidationError(format!("APIM_HTTP_PORT: invalid port '{}'", val)))?;
    }
    if let Some(val) = lookup("APIM_HTTP_HOST") {
        config.http.host = val;
    }
    if let Some(val) = lookup("APIM_CORS_ORIGINS") {
        config.http.cors_origins = split_list(&val);
    }

    // MongoDB
    if let Some(val) = lookup("APIM_MONGODB_URI") {
        config.mongodb.uri = val;
    }
    if let Some(val) = lookup("APIM_MONGODB_DATABASE") {
        config.mongodb.database = val;
    }

    // Storage
    if let Some(val) = lookup("APIM_STORAGE_BACKEND") {
        config.storage.backend = val.parse()?;
    }

    // Management
    if let Some(val) = lookup("APIM_DEFAULT_ORGANIZATION") {
        config.management.default_organization_id = val;
    }
    if let Some(val) = lookup("APIM_DEFAULT_ENVIRONMENT") {
        config.management.default_environment_id = val;
    }
    if let Some(val) = lookup("APIM_DEPLOYMENT_LABEL") {
        config.management.deployment_label = val;
    }
    if let Some(val) = lookup("APIM_MIGRATION_INCOMPATIBLE_POLICIES") {
        config.management.migration.incompatible_policies = split_list(&val);
    }

    // General
    if let Some(val) = lookup("APIM_LOG_FORMAT") {
        config.log_format = val;
    }
    if let Some(val) = lookup("APIM_DEV_MODE") {
        config.dev_mode = matches!(val.trim(), "true" | "1" | "yes");
    }

    Ok(())
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StorageBackend;
    use std::collections::HashMap;
    use std::io::Write;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_env_overrides_file_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[http]\nport = 9000\n[mongodb]\ndatabase = \"from-file\"").unwrap();

        let env = vars(&[
            ("APIM_HTTP_PORT", "9100"),
            ("APIM_STORAGE_BACKEND", "memory"),
            ("APIM_MIGRATION_INCOMPATIBLE_POLICIES", "groovy, ,cloud-events"),
        ]);
        let config = ConfigLoader::with_path(file.path())
            .load_with(|k| env.get(k).cloned())
            .unwrap();

        assert_eq!(config.http.port, 9100);
        assert_eq!(config.mongodb.database, "from-file");
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(
            config.management.migration.incompatible_policies,
            vec!["groovy".to_string(), "cloud-events".to_string()]
        );
    }

    #[test]
    fn test_config_path_from_env() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "dev_mode = true").unwrap();
        let path = file.path().to_string_lossy().to_string();

        let env = vars(&[("APIM_CONFIG", path.as_str())]);
        let config = ConfigLoader::new().load_with(|k| env.get(k).cloned()).unwrap();

        assert!(config.dev_mode);
    }

    #[test]
    fn test_invalid_port_rejected() {
        let env = vars(&[("APIM_HTTP_PORT", "not-a-port")]);
        let err = ConfigLoader::with_path("/nonexistent/apim.toml")
            .load_with(|k| env.get(k).cloned())
            .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let env = vars(&[("APIM_STORAGE_BACKEND", "cassandra")]);
        let result = ConfigLoader::with_path("/nonexistent/apim.toml").load_with(|k| env.get(k).cloned());
        assert!(result.is_err());
    }
}
