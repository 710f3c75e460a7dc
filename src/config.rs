//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::datasource::DataSourceSettings;
use crate::query::QueryDefaults;
use crate::store::CosmosClientOptions;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub datasource: DatasourceConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Data source instance configuration
#[derive(Clone, Deserialize)]
pub struct DatasourceConfig {
    /// Account endpoint, e.g. `https://acct.documents.azure.com:443/`
    pub endpoint_uri: Option<String>,

    /// Account primary key. Prefer `COSMOFRAME_PRIMARY_KEY` over the file.
    pub primary_key: Option<String>,

    pub default_database: Option<String>,

    pub default_container: Option<String>,

    pub default_partition_key: Option<String>,

    /// Page size hint sent to the store
    pub max_item_count: Option<u32>,

    #[serde(default = "default_store_timeout")]
    pub request_timeout_ms: u64,

    #[serde(default = "default_query_concurrency")]
    pub query_concurrency: usize,
}

fn default_store_timeout() -> u64 {
    30_000 // 30 seconds
}

fn default_query_concurrency() -> usize {
    1
}

impl Default for DatasourceConfig {
    fn default() -> Self {
        Self {
            endpoint_uri: None,
            primary_key: None,
            default_database: None,
            default_container: None,
            default_partition_key: None,
            max_item_count: None,
            request_timeout_ms: default_store_timeout(),
            query_concurrency: default_query_concurrency(),
        }
    }
}

impl std::fmt::Debug for DatasourceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatasourceConfig")
            .field("endpoint_uri", &self.endpoint_uri)
            .field("primary_key", &self.primary_key.as_ref().map(|_| "<redacted>"))
            .field("default_database", &self.default_database)
            .field("default_container", &self.default_container)
            .field("default_partition_key", &self.default_partition_key)
            .field("max_item_count", &self.max_item_count)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("query_concurrency", &self.query_concurrency)
            .finish()
    }
}

/// API server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Allowed browser origins; an empty list allows any origin
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Batches still running after this are cancelled
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8090
}

fn default_request_timeout() -> u64 {
    60
}

fn default_cors_origins() -> Vec<String> {
    vec!["http://localhost:3000".to_string()]
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: default_cors_origins(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("cosmoframe").join("config.toml")),
            Some(PathBuf::from("/etc/cosmoframe/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        // Data source overrides
        if let Some(endpoint) = var("COSMOFRAME_ENDPOINT_URI") {
            self.datasource.endpoint_uri = Some(endpoint);
        }
        if let Some(key) = var("COSMOFRAME_PRIMARY_KEY") {
            self.datasource.primary_key = Some(key);
        }
        if let Some(database) = var("COSMOFRAME_DATABASE") {
            self.datasource.default_database = Some(database);
        }
        if let Some(container) = var("COSMOFRAME_CONTAINER") {
            self.datasource.default_container = Some(container);
        }
        if let Some(partition_key) = var("COSMOFRAME_PARTITION_KEY") {
            self.datasource.default_partition_key = Some(partition_key);
        }
        if let Some(concurrency) = var("COSMOFRAME_QUERY_CONCURRENCY") {
            if let Ok(n) = concurrency.parse() {
                self.datasource.query_concurrency = n;
            }
        }

        // API overrides
        if let Some(host) = var("COSMOFRAME_API_HOST") {
            self.api.host = host;
        }
        if let Some(port) = var("COSMOFRAME_API_PORT") {
            if let Ok(p) = port.parse() {
                self.api.port = p;
            }
        }

        // Logging overrides
        if let Some(level) = var("COSMOFRAME_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("COSMOFRAME_LOG_FORMAT") {
            self.logging.format = format;
        }
    }

    /// Settings for building a data source instance
    pub fn to_settings(&self) -> DataSourceSettings {
        let ds = &self.datasource;
        DataSourceSettings {
            endpoint_uri: ds.endpoint_uri.clone(),
            primary_key: ds.primary_key.clone(),
            defaults: QueryDefaults {
                database: ds.default_database.clone(),
                container: ds.default_container.clone(),
                partition_key: ds.default_partition_key.clone(),
            },
            client: CosmosClientOptions {
                request_timeout_ms: ds.request_timeout_ms,
                max_item_count: ds.max_item_count,
            },
            query_concurrency: ds.query_concurrency.max(1),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# cosmoframe Configuration
#
# Environment variables override these settings:
# - COSMOFRAME_ENDPOINT_URI
# - COSMOFRAME_PRIMARY_KEY
# - COSMOFRAME_DATABASE
# - COSMOFRAME_CONTAINER
# - COSMOFRAME_PARTITION_KEY
# - COSMOFRAME_QUERY_CONCURRENCY
# - COSMOFRAME_API_HOST
# - COSMOFRAME_API_PORT
# - COSMOFRAME_LOG_LEVEL
# - COSMOFRAME_LOG_FORMAT

[datasource]
# Cosmos DB account endpoint
endpoint_uri = "https://your-account.documents.azure.com:443/"

# Account primary key (base64). Better set through COSMOFRAME_PRIMARY_KEY.
# primary_key = ""

# Used when a query leaves these empty
# default_database = "iot"
# default_container = "readings"
# default_partition_key = "device-1"

# Documents per page requested from the store
# max_item_count = 1000

# Timeout for a single store request (ms)
request_timeout_ms = 30000

# Queries of one batch allowed to run at once
query_concurrency = 1

[api]
# API server host
host = "0.0.0.0"

# API server port
port = 8090

# Allowed CORS origins
cors_origins = ["http://localhost:3000"]

# Batches still running after this many seconds are cancelled
request_timeout_secs = 60

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.datasource.endpoint_uri.is_none());
        assert_eq!(config.datasource.request_timeout_ms, 30_000);
        assert_eq!(config.datasource.query_concurrency, 1);
        assert_eq!(config.api.port, 8090);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[datasource]
endpoint_uri = "https://acct.documents.azure.com:443/"
default_database = "iot"
query_concurrency = 4

[api]
port = 9000
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(
            config.datasource.endpoint_uri.as_deref(),
            Some("https://acct.documents.azure.com:443/")
        );
        assert_eq!(config.datasource.default_database.as_deref(), Some("iot"));
        assert_eq!(config.datasource.query_concurrency, 4);
        assert_eq!(config.datasource.request_timeout_ms, 30_000);
        assert_eq!(config.api.port, 9000);
        assert_eq!(config.api.host, "0.0.0.0");
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_api_section_keeps_default_cors_origins() {
        let from_section: Config = toml::from_str("[api]\nport = 9000\n").unwrap();
        let without_section: Config = toml::from_str("").unwrap();

        assert_eq!(from_section.api.cors_origins, vec!["http://localhost:3000"]);
        assert_eq!(from_section.api.cors_origins, without_section.api.cors_origins);
        assert_eq!(from_section.api.cors_origins, ApiConfig::default().cors_origins);

        let open: Config = toml::from_str("[api]\ncors_origins = []\n").unwrap();
        assert!(open.api.cors_origins.is_empty());
    }

    #[test]
    fn test_load_errors() {
        let missing = Config::load(Path::new("/nonexistent/cosmoframe.toml"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[api]\nport = \"not a number\"").unwrap();
        assert!(matches!(Config::load(file.path()), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_generated_config_parses() {
        let config: Config = toml::from_str(&generate_default_config()).unwrap();
        assert!(config.datasource.primary_key.is_none());
        assert_eq!(config.api.request_timeout_secs, 60);
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("COSMOFRAME_ENDPOINT_URI", "https://other.documents.azure.com"),
            ("COSMOFRAME_PRIMARY_KEY", "a2V5"),
            ("COSMOFRAME_CONTAINER", "events"),
            ("COSMOFRAME_API_PORT", "not-a-port"),
            ("COSMOFRAME_LOG_FORMAT", "json"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(
            config.datasource.endpoint_uri.as_deref(),
            Some("https://other.documents.azure.com")
        );
        assert_eq!(config.datasource.default_container.as_deref(), Some("events"));
        assert_eq!(config.api.port, 8090);
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_to_settings() {
        let mut config = Config::default();
        config.datasource.primary_key = Some("a2V5".to_string());
        config.datasource.default_partition_key = Some("dev-1".to_string());
        config.datasource.max_item_count = Some(50);
        config.datasource.query_concurrency = 0;

        let settings = config.to_settings();
        assert_eq!(settings.primary_key.as_deref(), Some("a2V5"));
        assert_eq!(settings.defaults.partition_key.as_deref(), Some("dev-1"));
        assert_eq!(settings.client.max_item_count, Some(50));
        assert_eq!(settings.query_concurrency, 1);
    }

    #[test]
    fn test_debug_redacts_key() {
        let mut config = Config::default();
        config.datasource.primary_key = Some("super-secret".to_string());
        assert!(!format!("{:?}", config).contains("super-secret"));
    }
}
