//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::datasource::DataSource;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Data source serving every query batch
    pub datasource: Arc<DataSource>,
    /// API configuration
    pub config: Arc<ApiConfig>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    pub fn new(datasource: Arc<DataSource>, config: ApiConfig) -> Self {
        Self {
            datasource,
            config: Arc::new(config),
            start_time: Instant::now(),
        }
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Batches still running after this are cancelled
    pub request_timeout_ms: u64,
    /// Maximum request body size in bytes
    pub max_body_size: usize,
    /// Allowed CORS origins; empty allows any
    pub cors_origins: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8090,
            request_timeout_ms: 60_000,
            max_body_size: 2 * 1024 * 1024, // 2MB
            cors_origins: crate::config::ApiConfig::default().cors_origins,
        }
    }
}

impl From<&crate::config::ApiConfig> for ApiConfig {
    fn from(config: &crate::config::ApiConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            request_timeout_ms: config.request_timeout_secs.saturating_mul(1000),
            cors_origins: config.cors_origins.clone(),
            ..Default::default()
        }
    }
}

impl ApiConfig {
    /// Create config with custom host and port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_file_config() {
        let file_config = crate::config::ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 9000,
            cors_origins: vec!["http://localhost:3000".to_string()],
            request_timeout_secs: 5,
        };

        let config = ApiConfig::from(&file_config);
        assert_eq!(config.addr(), "127.0.0.1:9000");
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert_eq!(config.cors_origins.len(), 1);
    }

    #[test]
    fn test_default_cors_matches_file_default() {
        assert_eq!(
            ApiConfig::default().cors_origins,
            crate::config::ApiConfig::default().cors_origins
        );
    }
}
