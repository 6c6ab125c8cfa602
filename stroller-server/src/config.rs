//! Server configuration.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::cache::CacheConfig;
use crate::capabilities::MockRouteQueryConfig;
use crate::credentials::TransitlandEndpoints;
use crate::credentials::dev_env::DEFAULT_DEV_ENV_PATH;

/// Default file persisted credentials are kept in.
pub const DEFAULT_STORAGE_PATH: &str = "stroller-storage.json";

/// Errors from reading configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {message}")]
    InvalidValue { var: &'static str, message: String },
}

/// Everything `main` needs to assemble the server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on
    pub addr: SocketAddr,

    /// JSON file holding persisted credentials
    pub storage_path: PathBuf,

    /// Development env file read at startup
    pub dev_env_path: PathBuf,

    /// Static assets directory
    pub static_dir: String,

    pub endpoints: TransitlandEndpoints,

    pub cache: CacheConfig,

    pub route_query: MockRouteQueryConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            storage_path: PathBuf::from(DEFAULT_STORAGE_PATH),
            dev_env_path: PathBuf::from(DEFAULT_DEV_ENV_PATH),
            static_dir: "static".to_string(),
            endpoints: TransitlandEndpoints::default(),
            cache: CacheConfig::default(),
            route_query: MockRouteQueryConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by environment variables.
    ///
    /// | Variable | Field |
    /// |---|---|
    /// | `STROLLER_ADDR` | `addr` |
    /// | `STROLLER_STORAGE_PATH` | `storage_path` |
    /// | `STROLLER_DEV_ENV` | `dev_env_path` |
    /// | `STROLLER_STATIC_DIR` | `static_dir` |
    /// | `STROLLER_MOCK_LATENCY_MS` | `route_query.latency` |
    /// | `TRANSITLAND_BASE_URL` | `endpoints` |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Like `from_env`, reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(addr) = lookup("STROLLER_ADDR") {
            config.addr = addr.parse().map_err(|e| ConfigError::InvalidValue {
                var: "STROLLER_ADDR",
                message: format!("{e}"),
            })?;
        }
        if let Some(path) = lookup("STROLLER_STORAGE_PATH") {
            config.storage_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("STROLLER_DEV_ENV") {
            config.dev_env_path = PathBuf::from(path);
        }
        if let Some(dir) = lookup("STROLLER_STATIC_DIR") {
            config.static_dir = dir;
        }
        if let Some(ms) = lookup("STROLLER_MOCK_LATENCY_MS") {
            let ms: u64 = ms.trim().parse().map_err(|e| ConfigError::InvalidValue {
                var: "STROLLER_MOCK_LATENCY_MS",
                message: format!("{e}"),
            })?;
            config.route_query = config.route_query.with_latency(Duration::from_millis(ms));
        }
        if let Some(base_url) = lookup("TRANSITLAND_BASE_URL") {
            config.endpoints = TransitlandEndpoints::new(base_url);
        }

        Ok(config)
    }

    pub fn with_storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage_path = path.into();
        self
    }

    pub fn with_static_dir(mut self, dir: impl Into<String>) -> Self {
        self.static_dir = dir.into();
        self
    }
}
