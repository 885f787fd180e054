// Configuration types module
// Defines all configuration-related data structures

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub site: SiteConfig,
    pub identity: IdentityConfig,
    pub cors: CorsConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Site layout: where static files and submissions live
#[derive(Debug, Deserialize, Clone)]
pub struct SiteConfig {
    /// Directory served as the website root
    pub root_dir: String,
    /// Document served for `/` and as the single-page-app fallback
    pub index_file: String,
    /// Directory holding the submissions file (never served)
    pub data_dir: String,
    /// File name of the submissions collection inside `data_dir`
    pub submissions_file: String,
    /// Liveness probe path
    #[serde(default = "default_health_path")]
    pub health_path: String,
}

#[allow(clippy::missing_const_for_fn)]
fn default_health_path() -> String {
    "/healthz".to_string()
}

impl SiteConfig {
    pub fn submissions_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(&self.submissions_file)
    }

    pub fn index_path(&self) -> PathBuf {
        PathBuf::from(&self.root_dir).join(&self.index_file)
    }
}

/// Identity provider settings
///
/// `client_secret` stays server-side; it is never part of any response.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct IdentityConfig {
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub audience: String,
    /// Optional enterprise connection forwarded on login
    #[serde(default)]
    pub connection: Option<String>,
    pub session_cookie: String,
    /// Seconds a login session stays valid after `/callback`
    pub session_ttl_secs: u64,
}

impl IdentityConfig {
    /// Domain and client id are the minimum needed to talk to the provider
    pub fn is_configured(&self) -> bool {
        !self.domain.trim().is_empty() && !self.client_id.trim().is_empty()
    }

    /// Public subset handed to browsers
    pub fn public(&self) -> PublicIdentityConfig {
        PublicIdentityConfig {
            domain: self.domain.clone(),
            client_id: self.client_id.clone(),
            audience: self.audience.clone(),
        }
    }
}

/// Non-secret identity parameters exposed by `/api/auth/config`
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PublicIdentityConfig {
    pub domain: String,
    pub client_id: String,
    pub audience: String,
}

/// Cross-origin settings
#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    /// Comma-separated list of permitted origins; empty means "same site only"
    #[serde(default)]
    pub allowed_origins: String,
    /// Public base URL of the site, also the fallback CORS origin
    pub base_url: String,
}

impl CorsConfig {
    pub fn origins(&self) -> Vec<String> {
        self.allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
            .collect()
    }
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
    pub max_connections: Option<u64>,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HttpConfig {
    pub server_name: String,
    pub max_body_size: u64,
}
