// Configuration module entry point
// Loads the process-wide configuration once and builds the shared runtime state

mod state;
mod types;

use std::net::SocketAddr;

// Re-export public types
pub use state::AppState;
pub use types::{
    Config, CorsConfig, HttpConfig, IdentityConfig, LoggingConfig, PerformanceConfig,
    PublicIdentityConfig, ServerConfig, SiteConfig,
};

/// Well-known plain environment variables and the keys they override.
/// The first variable found wins for keys listed more than once.
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("PORT", "server.port"),
    ("AUTH0_DOMAIN", "identity.domain"),
    ("AUTH0_CLIENT_ID", "identity.client_id"),
    ("AUTH0_CLIENT_SECRET", "identity.client_secret"),
    ("AUTH0_AUDIENCE", "identity.audience"),
    ("AUTH0_ENTRA_CONNECTION", "identity.connection"),
    ("ALLOWED_ORIGINS", "cors.allowed_origins"),
    ("AUTH0_BASE_URL", "cors.base_url"),
    ("BASE_URL", "cors.base_url"),
];

impl Config {
    /// Load configuration from specified file path (without extension)
    /// Default config file is "config.toml" when no path specified
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let overrides = collect_env_overrides(|name| std::env::var(name).ok());
        Self::build(Some(config_path), &overrides)
    }

    /// Build configuration from an optional file plus explicit key overrides
    pub fn build(
        config_path: Option<&str>,
        overrides: &[(&str, String)],
    ) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }
        builder = builder
            .add_source(config::Environment::with_prefix("SITE").separator("__"))
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("site.root_dir", ".")?
            .set_default("site.index_file", "index.html")?
            .set_default("site.data_dir", "data")?
            .set_default("site.submissions_file", "contact_submissions.json")?
            .set_default("identity.session_cookie", "arkham.sid")?
            .set_default("identity.session_ttl_secs", 86_400)?
            .set_default("cors.base_url", "")?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("http.server_name", "arkham-site/0.1")?
            .set_default("http.max_body_size", 65_536)?;

        for (key, value) in overrides {
            builder = builder.set_override(*key, value.as_str())?;
        }

        let mut cfg: Self = builder.build()?.try_deserialize()?;
        if cfg.cors.base_url.trim().is_empty() {
            cfg.cors.base_url = format!("http://localhost:{}", cfg.server.port);
        }
        Ok(cfg)
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

/// Map the plain environment variables onto configuration keys
fn collect_env_overrides(lookup: impl Fn(&str) -> Option<String>) -> Vec<(&'static str, String)> {
    let mut overrides: Vec<(&'static str, String)> = Vec::new();
    for (name, key) in ENV_OVERRIDES {
        if overrides.iter().any(|(k, _)| k == key) {
            continue;
        }
        if let Some(value) = lookup(name).filter(|v| !v.trim().is_empty()) {
            overrides.push((*key, value));
        }
    }
    overrides
}

/// Configuration rooted at a scratch directory, used by tests across the crate
#[cfg(test)]
pub(crate) fn test_config(root: &std::path::Path, overrides: &[(&str, String)]) -> Config {
    let root_dir = root.display().to_string();
    let data_dir = root.join("data").display().to_string();
    let mut all = vec![("site.root_dir", root_dir), ("site.data_dir", data_dir)];
    all.extend(overrides.iter().cloned());
    Config::build(None, &all).expect("test config should build")
}
