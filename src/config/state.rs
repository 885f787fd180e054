// Application state module
// Everything a request handler needs, built once at startup

use std::sync::Arc;
use std::time::Duration;

use super::types::Config;
use crate::identity::{CodeExchange, SessionRegistry};
use crate::submission::{FileSubmissionStore, SubmissionStore};

/// Application state
pub struct AppState {
    pub config: Config,

    /// Where accepted contact submissions go
    pub store: Arc<dyn SubmissionStore>,

    /// Server-side login sessions keyed by cookie value
    pub sessions: SessionRegistry,

    /// Identity integration that turns an authorization code into claims.
    /// `None` means `/callback` answers 501.
    pub code_exchange: Option<Arc<dyn CodeExchange>>,
}

impl AppState {
    /// Create `AppState` backed by the submissions file named in the config
    pub fn new(config: &Config) -> Self {
        let store = Arc::new(FileSubmissionStore::new(config.site.submissions_path()));
        Self::with_store(config, store)
    }

    /// Create `AppState` with an explicit submission store
    pub fn with_store(config: &Config, store: Arc<dyn SubmissionStore>) -> Self {
        Self {
            config: config.clone(),
            store,
            sessions: SessionRegistry::new(Duration::from_secs(config.identity.session_ttl_secs)),
            code_exchange: None,
        }
    }

    /// Install the identity integration used by `/callback`
    #[must_use]
    pub fn with_code_exchange(mut self, exchange: Arc<dyn CodeExchange>) -> Self {
        self.code_exchange = Some(exchange);
        self
    }

    pub fn access_log_enabled(&self) -> bool {
        self.config.logging.access_log
    }

    /// Identity is configured but `/callback` has nothing to finish a login with
    pub fn login_cannot_complete(&self) -> bool {
        self.config.identity.is_configured() && self.code_exchange.is_none()
    }
}
