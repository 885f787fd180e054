//! Sign-in controller for the site's profile panel
//!
//! The hosted-login SDK sits behind [`IdentityProvider`] and the browser's
//! session storage behind [`SessionStorage`], so the whole flow (config merge,
//! redirect completion, claim rendering) runs without a browser.

use std::collections::HashMap;

use serde_json::{Map, Value};
use thiserror::Error;

use super::claims::ClaimList;

/// Session-storage key holding the page to restore after the provider redirect
pub const RETURN_TO_KEY: &str = "arkham-auth-return-to";

const FALLBACK_FAILURE: &str = "Authentication failed.";
const LOGIN_FAILURE: &str = "Unable to start sign in.";
const LOGOUT_FAILURE: &str = "Unable to sign out.";

/// Failure reported by the identity SDK
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct ProviderError(pub String);

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientAuthError {
    #[error("Auth0 configuration is missing. Please set AUTH0_DOMAIN and AUTH0_CLIENT_ID.")]
    MissingConfig,
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Sanitized configuration the SDK is initialized with
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientConfig {
    pub domain: String,
    pub client_id: String,
    pub audience: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOptions {
    pub audience: Option<String>,
    pub redirect_uri: String,
}

/// The hosted-login SDK as seen by the controller
#[allow(async_fn_in_trait)]
pub trait IdentityProvider {
    /// Server-side configuration, normally `GET /api/auth/config`
    async fn resolve_config(&self) -> Result<Value, ProviderError>;
    async fn initialize(&self, config: &ClientConfig) -> Result<(), ProviderError>;
    async fn login_redirect(&self, options: LoginOptions) -> Result<(), ProviderError>;
    /// Complete a redirect; `query` starts with `?`
    async fn handle_redirect_callback(&self, query: &str) -> Result<(), ProviderError>;
    async fn is_authenticated(&self) -> Result<bool, ProviderError>;
    async fn get_user(&self) -> Result<Option<Value>, ProviderError>;
    async fn logout(&self, return_to: &str) -> Result<(), ProviderError>;
}

/// Per-tab key/value storage
pub trait SessionStorage {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String);
    fn remove(&mut self, key: &str);
}

#[derive(Debug, Default)]
pub struct MemorySessionStorage {
    entries: HashMap<String, String>,
}

impl SessionStorage for MemorySessionStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

/// Where the page currently is
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageLocation {
    pub origin: String,
    pub pathname: String,
    /// Includes the leading `?` when present
    pub search: String,
    /// Includes the leading `#` when present
    pub hash: String,
}

impl PageLocation {
    fn redirect_uri(&self) -> String {
        format!("{}{}", self.origin, self.pathname)
    }

    /// Equivalent of `history.replaceState` to `target`
    fn replace(&mut self, target: &str) {
        let (path, search) = match target.find('?') {
            Some(i) => (&target[..i], &target[i..]),
            None => (target, ""),
        };
        self.pathname = path.to_string();
        self.search = search.to_string();
        self.hash.clear();
    }

    fn redirect_query(&self) -> Option<String> {
        let marks = |s: &str| s.contains("code=") || s.contains("error=");
        if !marks(&self.search) && !marks(&self.hash) {
            return None;
        }
        if self.search.contains("code=") {
            Some(self.search.clone())
        } else {
            Some(format!("?{}", self.hash.trim_start_matches('#')))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthView {
    Loading(String),
    SignedOut,
    SignedIn(ClaimList),
    Error(String),
}

impl AuthView {
    pub const fn status(&self) -> &'static str {
        match self {
            Self::Loading(_) => "Loading...",
            Self::SignedOut => "You are signed out.",
            Self::SignedIn(_) => "You are signed in.",
            Self::Error(_) => "Unable to sign in",
        }
    }

    /// Whether the login / logout buttons are usable
    pub const fn buttons(&self) -> (bool, bool) {
        match self {
            Self::SignedOut => (true, false),
            Self::SignedIn(_) => (false, true),
            Self::Loading(_) | Self::Error(_) => (false, false),
        }
    }
}

/// Trim a config value; anything still carrying a `${...}` placeholder is unset
pub fn sanitize(value: Option<&Value>) -> String {
    match value.and_then(Value::as_str).map(str::trim) {
        Some(v) if !v.contains("${") => v.to_string(),
        _ => String::new(),
    }
}

/// Merge page-embedded and server configuration, server values winning
pub fn merge_config(inline: Option<&str>, server: Option<Value>) -> Result<ClientConfig, ClientAuthError> {
    let mut merged = Map::new();
    let inline = inline
        .filter(|text| !text.trim().is_empty())
        .and_then(|text| serde_json::from_str::<Value>(text).ok());
    for source in [inline, server].into_iter().flatten() {
        if let Value::Object(fields) = source {
            merged.extend(fields);
        }
    }

    let config = ClientConfig {
        domain: sanitize(merged.get("domain")),
        client_id: sanitize(merged.get("clientId")),
        audience: sanitize(merged.get("audience")),
    };
    if config.domain.is_empty() || config.client_id.is_empty() {
        return Err(ClientAuthError::MissingConfig);
    }
    Ok(config)
}

pub struct ClientAuthController<P, S> {
    provider: P,
    storage: S,
    location: PageLocation,
    inline_config: Option<String>,
    config: Option<ClientConfig>,
    view: AuthView,
}

impl<P: IdentityProvider, S: SessionStorage> ClientAuthController<P, S> {
    pub fn new(provider: P, storage: S, location: PageLocation, inline_config: Option<String>) -> Self {
        Self {
            provider,
            storage,
            location,
            inline_config,
            config: None,
            view: AuthView::Loading("Loading authentication...".to_string()),
        }
    }

    pub const fn view(&self) -> &AuthView {
        &self.view
    }

    pub const fn location(&self) -> &PageLocation {
        &self.location
    }

    pub const fn config(&self) -> Option<&ClientConfig> {
        self.config.as_ref()
    }

    pub const fn provider(&self) -> &P {
        &self.provider
    }

    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Load configuration, finish a pending redirect and show the session
    pub async fn start(&mut self) -> &AuthView {
        self.view = AuthView::Loading("Loading authentication...".to_string());
        if let Err(e) = self.try_start().await {
            let message = e.to_string();
            self.view = AuthView::Error(if message.is_empty() {
                FALLBACK_FAILURE.to_string()
            } else {
                message
            });
        }
        &self.view
    }

    async fn try_start(&mut self) -> Result<(), ClientAuthError> {
        let server = self.provider.resolve_config().await.ok();
        let config = merge_config(self.inline_config.as_deref(), server)?;
        self.provider.initialize(&config).await?;
        self.config = Some(config);

        if let Some(query) = self.location.redirect_query() {
            self.provider.handle_redirect_callback(&query).await?;
            let target = self
                .storage
                .get(RETURN_TO_KEY)
                .unwrap_or_else(|| self.location.pathname.clone());
            self.location.replace(&target);
            self.storage.remove(RETURN_TO_KEY);
        }

        self.refresh().await?;
        Ok(())
    }

    /// Re-read the SDK session and render it
    pub async fn refresh(&mut self) -> Result<&AuthView, ClientAuthError> {
        self.view = if self.provider.is_authenticated().await? {
            match self.provider.get_user().await? {
                Some(user) => AuthView::SignedIn(ClaimList::from_user(&user)),
                None => AuthView::SignedOut,
            }
        } else {
            AuthView::SignedOut
        };
        Ok(&self.view)
    }

    /// Remember the current page and hand over to the hosted login
    pub async fn login(&mut self) -> &AuthView {
        let Some(config) = &self.config else {
            return &self.view;
        };
        let options = LoginOptions {
            audience: Some(config.audience.clone()).filter(|a| !a.is_empty()),
            redirect_uri: self.location.redirect_uri(),
        };

        self.view = AuthView::Loading("Redirecting to sign in...".to_string());
        let return_to = format!("{}{}", self.location.pathname, self.location.search);
        self.storage.set(RETURN_TO_KEY, return_to);
        if self.provider.login_redirect(options).await.is_err() {
            self.view = AuthView::Error(LOGIN_FAILURE.to_string());
        }
        &self.view
    }

    pub async fn logout(&mut self) -> &AuthView {
        if self.config.is_none() {
            return &self.view;
        }
        self.view = AuthView::Loading("Signing out...".to_string());
        self.view = match self.provider.logout(&self.location.redirect_uri()).await {
            Ok(()) => AuthView::SignedOut,
            Err(_) => AuthView::Error(LOGOUT_FAILURE.to_string()),
        };
        &self.view
    }
}
