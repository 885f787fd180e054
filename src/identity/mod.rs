//! Sign-in support: hosted-login redirects, server-side sessions, and the
//! client-side controller that renders profile claims.

mod claims;
mod client;
mod session;
mod urls;

pub use claims::{normalize_claim, ClaimList, GROUPS_URI, ROLE_URI, TENANT_ID_URI};
pub use client::{
    merge_config, sanitize, AuthView, ClientAuthController, ClientAuthError, ClientConfig,
    IdentityProvider, LoginOptions, MemorySessionStorage, PageLocation, ProviderError,
    SessionStorage, RETURN_TO_KEY,
};
pub use session::{
    cookie_value, expired_cookie, session_cookie, CodeExchange, ExchangeError, ExchangeFuture,
    ExchangedIdentity, Session, SessionRegistry,
};
pub use urls::{
    authorize_url, callback_url, logout_url, query_param, safe_return_path, CALLBACK_PATH,
};
