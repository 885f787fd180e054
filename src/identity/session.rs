//! Server-side login sessions
//!
//! The protocol work (code exchange, token validation) belongs to an external
//! identity integration behind [`CodeExchange`]; this module only remembers
//! which cookie maps to which claims.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::RwLock;

/// Claims returned by the identity integration for a completed login
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangedIdentity {
    pub user: Value,
    pub id_token_claims: Option<Value>,
}

#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("authorization code rejected: {0}")]
    Rejected(String),
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

pub type ExchangeFuture<'a> =
    Pin<Box<dyn Future<Output = Result<ExchangedIdentity, ExchangeError>> + Send + 'a>>;

/// Turns an authorization code from `/callback` into identity claims
pub trait CodeExchange: Send + Sync {
    fn exchange<'a>(&'a self, code: &'a str, redirect_uri: &'a str) -> ExchangeFuture<'a>;
}

#[derive(Debug, Clone)]
pub struct Session {
    pub identity: ExchangedIdentity,
    pub created_at: DateTime<Utc>,
}

impl Session {
    fn is_expired(&self, now: DateTime<Utc>, ttl: chrono::Duration) -> bool {
        now - self.created_at >= ttl
    }
}

/// In-process session table keyed by opaque cookie value
///
/// Entries older than the TTL read as absent. They are dropped on lookup
/// and swept whenever a new session is created.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Session>>,
    ttl: chrono::Duration,
}

impl SessionRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl: chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX),
        }
    }

    /// Store a new session and return its id
    pub async fn create(&self, identity: ExchangedIdentity) -> String {
        let id = uuid::Uuid::new_v4().simple().to_string();
        let now = Utc::now();
        let session = Session {
            identity,
            created_at: now,
        };
        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, s| !s.is_expired(now, self.ttl));
        sessions.insert(id.clone(), session);
        id
    }

    pub async fn get(&self, id: &str) -> Option<Session> {
        let now = Utc::now();
        {
            let sessions = self.sessions.read().await;
            match sessions.get(id) {
                None => return None,
                Some(s) if !s.is_expired(now, self.ttl) => return Some(s.clone()),
                Some(_) => {}
            }
        }
        self.sessions.write().await.remove(id);
        None
    }

    pub async fn remove(&self, id: &str) -> Option<Session> {
        self.sessions.write().await.remove(id)
    }

    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

/// Find a cookie value in a `Cookie` header
pub fn cookie_value<'a>(header: Option<&'a str>, name: &str) -> Option<&'a str> {
    header?
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.trim())
        .filter(|v| !v.is_empty())
}

/// `Set-Cookie` value carrying a session id
pub fn session_cookie(name: &str, id: &str) -> String {
    format!("{name}={id}; Path=/; HttpOnly; SameSite=Lax")
}

/// `Set-Cookie` value that clears the session cookie
pub fn expired_cookie(name: &str) -> String {
    format!("{name}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}
