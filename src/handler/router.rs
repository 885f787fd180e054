//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: health probe, API endpoints, sign-in
//! navigations, then the static site. Every response passes through here for
//! the `Server` header and the access log.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use hyper::body::Body;
use hyper::header::{HeaderValue, REFERER, SERVER, USER_AGENT};
use hyper::{Method, Request, Version};

use super::{auth, contact, header, static_files, BoxError};
use crate::config::AppState;
use crate::error::ApiError;
use crate::http::{self, HttpResponse};
use crate::logger::{self, AccessLogEntry};

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    peer_addr: Option<SocketAddr>,
    state: Arc<AppState>,
) -> Result<HttpResponse, Infallible>
where
    B: Body,
    B::Error: Into<BoxError>,
{
    let started = Instant::now();
    let entry = state
        .access_log_enabled()
        .then(|| access_entry(&req, peer_addr));

    let mut resp = route(req, peer_addr, &state).await;

    match HeaderValue::from_str(&state.config.http.server_name) {
        Ok(v) => {
            resp.headers_mut().insert(SERVER, v);
        }
        Err(e) => logger::log_debug(&format!("Unusable server name: {e}")),
    }

    if let Some(mut entry) = entry {
        entry.status = resp.status().as_u16();
        entry.body_bytes = resp
            .body()
            .size_hint()
            .exact()
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(resp)
}

async fn route<B>(req: Request<B>, peer_addr: Option<SocketAddr>, state: &AppState) -> HttpResponse
where
    B: Body,
    B::Error: Into<BoxError>,
{
    let path = req.uri().path().to_owned();
    let navigable = matches!(*req.method(), Method::GET | Method::HEAD);

    if path == state.config.site.health_path {
        return http::build_health_response("ok");
    }

    match path.as_str() {
        "/api/contact" => contact::handle(req, peer_addr, state).await,
        "/api/auth/config" => auth::auth_config(&req, state),
        "/api/profile" => auth::profile(&req, state).await,
        p if p.starts_with("/api/") => http::error_response(&ApiError::NotFound),
        "/login" if navigable => auth::login(&req, state),
        "/callback" if navigable => auth::callback(&req, state).await,
        "/logout" if navigable => auth::logout(&req, state).await,
        _ => static_files::serve(&req, state).await,
    }
}

fn access_entry<B>(req: &Request<B>, peer_addr: Option<SocketAddr>) -> AccessLogEntry {
    let remote = peer_addr.map_or_else(|| "-".to_string(), |a| a.ip().to_string());
    let mut entry = AccessLogEntry::new(
        remote,
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = match req.version() {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2.0",
        Version::HTTP_3 => "3.0",
        _ => "1.1",
    }
    .to_string();
    entry.referer = header(req, REFERER.as_str()).map(ToString::to_string);
    entry.user_agent = header(req, USER_AGENT.as_str()).map(ToString::to_string);
    entry
}
