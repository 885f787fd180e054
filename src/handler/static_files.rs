//! Static file serving module
//!
//! Files come from `site.root_dir`. Anything that does not resolve to a servable
//! file falls back to the index document so client-side routes load the app.

use std::path::{Path, PathBuf};

use hyper::{Method, Request};
use tokio::fs;

use crate::config::{AppState, SiteConfig};
use crate::http::{self, mime, HttpResponse};
use crate::logger;

const STATIC_ALLOW: &str = "GET, HEAD, OPTIONS";

/// Serve a file under the site root, or the index document
pub async fn serve<B>(req: &Request<B>, state: &AppState) -> HttpResponse {
    let is_head = match *req.method() {
        Method::GET => false,
        Method::HEAD => true,
        Method::OPTIONS => return http::build_no_content_response(STATIC_ALLOW),
        ref other => {
            logger::log_warning(&format!("Method not allowed: {other} {}", req.uri().path()));
            return http::build_405_response();
        }
    };

    let site = &state.config.site;
    let path = req.uri().path();
    if let Some(file) = resolve(site, path).await {
        if let Some(resp) = load(&file, is_head).await {
            return resp;
        }
    }

    match load(&site.index_path(), is_head).await {
        Some(resp) => resp,
        None => {
            logger::log_warning(&format!(
                "No index document at {} for {path}",
                site.index_path().display()
            ));
            http::build_404_response()
        }
    }
}

/// Map a request path onto a servable file under the site root
///
/// Rejects dot-segments, anything resolving outside the root, and anything
/// inside the data directory.
pub async fn resolve(site: &SiteConfig, path: &str) -> Option<PathBuf> {
    let relative = path.trim_start_matches('/');
    if relative.split('/').any(|segment| segment.starts_with('.')) {
        return None;
    }

    let root = match fs::canonicalize(&site.root_dir).await {
        Ok(p) => p,
        Err(e) => {
            logger::log_warning(&format!(
                "Site root not found or inaccessible '{}': {e}",
                site.root_dir
            ));
            return None;
        }
    };

    let mut candidate = root.join(relative);
    if relative.is_empty() || relative.ends_with('/') || is_dir(&candidate).await {
        candidate = candidate.join(&site.index_file);
    }

    // Not found is the common case, not worth a log line
    let canonical = fs::canonicalize(&candidate).await.ok()?;
    if !canonical.starts_with(&root) {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {path} -> {}",
            canonical.display()
        ));
        return None;
    }
    if let Ok(data_dir) = fs::canonicalize(&site.data_dir).await {
        if canonical.starts_with(&data_dir) {
            logger::log_warning(&format!("Refused to serve data directory path: {path}"));
            return None;
        }
    }

    match fs::metadata(&canonical).await {
        Ok(meta) if meta.is_file() => Some(canonical),
        _ => None,
    }
}

async fn is_dir(path: &Path) -> bool {
    fs::metadata(path).await.is_ok_and(|m| m.is_dir())
}

async fn load(path: &Path, is_head: bool) -> Option<HttpResponse> {
    let content = match fs::read(path).await {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            logger::log_error(&format!("Failed to read file '{}': {e}", path.display()));
            return None;
        }
    };
    let content_type = mime::get_content_type(path.extension().and_then(|e| e.to_str()));
    Some(http::build_file_response(content, content_type, is_head))
}
