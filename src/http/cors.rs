//! Cross-origin policy for the `/api/*` endpoints
//!
//! With `allowed_origins` configured, a request carrying any other `Origin` is
//! rejected. Without it the request's own origin, the `Host`-derived origin and
//! the public base URL are all acceptable.

use hyper::header::{
    HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE, VARY,
};

use super::response::{build_no_content_response, HttpResponse};
use crate::config::CorsConfig;
use crate::error::ApiError;

pub const ALLOW_HEADERS: &str = "Content-Type, X-Requested-With";
pub const ALLOW_METHODS: &str = "GET, POST, OPTIONS";
pub const MAX_AGE: &str = "86400";

/// Outcome of checking one request against the policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsGrant {
    /// Value for `Access-Control-Allow-Origin`
    pub allow_origin: String,
}

/// Check the request's `Origin` and `Host` headers against the configuration
pub fn check(
    cfg: &CorsConfig,
    origin: Option<&str>,
    host: Option<&str>,
) -> Result<CorsGrant, ApiError> {
    let origin = origin.map(str::trim).filter(|o| !o.is_empty());
    let configured = cfg.origins();
    let restricted = !configured.is_empty();

    let permitted: Vec<String> = if restricted {
        configured
    } else {
        [
            origin.map(ToString::to_string),
            host.filter(|h| !h.is_empty()).map(|h| format!("http://{h}")),
            Some(cfg.base_url.clone()),
        ]
        .into_iter()
        .flatten()
        .filter(|o| !o.is_empty())
        .collect()
    };

    if let Some(o) = origin {
        if restricted && !permitted.iter().any(|p| p == o) {
            return Err(ApiError::OriginNotAllowed);
        }
    }

    let allow_origin = origin
        .map(ToString::to_string)
        .or_else(|| permitted.first().cloned())
        .unwrap_or_else(|| cfg.base_url.clone());

    Ok(CorsGrant { allow_origin })
}

/// Attach the CORS headers for a granted request
pub fn apply(resp: &mut HttpResponse, grant: &CorsGrant) {
    let headers = resp.headers_mut();
    match HeaderValue::from_str(&grant.allow_origin) {
        Ok(v) => {
            headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, v);
        }
        Err(e) => {
            crate::logger::log_warning(&format!(
                "Unusable CORS origin '{}': {e}",
                grant.allow_origin
            ));
        }
    }
    headers.insert(VARY, HeaderValue::from_static("Origin"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOW_METHODS),
    );
    headers.insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static(MAX_AGE));
}

/// 204 answer to a preflight, CORS headers included
pub fn preflight(grant: &CorsGrant) -> HttpResponse {
    let mut resp = build_no_content_response(ALLOW_METHODS);
    apply(&mut resp, grant);
    resp
}
