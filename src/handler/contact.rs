//! `POST /api/contact`
//!
//! Checks run in a fixed order and the first failure ends the request: origin,
//! method, submission source, body, validation, storage. Nothing is written
//! unless every earlier step passed.

use std::net::SocketAddr;

use hyper::body::Body;
use hyper::header::{HOST, ORIGIN};
use hyper::{Method, Request, StatusCode};
use serde_json::json;

use super::{header, read_json_body, BoxError};
use crate::config::AppState;
use crate::error::ApiError;
use crate::http::{cors, error_response, json_response, HttpResponse};
use crate::logger;
use crate::submission::{validate, Submission};

pub const VALIDATION_FAILED: &str = "Validation failed. Please correct the highlighted fields.";
const INVALID_SOURCE: &str = "Invalid submission source.";
const SAME_ORIGIN_MARKER: &str = "XMLHttpRequest";

pub async fn handle<B>(req: Request<B>, peer_addr: Option<SocketAddr>, state: &AppState) -> HttpResponse
where
    B: Body,
    B::Error: Into<BoxError>,
{
    let grant = match cors::check(
        &state.config.cors,
        header(&req, ORIGIN.as_str()),
        header(&req, HOST.as_str()),
    ) {
        Ok(grant) => grant,
        Err(e) => return error_response(&e),
    };

    if req.method() == Method::OPTIONS {
        return cors::preflight(&grant);
    }

    let mut resp = match submit(req, peer_addr, state).await {
        Ok(resp) => resp,
        Err(e) => {
            if let ApiError::Storage(cause) = &e {
                logger::log_error(&format!("[Contact] Error saving submission: {cause}"));
            }
            error_response(&e)
        }
    };
    cors::apply(&mut resp, &grant);
    resp
}

async fn submit<B>(
    req: Request<B>,
    peer_addr: Option<SocketAddr>,
    state: &AppState,
) -> Result<HttpResponse, ApiError>
where
    B: Body,
    B::Error: Into<BoxError>,
{
    if req.method() != Method::POST {
        return Err(ApiError::MethodNotAllowed {
            message: "Method not allowed. Use POST.".to_string(),
            allow: "POST",
        });
    }

    if header(&req, "x-requested-with") != Some(SAME_ORIGIN_MARKER) {
        return Err(ApiError::BadRequest(INVALID_SOURCE.to_string()));
    }

    let raw = read_json_body(req, state.config.http.max_body_size).await?;
    let form = validate(&raw).map_err(|errors| ApiError::Validation {
        message: VALIDATION_FAILED.to_string(),
        errors,
    })?;

    let ip = peer_addr.map(|addr| addr.ip().to_string());
    let submission = Submission::accept(form, ip);
    state.store.append(&submission).await?;

    logger::log_submission_stored(&submission.email, submission.ip.as_deref());
    Ok(json_response(StatusCode::OK, &json!({ "success": true })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use crate::handler::test_support::{body_json, request};
    use crate::submission::{MemorySubmissionStore, SubmissionStore};
    use hyper::header::{ACCESS_CONTROL_ALLOW_ORIGIN, ALLOW};
    use std::sync::Arc;

    const VALID: &str = r#"{
        "name": "Ada Lovelace",
        "email": "ada@example.com",
        "company": "Analytical Engines",
        "message": "We would like a quote for a new website.",
        "consent": true
    }"#;

    fn state_with(
        overrides: &[(&str, String)],
    ) -> (tempfile::TempDir, Arc<MemorySubmissionStore>, AppState) {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path(), overrides);
        let store = Arc::new(MemorySubmissionStore::new());
        let state = AppState::with_store(&config, store.clone());
        (dir, store, state)
    }

    fn peer() -> Option<SocketAddr> {
        Some("203.0.113.9:51000".parse().unwrap())
    }

    fn contact(method: &str, headers: &[(&str, &str)], body: &str) -> Request<http_body_util::Full<hyper::body::Bytes>> {
        request(method, "/api/contact", headers, body)
    }

    #[tokio::test]
    async fn test_valid_submission_is_stored_once() {
        let (_dir, store, state) = state_with(&[]);
        let req = contact(
            "POST",
            &[("x-requested-with", "XMLHttpRequest"), ("content-type", "application/json")],
            VALID,
        );

        let resp = handle(req, peer(), &state).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await, json!({"success": true}));

        let stored = store.load_all().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].name, "Ada Lovelace");
        assert_eq!(stored[0].phone, "");
        assert_eq!(stored[0].ip.as_deref(), Some("203.0.113.9"));
    }

    #[tokio::test]
    async fn test_missing_consent_names_the_field() {
        let (_dir, store, state) = state_with(&[]);
        let body = VALID.replace(r#""consent": true"#, r#""consent": false"#);
        let req = contact("POST", &[("x-requested-with", "XMLHttpRequest")], &body);

        let resp = handle(req, peer(), &state).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = body_json(resp).await;
        assert_eq!(body["error"], VALIDATION_FAILED);
        assert_eq!(body["errors"]["consent"], "Consent is required to submit this form.");
        assert!(store.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_marker_header() {
        let (_dir, store, state) = state_with(&[]);
        let resp = handle(contact("POST", &[], VALID), peer(), &state).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["error"], INVALID_SOURCE);
        assert!(store.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_wrong_method() {
        let (_dir, _store, state) = state_with(&[]);
        let resp = handle(contact("GET", &[], ""), peer(), &state).await;
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(resp.headers()[ALLOW], "POST");
        assert_eq!(body_json(resp).await["error"], "Method not allowed. Use POST.");
    }

    #[tokio::test]
    async fn test_malformed_json() {
        let (_dir, _store, state) = state_with(&[]);
        let req = contact("POST", &[("x-requested-with", "XMLHttpRequest")], "{not json");
        let resp = handle(req, peer(), &state).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["error"], "Invalid JSON body.");
    }

    #[tokio::test]
    async fn test_preflight() {
        let (_dir, _store, state) = state_with(&[]);
        let req = contact("OPTIONS", &[("origin", "https://www.example.com")], "");
        let resp = handle(req, peer(), &state).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert_eq!(resp.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "https://www.example.com");
    }

    #[tokio::test]
    async fn test_disallowed_origin() {
        let (_dir, store, state) =
            state_with(&[("cors.allowed_origins", "https://www.example.com".to_string())]);
        let req = contact(
            "POST",
            &[("origin", "https://evil.test"), ("x-requested-with", "XMLHttpRequest")],
            VALID,
        );
        let resp = handle(req, peer(), &state).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_json(resp).await["error"], "Origin not allowed");
        assert!(store.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_storage_failure_is_generic() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path(), &[]);
        // A directory where the submissions file should be makes every append fail
        std::fs::create_dir_all(config.site.submissions_path()).unwrap();
        let state = AppState::new(&config);

        let req = contact("POST", &[("x-requested-with", "XMLHttpRequest")], VALID);
        let resp = handle(req, peer(), &state).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(resp).await,
            json!({"error": "Unable to save your request at this time."})
        );
    }
}
