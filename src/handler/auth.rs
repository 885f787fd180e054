//! Sign-in endpoints
//!
//! `/api/auth/config` and `/api/profile` are JSON endpoints behind the CORS
//! policy. `/login`, `/callback` and `/logout` are browser navigations that end
//! in a redirect.

use hyper::header::{HeaderValue, COOKIE, HOST, ORIGIN, SET_COOKIE};
use hyper::{Method, Request, StatusCode};
use serde_json::{json, Value};

use super::header;
use crate::config::AppState;
use crate::error::ApiError;
use crate::http::{build_redirect_response, cors, error_response, json_response, HttpResponse};
use crate::identity::{
    authorize_url, callback_url, cookie_value, expired_cookie, logout_url, query_param,
    safe_return_path, session_cookie,
};
use crate::logger;

fn configuration_missing() -> ApiError {
    ApiError::ConfigurationMissing {
        message: "Auth0 configuration is missing".to_string(),
        details: "Set AUTH0_DOMAIN and AUTH0_CLIENT_ID environment variables to enable authentication."
            .to_string(),
    }
}

/// `GET /api/auth/config`: public identity parameters for the browser
pub fn auth_config<B>(req: &Request<B>, state: &AppState) -> HttpResponse {
    let grant = match cors::check(
        &state.config.cors,
        header(req, ORIGIN.as_str()),
        header(req, HOST.as_str()),
    ) {
        Ok(grant) => grant,
        Err(e) => return error_response(&e),
    };

    let mut resp = match *req.method() {
        Method::OPTIONS => return cors::preflight(&grant),
        Method::GET | Method::HEAD => {
            let identity = &state.config.identity;
            if identity.is_configured() {
                json_response(StatusCode::OK, &identity.public())
            } else {
                logger::log_warning("[Auth] Config requested but identity provider is not configured");
                error_response(&configuration_missing())
            }
        }
        _ => error_response(&ApiError::MethodNotAllowed {
            message: "Method not allowed".to_string(),
            allow: "GET",
        }),
    };
    cors::apply(&mut resp, &grant);
    resp
}

/// `GET /login`: hand the browser to the hosted login page
pub fn login<B>(req: &Request<B>, state: &AppState) -> HttpResponse {
    let identity = &state.config.identity;
    if !identity.is_configured() {
        return error_response(&configuration_missing());
    }

    let return_to = query_param(req.uri().query(), "returnTo").unwrap_or_else(|| "/".to_string());
    match authorize_url(identity, &state.config.cors.base_url, &return_to) {
        Ok(target) => build_redirect_response(&target),
        Err(e) => {
            logger::log_error(&format!(
                "[Auth] Cannot build authorize URL for '{}': {e}",
                identity.domain
            ));
            error_response(&configuration_missing())
        }
    }
}

/// `GET /callback`: finish the login and start a server-side session
pub async fn callback<B>(req: &Request<B>, state: &AppState) -> HttpResponse {
    match complete_login(req.uri().query(), state).await {
        Ok(resp) => resp,
        Err(e) => {
            logger::log_warning(&format!("[Auth] Callback failed: {e}"));
            error_response(&e)
        }
    }
}

async fn complete_login(query: Option<&str>, state: &AppState) -> Result<HttpResponse, ApiError> {
    if let Some(error) = query_param(query, "error") {
        let details = query_param(query, "error_description").unwrap_or_else(|| error.clone());
        return Err(ApiError::AuthorizationFailed {
            message: error,
            details,
        });
    }

    let code = query_param(query, "code")
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing authorization code.".to_string()))?;

    let Some(exchange) = state.code_exchange.as_ref() else {
        return Err(ApiError::NotImplemented(
            "Authorization code exchange is not configured.".to_string(),
        ));
    };

    let redirect_uri = callback_url(&state.config.cors.base_url);
    let identity = exchange.exchange(&code, &redirect_uri).await.map_err(|e| {
        logger::log_error(&format!("[Auth] Code exchange failed: {e}"));
        ApiError::Upstream("Unable to complete sign in.".to_string())
    })?;

    let session_id = state.sessions.create(identity).await;
    let target = safe_return_path(&query_param(query, "state").unwrap_or_default());

    let mut resp = build_redirect_response(&target);
    set_cookie(
        &mut resp,
        &session_cookie(&state.config.identity.session_cookie, &session_id),
    );
    Ok(resp)
}

/// `GET /logout`: forget the session and sign out at the provider too
pub async fn logout<B>(req: &Request<B>, state: &AppState) -> HttpResponse {
    let cookie_name = &state.config.identity.session_cookie;
    if let Some(id) = cookie_value(header(req, COOKIE.as_str()), cookie_name) {
        state.sessions.remove(id).await;
    }

    let identity = &state.config.identity;
    let target = if identity.is_configured() {
        logout_url(identity, &state.config.cors.base_url).unwrap_or_else(|e| {
            logger::log_error(&format!("[Auth] Cannot build logout URL: {e}"));
            "/".to_string()
        })
    } else {
        "/".to_string()
    };

    let mut resp = build_redirect_response(&target);
    set_cookie(&mut resp, &expired_cookie(cookie_name));
    resp
}

/// `GET /api/profile`: claims of the signed-in user
pub async fn profile<B>(req: &Request<B>, state: &AppState) -> HttpResponse {
    let grant = match cors::check(
        &state.config.cors,
        header(req, ORIGIN.as_str()),
        header(req, HOST.as_str()),
    ) {
        Ok(grant) => grant,
        Err(e) => return error_response(&e),
    };

    let mut resp = match *req.method() {
        Method::OPTIONS => return cors::preflight(&grant),
        Method::GET | Method::HEAD => {
            let cookie_name = &state.config.identity.session_cookie;
            let session = match cookie_value(header(req, COOKIE.as_str()), cookie_name) {
                Some(id) => state.sessions.get(id).await,
                None => None,
            };
            match session {
                Some(session) => {
                    let claims = session.identity.id_token_claims;
                    let user = match session.identity.user {
                        Value::Null => claims.clone().unwrap_or_else(|| json!({})),
                        user => user,
                    };
                    json_response(
                        StatusCode::OK,
                        &json!({ "user": user, "idTokenClaims": claims }),
                    )
                }
                None => error_response(&ApiError::Unauthenticated),
            }
        }
        _ => error_response(&ApiError::MethodNotAllowed {
            message: "Method not allowed".to_string(),
            allow: "GET",
        }),
    };
    cors::apply(&mut resp, &grant);
    resp
}

fn set_cookie(resp: &mut HttpResponse, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(v) => {
            resp.headers_mut().insert(SET_COOKIE, v);
        }
        Err(e) => logger::log_error(&format!("[Auth] Invalid cookie value: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use crate::handler::test_support::{body_json, request};
    use crate::identity::{CodeExchange, ExchangeError, ExchangeFuture, ExchangedIdentity};
    use hyper::header::LOCATION;
    use std::sync::Arc;

    struct StaticExchange {
        accept: &'static str,
    }

    impl CodeExchange for StaticExchange {
        fn exchange<'a>(&'a self, code: &'a str, redirect_uri: &'a str) -> ExchangeFuture<'a> {
            Box::pin(async move {
                assert!(redirect_uri.ends_with("/callback"));
                if code == self.accept {
                    Ok(ExchangedIdentity {
                        user: json!({"sub": "auth0|99", "email": "grace@example.com"}),
                        id_token_claims: Some(json!({"sub": "auth0|99", "aud": "client-1"})),
                    })
                } else {
                    Err(ExchangeError::Rejected("invalid_grant".to_string()))
                }
            })
        }
    }

    fn configured() -> Vec<(&'static str, String)> {
        vec![
            ("identity.domain", "tenant.example.com".to_string()),
            ("identity.client_id", "client-1".to_string()),
            ("identity.client_secret", "top-secret".to_string()),
            ("identity.audience", "https://api.example.com".to_string()),
            ("cors.base_url", "https://site.example.com".to_string()),
        ]
    }

    fn state(overrides: &[(&str, String)]) -> (tempfile::TempDir, AppState) {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path(), overrides);
        let state = AppState::new(&config).with_code_exchange(Arc::new(StaticExchange { accept: "good" }));
        (dir, state)
    }

    #[tokio::test]
    async fn test_config_missing() {
        let (_dir, state) = state(&[]);
        let resp = auth_config(&request("GET", "/api/auth/config", &[], ""), &state);
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(resp).await,
            json!({
                "error": "Auth0 configuration is missing",
                "details": "Set AUTH0_DOMAIN and AUTH0_CLIENT_ID environment variables to enable authentication."
            })
        );
    }

    #[tokio::test]
    async fn test_config_is_public_subset() {
        let (_dir, state) = state(&configured());
        let resp = auth_config(&request("GET", "/api/auth/config", &[], ""), &state);
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            body_json(resp).await,
            json!({"domain": "tenant.example.com", "clientId": "client-1", "audience": "https://api.example.com"})
        );
    }

    #[tokio::test]
    async fn test_config_rejects_post() {
        let (_dir, state) = state(&configured());
        let resp = auth_config(&request("POST", "/api/auth/config", &[], ""), &state);
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(resp.headers()["allow"], "GET");
    }

    #[test]
    fn test_config_preflight_has_no_body() {
        let (_dir, state) = state(&[]);
        let req = request("OPTIONS", "/api/auth/config", &[("origin", "https://a.test")], "");
        let resp = auth_config(&req, &state);
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    }

    #[test]
    fn test_login_redirects_to_provider() {
        let (_dir, state) = state(&configured());
        let resp = login(&request("GET", "/login?returnTo=%2Fteam", &[], ""), &state);
        assert_eq!(resp.status(), StatusCode::FOUND);
        let location = resp.headers()[LOCATION].to_str().unwrap();
        assert!(location.starts_with("https://tenant.example.com/authorize?"));
        assert!(location.contains("state=%2Fteam"));
        assert!(!location.contains("top-secret"));
    }

    #[test]
    fn test_login_unconfigured() {
        let (_dir, state) = state(&[]);
        let resp = login(&request("GET", "/login", &[], ""), &state);
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_callback_error_from_provider() {
        let (_dir, state) = state(&configured());
        let req = request(
            "GET",
            "/callback?error=access_denied&error_description=User%20cancelled",
            &[],
            "",
        );
        let resp = callback(&req, &state).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            body_json(resp).await,
            json!({"error": "access_denied", "details": "User cancelled"})
        );
    }

    #[tokio::test]
    async fn test_callback_without_code() {
        let (_dir, state) = state(&configured());
        let resp = callback(&request("GET", "/callback", &[], ""), &state).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_callback_without_exchange() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::new(&test_config(dir.path(), &configured()));
        let resp = callback(&request("GET", "/callback?code=good", &[], ""), &state).await;
        assert_eq!(resp.status(), StatusCode::NOT_IMPLEMENTED);
    }

    #[tokio::test]
    async fn test_callback_rejected_code() {
        let (_dir, state) = state(&configured());
        let resp = callback(&request("GET", "/callback?code=bad", &[], ""), &state).await;
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(state.sessions.count().await, 0);
    }

    #[tokio::test]
    async fn test_full_session_flow() {
        let (_dir, state) = state(&configured());

        let resp = callback(
            &request("GET", "/callback?code=good&state=%2Fpricing", &[], ""),
            &state,
        )
        .await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(resp.headers()[LOCATION], "/pricing");
        let set_cookie = resp.headers()[SET_COOKIE].to_str().unwrap().to_string();
        assert!(set_cookie.contains("HttpOnly"));
        let cookie = set_cookie.split(';').next().unwrap().to_string();

        let resp = profile(&request("GET", "/api/profile", &[("cookie", &cookie)], ""), &state).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["user"]["email"], "grace@example.com");
        assert_eq!(body["idTokenClaims"]["aud"], "client-1");

        let resp = logout(&request("GET", "/logout", &[("cookie", &cookie)], ""), &state).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert!(resp.headers()[LOCATION]
            .to_str()
            .unwrap()
            .starts_with("https://tenant.example.com/v2/logout?"));
        assert!(resp.headers()[SET_COOKIE].to_str().unwrap().contains("Max-Age=0"));
        assert_eq!(state.sessions.count().await, 0);

        let resp = profile(&request("GET", "/api/profile", &[("cookie", &cookie)], ""), &state).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_expired_session_requires_login_again() {
        let mut overrides = configured();
        overrides.push(("identity.session_ttl_secs", "0".to_string()));
        let (_dir, state) = state(&overrides);

        let resp = callback(&request("GET", "/callback?code=good", &[], ""), &state).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        let cookie = resp.headers()[SET_COOKIE]
            .to_str()
            .unwrap()
            .split(';')
            .next()
            .unwrap()
            .to_string();
        assert_eq!(state.sessions.count().await, 1);

        let resp = profile(&request("GET", "/api/profile", &[("cookie", &cookie)], ""), &state).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(state.sessions.count().await, 0);
    }

    #[tokio::test]
    async fn test_callback_state_cannot_leave_site() {
        let (_dir, state) = state(&configured());
        let req = request("GET", "/callback?code=good&state=https%3A%2F%2Fevil.test", &[], "");
        let resp = callback(&req, &state).await;
        assert_eq!(resp.headers()[LOCATION], "/");
    }

    #[tokio::test]
    async fn test_profile_requires_session() {
        let (_dir, state) = state(&configured());
        let resp = profile(&request("GET", "/api/profile", &[], ""), &state).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(resp).await, json!({"error": "Authentication required"}));
    }

    #[tokio::test]
    async fn test_logout_unconfigured_goes_home() {
        let (_dir, state) = state(&[]);
        let resp = logout(&request("GET", "/logout", &[], ""), &state).await;
        assert_eq!(resp.headers()[LOCATION], "/");
    }
}
