//! Redirect targets for the hosted login and logout pages

use url::Url;

use crate::config::IdentityConfig;

/// Path on this site the provider sends the browser back to
pub const CALLBACK_PATH: &str = "/callback";

/// Absolute callback URL registered with the provider
pub fn callback_url(base_url: &str) -> String {
    format!("{}{CALLBACK_PATH}", base_url.trim_end_matches('/'))
}

/// Hosted login page URL; `return_to` travels in `state`
pub fn authorize_url(
    identity: &IdentityConfig,
    base_url: &str,
    return_to: &str,
) -> Result<String, url::ParseError> {
    let mut url = provider_base(&identity.domain)?.join("authorize")?;
    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair("response_type", "code")
            .append_pair("scope", "openid profile email")
            .append_pair("client_id", &identity.client_id)
            .append_pair("redirect_uri", &callback_url(base_url))
            .append_pair("state", &safe_return_path(return_to));
        if !identity.audience.trim().is_empty() {
            query.append_pair("audience", identity.audience.trim());
        }
        if let Some(connection) = identity.connection.as_deref().filter(|c| !c.is_empty()) {
            query.append_pair("connection", connection);
        }
    }
    Ok(url.into())
}

/// Hosted logout page URL returning to the site root
pub fn logout_url(identity: &IdentityConfig, base_url: &str) -> Result<String, url::ParseError> {
    let mut url = provider_base(&identity.domain)?.join("v2/logout")?;
    url.query_pairs_mut()
        .append_pair("client_id", &identity.client_id)
        .append_pair("returnTo", base_url);
    Ok(url.into())
}

/// Restrict post-login redirects to paths on this site
pub fn safe_return_path(candidate: &str) -> String {
    let candidate = candidate.trim();
    let is_local = candidate.starts_with('/')
        && !candidate.starts_with("//")
        && !candidate.contains('\\')
        && !candidate.chars().any(char::is_control);
    if is_local {
        candidate.to_string()
    } else {
        "/".to_string()
    }
}

/// First value of a query parameter
pub fn query_param(query: Option<&str>, name: &str) -> Option<String> {
    url::form_urlencoded::parse(query?.as_bytes())
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}

fn provider_base(domain: &str) -> Result<Url, url::ParseError> {
    let domain = domain.trim().trim_end_matches('/');
    if domain.starts_with("https://") || domain.starts_with("http://") {
        Url::parse(&format!("{domain}/"))
    } else {
        Url::parse(&format!("https://{domain}/"))
    }
}
