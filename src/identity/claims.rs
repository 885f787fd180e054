//! Profile claims shown after sign-in
//!
//! Providers put tenant, role and group claims either under a short name or under
//! a vendor-namespaced URI; both are accepted, the namespaced key first.

use serde_json::Value;

use crate::submission::truthy;

pub const TENANT_ID_URI: &str = "https://schemas.microsoft.com/identity/claims/tenantid";
pub const ROLE_URI: &str = "https://schemas.microsoft.com/ws/2008/06/identity/claims/role";
pub const GROUPS_URI: &str = "https://schemas.microsoft.com/ws/2008/06/identity/claims/groups";

/// Ordered `(label, value)` pairs ready to render as a definition list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimList {
    pub entries: Vec<(&'static str, String)>,
}

impl ClaimList {
    pub fn from_user(user: &Value) -> Self {
        let rows: [(&'static str, &[&str]); 6] = [
            ("Subject", &["sub"]),
            ("Name", &["name", "given_name"]),
            ("Email", &["email"]),
            ("Tenant ID", &[TENANT_ID_URI, "tid", "tenantId"]),
            ("Roles", &[ROLE_URI, "roles"]),
            ("Groups", &[GROUPS_URI, "groups"]),
        ];

        let entries = rows
            .iter()
            .filter_map(|(label, keys)| {
                first_truthy(user, keys)
                    .and_then(normalize_claim)
                    .map(|v| (*label, v))
            })
            .collect();

        Self { entries }
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `<dl>` markup with escaped text
    pub fn to_html(&self) -> String {
        let mut html = String::from("<dl>");
        for (label, value) in &self.entries {
            html.push_str("<dt>");
            html.push_str(&escape_html(label));
            html.push_str("</dt><dd>");
            html.push_str(&escape_html(value));
            html.push_str("</dd>");
        }
        html.push_str("</dl>");
        html
    }
}

/// Display form of a claim, `None` when there is nothing worth showing
pub fn normalize_claim(value: &Value) -> Option<String> {
    if !truthy(value) {
        return None;
    }
    match value {
        Value::Array(items) => {
            let cleaned: Vec<String> = items
                .iter()
                .filter(|v| truthy(v))
                .map(|v| match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect();
            if cleaned.is_empty() {
                None
            } else {
                Some(cleaned.join(", "))
            }
        }
        Value::Object(_) => Some(value.to_string()),
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn first_truthy<'a>(user: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| user.get(*k))
        .find(|v| truthy(v))
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
