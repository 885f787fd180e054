//! How a browser-side form should read a contact endpoint response.

use super::FieldErrors;

pub const GENERIC_FAILURE_MESSAGE: &str =
    "We could not send your request right now. Please try again later.";

/// Result of a contact submission as seen by the submitting client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContactOutcome {
    Accepted,
    /// Structured per-field errors, shown inline next to each field
    FieldErrors(FieldErrors),
    /// Anything else: network failure, unparseable body, server error
    Failed(String),
}

impl ContactOutcome {
    /// Interpret a status code and raw response body
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        let parsed: Option<serde_json::Value> = serde_json::from_slice(body).ok();

        if (200..300).contains(&status) {
            return Self::Accepted;
        }

        let field_errors = parsed
            .as_ref()
            .and_then(|v| v.get("errors"))
            .and_then(serde_json::Value::as_object)
            .map(|errors| {
                errors
                    .iter()
                    .filter_map(|(k, v)| v.as_str().map(|m| (k.clone(), m.to_string())))
                    .collect::<FieldErrors>()
            })
            .filter(|errors| !errors.is_empty());

        match field_errors {
            Some(errors) => Self::FieldErrors(errors),
            None => Self::Failed(GENERIC_FAILURE_MESSAGE.to_string()),
        }
    }

    /// Transport failed before any response arrived
    pub fn network_failure() -> Self {
        Self::Failed(GENERIC_FAILURE_MESSAGE.to_string())
    }
}
