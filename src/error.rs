//! Error types shared by the handlers and the submission store.

use std::collections::BTreeMap;
use std::path::PathBuf;

use hyper::StatusCode;
use thiserror::Error;

/// Failure while reading or writing the submissions collection.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Directory creation, read, write or rename failed.
    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Existing collection is not a JSON array of submissions.
    #[error("corrupt submissions file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// Collection could not be serialized.
    #[error("failed to serialize submissions: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Request-terminating failures, each mapped to one status code.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed body or bad submission source.
    #[error("{0}")]
    BadRequest(String),
    /// Field-level validation failure.
    #[error("{message}")]
    Validation {
        message: String,
        errors: BTreeMap<String, String>,
    },
    #[error("{message}")]
    MethodNotAllowed {
        message: String,
        allow: &'static str,
    },
    #[error("Origin not allowed")]
    OriginNotAllowed,
    #[error("Payload too large")]
    PayloadTooLarge,
    #[error("{message}")]
    ConfigurationMissing { message: String, details: String },
    #[error("Authentication required")]
    Unauthenticated,
    #[error("{message}")]
    AuthorizationFailed { message: String, details: String },
    /// Storage failures keep their cause for the server log only.
    #[error("Unable to save your request at this time.")]
    Storage(#[from] StorageError),
    #[error("Not found")]
    NotFound,
    #[error("{0}")]
    NotImplemented(String),
    #[error("{0}")]
    Upstream(String),
}

impl ApiError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Self::OriginNotAllowed => StatusCode::FORBIDDEN,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::ConfigurationMissing { .. } | Self::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Unauthenticated | Self::AuthorizationFailed { .. } => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// JSON body sent to the client. Never includes storage internals.
    pub fn body(&self) -> serde_json::Value {
        match self {
            Self::Validation { message, errors } => {
                serde_json::json!({ "error": message, "errors": errors })
            }
            Self::ConfigurationMissing { message, details }
            | Self::AuthorizationFailed { message, details } => {
                serde_json::json!({ "error": message, "details": details })
            }
            other => serde_json::json!({ "error": other.to_string() }),
        }
    }

    /// `Allow` header value for 405 responses
    pub const fn allow(&self) -> Option<&'static str> {
        match self {
            Self::MethodNotAllowed { allow, .. } => Some(*allow),
            _ => None,
        }
    }
}
