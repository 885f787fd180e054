//! Request handler module
//!
//! Routing dispatch plus one submodule per endpoint family: the contact form,
//! the sign-in endpoints and the static site.

pub mod auth;
pub mod contact;
pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::handle_request;

use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Body;
use hyper::Request;
use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::logger;

pub const INVALID_JSON: &str = "Invalid JSON body.";

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Header value as a string, `None` when absent or not visible ASCII
pub fn header<'a, B>(req: &'a Request<B>, name: &str) -> Option<&'a str> {
    req.headers().get(name).and_then(|v| v.to_str().ok())
}

/// Read a JSON request body of at most `max_body_size` bytes
///
/// An empty body reads as `{}`, so a bare POST reaches validation instead of
/// failing as malformed JSON.
pub async fn read_json_body<B>(req: Request<B>, max_body_size: u64) -> Result<Value, ApiError>
where
    B: Body,
    B::Error: Into<BoxError>,
{
    if let Some(declared) = header(&req, "content-length").and_then(|v| v.trim().parse::<u64>().ok()) {
        if declared > max_body_size {
            logger::log_warning(&format!(
                "Request body too large: {declared} bytes (max: {max_body_size})"
            ));
            return Err(ApiError::PayloadTooLarge);
        }
    }

    let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);
    let bytes = match Limited::new(req.into_body(), limit).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            return Err(ApiError::PayloadTooLarge);
        }
        Err(e) => {
            logger::log_debug(&format!("Failed to read request body: {e}"));
            return Err(ApiError::BadRequest(INVALID_JSON.to_string()));
        }
    };

    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_slice(&bytes).map_err(|_| ApiError::BadRequest(INVALID_JSON.to_string()))
}

#[cfg(test)]
pub(crate) mod test_support {
    use http_body_util::{BodyExt, Full};
    use hyper::body::Bytes;
    use hyper::Request;
    use serde_json::Value;

    use crate::http::HttpResponse;

    pub fn request(method: &str, uri: &str, headers: &[(&str, &str)], body: &str) -> Request<Full<Bytes>> {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(Full::new(Bytes::from(body.to_string()))).unwrap()
    }

    pub async fn body_bytes(resp: HttpResponse) -> Bytes {
        resp.into_body().collect().await.unwrap().to_bytes()
    }

    pub async fn body_json(resp: HttpResponse) -> Value {
        serde_json::from_slice(&body_bytes(resp).await).unwrap()
    }
}
