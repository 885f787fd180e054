//! HTTP protocol layer module
//!
//! Response builders, content types and the CORS policy, kept apart from the
//! request handlers that use them.

pub mod cors;
pub mod mime;
pub mod response;

// Re-export commonly used items
pub use response::{
    build_404_response, build_405_response, build_file_response,
    build_health_response, build_no_content_response, build_redirect_response, error_response,
    json_response, HttpResponse,
};
