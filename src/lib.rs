//! Marketing-site server: static pages, a contact form that lands in a JSON
//! file, and sign-in through a hosted identity provider.

pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod identity;
pub mod logger;
pub mod server;
pub mod submission;
