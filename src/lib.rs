//! Cross-origin relay gateway library.
//!
//! Accepts `GET /?<target url>` from browser pages served by an allowed
//! origin, fetches the target on their behalf and relays the response back
//! with permissive CORS headers.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod relay;

pub use config::schema::RelayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use relay::{ReqwestClient, UpstreamClient};
