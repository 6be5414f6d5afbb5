//! Request validation and relay pipeline.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → validator.rs (origin / query / method / origin pattern)
//!     → reject: error.rs (status + plain-text message)
//!     → accept: fetcher.rs (one GET through an UpstreamClient, body buffered)
//!     → response.rs (CORS headers + upstream headers, status and body)
//!     → Send to client
//! ```
//!
//! # Design Decisions
//! - Every stage returns an explicit outcome enum; no stage panics
//! - The allowed-origin pattern is a parameter, never read from globals here
//! - The outbound client is injected so tests run without sockets

pub mod client;
pub mod error;
pub mod fetcher;
pub mod response;
pub mod validator;

pub use client::ReqwestClient;
pub use error::{ErrorKind, RelayError};
pub use fetcher::{fetch, FetchResult, UpstreamClient, UpstreamError, UpstreamResponse};
pub use response::assemble;
pub use validator::{validate, ApprovedRequest, ValidationOutcome};
