//! Outbound fetch of the target URL.
//!
//! The fetch goes through an [`UpstreamClient`] so the relay never owns
//! sockets. A client buffers the whole body before returning; whatever it
//! holds for the upstream response is dropped on every exit path.

use async_trait::async_trait;
use axum::http::{HeaderMap, StatusCode};
use bytes::Bytes;
use thiserror::Error;

use crate::relay::error::RelayError;

/// A fully buffered upstream response.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Failures an [`UpstreamClient`] can report.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// No response was obtained. `status` is set when the client still saw one.
    #[error("{message}")]
    Network {
        status: Option<StatusCode>,
        message: String,
    },

    /// Headers arrived but the body could not be read to the end.
    #[error("{0}")]
    Body(String),
}

/// Capability to perform a single GET.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    async fn get(&self, url: &str) -> Result<UpstreamResponse, UpstreamError>;
}

/// Result of [`fetch`].
#[derive(Debug)]
pub enum FetchResult {
    Success(UpstreamResponse),
    Failure(RelayError),
}

impl FetchResult {
    /// Status the caller will see.
    pub fn status(&self) -> StatusCode {
        match self {
            FetchResult::Success(response) => response.status,
            FetchResult::Failure(err) => err.status(),
        }
    }
}

/// Fetch `target_url` once. There are no retries.
pub async fn fetch(target_url: &str, client: &dyn UpstreamClient) -> FetchResult {
    match client.get(target_url).await {
        Ok(response) => FetchResult::Success(response),
        Err(UpstreamError::Network { status, message }) => FetchResult::Failure(RelayError::Network {
            // StatusCode is always >= 100, so any status the client saw is usable.
            status: status.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            message,
        }),
        Err(UpstreamError::Body(message)) => FetchResult::Failure(RelayError::BodyRead(message)),
    }
}
