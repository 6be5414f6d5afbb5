//! `reqwest`-backed upstream client.

use async_trait::async_trait;
use axum::http::{header, StatusCode};
use reqwest::redirect::Policy;
use std::time::Duration;
use url::Url;

use crate::config::schema::UpstreamConfig;
use crate::relay::fetcher::{UpstreamClient, UpstreamError, UpstreamResponse};

/// Redirect limit reqwest applies when no policy is configured.
const DEFAULT_MAX_REDIRECTS: usize = 10;

/// Production [`UpstreamClient`]. Deadlines and redirects come from `[upstream]`.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    inner: reqwest::Client,
    max_redirects: usize,
}

impl ReqwestClient {
    pub fn from_config(config: &UpstreamConfig) -> Result<Self, reqwest::Error> {
        Self::from_builder(reqwest::Client::builder(), config)
    }

    /// Apply `[upstream]` on top of a caller-prepared builder.
    pub fn from_builder(
        builder: reqwest::ClientBuilder,
        config: &UpstreamConfig,
    ) -> Result<Self, reqwest::Error> {
        let inner = builder
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .redirect(stop_after(config.max_redirects))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            inner,
            max_redirects: config.max_redirects,
        })
    }

    /// Wrap an already configured client.
    pub fn with_client(inner: reqwest::Client) -> Self {
        Self {
            inner,
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }
}

/// Follow up to `max` redirects, then hand the last 3xx back as the response.
fn stop_after(max: usize) -> Policy {
    Policy::custom(move |attempt| {
        // `previous` starts with the original URL.
        if attempt.previous().len() > max {
            attempt.stop()
        } else {
            attempt.follow()
        }
    })
}

/// A followable redirect that came back as the final response.
///
/// The redirect policy only stops at the limit, so a 3xx whose `Location`
/// still resolves means the chain was cut short.
fn is_unfollowed_redirect(response: &reqwest::Response) -> bool {
    let followable = matches!(
        response.status(),
        StatusCode::MOVED_PERMANENTLY
            | StatusCode::FOUND
            | StatusCode::SEE_OTHER
            | StatusCode::TEMPORARY_REDIRECT
            | StatusCode::PERMANENT_REDIRECT
    );

    followable
        && response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|location| response.url().join(location).is_ok())
}

#[async_trait]
impl UpstreamClient for ReqwestClient {
    async fn get(&self, url: &str) -> Result<UpstreamResponse, UpstreamError> {
        let url = Url::parse(url).map_err(|e| UpstreamError::Network {
            status: None,
            message: format!("invalid target URL {:?}: {}", url, e),
        })?;

        let response = self
            .inner
            .get(url)
            .send()
            .await
            .map_err(|e| UpstreamError::Network {
                status: e.status(),
                message: e.to_string(),
            })?;

        if is_unfollowed_redirect(&response) {
            return Err(UpstreamError::Network {
                status: Some(response.status()),
                message: format!(
                    "{}: stopped after {} redirects",
                    response.url(),
                    self.max_redirects
                ),
            });
        }

        let status = response.status();
        let headers = response.headers().clone();

        // `bytes` consumes the response, releasing the connection on both paths.
        let body = response
            .bytes()
            .await
            .map_err(|e| UpstreamError::Body(e.to_string()))?;

        Ok(UpstreamResponse {
            status,
            headers,
            body,
        })
    }
}
