//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the relay handler on every path
//! - Wire up middleware (request ID, tracing, inbound timeout)
//! - Serve on a listener until shutdown
//! - Apply configuration updates between requests
//! - Drive each request through validate → fetch → assemble

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::RelayConfig;
use crate::http::request::{MakeRequestUuid, RequestIdExt};
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::relay::{assemble, fetch, validate, FetchResult, RelayError, UpstreamClient, ValidationOutcome};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ArcSwap<RelayConfig>>,
    pub client: Arc<dyn UpstreamClient>,
}

/// HTTP server for the relay.
pub struct HttpServer {
    router: Router,
    config: Arc<ArcSwap<RelayConfig>>,
}

impl HttpServer {
    /// Create a new HTTP server relaying through `client`.
    pub fn new(config: RelayConfig, client: Arc<dyn UpstreamClient>) -> Self {
        let shared = Arc::new(ArcSwap::from_pointee(config));
        let state = AppState {
            config: shared.clone(),
            client,
        };

        let router = Self::build_router(&shared.load(), state);
        Self {
            router,
            config: shared,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &RelayConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(relay_handler))
            .route("/", any(relay_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "relay",
                    method = %request.method(),
                    request_id = %request.request_id(),
                )
            }))
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// A clone of the router, e.g. for serving it elsewhere or in tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// The configuration currently in effect.
    pub fn config(&self) -> Arc<RelayConfig> {
        self.config.load_full()
    }

    /// Replace the configuration; the next request observes it.
    pub fn apply_config(&self, config: RelayConfig) {
        swap_config(&self.config, config);
    }

    /// Run the server until `shutdown` fires, applying `config_updates` as they arrive.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<RelayConfig>,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let shared = self.config.clone();
        let updater = tokio::spawn(async move {
            while let Some(new_config) = config_updates.recv().await {
                swap_config(&shared, new_config);
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(Shutdown::signalled(shutdown))
            .await?;

        updater.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

fn swap_config(shared: &ArcSwap<RelayConfig>, new_config: RelayConfig) {
    let current = shared.load();
    if current.listener != new_config.listener || current.timeouts != new_config.timeouts {
        tracing::warn!("Listener and inbound timeout changes take effect after a restart");
    }
    if current.upstream != new_config.upstream {
        tracing::warn!("Upstream client changes take effect after a restart");
    }
    drop(current);

    shared.store(Arc::new(new_config));
    tracing::info!("Configuration reloaded");
}

/// Relay handler: validate, fetch once, assemble.
async fn relay_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request.request_id().to_string();
    let method = request.method().clone();

    // Pattern is resolved per request so config swaps and env changes apply immediately.
    let outcome = {
        let config = state.config.load();
        let pattern = config.origin.resolve_pattern();
        validate(&request, &pattern)
    };

    let approved = match outcome {
        ValidationOutcome::Approved(approved) => approved,
        ValidationOutcome::Rejected(err) => {
            if let RelayError::PatternCompile { reason } = &err {
                tracing::error!(request_id = %request_id, reason = %reason, "Allowed-origin pattern does not compile");
            }
            tracing::warn!(
                request_id = %request_id,
                method = %method,
                kind = err.kind().as_str(),
                status = err.status().as_u16(),
                "Request rejected"
            );
            metrics::record_request(err.kind().as_str(), err.status().as_u16(), start_time);
            return err.into_response();
        }
    };

    tracing::info!(request_id = %request_id, url = %approved.target_url, "Relaying request");

    let result = fetch(&approved.target_url, state.client.as_ref()).await;
    match &result {
        FetchResult::Success(upstream) => {
            tracing::debug!(
                request_id = %request_id,
                status = upstream.status.as_u16(),
                bytes = upstream.body.len(),
                "Upstream responded"
            );
            metrics::record_request(metrics::OUTCOME_RELAYED, upstream.status.as_u16(), start_time);
        }
        FetchResult::Failure(err) => {
            tracing::warn!(
                request_id = %request_id,
                url = %approved.target_url,
                kind = err.kind().as_str(),
                status = err.status().as_u16(),
                error = %err,
                "Upstream fetch failed"
            );
            metrics::record_request(err.kind().as_str(), err.status().as_u16(), start_time);
        }
    }

    assemble(&approved.origin, result)
}
