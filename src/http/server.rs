//! HTTP server setup and request entry points.
//!
//! # Responsibilities
//! - Create the Axum router and wire up middleware (timeout, tracing,
//!   request ID)
//! - Validate the inbound target URL before orchestration starts
//! - Serve plain TCP or TLS depending on listener configuration
//! - Shut down gracefully on the coordinator signal

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use http::{HeaderMap, StatusCode};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::ProxyConfig;
use crate::error::TransportError;
use crate::http::request::{self, MakeRequestUuid, ProxyParams};
use crate::http::response;
use crate::net::tls;
use crate::observability::metrics;
use crate::proxy::context::RequestContext;
use crate::proxy::handler;
use crate::proxy::policy::{CompressionCandidates, TransformPolicy};
use crate::upstream::UpstreamClient;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ProxyConfig>,
    pub upstream: Arc<UpstreamClient>,
    pub policy: Arc<dyn TransformPolicy>,
}

/// HTTP server for the compression proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a server with the production delivery policy.
    pub fn new(config: ProxyConfig) -> Result<Self, TransportError> {
        let policy = Arc::new(CompressionCandidates::new(config.compression.min_size));
        Self::with_policy(config, policy)
    }

    /// Create a server with an injected delivery policy.
    pub fn with_policy(
        config: ProxyConfig,
        policy: Arc<dyn TransformPolicy>,
    ) -> Result<Self, TransportError> {
        let upstream = Arc::new(UpstreamClient::new(&config.upstream)?);
        let state = AppState {
            config: Arc::new(config.clone()),
            upstream,
            policy,
        };
        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        Router::new()
            .route("/", get(proxy_handler))
            .route("/health", get(health_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Run the server, accepting connections on the given listener until
    /// the shutdown channel fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            tls = self.config.listener.tls.is_some(),
            "HTTP server starting"
        );

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        match &self.config.listener.tls {
            Some(tls_config) => {
                let rustls = tls::load_tls_config(
                    Path::new(&tls_config.cert_path),
                    Path::new(&tls_config.key_path),
                )
                .await?;
                let handle = axum_server::Handle::new();
                let drain = handle.clone();
                tokio::spawn(async move {
                    let _ = shutdown.recv().await;
                    tracing::info!("Shutdown signal received");
                    drain.graceful_shutdown(Some(Duration::from_secs(5)));
                });
                axum_server::from_tcp_rustls(listener.into_std()?, rustls)
                    .handle(handle)
                    .serve(app)
                    .await?;
            }
            None => {
                axum::serve(listener, app)
                    .with_graceful_shutdown(async move {
                        let _ = shutdown.recv().await;
                        tracing::info!("Shutdown signal received");
                    })
                    .await?;
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

/// Main proxy entry point. Validates the target URL, captures the request
/// context, and hands off to the orchestration.
async fn proxy_handler(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Query(params): Query<ProxyParams>,
    headers: HeaderMap,
) -> Response {
    let started = Instant::now();
    let request_id = request::request_id(&headers);

    let raw_url = match params.url {
        Some(raw) if !raw.is_empty() => raw,
        _ => {
            tracing::debug!(request_id = %request_id, "Missing url parameter");
            metrics::record_request("rejected", 400, started);
            return response::error_response(
                StatusCode::BAD_REQUEST,
                "missing_url",
                "query parameter `url` is required",
            );
        }
    };

    let url = match request::parse_target(&raw_url) {
        Ok(url) => url,
        Err(error) => {
            tracing::debug!(
                request_id = %request_id,
                url = %raw_url,
                error = %error,
                "Unparseable target URL"
            );
            metrics::record_request("rejected", 400, started);
            return response::error_response(
                StatusCode::BAD_REQUEST,
                "invalid_url",
                "query parameter `url` is not a valid absolute URL",
            );
        }
    };

    let ctx = RequestContext::new(request_id, url, &headers, peer.ip());
    handler::run(&state, ctx, started).await
}

async fn health_handler() -> impl IntoResponse {
    axum::Json(serde_json::json!({ "status": "ok" }))
}
