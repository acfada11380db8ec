//! HTTP server setup and the proxy pipeline.
//!
//! # Responsibilities
//! - Create Axum Router with the proxy handler
//! - Wire up middleware (tracing, request timeout, request ID)
//! - Bind server to listener with graceful shutdown
//! - Run every request through lookup → authenticate → buffer → validate → forward

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{Request, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ProxyConfig;
use crate::error::{AuthError, ProxyError};
use crate::http::forward::Forwarder;
use crate::http::request::{request_id, ProxyRequest, RequestIdLayer};
use crate::identity::IdentityResolver;
use crate::observability::metrics;
use crate::routing::{Route, RouteRegistry};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<RouteRegistry>,
    pub identity: IdentityResolver,
    pub forwarder: Forwarder,
    pub max_body_bytes: usize,
    pub strict_status_codes: bool,
}

impl AppState {
    /// Build every subsystem from configuration.
    pub fn from_config(config: &ProxyConfig) -> Result<Self, AuthError> {
        Ok(Self::new(
            config,
            RouteRegistry::from_config(config),
            IdentityResolver::new(&config.identity)?,
        ))
    }

    /// Build state around an already assembled registry and resolver.
    pub fn new(config: &ProxyConfig, registry: RouteRegistry, identity: IdentityResolver) -> Self {
        Self {
            registry: Arc::new(registry),
            identity,
            forwarder: Forwarder::new(
                &config.upstream.base_url,
                Duration::from_secs(config.timeouts.connect_secs),
            ),
            max_body_bytes: config.limits.max_body_bytes,
            strict_status_codes: config.auth.strict_status_codes,
        }
    }
}

/// HTTP server for the reverse proxy.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: &ProxyConfig) -> Result<Self, AuthError> {
        Ok(Self::with_state(config, AppState::from_config(config)?))
    }

    pub fn with_state(config: &ProxyConfig, state: AppState) -> Self {
        tracing::info!(
            routes = state.registry.len(),
            upstream = %config.upstream.base_url,
            "Route registry built"
        );
        Self {
            router: Self::build_router(config, state),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(TraceLayer::new_for_http())
            .layer(RequestIdLayer)
    }

    /// The router, for serving on a custom transport or driving in tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Main proxy handler.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response<Body> {
    let start_time = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    let (route_label, result) = match state.registry.lookup(&path) {
        Some(route) => (route.url_path.as_str(), dispatch(&state, route, request).await),
        None => ("none", Err(ProxyError::NotFound)),
    };

    let response = match result {
        Ok(response) => response,
        Err(e) => {
            let response = e.into_response(state.strict_status_codes);
            tracing::info!(
                method = %method,
                path = %path,
                status = response.status().as_u16(),
                "Request rejected"
            );
            response
        }
    };

    metrics::record_request(&method, response.status().as_u16(), route_label, start_time);
    response
}

/// Run one request through the pipeline of its matched route.
///
/// Authentication only looks at the head, so the body is not read until the
/// caller has been let through.
async fn dispatch(
    state: &AppState,
    route: &Route,
    request: Request<Body>,
) -> Result<Response<Body>, ProxyError> {
    let (parts, body) = request.into_parts();
    let request_id = request_id(&parts);

    tracing::debug!(
        request_id = %request_id,
        method = %parts.method,
        route = %route.url_path,
        "Proxying request"
    );

    let credential = route
        .authenticator
        .authenticate(&parts, &state.identity)
        .await
        .map_err(ProxyError::Unauthorized)?;

    let request = ProxyRequest::from_parts(parts, body, state.max_body_bytes).await?;

    for validator in &route.validators {
        validator
            .process(&request, &credential, &state.identity)
            .await?;
    }

    let response = state.forwarder.forward(route, request).await?;
    tracing::debug!(
        request_id = %request_id,
        status = response.status().as_u16(),
        "Response relayed"
    );
    Ok(response)
}
