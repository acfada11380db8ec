//! Shared utilities for integration testing.
//!
//! Every server binds to an ephemeral port on 127.0.0.1 so tests can run in parallel.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    body::{Body, Bytes},
    extract::{Path, State},
    http::{HeaderMap, Request, Response, StatusCode},
    routing::{any, get},
    Router,
};
use serde_json::json;
use tokio::net::TcpListener;

use gatekeeper_proxy::config::{BypassConfig, ProxyConfig};
use gatekeeper_proxy::http::AppState;
use gatekeeper_proxy::identity::IdentityResolver;
use gatekeeper_proxy::routing::RouteRegistry;
use gatekeeper_proxy::{HttpServer, Shutdown};

/// Marker that switches off authentication on bypassable routes in tests.
pub const TEST_SESSION: &str = "e5b21a57889541ffa01c6e387da971cd";

/// Referer origin trusted by the test proxy.
pub const TRUSTED_REFERER: &str = "https://servicewechat.com/";

/// Body returned by the mock upstream for every request.
pub const UPSTREAM_BODY: &str = r#"{"code":200,"rows":[{"id":1,"msgText":"hello"}]}"#;

async fn serve(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    addr
}

/// A request as seen by the mock upstream.
#[derive(Debug, Clone)]
pub struct Captured {
    pub method: String,
    pub uri: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Header asking the mock upstream to answer with a specific status code.
pub const REPLY_STATUS: &str = "x-mock-status";

/// Upstream that records every request and answers with repeated headers.
///
/// The status is 202 unless the request carries [`REPLY_STATUS`].
#[derive(Clone)]
pub struct MockUpstream {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<Captured>>>,
}

impl MockUpstream {
    pub async fn start() -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let router = Router::new()
            .route("/{*path}", any(record_and_reply))
            .with_state(requests.clone());
        Self {
            addr: serve(router).await,
            requests,
        }
    }

    pub fn requests(&self) -> Vec<Captured> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last(&self) -> Captured {
        self.requests().pop().expect("upstream was never called")
    }
}

async fn record_and_reply(
    State(requests): State<Arc<Mutex<Vec<Captured>>>>,
    request: Request<Body>,
) -> Response<Body> {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    let status = parts
        .headers
        .get(REPLY_STATUS)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u16>().ok())
        .and_then(|code| StatusCode::from_u16(code).ok())
        .unwrap_or(StatusCode::ACCEPTED);
    requests.lock().unwrap().push(Captured {
        method: parts.method.to_string(),
        uri: parts.uri.to_string(),
        headers: parts.headers,
        body,
    });

    Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .header("x-upstream", "mock")
        .header("set-cookie", "a=1; Path=/")
        .header("set-cookie", "b=2; Path=/")
        .body(Body::from(UPSTREAM_BODY))
        .unwrap()
}

#[derive(Clone, Default)]
struct IdentityLog {
    login_hits: Arc<AtomicUsize>,
    sender_hits: Arc<AtomicUsize>,
    authorizations: Arc<Mutex<Vec<String>>>,
    sender_paths: Arc<Mutex<Vec<String>>>,
}

/// Account service stub.
///
/// Tokens: `Bearer good` → user 7 (sender S1), `Bearer other` → user 8 (S8),
/// `Bearer text` → user "u-7" (S1), `Bearer garbage` → non-JSON reply,
/// anything else → `code: 401`.
#[derive(Clone)]
pub struct MockIdentity {
    pub addr: SocketAddr,
    log: IdentityLog,
}

impl MockIdentity {
    pub async fn start() -> Self {
        let log = IdentityLog::default();
        let router = Router::new()
            .route("/system/loginInfo", get(login_info))
            .route("/system/session/digital/{user_id}/{role}", get(sender_session))
            .with_state(log.clone());
        Self {
            addr: serve(router).await,
            log,
        }
    }

    /// Base URL to configure as `identity.account_base_url`.
    pub fn account_base_url(&self) -> String {
        format!("http://{}/system", self.addr)
    }

    pub fn login_hits(&self) -> usize {
        self.log.login_hits.load(Ordering::SeqCst)
    }

    pub fn sender_hits(&self) -> usize {
        self.log.sender_hits.load(Ordering::SeqCst)
    }

    /// Authorization headers received on `/loginInfo`, in order.
    pub fn authorizations(&self) -> Vec<String> {
        self.log.authorizations.lock().unwrap().clone()
    }

    /// Paths of the sender-session lookups, in order.
    pub fn sender_paths(&self) -> Vec<String> {
        self.log.sender_paths.lock().unwrap().clone()
    }
}

fn authorization(headers: &HeaderMap) -> String {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

async fn login_info(State(log): State<IdentityLog>, headers: HeaderMap) -> Response<Body> {
    log.login_hits.fetch_add(1, Ordering::SeqCst);
    let auth = authorization(&headers);
    log.authorizations.lock().unwrap().push(auth.clone());

    let body = match auth.as_str() {
        "Bearer good" => json!({"code": 200, "msg": "ok", "data": {"id": 7, "mobile": "13800000007"}}),
        "Bearer other" => json!({"code": 200, "msg": "ok", "data": {"id": 8, "mobile": "13800000008"}}),
        "Bearer text" => json!({"code": 200, "msg": "ok", "data": {"id": "u-7", "mobile": "13800000070"}}),
        "Bearer garbage" => return Response::new(Body::from("<html>gateway error</html>")),
        _ => json!({"code": 401, "msg": "token expired", "data": null}),
    };
    Response::new(Body::from(body.to_string()))
}

async fn sender_session(
    State(log): State<IdentityLog>,
    Path((user_id, role)): Path<(String, String)>,
) -> Response<Body> {
    log.sender_hits.fetch_add(1, Ordering::SeqCst);
    log.sender_paths
        .lock()
        .unwrap()
        .push(format!("{}/{}", user_id, role));

    let sender_id = match user_id.as_str() {
        "7" | "u-7" => "S1",
        "8" => "S8",
        _ => "",
    };
    let body = json!({"code": 200, "msg": "ok", "data": {"senderId": sender_id}});
    Response::new(Body::from(body.to_string()))
}

/// HTTP client that ignores proxy environment variables.
pub fn direct_client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Resolver for `config` whose calls never go through a system proxy.
pub fn resolver_for(config: &ProxyConfig) -> IdentityResolver {
    IdentityResolver::with_client(&config.identity, direct_client())
}

fn state_for(config: &ProxyConfig) -> AppState {
    AppState::new(config, RouteRegistry::from_config(config), resolver_for(config))
}

/// A running proxy wired to fresh mock upstream and account services.
pub struct Harness {
    pub proxy_url: String,
    pub upstream: MockUpstream,
    pub identity: MockIdentity,
    pub client: reqwest::Client,
    shutdown: Shutdown,
}

impl Harness {
    pub async fn start() -> Self {
        Self::start_with(|_| {}).await
    }

    /// Start with a configuration tweak applied after the mocks are wired in.
    pub async fn start_with(tweak: impl FnOnce(&mut ProxyConfig)) -> Self {
        let upstream = MockUpstream::start().await;
        let identity = MockIdentity::start().await;

        let mut config = ProxyConfig::default();
        config.upstream.base_url = format!("http://{}", upstream.addr);
        config.identity.account_base_url = identity.account_base_url();
        config.auth.trusted_referer = TRUSTED_REFERER.to_string();
        config.auth.test_session_bypass = BypassConfig {
            enabled: true,
            marker: TEST_SESSION.to_string(),
        };
        tweak(&mut config);

        let server = HttpServer::with_state(&config, state_for(&config));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let proxy_addr = listener.local_addr().unwrap();

        let shutdown = Shutdown::new();
        let server_shutdown = shutdown.subscribe();
        tokio::spawn(async move {
            let _ = server.run(listener, server_shutdown).await;
        });

        Self {
            proxy_url: format!("http://{}", proxy_addr),
            upstream,
            identity,
            client: direct_client(),
            shutdown,
        }
    }

    pub fn url(&self, path_and_query: &str) -> String {
        format!("{}{}", self.proxy_url, path_and_query)
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}
