//! Upstream forwarding.
//!
//! # Responsibilities
//! - Rewrite the inbound URI onto the upstream base URL and route path
//! - Re-issue the request with the same method, headers and buffered body
//! - Relay the upstream status, headers and body unchanged
//!
//! # Design Decisions
//! - Exactly one upstream call per request: no retries, no caching
//! - The raw query string is carried over verbatim
//! - `Host` is derived from the upstream URL rather than copied

use std::error::Error as StdError;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header::HOST, HeaderMap, Request, Response, Uri},
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::error::ProxyError;
use crate::http::request::ProxyRequest;
use crate::routing::Route;

/// Sends validated requests to the configured upstream.
#[derive(Clone)]
pub struct Forwarder {
    client: Client<HttpConnector, Body>,
    base_url: String,
}

impl Forwarder {
    pub fn new(base_url: &str, connect_timeout: Duration) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(connect_timeout));
        let client = Client::builder(TokioExecutor::new()).build(connector);

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// `base_url + route.upstream_path`, plus the inbound raw query if any.
    pub fn upstream_url(&self, route: &Route, raw_query: Option<&str>) -> String {
        match raw_query {
            Some(query) => format!("{}{}?{}", self.base_url, route.upstream_path, query),
            None => format!("{}{}", self.base_url, route.upstream_path),
        }
    }

    /// Forward `request` along `route` and return the upstream's response.
    pub async fn forward(&self, route: &Route, request: ProxyRequest) -> Result<Response<Body>, ProxyError> {
        let ProxyRequest { parts, body } = request;

        let url = self.upstream_url(route, parts.uri.query());
        let uri: Uri = url
            .parse()
            .map_err(|e| ProxyError::UpstreamTransport(format!("invalid upstream URL {}: {}", url, e)))?;

        let mut outbound = Request::new(Body::from(body));
        *outbound.method_mut() = parts.method.clone();
        *outbound.uri_mut() = uri;
        copy_headers(&parts.headers, outbound.headers_mut());

        let response = self.client.request(outbound).await.map_err(|e| {
            let reason = error_chain(&e);
            tracing::error!(url = %url, error = %reason, "Upstream error");
            ProxyError::UpstreamTransport(reason)
        })?;

        let (parts, body) = response.into_parts();
        let bytes = axum::body::to_bytes(Body::new(body), usize::MAX)
            .await
            .map_err(|e| {
                tracing::error!(url = %url, error = %e, "Failed to read upstream body");
                ProxyError::UpstreamRead(e.to_string())
            })?;

        tracing::debug!(url = %url, status = %parts.status, bytes = bytes.len(), "Upstream responded");
        Ok(Response::from_parts(parts, Body::from(bytes)))
    }
}

/// Copy every header (all values) from `from` into `to`, replacing same-named entries.
fn copy_headers(from: &HeaderMap, to: &mut HeaderMap) {
    for name in from.keys() {
        if *name == HOST {
            continue;
        }
        to.remove(name);
        for value in from.get_all(name) {
            to.append(name.clone(), value.clone());
        }
    }
}

/// Render an error and its sources as one line.
fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
