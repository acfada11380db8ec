//! Request handling and transformation.
//!
//! # Responsibilities
//! - Assign a unique request ID (UUID v4) and echo it on the response
//! - Buffer the inbound body once so validators and the forwarder share it
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - The body is read exactly once, up to `limits.max_body_bytes`
//! - Original request head is kept intact; the forwarder builds a new request

use axum::{
    body::{Body, Bytes},
    http::{request::Parts, HeaderName, Method, Request},
};
use tower::Layer;
use tower_http::request_id::{
    MakeRequestUuid, PropagateRequestId, PropagateRequestIdLayer, SetRequestId,
    SetRequestIdLayer,
};

use crate::error::ProxyError;

/// Header carrying the request ID.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Sets `x-request-id` on requests that lack one and copies it onto the response.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestIdLayer;

impl<S> Layer<S> for RequestIdLayer {
    type Service = SetRequestId<PropagateRequestId<S>, MakeRequestUuid>;

    fn layer(&self, inner: S) -> Self::Service {
        let propagated = PropagateRequestIdLayer::new(X_REQUEST_ID).layer(inner);
        SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid).layer(propagated)
    }
}

/// Read the request ID assigned by [`RequestIdLayer`].
pub fn request_id(parts: &Parts) -> String {
    parts
        .headers
        .get(&X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}

/// Header value as a string; missing and non-UTF-8 values read as `None`.
pub fn header_str<'a>(parts: &'a Parts, name: &HeaderName) -> Option<&'a str> {
    parts.headers.get(name).and_then(|v| v.to_str().ok())
}

/// An inbound request whose body has been read into memory.
#[derive(Debug)]
pub struct ProxyRequest {
    pub parts: Parts,
    pub body: Bytes,
}

impl ProxyRequest {
    /// Buffer the body of `request`, failing if it exceeds `limit` bytes.
    pub async fn buffer(request: Request<Body>, limit: usize) -> Result<Self, ProxyError> {
        let (parts, body) = request.into_parts();
        Self::from_parts(parts, body, limit).await
    }

    /// Buffer `body` under an already split-off head.
    pub async fn from_parts(parts: Parts, body: Body, limit: usize) -> Result<Self, ProxyError> {
        let body = axum::body::to_bytes(body, limit)
            .await
            .map_err(|e| ProxyError::RequestBody(e.to_string()))?;
        Ok(Self { parts, body })
    }

    pub fn method(&self) -> &Method {
        &self.parts.method
    }

    /// Raw query string, without the leading `?`.
    pub fn raw_query(&self) -> Option<&str> {
        self.parts.uri.query()
    }
}
