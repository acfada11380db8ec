//! Error taxonomy for the request pipeline.
//!
//! Each stage of the dispatcher has its own error type; [`ProxyError`] wraps
//! them and decides the status code the caller sees.

use axum::{
    body::Body,
    http::{header, Method, Response, StatusCode},
};
use thiserror::Error;

/// Failures while authenticating a caller or resolving its identity.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("unauthorized: missing authorization credential")]
    MissingCredential,

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("account service request failed: {0}")]
    Upstream(String),

    #[error("account service returned a malformed response: {0}")]
    Malformed(String),
}

/// Failures raised by a route validator.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("unsupported HTTP method: {0}")]
    MethodNotAllowed(Method),

    #[error(transparent)]
    Identity(#[from] AuthError),
}

/// Terminal failure of one proxied request.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Not found")]
    NotFound,

    #[error("{0}")]
    Unauthorized(AuthError),

    #[error("{0}")]
    Rejected(#[from] ValidationError),

    #[error("Error reading request body: {0}")]
    RequestBody(String),

    #[error("Error making request: {0}")]
    UpstreamTransport(String),

    #[error("Error reading response body: {0}")]
    UpstreamRead(String),
}

impl ProxyError {
    /// Status code for this error.
    ///
    /// With `strict` unset, identity mismatches and unsupported methods are
    /// answered with 400 like every other validation failure.
    pub fn status(&self, strict: bool) -> StatusCode {
        match self {
            ProxyError::NotFound => StatusCode::NOT_FOUND,
            ProxyError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ProxyError::Rejected(ValidationError::Forbidden(_)) if strict => StatusCode::FORBIDDEN,
            ProxyError::Rejected(ValidationError::MethodNotAllowed(_)) if strict => {
                StatusCode::METHOD_NOT_ALLOWED
            }
            ProxyError::Rejected(_) | ProxyError::RequestBody(_) => StatusCode::BAD_REQUEST,
            ProxyError::UpstreamTransport(_) | ProxyError::UpstreamRead(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Render as a plain-text response carrying the error message.
    pub fn into_response(self, strict: bool) -> Response<Body> {
        let status = self.status(strict);
        let mut response = Response::new(Body::from(format!("{}\n", self)));
        *response.status_mut() = status;
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        response.headers_mut().insert(
            header::X_CONTENT_TYPE_OPTIONS,
            header::HeaderValue::from_static("nosniff"),
        );
        response
    }
}
