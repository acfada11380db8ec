//! Authenticating path-based reverse proxy.
//!
//! Every inbound request is matched against a fixed route table, authenticated
//! by the route's authenticator, checked by the route's validators and then
//! forwarded to a single upstream backend whose response is relayed verbatim.

pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod identity;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod validate;

pub use config::schema::ProxyConfig;
pub use error::{AuthError, ProxyError, ValidationError};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
