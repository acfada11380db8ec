//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, proxy handler)
//!     → request.rs (request ID)
//!     → [routing, authentication]
//!     → request.rs (body buffering)
//!     → [validation]
//!     → forward.rs (upstream call, response relay)
//!     → Send to client
//! ```

pub mod forward;
pub mod request;
pub mod server;

pub use forward::Forwarder;
pub use request::{ProxyRequest, RequestIdLayer, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
