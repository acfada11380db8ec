//! Per-route request validation.
//!
//! # Data Flow
//! ```text
//! Authenticated ProxyRequest + Credential
//!     → validator.rs (each route validator, in registration order)
//!         GET  → sender id in the query string must match the caller's account
//!         POST → sender id in the JSON body must match the body's user
//!     → first failure short-circuits → 400
//! ```
//!
//! # Design Decisions
//! - Validators read the buffered body; they never consume a stream
//! - Identity lookups are made fresh for every request
//! - Cheap syntactic checks run before any network call

pub mod message;
pub mod validator;

pub use message::Message;
pub use validator::Validator;
