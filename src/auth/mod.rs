//! Authentication subsystem.
//!
//! # Data Flow
//! ```text
//! Request head (method, URI, headers; the body is still unread)
//!     → authenticator.rs (route's Authenticator variant)
//!     → Credential (possibly empty) or AuthError → 401
//! ```
//!
//! # Design Decisions
//! - Closed set of variants: routes are static, so no trait objects
//! - Evaluated exactly once per request, before the body is buffered
//! - The credential is passed through unmodified to validators and upstream

pub mod authenticator;

pub use authenticator::{Authenticator, Credential};
