//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path)
//!     → router.rs (exact path lookup)
//!     → Return: matched Route or NoMatch (404)
//!
//! Route Compilation (at startup):
//!     RouteConfig[] + AuthConfig
//!     → build Authenticator and Validators per route
//!     → Freeze as immutable RouteRegistry behind an Arc
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Exact path matching only
//! - Deterministic: same input always matches same route

pub mod router;

pub use router::{Route, RouteRegistry};
