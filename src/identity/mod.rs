//! Identity resolution subsystem.
//!
//! # Data Flow
//! ```text
//! Credential (Authorization header value)
//!     → resolver.rs: authorize          GET {authorize_url}           → account mobile
//!     → resolver.rs: resolve_user_id    GET {account}/loginInfo       → userId
//!     → resolver.rs: resolve_sender_id  GET {account}/session/digital/{userId}/{role} → senderId
//! ```
//!
//! # Design Decisions
//! - Every call is one fresh GET: no retries, no caching, so authorization
//!   always reflects live account state
//! - The resolver owns its configuration; nothing is read from globals

pub mod resolver;
pub mod types;

pub use resolver::IdentityResolver;
pub use types::ResolvedIdentity;
