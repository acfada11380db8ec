//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Path of the message-list route registered by default.
pub const MESSAGE_LIST_PATH: &str = "/system/message/list";

/// Path of the logout route registered by default.
pub const LOGOUT_PATH: &str = "/logout";

/// Root configuration for the reverse proxy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// The single backend every route forwards to.
    pub upstream: UpstreamConfig,

    /// External account service used to resolve credentials.
    pub identity: IdentityConfig,

    /// Authentication policy shared by all routes.
    pub auth: AuthConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Request size limits.
    pub limits: LimitsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Route definitions mapping inbound paths to upstream paths.
    pub routes: Vec<RouteConfig>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            upstream: UpstreamConfig::default(),
            identity: IdentityConfig::default(),
            auth: AuthConfig::default(),
            timeouts: TimeoutConfig::default(),
            limits: LimitsConfig::default(),
            observability: ObservabilityConfig::default(),
            routes: default_routes(),
        }
    }
}

/// The two routes the proxy serves when no routes are configured.
pub fn default_routes() -> Vec<RouteConfig> {
    vec![
        RouteConfig {
            path: MESSAGE_LIST_PATH.to_string(),
            upstream_path: MESSAGE_LIST_PATH.to_string(),
            authenticator: AuthenticatorKind::BypassableToken,
            validators: vec![ValidatorKind::MethodDispatch],
        },
        RouteConfig {
            path: LOGOUT_PATH.to_string(),
            upstream_path: LOGOUT_PATH.to_string(),
            authenticator: AuthenticatorKind::Referer,
            validators: Vec::new(),
        },
    ]
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Upstream backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL prepended to each route's upstream path (no trailing slash).
    pub base_url: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:9303".to_string(),
        }
    }
}

/// Account service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Base URL of the account API (`/loginInfo` and `/session/digital/...` live under it).
    pub account_base_url: String,

    /// URL of the token authorization endpoint.
    /// Defaults to `{account_base_url}/loginInfo` when unset.
    pub authorize_url: Option<String>,

    /// Role constant used when looking up a user's sender identifier.
    pub role: String,

    /// Timeout for a single account service call in seconds.
    pub timeout_secs: u64,
}

impl IdentityConfig {
    /// Resolved authorization endpoint.
    pub fn authorize_url(&self) -> String {
        match &self.authorize_url {
            Some(url) => url.clone(),
            None => format!("{}/loginInfo", self.account_base_url.trim_end_matches('/')),
        }
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            account_base_url: "http://127.0.0.1:9303/system".to_string(),
            authorize_url: None,
            role: "132".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Authentication policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Origin prefix a `Referer` header must carry for referer-authenticated routes.
    pub trusted_referer: String,

    /// Answer identity mismatches with 403 and unsupported methods with 405
    /// instead of 400.
    pub strict_status_codes: bool,

    /// Test-session authentication bypass.
    pub test_session_bypass: BypassConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            trusted_referer: "https://servicewechat.com/".to_string(),
            strict_status_codes: false,
            test_session_bypass: BypassConfig::default(),
        }
    }
}

/// Skips token authentication for URLs carrying a known test-session marker.
///
/// WARNING: this is a backdoor. Leave it disabled outside of test environments.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct BypassConfig {
    pub enabled: bool,
    pub marker: String,
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout for upstream calls in seconds.
    pub connect_secs: u64,

    /// Total time allowed for one inbound request, upstream call included.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
        }
    }
}

/// Request size limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum inbound body size buffered for validation and forwarding.
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// A single route binding.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Inbound path, matched exactly.
    pub path: String,

    /// Path appended to the upstream base URL.
    pub upstream_path: String,

    /// How callers of this route are authenticated.
    pub authenticator: AuthenticatorKind,

    /// Checks run in order after authentication succeeds.
    #[serde(default)]
    pub validators: Vec<ValidatorKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuthenticatorKind {
    Token,
    Referer,
    BypassableToken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidatorKind {
    SenderId,
    MessageBody,
    MethodDispatch,
}
