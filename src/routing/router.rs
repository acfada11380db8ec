//! Route lookup.
//!
//! # Responsibilities
//! - Store the compiled routes
//! - Look up the route for a request path
//! - Return the matched route or an explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(1) exact-path lookup via HashMap
//! - Explicit `None` rather than a silent default route

use std::collections::HashMap;

use crate::auth::Authenticator;
use crate::config::{AuthConfig, ProxyConfig, RouteConfig};
use crate::validate::Validator;

/// A registered binding from an inbound path to the upstream.
#[derive(Debug, Clone)]
pub struct Route {
    pub url_path: String,
    pub upstream_path: String,
    pub authenticator: Authenticator,
    pub validators: Vec<Validator>,
}

impl Route {
    pub fn new(
        url_path: impl Into<String>,
        upstream_path: impl Into<String>,
        authenticator: Authenticator,
        validators: Vec<Validator>,
    ) -> Self {
        Self {
            url_path: url_path.into(),
            upstream_path: upstream_path.into(),
            authenticator,
            validators,
        }
    }

    fn from_config(route: &RouteConfig, auth: &AuthConfig) -> Self {
        Self::new(
            route.path.clone(),
            route.upstream_path.clone(),
            Authenticator::from_kind(route.authenticator, auth),
            route.validators.iter().copied().map(Validator::from).collect(),
        )
    }
}

/// Path → route table. Built once at startup, then shared read-only.
#[derive(Debug, Clone, Default)]
pub struct RouteRegistry {
    routes: HashMap<String, Route>,
}

impl RouteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile the routes of a configuration.
    pub fn from_config(config: &ProxyConfig) -> Self {
        let mut registry = Self::new();
        for route in &config.routes {
            registry.register(Route::from_config(route, &config.auth));
        }
        registry
    }

    /// Add a route, replacing any route already bound to the same path.
    ///
    /// Takes `&mut self`, so it cannot be called once the registry is shared.
    pub fn register(&mut self, route: Route) -> Option<Route> {
        tracing::debug!(
            path = %route.url_path,
            upstream_path = %route.upstream_path,
            validators = route.validators.len(),
            "Route registered"
        );
        self.routes.insert(route.url_path.clone(), route)
    }

    /// Exact-path lookup.
    pub fn lookup(&self, path: &str) -> Option<&Route> {
        self.routes.get(path)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Routes sorted by path.
    pub fn routes(&self) -> Vec<&Route> {
        let mut routes: Vec<_> = self.routes.values().collect();
        routes.sort_by(|a, b| a.url_path.cmp(&b.url_path));
        routes
    }
}
