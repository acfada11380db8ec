//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that every base URL parses
//! - Validate value ranges (timeouts > 0)
//! - Detect conflicting routes
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationIssue>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::fmt;

use url::Url;

use crate::config::schema::ProxyConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl ValidationIssue {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check a parsed configuration for semantic errors.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationIssue>> {
    let mut issues = Vec::new();

    // The upstream connector speaks plain HTTP only.
    check_url(&mut issues, "upstream.base_url", &config.upstream.base_url, &["http"]);
    check_url(
        &mut issues,
        "identity.account_base_url",
        &config.identity.account_base_url,
        &["http", "https"],
    );
    if let Some(url) = &config.identity.authorize_url {
        check_url(&mut issues, "identity.authorize_url", url, &["http", "https"]);
    }

    if config.identity.role.is_empty() {
        issues.push(ValidationIssue::new("identity.role", "must not be empty"));
    }
    if config.identity.timeout_secs == 0 {
        issues.push(ValidationIssue::new("identity.timeout_secs", "must be greater than 0"));
    }
    if config.timeouts.request_secs == 0 {
        issues.push(ValidationIssue::new("timeouts.request_secs", "must be greater than 0"));
    }
    if config.timeouts.connect_secs == 0 {
        issues.push(ValidationIssue::new("timeouts.connect_secs", "must be greater than 0"));
    }

    let bypass = &config.auth.test_session_bypass;
    if bypass.enabled && bypass.marker.is_empty() {
        issues.push(ValidationIssue::new(
            "auth.test_session_bypass.marker",
            "must be set when the bypass is enabled",
        ));
    }

    let mut seen = HashSet::new();
    for (i, route) in config.routes.iter().enumerate() {
        if !route.path.starts_with('/') {
            issues.push(ValidationIssue::new(
                format!("routes[{}].path", i),
                "must start with '/'",
            ));
        }
        if !route.upstream_path.starts_with('/') {
            issues.push(ValidationIssue::new(
                format!("routes[{}].upstream_path", i),
                "must start with '/'",
            ));
        }
        if !seen.insert(route.path.as_str()) {
            issues.push(ValidationIssue::new(
                format!("routes[{}].path", i),
                format!("duplicate route '{}'", route.path),
            ));
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

fn check_url(issues: &mut Vec<ValidationIssue>, field: &str, value: &str, schemes: &[&str]) {
    match Url::parse(value) {
        Ok(url) if schemes.contains(&url.scheme()) => {}
        Ok(url) => issues.push(ValidationIssue::new(
            field,
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => issues.push(ValidationIssue::new(field, format!("invalid URL: {}", e))),
    }
}
