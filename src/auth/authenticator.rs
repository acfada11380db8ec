//! Route authenticators.

use std::fmt;

use axum::http::header::{AUTHORIZATION, REFERER};
use axum::http::request::Parts;

use crate::config::{AuthConfig, AuthenticatorKind};
use crate::error::AuthError;
use crate::http::request::header_str;
use crate::identity::IdentityResolver;

/// Opaque per-request authorization token. Empty means none was presented.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// Tokens never reach the logs.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("Credential(<none>)")
        } else {
            f.write_str("Credential(<redacted>)")
        }
    }
}

/// How a route decides whether a caller is allowed through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authenticator {
    /// Non-empty `Authorization` header accepted by the account service.
    Token,
    /// `Referer` header starting with a trusted origin; yields no credential.
    Referer { trusted_origin: String },
    /// Like `Token`, unless the URL carries the test-session marker.
    /// `marker` is `None` when the bypass is disabled.
    BypassableToken { marker: Option<String> },
}

impl Authenticator {
    /// Build the authenticator for a configured route.
    pub fn from_kind(kind: AuthenticatorKind, auth: &AuthConfig) -> Self {
        match kind {
            AuthenticatorKind::Token => Authenticator::Token,
            AuthenticatorKind::Referer => Authenticator::Referer {
                trusted_origin: auth.trusted_referer.clone(),
            },
            AuthenticatorKind::BypassableToken => {
                let bypass = &auth.test_session_bypass;
                Authenticator::BypassableToken {
                    marker: (bypass.enabled && !bypass.marker.is_empty())
                        .then(|| bypass.marker.clone()),
                }
            }
        }
    }

    /// Authenticate a request by its head, producing the credential
    /// downstream stages use. The body is never read.
    pub async fn authenticate(
        &self,
        request: &Parts,
        identity: &IdentityResolver,
    ) -> Result<Credential, AuthError> {
        match self {
            Authenticator::Token => authenticate_token(request, identity).await,
            Authenticator::Referer { trusted_origin } => {
                let referer = header_str(request, &REFERER).unwrap_or_default();
                if referer.starts_with(trusted_origin.as_str()) {
                    Ok(Credential::empty())
                } else {
                    Err(AuthError::Unauthorized("invalid referer".to_string()))
                }
            }
            Authenticator::BypassableToken { marker } => {
                if let Some(marker) = marker {
                    if request.uri.to_string().contains(marker.as_str()) {
                        tracing::warn!(
                            path = %request.uri.path(),
                            "Test-session marker present, skipping authentication"
                        );
                        return Ok(Credential::empty());
                    }
                }
                authenticate_token(request, identity).await
            }
        }
    }
}

async fn authenticate_token(
    request: &Parts,
    identity: &IdentityResolver,
) -> Result<Credential, AuthError> {
    let token = match header_str(request, &AUTHORIZATION) {
        Some(token) if !token.is_empty() => token,
        _ => return Err(AuthError::MissingCredential),
    };

    identity.authorize(token).await.map_err(|e| match e {
        AuthError::Unauthorized(_) | AuthError::MissingCredential => e,
        other => AuthError::Unauthorized(other.to_string()),
    })?;

    Ok(Credential::new(token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BypassConfig, IdentityConfig};
    use axum::http::Request;

    // Points at a closed port, so any token check that reaches the network fails.
    fn offline_identity() -> IdentityResolver {
        IdentityResolver::new(&IdentityConfig {
            account_base_url: "http://127.0.0.1:9/system".into(),
            ..Default::default()
        })
        .unwrap()
    }

    fn request(uri: &str, headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn test_referer_prefix() {
        let auth = Authenticator::Referer {
            trusted_origin: "https://servicewechat.com/".into(),
        };
        let identity = offline_identity();

        let ok = request("/logout", &[("Referer", "https://servicewechat.com/app/1/page")]);
        assert_eq!(auth.authenticate(&ok, &identity).await.unwrap(), Credential::empty());

        let spoofed = request("/logout", &[("Referer", "https://evil.example/servicewechat.com/")]);
        assert!(matches!(
            auth.authenticate(&spoofed, &identity).await,
            Err(AuthError::Unauthorized(_))
        ));

        let missing = request("/logout", &[]);
        assert!(auth.authenticate(&missing, &identity).await.is_err());
    }

    #[tokio::test]
    async fn test_token_requires_header() {
        let req = request("/system/message/list", &[]);
        assert!(matches!(
            Authenticator::Token.authenticate(&req, &offline_identity()).await,
            Err(AuthError::MissingCredential)
        ));
    }

    #[tokio::test]
    async fn test_unreachable_account_service_is_unauthorized() {
        let req = request("/system/message/list", &[("Authorization", "Bearer abc")]);
        assert!(matches!(
            Authenticator::Token.authenticate(&req, &offline_identity()).await,
            Err(AuthError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_marker_skips_token_check() {
        let auth = Authenticator::BypassableToken {
            marker: Some("test-session-1".into()),
        };
        let req = request("/system/message/list?sessionId=test-session-1", &[]);
        assert_eq!(
            auth.authenticate(&req, &offline_identity()).await.unwrap(),
            Credential::empty()
        );

        let other = request("/system/message/list?sessionId=other", &[]);
        assert!(auth.authenticate(&other, &offline_identity()).await.is_err());
    }

    #[test]
    fn test_bypass_disabled_drops_marker() {
        let mut config = AuthConfig {
            test_session_bypass: BypassConfig {
                enabled: false,
                marker: "test-session-1".into(),
            },
            ..Default::default()
        };
        assert_eq!(
            Authenticator::from_kind(AuthenticatorKind::BypassableToken, &config),
            Authenticator::BypassableToken { marker: None }
        );

        config.test_session_bypass.enabled = true;
        assert_eq!(
            Authenticator::from_kind(AuthenticatorKind::BypassableToken, &config),
            Authenticator::BypassableToken {
                marker: Some("test-session-1".into())
            }
        );
    }

    #[test]
    fn test_credential_debug_is_redacted() {
        assert_eq!(format!("{:?}", Credential::new("Bearer secret")), "Credential(<redacted>)");
    }
}
