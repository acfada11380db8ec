//! Account service client.

use std::time::Duration;

use reqwest::header::AUTHORIZATION;
use serde::de::DeserializeOwned;

use crate::config::IdentityConfig;
use crate::error::AuthError;
use crate::identity::types::{
    AuthorizeResponse, Envelope, LoginInfo, ResolvedIdentity, SenderSession,
};
use crate::observability::metrics;

/// Resolves credentials against the external account service.
#[derive(Debug, Clone)]
pub struct IdentityResolver {
    client: reqwest::Client,
    account_base_url: String,
    authorize_url: String,
    role: String,
}

impl IdentityResolver {
    /// Build a resolver with its own HTTP client.
    pub fn new(config: &IdentityConfig) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AuthError::Upstream(e.to_string()))?;
        Ok(Self::with_client(config, client))
    }

    /// Build a resolver on top of an existing client.
    pub fn with_client(config: &IdentityConfig, client: reqwest::Client) -> Self {
        Self {
            client,
            account_base_url: config.account_base_url.trim_end_matches('/').to_string(),
            authorize_url: config.authorize_url(),
            role: config.role.clone(),
        }
    }

    /// Check that a token belongs to a logged-in account; returns the account's mobile.
    ///
    /// A `Bearer ` prefix is added when the token does not carry one.
    pub async fn authorize(&self, token: &str) -> Result<String, AuthError> {
        if token.is_empty() {
            return Err(AuthError::MissingCredential);
        }
        let header = if token.contains("Bearer ") {
            token.to_string()
        } else {
            format!("Bearer {}", token)
        };

        let response: AuthorizeResponse = self.get_json("authorize", &self.authorize_url, &header).await?;
        if response.code != 200 {
            return Err(AuthError::Unauthorized(response.msg));
        }
        match response.data.and_then(|d| d.mobile) {
            Some(mobile) if !mobile.is_empty() => Ok(mobile),
            _ => Err(AuthError::Unauthorized("not logged in".to_string())),
        }
    }

    /// Resolve a credential to the id of the account it belongs to.
    pub async fn resolve_user_id(&self, credential: &str) -> Result<String, AuthError> {
        if credential.is_empty() {
            return Err(AuthError::MissingCredential);
        }
        let url = format!("{}/loginInfo", self.account_base_url);
        let envelope: Envelope<LoginInfo> = self.get_json("login_info", &url, credential).await?;
        Ok(envelope.data.id.to_string())
    }

    /// Resolve the canonical sender id of `user_id` for the configured role.
    pub async fn resolve_sender_id(&self, user_id: &str, credential: &str) -> Result<String, AuthError> {
        if credential.is_empty() {
            return Err(AuthError::MissingCredential);
        }
        if user_id.is_empty() {
            return Err(AuthError::Malformed("empty user id".to_string()));
        }
        let url = format!(
            "{}/session/digital/{}/{}",
            self.account_base_url, user_id, self.role
        );
        let envelope: Envelope<SenderSession> = self.get_json("sender_session", &url, credential).await?;
        Ok(envelope.data.sender_id)
    }

    /// Resolve both identifiers for a credential.
    pub async fn resolve(&self, credential: &str) -> Result<ResolvedIdentity, AuthError> {
        let user_id = self.resolve_user_id(credential).await?;
        let sender_id = self.resolve_sender_id(&user_id, credential).await?;
        Ok(ResolvedIdentity { user_id, sender_id })
    }

    /// GET `url` and decode its JSON body. Every outcome is counted once.
    async fn get_json<T: DeserializeOwned>(
        &self,
        call: &'static str,
        url: &str,
        authorization: &str,
    ) -> Result<T, AuthError> {
        let result = self.fetch_json(url, authorization).await;
        metrics::record_identity_call(call, result.is_ok());
        if let Err(e) = &result {
            tracing::warn!(call, url = %url, error = %e, "Account service call failed");
        }
        result
    }

    async fn fetch_json<T: DeserializeOwned>(
        &self,
        url: &str,
        authorization: &str,
    ) -> Result<T, AuthError> {
        let response = self
            .client
            .get(url)
            .header(AUTHORIZATION, authorization)
            .send()
            .await
            .map_err(|e| AuthError::Upstream(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| AuthError::Upstream(e.to_string()))?;
        tracing::debug!(status = %status, bytes = body.len(), "Account service replied");

        serde_json::from_slice(&body).map_err(|e| AuthError::Malformed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> IdentityResolver {
        // Nothing listens here; every test below must fail before connecting.
        let config = IdentityConfig {
            account_base_url: "http://127.0.0.1:9/system/".into(),
            ..Default::default()
        };
        IdentityResolver::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_empty_credential_is_rejected_before_any_call() {
        let resolver = resolver();
        assert!(matches!(
            resolver.resolve_user_id("").await,
            Err(AuthError::MissingCredential)
        ));
        assert!(matches!(
            resolver.resolve_sender_id("7", "").await,
            Err(AuthError::MissingCredential)
        ));
        assert!(matches!(resolver.authorize("").await, Err(AuthError::MissingCredential)));
    }

    #[tokio::test]
    async fn test_transport_failure_is_upstream_error() {
        let resolver = resolver();
        assert!(matches!(
            resolver.resolve_user_id("Bearer abc").await,
            Err(AuthError::Upstream(_))
        ));
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        assert_eq!(resolver().account_base_url, "http://127.0.0.1:9/system");
        assert_eq!(resolver().authorize_url, "http://127.0.0.1:9/system/loginInfo");
    }
}
