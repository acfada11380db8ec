//! Route validators.

use axum::http::Method;
use url::form_urlencoded;

use crate::auth::Credential;
use crate::config::ValidatorKind;
use crate::error::ValidationError;
use crate::http::request::ProxyRequest;
use crate::identity::IdentityResolver;
use crate::validate::message::Message;

const SENDER_ID_PARAM: &str = "senderId";

/// A check run against an authenticated request before it is forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validator {
    /// `senderId` query parameter must be the caller's canonical sender id.
    SenderId,
    /// JSON body's `senderId` must be the canonical sender id of its `userId`.
    MessageBody,
    /// `SenderId` for GET, `MessageBody` for POST, anything else is rejected.
    MethodDispatch,
}

impl From<ValidatorKind> for Validator {
    fn from(kind: ValidatorKind) -> Self {
        match kind {
            ValidatorKind::SenderId => Validator::SenderId,
            ValidatorKind::MessageBody => Validator::MessageBody,
            ValidatorKind::MethodDispatch => Validator::MethodDispatch,
        }
    }
}

impl Validator {
    pub async fn process(
        &self,
        request: &ProxyRequest,
        credential: &Credential,
        identity: &IdentityResolver,
    ) -> Result<(), ValidationError> {
        match self {
            Validator::SenderId => check_query_sender(request, credential, identity).await,
            Validator::MessageBody => check_body_sender(request, credential, identity).await,
            Validator::MethodDispatch => match *request.method() {
                Method::GET => check_query_sender(request, credential, identity).await,
                Method::POST => check_body_sender(request, credential, identity).await,
                _ => Err(ValidationError::MethodNotAllowed(request.method().clone())),
            },
        }
    }
}

/// True when the query ends in an empty `senderId=` assignment.
fn has_empty_sender_suffix(request: &ProxyRequest) -> bool {
    request
        .raw_query()
        .is_some_and(|q| q.ends_with("senderId="))
}

/// First `senderId` query value, URL-decoded; empty when absent.
fn query_sender_id(request: &ProxyRequest) -> String {
    request
        .raw_query()
        .and_then(|q| {
            form_urlencoded::parse(q.as_bytes())
                .find(|(key, _)| key == SENDER_ID_PARAM)
                .map(|(_, value)| value.into_owned())
        })
        .unwrap_or_default()
}

async fn check_query_sender(
    request: &ProxyRequest,
    credential: &Credential,
    identity: &IdentityResolver,
) -> Result<(), ValidationError> {
    if has_empty_sender_suffix(request) {
        return Err(ValidationError::BadRequest("invalid URL format".to_string()));
    }

    let user_id = identity.resolve_user_id(credential.as_str()).await?;
    let requested = query_sender_id(request);
    let canonical = identity
        .resolve_sender_id(&user_id, credential.as_str())
        .await?;

    if requested != canonical {
        tracing::debug!(user_id = %user_id, "Query senderId does not match account");
        return Err(ValidationError::Forbidden("invalid senderId".to_string()));
    }
    Ok(())
}

async fn check_body_sender(
    request: &ProxyRequest,
    credential: &Credential,
    identity: &IdentityResolver,
) -> Result<(), ValidationError> {
    let msg: Message = serde_json::from_slice(&request.body)
        .map_err(|e| ValidationError::BadRequest(format!("invalid JSON format: {}", e)))?;

    if msg.sender_id.is_empty() {
        return Err(ValidationError::BadRequest(
            "missing senderId in request body".to_string(),
        ));
    }
    if msg.user_id == 0 {
        return Err(ValidationError::BadRequest(
            "missing or invalid userId in request body".to_string(),
        ));
    }

    let canonical = identity
        .resolve_sender_id(&msg.user_id.to_string(), credential.as_str())
        .await?;

    if canonical != msg.sender_id {
        tracing::debug!(user_id = msg.user_id, "Body senderId does not match user");
        return Err(ValidationError::Forbidden("invalid senderId".to_string()));
    }
    Ok(())
}
