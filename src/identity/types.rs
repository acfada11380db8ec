//! Wire types of the account service.

use serde::Deserialize;
use std::fmt;

/// A user and the sender identity bound to it for the configured role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentity {
    pub user_id: String,
    pub sender_id: String,
}

/// Generic `{"data": ...}` envelope.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

/// `data` of the login-info lookup.
#[derive(Debug, Deserialize)]
pub struct LoginInfo {
    pub id: UserId,
}

/// Account ids arrive either as JSON numbers or as strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum UserId {
    Number(i64),
    Text(String),
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserId::Number(n) => write!(f, "{}", n),
            UserId::Text(s) => f.write_str(s),
        }
    }
}

/// `data` of the sender-session lookup.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SenderSession {
    pub sender_id: String,
}

/// Response of the token authorization endpoint.
#[derive(Debug, Deserialize)]
pub struct AuthorizeResponse {
    #[serde(default)]
    pub msg: String,
    pub code: i64,
    #[serde(default)]
    pub data: Option<AccountData>,
}

/// Subset of the account record the proxy cares about.
#[derive(Debug, Default, Deserialize)]
pub struct AccountData {
    #[serde(default)]
    pub mobile: Option<String>,
}
