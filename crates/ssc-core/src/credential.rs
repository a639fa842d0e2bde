//! Session credentials and server configuration

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Permission level attached to a session credential
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    Anonymous,
    User,
    Privileged,
}

impl std::fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccessLevel::Anonymous => write!(f, "anonymous"),
            AccessLevel::User => write!(f, "user"),
            AccessLevel::Privileged => write!(f, "privileged"),
        }
    }
}

/// Session credential returned by the auth endpoint
///
/// Replaced wholesale whenever refetched, never patched field-by-field:
/// the token and the permission level must always come from the same
/// auth response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub user_id: String,
    pub level: AccessLevel,
    /// Time after which the credential must be refetched (epoch seconds)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_at: Option<u64>,
    /// Opaque bearer token; absent for anonymous sessions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Credential {
    /// Whether the credential must be refetched before the next connection
    /// attempt. Credentials without `refresh_at` never go stale.
    pub fn is_stale(&self, now_epoch_secs: u64) -> bool {
        match self.refresh_at {
            Some(at) => at <= now_epoch_secs,
            None => false,
        }
    }
}

/// Current wall-clock time as epoch seconds
pub fn epoch_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Server endpoints for one synchronization service
///
/// Supplied once at construction by the host configuration provider;
/// never read from ambient/global state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// WebSocket endpoint of the synchronization server
    pub server_url: String,
    /// Base URL of the auth endpoint; the content id is appended as-is
    pub auth_endpoint: String,
}

impl ServerConfig {
    pub fn new(server_url: impl Into<String>, auth_endpoint: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            auth_endpoint: auth_endpoint.into(),
        }
    }
}
