//! Connection-target resolution

use crate::auth::CredentialProvider;
use async_trait::async_trait;
use ssc_core::{Result, ServerConfig};
use std::sync::Arc;

/// Invoked by the socket on every connection and reconnection attempt to
/// decide where to connect. A failure aborts that attempt only; the socket's
/// backoff policy governs the next one.
#[async_trait]
pub trait TargetResolver: Send + Sync {
    async fn resolve(&self) -> Result<String>;
}

/// Production resolver: ensures the credential is valid before every attempt
/// and appends the token as a query parameter when the session carries one.
pub struct CredentialResolver {
    provider: Arc<CredentialProvider>,
    server_url: String,
}

impl CredentialResolver {
    pub fn new(provider: Arc<CredentialProvider>, config: &ServerConfig) -> Self {
        Self {
            provider,
            server_url: config.server_url.clone(),
        }
    }
}

#[async_trait]
impl TargetResolver for CredentialResolver {
    async fn resolve(&self) -> Result<String> {
        let credential = self.provider.fresh().await?;
        Ok(match credential.token {
            Some(token) => format!("{}?token={}", self.server_url, token),
            None => self.server_url.clone(),
        })
    }
}
