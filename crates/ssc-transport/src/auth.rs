//! Credential fetch and caching

use async_trait::async_trait;
use ssc_core::credential::epoch_now;
use ssc_core::{ContentId, Credential, Error, Result, ServerConfig};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Where credentials come from. Production uses the auth HTTP endpoint;
/// tests inject stubs.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    async fn fetch(&self) -> Result<Credential>;
}

/// Fetches credentials from `GET {auth_endpoint}{content_id}` with the
/// session cookies included (the native equivalent of a cross-origin,
/// credentials-included browser fetch).
pub struct HttpCredentialSource {
    http: reqwest::Client,
    url: String,
}

impl HttpCredentialSource {
    pub fn new(config: &ServerConfig, content_id: &ContentId) -> Result<Self> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|e| Error::CredentialFetch(e.to_string()))?;
        Ok(Self {
            http,
            url: format!("{}{}", config.auth_endpoint, content_id),
        })
    }
}

#[async_trait]
impl CredentialSource for HttpCredentialSource {
    async fn fetch(&self) -> Result<Credential> {
        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::CredentialFetch(e.to_string()))?;

        let body = response
            .text()
            .await
            .map_err(|e| Error::CredentialFetch(e.to_string()))?;

        if body.trim().is_empty() || body.trim() == "null" {
            return Err(Error::InvalidCredential("empty auth response".into()));
        }

        serde_json::from_str(&body).map_err(|e| Error::InvalidCredential(e.to_string()))
    }
}

/// Caches the session credential, refetching it only when absent or past its
/// `refresh_at` deadline. The cached value is replaced wholesale on every
/// fetch.
pub struct CredentialProvider {
    source: Box<dyn CredentialSource>,
    cached: RwLock<Option<Credential>>,
}

impl CredentialProvider {
    pub fn new(source: Box<dyn CredentialSource>) -> Self {
        Self {
            source,
            cached: RwLock::new(None),
        }
    }

    /// Provider backed by the auth HTTP endpoint
    pub fn over_http(config: &ServerConfig, content_id: &ContentId) -> Result<Self> {
        Ok(Self::new(Box::new(HttpCredentialSource::new(config, content_id)?)))
    }

    /// Return a valid credential, fetching one if none is cached or the
    /// cached one is stale.
    pub async fn fresh(&self) -> Result<Credential> {
        let (credential, _) = self.fresh_at(epoch_now()).await?;
        Ok(credential)
    }

    // The boolean reports whether a fetch happened; the cache tests key on it.
    pub(crate) async fn fresh_at(&self, now: u64) -> Result<(Credential, bool)> {
        {
            let cached = self.cached.read().await;
            if let Some(cred) = cached.as_ref() {
                if !cred.is_stale(now) {
                    return Ok((cred.clone(), false));
                }
                debug!(user = %cred.user_id, "Cached credential is stale, refetching");
            }
        }

        let fetched = self.source.fetch().await?;
        info!(user = %fetched.user_id, level = %fetched.level, "Fetched credential");
        *self.cached.write().await = Some(fetched.clone());
        Ok((fetched, true))
    }

    /// Snapshot of the cached credential, if any
    pub async fn cached(&self) -> Option<Credential> {
        self.cached.read().await.clone()
    }
}
