use chrono::Utc;
use std::future::Future;
use tokio::sync::Mutex;
use voyra_core::provider::ProviderToken;
use voyra_core::EngineResult;

/// Shared provider credential cache.
///
/// Concurrent callers read the cached token; when it goes stale, exactly one
/// caller performs the refresh while the rest wait on the lock and pick up
/// the fresh token afterwards. A refresh in progress never triggers a second
/// refresh because the check and the renewal happen under the same guard.
pub struct TokenCache {
    inner: Mutex<Option<ProviderToken>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(None),
        }
    }

    /// Return a bearer token, renewing through `renew` if the cached one is
    /// missing or stale.
    pub async fn bearer<F, Fut>(&self, renew: F) -> EngineResult<String>
    where
        F: FnOnce(Option<ProviderToken>) -> Fut,
        Fut: Future<Output = EngineResult<ProviderToken>>,
    {
        let mut guard = self.inner.lock().await;
        if let Some(token) = guard.as_ref() {
            if token.is_fresh_at(Utc::now()) {
                return Ok(token.token.clone());
            }
        }
        let renewed = renew(guard.take()).await?;
        let bearer = renewed.token.clone();
        *guard = Some(renewed);
        Ok(bearer)
    }

    /// Drop the cached token, forcing re-authentication on the next call.
    /// Used when the provider answers 401 despite a seemingly fresh token.
    pub async fn invalidate(&self) {
        self.inner.lock().await.take();
    }
}

impl Default for TokenCache {
    fn default() -> Self {
        Self::new()
    }
}
