//! Token sources: anything that can produce a current token on demand.

use std::sync::Arc;

use async_trait::async_trait;
use tokenkeep_oauth::Token;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::flow::OAuthFlow;

/// Produces a current, possibly refreshed, token.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Returns a token usable for the next request.
    async fn token(&self) -> Result<Token>;
}

/// Reuses a token until it expires, then asks its refresher for a new one.
///
/// Callers racing on an expired token wait for the one in-flight refresh
/// instead of starting their own.
pub struct ReuseTokenSource {
    current: Mutex<Token>,
    refresher: Arc<dyn TokenSource>,
}

impl ReuseTokenSource {
    /// Wraps `refresher`, starting from `token`.
    #[must_use]
    pub fn new(token: Token, refresher: Arc<dyn TokenSource>) -> Self {
        Self {
            current: Mutex::new(token),
            refresher,
        }
    }
}

#[async_trait]
impl TokenSource for ReuseTokenSource {
    async fn token(&self) -> Result<Token> {
        let mut current = self.current.lock().await;
        if current.is_valid() {
            return Ok(current.clone());
        }

        debug!("Held token expired, asking refresher");
        let fresh = self.refresher.token().await?;
        current.clone_from(&fresh);
        Ok(fresh)
    }
}

impl std::fmt::Debug for ReuseTokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReuseTokenSource").finish_non_exhaustive()
    }
}

/// Runs the refresh grant whenever its token has expired.
pub struct RefreshingTokenSource {
    flow: Arc<dyn OAuthFlow>,
    current: Mutex<Token>,
}

impl RefreshingTokenSource {
    /// Creates a source that refreshes `token` through `flow`.
    #[must_use]
    pub fn new(flow: Arc<dyn OAuthFlow>, token: Token) -> Self {
        Self {
            flow,
            current: Mutex::new(token),
        }
    }
}

#[async_trait]
impl TokenSource for RefreshingTokenSource {
    async fn token(&self) -> Result<Token> {
        let mut current = self.current.lock().await;
        if current.is_valid() {
            return Ok(current.clone());
        }

        let fresh = self.flow.refresh(&current).await.map_err(|e| {
            warn!("Token refresh failed: {e}");
            Error::Refresh(e)
        })?;
        debug!(expires_at = ?fresh.expires_at, "Refreshed access token");
        current.clone_from(&fresh);
        Ok(fresh)
    }
}

impl std::fmt::Debug for RefreshingTokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshingTokenSource").finish_non_exhaustive()
    }
}
