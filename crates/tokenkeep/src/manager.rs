//! Single authority over the stored token.

use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use tokenkeep_oauth::Token;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::source::TokenSource;
use crate::store::TokenStore;

/// What [`TokenManager::token`] does when the stored token is no longer valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshMode {
    /// Persist the stored token unchanged and return it.
    ///
    /// No refresh grant is issued from the manager.
    #[default]
    PersistStale,
    /// Ask the installed refreshing source for a new token, persist it and
    /// return it. Behaves like [`PersistStale`](Self::PersistStale) until a
    /// source is installed.
    Exchange,
}

/// Reads and writes the durable token and serializes the refresh path.
///
/// [`token`](TokenSource::token) holds an exclusive lock for its whole
/// read-check-persist sequence. [`get`](Self::get) and [`save`](Self::save)
/// are plain passthroughs and do not take that lock.
pub struct TokenManager {
    store: Arc<dyn TokenStore>,
    lock: Mutex<()>,
    source: RwLock<Option<Arc<dyn TokenSource>>>,
    mode: RefreshMode,
}

impl TokenManager {
    /// Creates a manager over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self {
            store,
            lock: Mutex::new(()),
            source: RwLock::new(None),
            mode: RefreshMode::default(),
        }
    }

    /// Sets how expired tokens are handled.
    #[must_use]
    pub const fn with_refresh_mode(mut self, mode: RefreshMode) -> Self {
        self.mode = mode;
        self
    }

    /// Returns the configured refresh mode.
    #[must_use]
    pub const fn refresh_mode(&self) -> RefreshMode {
        self.mode
    }

    pub(crate) fn store(&self) -> Arc<dyn TokenStore> {
        Arc::clone(&self.store)
    }

    /// Reads the stored token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Retrieve`] if the store read fails.
    pub async fn get(&self) -> Result<Token> {
        debug!("Reading token from store");
        self.store.get().await.map_err(Error::Retrieve)
    }

    /// Writes `token` to the store.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Persist`] if the store write fails.
    pub async fn save(&self, token: &Token) -> Result<()> {
        debug!(expires_at = ?token.expires_at, "Saving token to store");
        self.store.save(token).await.map_err(Error::Persist)
    }

    /// Installs the source used to refresh expired tokens.
    ///
    /// Replaces any previously installed source.
    pub fn install_source(&self, source: Arc<dyn TokenSource>) {
        let mut slot = self.source.write().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(source);
    }

    fn installed_source(&self) -> Option<Arc<dyn TokenSource>> {
        self.source
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl TokenSource for TokenManager {
    /// Returns the stored token, persisting it again when it is no longer
    /// valid.
    ///
    /// Concurrent callers are serialized: a second caller waits for the first
    /// to finish and then re-reads the store.
    async fn token(&self) -> Result<Token> {
        let _guard = self.lock.lock().await;

        let token = self.store.get().await.map_err(Error::Retrieve)?;
        if token.is_valid() {
            debug!("Stored token is still valid");
            return Ok(token);
        }

        let token = match (self.mode, self.installed_source()) {
            (RefreshMode::Exchange, Some(source)) => source.token().await?,
            _ => {
                warn!(expires_at = ?token.expires_at, "Stored token is expired, persisting it unchanged");
                token
            }
        };

        self.store.save(&token).await.map_err(Error::Persist)?;
        Ok(token)
    }
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("mode", &self.mode)
            .field("source_installed", &self.installed_source().is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::source::RefreshingTokenSource;
    use crate::testing::{MemoryStore, ScriptedFlow, expired_token, valid_token};
    use std::time::Duration;

    #[tokio::test]
    async fn test_valid_token_is_returned_without_save() {
        let store = Arc::new(MemoryStore::with_token(valid_token("good")));
        let manager = TokenManager::new(store.clone());

        let token = manager.token().await.unwrap();
        assert_eq!(token.access_token, "good");
        assert!(store.saved().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_token_is_saved_once_unchanged() {
        let stale = expired_token("stale");
        let store = Arc::new(MemoryStore::with_token(stale.clone()));
        let manager = TokenManager::new(store.clone());

        let token = manager.token().await.unwrap();
        assert_eq!(token, stale);
        assert_eq!(store.saved(), vec![stale]);
    }

    #[tokio::test]
    async fn test_invalid_token_save_error_propagates() {
        let store = Arc::new(MemoryStore::with_token(expired_token("stale")));
        store.fail_save();
        let manager = TokenManager::new(store.clone());

        let err = manager.token().await.unwrap_err();
        assert!(matches!(err, Error::Persist(_)));
    }

    #[tokio::test]
    async fn test_store_read_error_propagates() {
        let store = Arc::new(MemoryStore::with_token(valid_token("good")));
        store.fail_get();
        let manager = TokenManager::new(store.clone());

        assert!(matches!(manager.token().await, Err(Error::Retrieve(_))));
        assert!(matches!(manager.get().await, Err(Error::Retrieve(_))));
        assert!(store.saved().is_empty());
    }

    #[tokio::test]
    async fn test_passthroughs() {
        let store = Arc::new(MemoryStore::default());
        let manager = TokenManager::new(store.clone());

        assert!(matches!(manager.get().await, Err(Error::Retrieve(_))));
        manager.save(&valid_token("first")).await.unwrap();
        assert_eq!(manager.get().await.unwrap().access_token, "first");

        store.fail_save();
        assert!(matches!(
            manager.save(&valid_token("second")).await,
            Err(Error::Persist(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_calls_are_serialized() {
        const CALLERS: usize = 8;
        let store =
            Arc::new(MemoryStore::with_token(valid_token("good")).with_delay(Duration::from_millis(20)));
        let manager = Arc::new(TokenManager::new(store.clone()));

        let handles: Vec<_> = (0..CALLERS)
            .map(|_| {
                let manager = Arc::clone(&manager);
                tokio::spawn(async move { manager.token().await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.gets(), CALLERS);
        assert_eq!(store.max_in_flight(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_stale_persists_are_serialized() {
        let store = Arc::new(
            MemoryStore::with_token(expired_token("stale")).with_delay(Duration::from_millis(10)),
        );
        let manager = Arc::new(TokenManager::new(store.clone()));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let manager = Arc::clone(&manager);
                tokio::spawn(async move { manager.token().await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.gets(), 4);
        assert_eq!(store.saved().len(), 4);
        assert_eq!(store.max_in_flight(), 1);
    }

    #[tokio::test]
    async fn test_exchange_mode_without_source_persists_stale() {
        let stale = expired_token("stale");
        let store = Arc::new(MemoryStore::with_token(stale.clone()));
        let manager = TokenManager::new(store.clone()).with_refresh_mode(RefreshMode::Exchange);

        assert_eq!(manager.token().await.unwrap(), stale);
        assert_eq!(store.saved(), vec![stale]);
    }

    #[tokio::test]
    async fn test_exchange_mode_refreshes_and_persists() {
        let stale = expired_token("stale");
        let store = Arc::new(MemoryStore::with_token(stale.clone()));
        let flow = Arc::new(ScriptedFlow::default());
        let manager = TokenManager::new(store.clone()).with_refresh_mode(RefreshMode::Exchange);
        manager.install_source(Arc::new(RefreshingTokenSource::new(flow.clone(), stale)));

        let token = manager.token().await.unwrap();
        assert_eq!(token.access_token, "refreshed-1");
        assert_eq!(store.saved(), vec![token.clone()]);

        // The persisted token now wins; no second refresh.
        assert_eq!(manager.token().await.unwrap(), token);
        assert_eq!(flow.refreshes(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_exchange_refreshes_once() {
        const CALLERS: usize = 6;
        let stale = expired_token("stale");
        let store = Arc::new(
            MemoryStore::with_token(stale.clone()).with_delay(Duration::from_millis(10)),
        );
        let flow = Arc::new(ScriptedFlow::default());
        let manager =
            Arc::new(TokenManager::new(store.clone()).with_refresh_mode(RefreshMode::Exchange));
        manager.install_source(Arc::new(RefreshingTokenSource::new(flow.clone(), stale)));

        let handles: Vec<_> = (0..CALLERS)
            .map(|_| {
                let manager = Arc::clone(&manager);
                tokio::spawn(async move { manager.token().await })
            })
            .collect();
        for handle in handles {
            let token = handle.await.unwrap().unwrap();
            assert_eq!(token.access_token, "refreshed-1");
        }

        // Callers that waited on the lock re-read the refreshed token.
        assert_eq!(flow.refreshes(), 1);
        assert_eq!(store.saved().len(), 1);
        assert_eq!(store.gets(), CALLERS);
        assert_eq!(store.max_in_flight(), 1);
    }

    #[tokio::test]
    async fn test_exchange_mode_refresh_failure_writes_nothing() {
        let stale = expired_token("stale");
        let store = Arc::new(MemoryStore::with_token(stale.clone()));
        let flow = Arc::new(ScriptedFlow::default());
        flow.fail_refresh();
        let manager = TokenManager::new(store.clone()).with_refresh_mode(RefreshMode::Exchange);
        manager.install_source(Arc::new(RefreshingTokenSource::new(flow, stale)));

        assert!(matches!(manager.token().await, Err(Error::Refresh(_))));
        assert!(store.saved().is_empty());
    }

    #[tokio::test]
    async fn test_persist_stale_ignores_installed_source() {
        let stale = expired_token("stale");
        let store = Arc::new(MemoryStore::with_token(stale.clone()));
        let flow = Arc::new(ScriptedFlow::default());
        let manager = TokenManager::new(store.clone());
        manager.install_source(Arc::new(RefreshingTokenSource::new(flow.clone(), stale.clone())));

        assert_eq!(manager.token().await.unwrap(), stale);
        assert_eq!(flow.refreshes(), 0);
    }
}
