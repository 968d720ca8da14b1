//! Pluggable token persistence.
//!
//! The crate ships no backend. Implement [`TokenStore`] over whatever holds
//! your tokens (a file, a database row, the system keyring, a remote secret
//! service) and hand it to [`Authorization::new`](crate::Authorization::new).

use async_trait::async_trait;
use tokenkeep_oauth::Token;

/// Error produced by a [`TokenStore`] implementation.
pub type StoreError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Anything that can load and persist a single token.
///
/// The only contract is that the last successful [`save`](Self::save) wins
/// for subsequent [`get`](Self::get) calls. Implementations need not be
/// atomic; [`TokenManager`](crate::TokenManager) serializes its refresh path
/// itself.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Returns the persisted token.
    ///
    /// Return an error when no token has been stored yet.
    async fn get(&self) -> Result<Token, StoreError>;

    /// Persists the token, replacing any previous one.
    async fn save(&self, token: &Token) -> Result<(), StoreError>;
}
