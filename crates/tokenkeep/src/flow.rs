//! The `OAuth2` client capability the facade orchestrates.

use async_trait::async_trait;
use tokenkeep_oauth::{AccessType, AuthorizationCodeFlow, Token};
use url::Url;

/// Protocol operations needed by [`Authorization`](crate::Authorization).
///
/// [`AuthorizationCodeFlow`] is the stock implementation. Substitute your
/// own to talk to a provider with non-standard endpoints, or to script
/// responses in tests.
#[async_trait]
pub trait OAuthFlow: Send + Sync {
    /// Builds the URL the user visits to grant access.
    fn authorization_url(&self, state: &str, access: AccessType) -> Url;

    /// Exchanges an authorization code for a token.
    async fn exchange_code(&self, code: &str) -> tokenkeep_oauth::Result<Token>;

    /// Obtains a new token using the refresh token of `token`.
    async fn refresh(&self, token: &Token) -> tokenkeep_oauth::Result<Token>;
}

#[async_trait]
impl OAuthFlow for AuthorizationCodeFlow {
    fn authorization_url(&self, state: &str, access: AccessType) -> Url {
        Self::authorization_url(self, state, access)
    }

    async fn exchange_code(&self, code: &str) -> tokenkeep_oauth::Result<Token> {
        Self::exchange_code(self, code).await
    }

    async fn refresh(&self, token: &Token) -> tokenkeep_oauth::Result<Token> {
        Self::refresh(self, token).await
    }
}
