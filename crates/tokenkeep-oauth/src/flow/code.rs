//! Authorization Code Flow implementation.

use super::OAuthClient;
use crate::error::Result;
use crate::token::Token;
use url::Url;

/// Access type requested in the authorization URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessType {
    /// Access only while the user is present. No refresh token is issued.
    #[default]
    Online,
    /// Ask the provider to issue a refresh token.
    Offline,
}

/// Authorization Code Flow for `OAuth2`.
///
/// This flow is suitable for applications that can open a browser
/// and receive the authorization code via redirect, or have the user
/// paste it back.
#[derive(Debug, Clone)]
pub struct AuthorizationCodeFlow {
    client: OAuthClient,
}

impl AuthorizationCodeFlow {
    /// Creates a new authorization code flow.
    #[must_use]
    pub const fn new(client: OAuthClient) -> Self {
        Self { client }
    }

    /// Returns the client configuration.
    #[must_use]
    pub const fn client(&self) -> &OAuthClient {
        &self.client
    }

    /// Builds the authorization URL for user consent.
    ///
    /// The user should be redirected to this URL to authorize the application.
    ///
    /// # Arguments
    ///
    /// * `state` - Opaque value echoed back by the provider for CSRF protection
    /// * `access` - Whether to request a refresh token
    #[must_use]
    pub fn authorization_url(&self, state: &str, access: AccessType) -> Url {
        let mut url = self.client.provider.auth_url.clone();

        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("client_id", &self.client.client_id)
                .append_pair("response_type", "code");

            if let Some(redirect_uri) = &self.client.redirect_uri {
                pairs.append_pair("redirect_uri", redirect_uri);
            }

            let scope_str = self.client.scope_param();
            if !scope_str.is_empty() {
                pairs.append_pair("scope", &scope_str);
            }

            pairs.append_pair("state", state);

            if access == AccessType::Offline {
                pairs.append_pair("access_type", "offline");
            }
        }

        url
    }

    /// Exchanges the authorization code for an access token.
    ///
    /// # Errors
    ///
    /// Returns an error if the token exchange fails.
    pub async fn exchange_code(&self, code: &str) -> Result<Token> {
        self.client.exchange_code(code).await
    }

    /// Obtains a new access token using the refresh token of `token`.
    ///
    /// # Errors
    ///
    /// Returns an error if `token` has no refresh token or the grant fails.
    pub async fn refresh(&self, token: &Token) -> Result<Token> {
        self.client.refresh_token(token).await
    }
}
