//! Authorization code flow facade.

use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::Duration;

use tokenkeep_oauth::{AccessType, Token};
use tracing::{debug, info};

use crate::client::AuthorizedClient;
use crate::error::{Error, Result};
use crate::flow::OAuthFlow;
use crate::manager::{RefreshMode, TokenManager};
use crate::source::{RefreshingTokenSource, ReuseTokenSource, TokenSource};
use crate::store::TokenStore;

/// Drives the authorization code flow and builds authenticated clients.
///
/// Authorize once with [`authorize_from_code`](Self::authorize_from_code)
/// (or [`authorize_cli`](Self::authorize_cli)); the token lands in the
/// store. Every later process can go straight to [`client`](Self::client).
pub struct Authorization {
    flow: Arc<dyn OAuthFlow>,
    manager: Arc<TokenManager>,
}

impl Authorization {
    /// Creates the facade over `flow`, persisting tokens in `store`.
    #[must_use]
    pub fn new(flow: Arc<dyn OAuthFlow>, store: Arc<dyn TokenStore>) -> Self {
        Self {
            flow,
            manager: Arc::new(TokenManager::new(store)),
        }
    }

    /// Sets how the token manager treats an expired stored token.
    ///
    /// Must be called before any client is handed out.
    #[must_use]
    pub fn with_refresh_mode(mut self, mode: RefreshMode) -> Self {
        self.manager = Arc::new(TokenManager::new(self.manager.store()).with_refresh_mode(mode));
        self
    }

    /// Returns the token manager.
    #[must_use]
    pub const fn manager(&self) -> &Arc<TokenManager> {
        &self.manager
    }

    /// Builds the URL the user visits to grant offline access.
    #[must_use]
    pub fn auth_code_url(&self, state: &str) -> String {
        self.flow
            .authorization_url(state, AccessType::Offline)
            .to_string()
    }

    /// Exchanges `code` for a token and persists it.
    ///
    /// Dropping the returned future cancels the exchange.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Exchange`] if the provider rejects the code (nothing
    /// is saved) or [`Error::Persist`] if the store write fails.
    pub async fn authorize_from_code(&self, code: &str) -> Result<()> {
        let token = self.flow.exchange_code(code).await.map_err(Error::Exchange)?;
        self.persist(&token).await
    }

    /// Like [`authorize_from_code`](Self::authorize_from_code), but gives up
    /// on the exchange after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] if the deadline passes first, otherwise
    /// the errors of [`authorize_from_code`](Self::authorize_from_code).
    pub async fn authorize_from_code_within(&self, code: &str, timeout: Duration) -> Result<()> {
        let token = tokio::time::timeout(timeout, self.flow.exchange_code(code))
            .await
            .map_err(|_| Error::Timeout(timeout))?
            .map_err(Error::Exchange)?;
        self.persist(&token).await
    }

    /// Prints the authorization URL, reads the code from stdin and
    /// authorizes with it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Input`] if the terminal cannot be written or read,
    /// otherwise the errors of [`authorize_from_code`](Self::authorize_from_code).
    pub async fn authorize_cli(&self, state: &str) -> Result<()> {
        self.prompt(state, io::stdout().lock())?;
        let code = tokio::task::spawn_blocking(|| read_code(io::stdin().lock()))
            .await
            .map_err(|e| Error::Input(io::Error::other(e)))??;
        self.authorize_from_code(&code).await
    }

    /// [`authorize_cli`](Self::authorize_cli) over arbitrary streams.
    ///
    /// # Errors
    ///
    /// Same as [`authorize_cli`](Self::authorize_cli).
    pub async fn authorize_interactive<R, W>(&self, state: &str, input: R, output: W) -> Result<()>
    where
        R: BufRead,
        W: Write,
    {
        self.prompt(state, output)?;
        let code = read_code(input)?;
        self.authorize_from_code(&code).await
    }

    /// Returns an HTTP client bound to the stored token.
    ///
    /// The client reuses the token until it expires, then goes through the
    /// token manager, which persists whatever it hands back.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Retrieve`] if no token can be read from the store.
    pub async fn client(&self) -> Result<AuthorizedClient> {
        self.client_with(reqwest::Client::new()).await
    }

    /// Like [`client`](Self::client), sending requests through `http`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Retrieve`] if no token can be read from the store.
    pub async fn client_with(&self, http: reqwest::Client) -> Result<AuthorizedClient> {
        let token = self.manager.get().await?;

        let refreshing = RefreshingTokenSource::new(Arc::clone(&self.flow), token.clone());
        self.manager.install_source(Arc::new(refreshing));

        let manager: Arc<dyn TokenSource> = self.manager.clone();
        let source = ReuseTokenSource::new(token, manager);
        debug!("Built authorized HTTP client");
        Ok(AuthorizedClient::new(http, Arc::new(source)))
    }

    async fn persist(&self, token: &Token) -> Result<()> {
        self.manager.save(token).await?;
        info!("Authorization complete, token saved");
        Ok(())
    }

    fn prompt<W: Write>(&self, state: &str, mut output: W) -> Result<()> {
        let url = self.auth_code_url(state);
        writeln!(output, "Visit the URL: {url}").map_err(Error::Input)?;
        write!(output, "Enter authorization code > ").map_err(Error::Input)?;
        output.flush().map_err(Error::Input)
    }
}

impl std::fmt::Debug for Authorization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authorization")
            .field("manager", &self.manager)
            .finish_non_exhaustive()
    }
}

/// Reads the first whitespace-delimited word from `input`.
fn read_code<R: BufRead>(mut input: R) -> Result<String> {
    let mut line = String::new();
    loop {
        line.clear();
        let read = input.read_line(&mut line).map_err(Error::Input)?;
        if read == 0 {
            return Err(Error::Input(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "no authorization code entered",
            )));
        }
        if let Some(code) = line.split_whitespace().next() {
            return Ok(code.to_string());
        }
    }
}
