//! HTTP client that authenticates every request with the current token.

use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::{IntoUrl, Method, Request, RequestBuilder, Response};
use tokenkeep_oauth::Token;

use crate::error::Result;
use crate::source::TokenSource;

/// HTTP client bound to a [`TokenSource`].
///
/// Each request asks the source for a token first, so an expired token is
/// refreshed (and persisted, when the source is backed by a
/// [`TokenManager`](crate::TokenManager)) before the request goes out.
#[derive(Clone)]
pub struct AuthorizedClient {
    http: reqwest::Client,
    source: Arc<dyn TokenSource>,
}

impl AuthorizedClient {
    /// Creates a client that sends requests through `http`.
    #[must_use]
    pub fn new(http: reqwest::Client, source: Arc<dyn TokenSource>) -> Self {
        Self { http, source }
    }

    /// Returns the token the next request would carry.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot produce a token.
    pub async fn token(&self) -> Result<Token> {
        self.source.token().await
    }

    /// Starts a request with the `Authorization` header already set.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot produce a token or the token is
    /// not a valid header value.
    pub async fn request<U: IntoUrl>(&self, method: Method, url: U) -> Result<RequestBuilder> {
        let value = self.authorization().await?;
        Ok(self.http.request(method, url).header(AUTHORIZATION, value))
    }

    /// Starts a `GET` request.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn get<U: IntoUrl>(&self, url: U) -> Result<RequestBuilder> {
        self.request(Method::GET, url).await
    }

    /// Starts a `POST` request.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn post<U: IntoUrl>(&self, url: U) -> Result<RequestBuilder> {
        self.request(Method::POST, url).await
    }

    /// Executes a prepared request, replacing any `Authorization` header.
    ///
    /// # Errors
    ///
    /// Returns an error if no token is available or the request fails.
    pub async fn execute(&self, mut request: Request) -> Result<Response> {
        let value = self.authorization().await?;
        request.headers_mut().insert(AUTHORIZATION, value);
        Ok(self.http.execute(request).await?)
    }

    /// Returns the underlying HTTP client.
    #[must_use]
    pub const fn http(&self) -> &reqwest::Client {
        &self.http
    }

    async fn authorization(&self) -> Result<HeaderValue> {
        let token = self.source.token().await?;
        let mut value = HeaderValue::from_str(&token.authorization_value())?;
        value.set_sensitive(true);
        Ok(value)
    }
}

impl std::fmt::Debug for AuthorizedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizedClient")
            .field("http", &self.http)
            .finish_non_exhaustive()
    }
}
