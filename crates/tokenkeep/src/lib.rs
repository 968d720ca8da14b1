//! # tokenkeep
//!
//! Glue for the `OAuth2` authorization code flow in CLI and server
//! applications: authorize once, persist the token through a pluggable
//! [`TokenStore`], and hand out HTTP clients that refresh and re-persist
//! the token as it expires.
//!
//! ## Components
//!
//! - [`Authorization`] - facade: authorization URL, code exchange,
//!   interactive authorization and client construction
//! - [`TokenManager`] - single authority over the stored token; serializes
//!   the refresh path
//! - [`ReuseTokenSource`] - reuses a token until it expires, then asks its
//!   refresher for a new one
//! - [`AuthorizedClient`] - attaches the current token to every request
//!
//! The `OAuth2` protocol itself sits behind [`OAuthFlow`];
//! [`AuthorizationCodeFlow`] from [`oauth`] is the default implementation.
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use tokenkeep::{Authorization, AuthorizationCodeFlow, OAuthClient, Provider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = OAuthClient::new("your_client_id", Provider::google()?)
//!         .with_client_secret("your_secret")
//!         .with_redirect_uri("urn:ietf:wg:oauth:2.0:oob")
//!         .with_scopes(["https://www.googleapis.com/auth/calendar.readonly"]);
//!
//!     // `MyStore` implements `TokenStore` (file, database, keyring, ...)
//!     let auth = Authorization::new(
//!         Arc::new(AuthorizationCodeFlow::new(client)),
//!         Arc::new(MyStore::open()?),
//!     );
//!
//!     if !MyStore::has_token() {
//!         auth.authorize_cli("random-state").await?;
//!     }
//!
//!     let http = auth.client().await?;
//!     let response = http.get("https://www.googleapis.com/calendar/v3/users/me/calendarList").await?
//!         .send()
//!         .await?;
//!     println!("{}", response.status());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod authorization;
mod client;
mod error;
pub mod flow;
mod manager;
pub mod source;
pub mod store;

#[cfg(test)]
mod testing;

pub use authorization::Authorization;
pub use client::AuthorizedClient;
pub use error::{Error, ErrorKind, Result};
pub use flow::OAuthFlow;
pub use manager::{RefreshMode, TokenManager};
pub use source::{RefreshingTokenSource, ReuseTokenSource, TokenSource};
pub use store::{StoreError, TokenStore};

pub use tokenkeep_oauth as oauth;
pub use tokenkeep_oauth::{AccessType, AuthorizationCodeFlow, OAuthClient, Provider, Token};
