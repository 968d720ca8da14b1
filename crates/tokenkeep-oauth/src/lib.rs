//! # tokenkeep-oauth
//!
//! Minimal `OAuth2` protocol support for the authorization code grant.
//! `tokenkeep` uses [`AuthorizationCodeFlow`] as its default `OAuthFlow`.
//!
//! ## Features
//!
//! - **Authorization URL**: client id, redirect URI, scopes, `state` and
//!   offline access
//! - **Code exchange**: `authorization_code` grant against the token endpoint
//! - **Refresh**: `refresh_token` grant, keeping the previous refresh token
//!   when the provider does not rotate it
//! - **Provider presets**: Google and Microsoft endpoints
//!
//! ## Quick Start
//!
//! ```ignore
//! use tokenkeep_oauth::{AccessType, AuthorizationCodeFlow, OAuthClient, Provider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = Provider::google()?;
//!     let client = OAuthClient::new("your_client_id", provider)
//!         .with_client_secret("your_secret")
//!         .with_redirect_uri("http://localhost:8080");
//!
//!     let flow = AuthorizationCodeFlow::new(client);
//!     let url = flow.authorization_url("random_state", AccessType::Offline);
//!     println!("Visit: {url}");
//!
//!     let token = flow.exchange_code("code_from_redirect").await?;
//!     if !token.is_valid() {
//!         let token = flow.refresh(&token).await?;
//!         println!("Refreshed, expires at {:?}", token.expires_at);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod error;
pub mod flow;
pub mod provider;
pub mod token;

pub use error::{Error, Result};
pub use flow::{AccessType, AuthorizationCodeFlow, OAuthClient};
pub use provider::Provider;
pub use token::Token;
