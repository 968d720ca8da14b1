#![allow(clippy::doc_markdown, clippy::uninlined_format_args)]
//! Example: authorize a CLI once, then reuse the token across runs
//!
//! The first run prints an authorization URL and waits for the code the
//! provider shows after consent. The token is written to a JSON file; later
//! runs skip straight to making an authenticated request, refreshing the
//! token when it has expired.
//!
//! ## Running
//!
//! ```bash
//! export OAUTH_CLIENT_ID="your-client-id"
//! export OAUTH_CLIENT_SECRET="your-client-secret"
//! export OAUTH_AUTH_URL="https://accounts.google.com/o/oauth2/v2/auth"
//! export OAUTH_TOKEN_URL="https://oauth2.googleapis.com/token"
//! export OAUTH_REDIRECT_URI="urn:ietf:wg:oauth:2.0:oob"
//! export OAUTH_SCOPES="https://www.googleapis.com/auth/userinfo.email"
//! export RESOURCE_URL="https://www.googleapis.com/oauth2/v3/userinfo"
//! cargo run --package tokenkeep --example cli_authorize
//! ```

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use tokenkeep::{
    Authorization, AuthorizationCodeFlow, OAuthClient, Provider, RefreshMode, StoreError, Token,
    TokenStore,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Keeps the token in a JSON file next to the working directory.
struct JsonFileStore {
    path: PathBuf,
}

#[async_trait]
impl TokenStore for JsonFileStore {
    async fn get(&self) -> Result<Token, StoreError> {
        let data = tokio::fs::read(&self.path).await?;
        Ok(serde_json::from_slice(&data)?)
    }

    async fn save(&self, token: &Token) -> Result<(), StoreError> {
        let data = serde_json::to_vec_pretty(token)?;
        tokio::fs::write(&self.path, data).await?;
        Ok(())
    }
}

fn required(name: &str) -> anyhow::Result<String> {
    env::var(name).with_context(|| format!("{name} environment variable not set"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tokenkeep=debug,tokenkeep_oauth=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let provider = Provider::new("Custom", required("OAUTH_AUTH_URL")?, required("OAUTH_TOKEN_URL")?)?;
    let mut client = OAuthClient::new(required("OAUTH_CLIENT_ID")?, provider)
        .with_redirect_uri(required("OAUTH_REDIRECT_URI")?);
    if let Ok(secret) = env::var("OAUTH_CLIENT_SECRET") {
        client = client.with_client_secret(secret);
    }
    if let Ok(scopes) = env::var("OAUTH_SCOPES") {
        client = client.with_scopes(scopes.split_whitespace());
    }

    let store = Arc::new(JsonFileStore {
        path: PathBuf::from("token.json"),
    });
    let auth = Authorization::new(Arc::new(AuthorizationCodeFlow::new(client)), store.clone())
        .with_refresh_mode(RefreshMode::Exchange);

    if store.get().await.is_err() {
        let state = format!("state-{}", chrono::Utc::now().timestamp());
        auth.authorize_cli(&state).await?;
        println!("\nToken saved to {}", store.path.display());
    }

    let http = auth.client().await?;
    let response = http.get(required("RESOURCE_URL")?).await?.send().await?;
    println!("{} {}", response.status(), response.text().await?);

    Ok(())
}
