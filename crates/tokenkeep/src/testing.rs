//! Test doubles shared by the unit tests.

#![allow(clippy::unwrap_used)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokenkeep_oauth::{AccessType, Token};
use url::Url;

use crate::flow::OAuthFlow;
use crate::store::{StoreError, TokenStore};

pub fn valid_token(access: &str) -> Token {
    Token::bearer(access)
        .with_refresh_token("refresh-1")
        .with_expires_at(Utc::now() + chrono::Duration::hours(1))
}

pub fn expired_token(access: &str) -> Token {
    Token::bearer(access)
        .with_refresh_token("refresh-1")
        .with_expires_at(Utc::now() - chrono::Duration::hours(1))
}

/// In-memory store that records every call.
#[derive(Default)]
pub struct MemoryStore {
    token: Mutex<Option<Token>>,
    saved: Mutex<Vec<Token>>,
    gets: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    fail_get: AtomicBool,
    fail_save: AtomicBool,
    delay: Option<Duration>,
}

impl MemoryStore {
    pub fn with_token(token: Token) -> Self {
        Self {
            token: Mutex::new(Some(token)),
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn fail_get(&self) {
        self.fail_get.store(true, Ordering::SeqCst);
    }

    pub fn fail_save(&self) {
        self.fail_save.store(true, Ordering::SeqCst);
    }

    pub fn saved(&self) -> Vec<Token> {
        self.saved.lock().unwrap().clone()
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn enter(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn leave(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl TokenStore for MemoryStore {
    async fn get(&self) -> Result<Token, StoreError> {
        self.enter().await;
        self.gets.fetch_add(1, Ordering::SeqCst);
        let result: Result<Token, StoreError> = if self.fail_get.load(Ordering::SeqCst) {
            Err("store unavailable".into())
        } else {
            self.token
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| "no token stored".into())
        };
        self.leave();
        result
    }

    async fn save(&self, token: &Token) -> Result<(), StoreError> {
        self.enter().await;
        let result: Result<(), StoreError> = if self.fail_save.load(Ordering::SeqCst) {
            Err("store is read-only".into())
        } else {
            *self.token.lock().unwrap() = Some(token.clone());
            self.saved.lock().unwrap().push(token.clone());
            Ok(())
        };
        self.leave();
        result
    }
}

/// Flow that accepts `good-code` and hands out numbered refreshed tokens.
#[derive(Default)]
pub struct ScriptedFlow {
    refreshes: AtomicUsize,
    fail_refresh: AtomicBool,
}

impl ScriptedFlow {
    pub fn fail_refresh(&self) {
        self.fail_refresh.store(true, Ordering::SeqCst);
    }

    pub fn refreshes(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OAuthFlow for ScriptedFlow {
    fn authorization_url(&self, state: &str, access: AccessType) -> Url {
        let mut url = Url::parse("https://auth.example.com/authorize").unwrap();
        url.query_pairs_mut().append_pair("state", state);
        if access == AccessType::Offline {
            url.query_pairs_mut().append_pair("access_type", "offline");
        }
        url
    }

    async fn exchange_code(&self, code: &str) -> tokenkeep_oauth::Result<Token> {
        if code == "good-code" {
            Ok(valid_token("exchanged"))
        } else {
            Err(tokenkeep_oauth::Error::oauth_error(
                "invalid_grant",
                "code is invalid or expired",
            ))
        }
    }

    async fn refresh(&self, token: &Token) -> tokenkeep_oauth::Result<Token> {
        if self.fail_refresh.load(Ordering::SeqCst) {
            return Err(tokenkeep_oauth::Error::oauth_error(
                "invalid_grant",
                "refresh token revoked",
            ));
        }
        token.refresh_token()?;
        let n = self.refreshes.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(valid_token(&format!("refreshed-{n}")))
    }
}
