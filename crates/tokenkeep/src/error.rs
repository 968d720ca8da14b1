//! Error types for token orchestration.

use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::store::StoreError;

/// Errors surfaced by [`Authorization`](crate::Authorization) and
/// [`TokenManager`](crate::TokenManager).
///
/// Collaborator errors are kept verbatim as the [`source`](std::error::Error::source).
#[derive(Debug, Error)]
pub enum Error {
    /// Exchanging the authorization code failed.
    #[error("Code exchange failed: {0}")]
    Exchange(#[source] tokenkeep_oauth::Error),

    /// Writing the token to the store failed.
    #[error("Failed to persist token: {0}")]
    Persist(#[source] StoreError),

    /// Reading the token from the store failed.
    #[error("Failed to retrieve token: {0}")]
    Retrieve(#[source] StoreError),

    /// Reading the authorization code from the terminal failed.
    #[error("Failed to read authorization code: {0}")]
    Input(#[source] io::Error),

    /// The refresh grant failed.
    #[error("Token refresh failed: {0}")]
    Refresh(#[source] tokenkeep_oauth::Error),

    /// The code exchange did not finish before the deadline.
    #[error("Code exchange timed out after {0:?}")]
    Timeout(Duration),

    /// The token cannot be used as a header value.
    #[error("Invalid authorization header: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    /// HTTP request error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Code-for-token exchange failed or timed out.
    Exchange,
    /// Store write failed.
    Persist,
    /// Store read failed.
    Retrieve,
    /// Terminal input failed.
    Input,
    /// Refresh grant failed.
    Refresh,
    /// Outgoing request failed.
    Transport,
}

impl Error {
    /// Returns the kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Exchange(_) | Self::Timeout(_) => ErrorKind::Exchange,
            Self::Persist(_) => ErrorKind::Persist,
            Self::Retrieve(_) => ErrorKind::Retrieve,
            Self::Input(_) => ErrorKind::Input,
            Self::Refresh(_) => ErrorKind::Refresh,
            Self::InvalidHeader(_) | Self::Http(_) => ErrorKind::Transport,
        }
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
