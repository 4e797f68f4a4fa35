//! Session error types

use churn_http::ClientError;
use thiserror::Error;

/// Errors surfaced by [`SessionManager`](crate::SessionManager) operations.
///
/// `Clone` so every caller sharing a single refresh sees the same outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The token endpoint answered without an access or refresh token
    #[error("Token response did not contain both an access and a refresh token")]
    MissingTokens,

    /// The profile endpoint answered without a usable profile
    #[error("Profile response contained no usable user profile")]
    MissingProfile,

    /// Any failure during login; the session has been cleared
    #[error("Login failed: {0}")]
    LoginFailed(#[source] Box<AuthError>),

    /// Refresh was attempted with no refresh token on record
    #[error("No refresh token on record")]
    NoRefreshToken,

    /// The refresh endpoint rejected the refresh token or could not be reached
    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),

    /// The session was replaced or ended while the operation was in flight
    #[error("Session changed while the operation was in flight")]
    Superseded,

    /// Transport or status failure talking to the backend
    #[error("Backend request failed: {message}")]
    Backend { status: Option<u16>, message: String },

    /// The persisted mirror could not be updated
    #[error("Session storage failed: {0}")]
    Storage(String),
}

impl AuthError {
    /// The specific failure behind any `LoginFailed` wrapping
    pub fn root_cause(&self) -> &Self {
        let mut current = self;
        while let Self::LoginFailed(inner) = current {
            current = inner;
        }
        current
    }

    pub(crate) fn login_failed(cause: Self) -> Self {
        match cause {
            already @ Self::LoginFailed(_) => already,
            other => Self::LoginFailed(Box::new(other)),
        }
    }
}

impl From<ClientError> for AuthError {
    fn from(err: ClientError) -> Self {
        Self::Backend {
            status: err.status(),
            message: err.to_string(),
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        Self::Storage(err.to_string())
    }
}

/// Persistence store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
