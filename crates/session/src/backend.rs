//! The authentication backend the session talks to

use async_trait::async_trait;
use churn_http::ApiClient;
use churn_http::ClientError;
use churn_http::types::{Credentials, RefreshedToken, TokenPair, UserProfile};

/// Token issuance, profile lookup and token refresh.
///
/// [`ApiClient`] implements this against the console REST API; tests swap in
/// scripted backends.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Exchange credentials for a token pair
    async fn obtain_tokens(&self, credentials: &Credentials) -> Result<TokenPair, ClientError>;

    /// Look up the profile owning `access_token`; `None` when the payload is unusable
    async fn fetch_profile(&self, access_token: &str) -> Result<Option<UserProfile>, ClientError>;

    /// Mint a new access token
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshedToken, ClientError>;
}

#[async_trait]
impl AuthBackend for ApiClient {
    async fn obtain_tokens(&self, credentials: &Credentials) -> Result<TokenPair, ClientError> {
        self.obtain_token(credentials).await
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<Option<UserProfile>, ClientError> {
        Self::fetch_profile(self, access_token).await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<RefreshedToken, ClientError> {
        self.refresh_token(refresh_token).await
    }
}
