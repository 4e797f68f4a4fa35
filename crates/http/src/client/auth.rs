//! Authentication API client methods
//!
//! These calls never go through the installed auth layer: they are what the
//! layer itself is built on.

use super::{ApiClient, ClientError};
use crate::types::{Credentials, RefreshRequest, RefreshedToken, TokenPair, UserProfile};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Paths of the token, profile and refresh endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthEndpoints {
    pub token: String,
    pub profile: String,
    pub refresh: String,
}

impl Default for AuthEndpoints {
    fn default() -> Self {
        Self {
            token: "/auth/token".into(),
            profile: "/auth/profile".into(),
            refresh: "/auth/token/refresh".into(),
        }
    }
}

impl ApiClient {
    /// Exchange credentials for an access/refresh token pair
    pub async fn obtain_token(&self, credentials: &Credentials) -> Result<TokenPair, ClientError> {
        let req = self
            .request(Method::POST, &self.endpoints().token)
            .json(credentials);
        self.execute_public(req).await
    }

    /// Fetch the profile belonging to `access_token`.
    ///
    /// An empty, `null`, `{}` or unparseable body yields `Ok(None)`.
    pub async fn fetch_profile(
        &self,
        access_token: &str,
    ) -> Result<Option<UserProfile>, ClientError> {
        let response = self
            .request(Method::GET, &self.endpoints().profile)
            .bearer_auth(access_token)
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;
        let body = response.text().await?;
        Ok(parse_profile(&body))
    }

    /// Mint a new access token from a refresh token
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<RefreshedToken, ClientError> {
        let req = self
            .request(Method::POST, &self.endpoints().refresh)
            .json(&RefreshRequest {
                refresh: refresh_token,
            });
        self.execute_public(req).await
    }
}

fn parse_profile(body: &str) -> Option<UserProfile> {
    let body = body.trim();
    if body.is_empty() || body == "null" || body == "{}" {
        debug!("Profile endpoint returned an empty payload");
        return None;
    }
    match serde_json::from_str(body) {
        Ok(profile) => Some(profile),
        Err(e) => {
            warn!("Profile payload could not be parsed: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    #[test]
    fn test_parse_profile_empty_variants() {
        assert!(parse_profile("").is_none());
        assert!(parse_profile("  null ").is_none());
        assert!(parse_profile("{}").is_none());
        assert!(parse_profile("<html>oops</html>").is_none());
    }

    #[test]
    fn test_parse_profile_valid() {
        let profile =
            parse_profile(r#"{"id":3,"username":"ds","role":"data_scientist"}"#).unwrap();
        assert_eq!(profile.id, 3);
        assert_eq!(profile.role, Role::DataScientist);
    }

    #[test]
    fn test_default_endpoints() {
        let endpoints = AuthEndpoints::default();
        assert_eq!(endpoints.token, "/auth/token");
        assert_eq!(endpoints.profile, "/auth/profile");
        assert_eq!(endpoints.refresh, "/auth/token/refresh");
    }
}
