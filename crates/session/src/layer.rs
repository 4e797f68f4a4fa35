use crate::manager::SessionManager;
use async_trait::async_trait;
use churn_http::AuthLayer;
use tracing::{debug, warn};

#[async_trait]
impl AuthLayer for SessionManager {
    async fn bearer_token(&self) -> Option<String> {
        if self.access_token_expiring() {
            debug!("Access token about to expire, refreshing before request");
            if let Err(e) = self.refresh_access_token().await {
                debug!("Refresh ahead of request failed: {e}");
            }
        }
        self.access_token()
    }

    async fn recover(&self, rejected_token: Option<&str>) -> Option<String> {
        // Another request may already have refreshed past the rejected token
        if let Some(current) = self.access_token() {
            if rejected_token != Some(current.as_str()) {
                debug!("Access token changed since the request was sent, replaying");
                return Some(current);
            }
        }

        match self.refresh_access_token().await {
            Ok(token) => Some(token),
            Err(e) => {
                warn!("Could not recover from rejected credentials: {e}");
                None
            }
        }
    }

    async fn replay_rejected(&self) {
        warn!("Backend rejected refreshed credentials, ending session");
        self.logout();
    }
}
