//! Console user administration
//!
//! The backend only accepts these from administrators; callers are expected
//! to check the session role first.

use super::{ApiClient, ClientError};
use crate::types::{UserForm, UserProfile};
use reqwest::Method;
use tracing::debug;

impl ApiClient {
    pub async fn list_users(&self) -> Result<Vec<UserProfile>, ClientError> {
        let request = self.request(Method::GET, "/users");
        self.execute(request).await
    }

    pub async fn create_user(&self, form: &UserForm) -> Result<UserProfile, ClientError> {
        let request = self.request(Method::POST, "/users").json(form);
        self.execute(request).await
    }

    pub async fn update_user(&self, id: u64, form: &UserForm) -> Result<UserProfile, ClientError> {
        let request = self.request(Method::PUT, &format!("/users/{id}")).json(form);
        self.execute(request).await
    }

    /// Delete a user; the response body, if any, is ignored
    pub async fn delete_user(&self, id: u64) -> Result<(), ClientError> {
        let request = self.request(Method::DELETE, &format!("/users/{id}"));
        let response = self.send(request).await?;
        Self::ensure_success(response).await?;
        debug!(user_id = id, "Deleted user");
        Ok(())
    }
}
