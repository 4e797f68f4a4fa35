//! Churn console API client

pub mod auth;
pub mod console;
pub mod error;
pub mod layer;
pub mod users;

pub use auth::AuthEndpoints;
pub use layer::AuthLayer;

use error::ClientError;
use reqwest::header::{self, HeaderValue};
use reqwest::{Client, ClientBuilder, Request, RequestBuilder, Response, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Console API client
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    endpoints: AuthEndpoints,
    auth_layer: Option<Arc<dyn AuthLayer>>,
}

impl ApiClient {
    /// Create a new client with default configuration
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::builder().base_url(base_url).build()
    }

    /// Create a new client builder
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Paths of the authentication endpoints
    pub const fn endpoints(&self) -> &AuthEndpoints {
        &self.endpoints
    }

    /// Whether requests from this client carry layered credentials
    pub const fn is_layered(&self) -> bool {
        self.auth_layer.is_some()
    }

    /// Same connection pool, with `layer` supplying credentials
    #[must_use]
    pub fn with_auth_layer(&self, layer: Arc<dyn AuthLayer>) -> Self {
        Self {
            auth_layer: Some(layer),
            ..self.clone()
        }
    }

    /// Create a request builder for a path under the base URL
    pub fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client.request(method, url)
    }

    /// Execute a request through the auth layer and decode the JSON body
    pub async fn execute<T: serde::de::DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = self.send(request).await?;
        Self::decode(response).await
    }

    /// Execute a request without consulting the auth layer
    pub async fn execute_public<T: serde::de::DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = request.send().await?;
        Self::decode(response).await
    }

    /// Send a request, attaching layered credentials and replaying once after
    /// a successful recovery from a 401.
    pub async fn send(&self, request: RequestBuilder) -> Result<Response, ClientError> {
        let mut request = request.build()?;
        let Some(layer) = &self.auth_layer else {
            return Ok(self.client.execute(request).await?);
        };

        let token = layer.bearer_token().await;
        if let Some(token) = &token {
            set_bearer(&mut request, token)?;
        }
        let replay = request.try_clone();

        let response = self.client.execute(request).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        let Some(mut replay) = replay else {
            debug!("Request body cannot be replayed, returning 401");
            return Ok(response);
        };
        let Some(fresh) = layer.recover(token.as_deref()).await else {
            debug!(url = %replay.url(), "Credential recovery failed, returning original 401");
            return Ok(response);
        };

        set_bearer(&mut replay, &fresh)?;
        debug!(url = %replay.url(), "Replaying request with refreshed credentials");
        let retried = self.client.execute(replay).await?;
        if retried.status() == StatusCode::UNAUTHORIZED {
            warn!("Replayed request was rejected again");
            layer.replay_rejected().await;
        }
        Ok(retried)
    }

    /// Check the status of a response and deserialize its body
    pub(crate) async fn decode<T: serde::de::DeserializeOwned>(
        response: Response,
    ) -> Result<T, ClientError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json().await?)
    }

    /// Turn a non-success status into the matching error
    pub(crate) async fn ensure_success(response: Response) -> Result<Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_else(|_| status.to_string());
        Err(ClientError::from_status(status, message))
    }
}

fn set_bearer(request: &mut Request, token: &str) -> Result<(), ClientError> {
    let value = HeaderValue::from_str(&format!("Bearer {token}"))
        .map_err(|e| ClientError::Configuration(format!("invalid bearer token: {e}")))?;
    request.headers_mut().insert(header::AUTHORIZATION, value);
    Ok(())
}

/// Builder for ApiClient
#[derive(Default)]
pub struct ApiClientBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    endpoints: Option<AuthEndpoints>,
    auth_layer: Option<Arc<dyn AuthLayer>>,
}

impl ApiClientBuilder {
    /// Set the base URL
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the user agent
    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Override the authentication endpoint paths
    #[must_use]
    pub fn endpoints(mut self, endpoints: AuthEndpoints) -> Self {
        self.endpoints = Some(endpoints);
        self
    }

    /// Install the credential layer
    #[must_use]
    pub fn auth_layer(mut self, layer: Arc<dyn AuthLayer>) -> Self {
        self.auth_layer = Some(layer);
        self
    }

    /// Build the client
    pub fn build(self) -> Result<ApiClient, ClientError> {
        let base_url = self
            .base_url
            .ok_or_else(|| ClientError::Configuration("base_url is required".into()))?;

        // Ensure base_url ends without a trailing slash
        let base_url = base_url.trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ClientError::Configuration(format!(
                "base_url must be an http(s) URL, got {base_url:?}"
            )));
        }

        let mut client_builder = ClientBuilder::new();

        if let Some(timeout) = self.timeout {
            client_builder = client_builder.timeout(timeout);
        }

        client_builder = client_builder.user_agent(
            self.user_agent
                .unwrap_or_else(|| concat!("churn-client/", env!("CARGO_PKG_VERSION")).into()),
        );

        let client = client_builder.build()?;

        Ok(ApiClient {
            client,
            base_url,
            endpoints: self.endpoints.unwrap_or_default(),
            auth_layer: self.auth_layer,
        })
    }
}
