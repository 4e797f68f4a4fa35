//! Churn console HTTP client
//!
//! Typed access to the console backend: the token/profile endpoints used by
//! the session layer, and the business endpoints (clients, churn predictions,
//! sentiment, outreach) used by everything else. Credentials are attached by
//! an [`AuthLayer`](client::AuthLayer) installed once when the client is built.

pub mod client;
pub mod types;

pub use client::error::ClientError;
pub use client::{ApiClient, ApiClientBuilder, AuthEndpoints, AuthLayer};
pub use types::{Credentials, Role, UserForm, UserProfile};
