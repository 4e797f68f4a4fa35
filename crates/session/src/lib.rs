//! Session lifecycle for the churn console
//!
//! A [`SessionManager`] owns the access token, refresh token and user profile
//! as one unit. It logs in against an [`AuthBackend`], mirrors the unit into a
//! [`PersistenceStore`] so it survives restarts, and implements
//! [`AuthLayer`](churn_http::AuthLayer) so an [`ApiClient`](churn_http::ApiClient)
//! built with it attaches the current token and recovers from expiry with a
//! single shared refresh.

pub mod backend;
pub mod error;
pub mod guard;
mod layer;
pub mod manager;
pub mod store;
pub mod token;

pub use backend::AuthBackend;
pub use churn_http::types::{Credentials, Role, UserProfile};
pub use error::{AuthError, StoreError};
pub use guard::{GuardError, require_authenticated, require_role};
pub use manager::{SessionConfig, SessionManager, SessionState};
pub use store::{FileStore, MemoryStore, PersistenceStore};
