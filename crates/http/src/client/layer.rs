//! Credential middleware installed into [`ApiClient`](super::ApiClient)

use async_trait::async_trait;

/// Supplies bearer credentials to outgoing requests and recovers from
/// rejected ones.
///
/// The client calls [`bearer_token`](Self::bearer_token) before every layered
/// request. On a 401 it calls [`recover`](Self::recover) once; a returned token
/// means the request is replayed with it. If the replay is rejected too, the
/// client calls [`replay_rejected`](Self::replay_rejected) and gives up.
#[async_trait]
pub trait AuthLayer: Send + Sync {
    /// Token to attach to the next request, if any
    async fn bearer_token(&self) -> Option<String>;

    /// Obtain a fresh token after `rejected_token` was refused.
    ///
    /// Returns `None` when no replay should be attempted.
    async fn recover(&self, rejected_token: Option<&str>) -> Option<String>;

    /// A replayed request was refused as well
    async fn replay_rejected(&self);
}
