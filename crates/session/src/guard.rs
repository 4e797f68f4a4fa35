//! Route guards for commands and views that need a logged-in user

use crate::manager::SessionManager;
use churn_http::types::{Role, UserProfile};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuardError {
    #[error("Not logged in")]
    NotAuthenticated,

    #[error("Access denied. Required roles: {required:?}, user role: {actual}")]
    Forbidden { required: Vec<Role>, actual: Role },
}

/// The current user, if the session is authenticated
pub fn require_authenticated(session: &SessionManager) -> Result<UserProfile, GuardError> {
    if !session.is_authenticated() {
        return Err(GuardError::NotAuthenticated);
    }
    session.current_user().ok_or(GuardError::NotAuthenticated)
}

/// The current user, if authenticated with one of `allowed`.
///
/// An empty `allowed` list admits nobody.
pub fn require_role(session: &SessionManager, allowed: &[Role]) -> Result<UserProfile, GuardError> {
    let user = require_authenticated(session)?;
    if allowed.iter().any(|role| session.has_role(*role)) {
        Ok(user)
    } else {
        Err(GuardError::Forbidden {
            required: allowed.to_vec(),
            actual: user.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::SessionConfig;
    use crate::store::{ACCESS_TOKEN_KEY, MemoryStore, PersistenceStore, REFRESH_TOKEN_KEY, USER_KEY};
    use async_trait::async_trait;
    use churn_http::ClientError;
    use churn_http::types::{Credentials, RefreshedToken, TokenPair};
    use std::sync::Arc;

    struct Unreachable;

    #[async_trait]
    impl crate::AuthBackend for Unreachable {
        async fn obtain_tokens(&self, _: &Credentials) -> Result<TokenPair, ClientError> {
            Err(ClientError::Configuration("offline".into()))
        }

        async fn fetch_profile(&self, _: &str) -> Result<Option<UserProfile>, ClientError> {
            Err(ClientError::Configuration("offline".into()))
        }

        async fn refresh(&self, _: &str) -> Result<RefreshedToken, ClientError> {
            Err(ClientError::Configuration("offline".into()))
        }
    }

    fn session_as(role: &str) -> SessionManager {
        let store = Arc::new(MemoryStore::new());
        store.set(ACCESS_TOKEN_KEY, "A1").unwrap();
        store.set(REFRESH_TOKEN_KEY, "R1").unwrap();
        store
            .set(
                USER_KEY,
                &format!(r#"{{"id":9,"username":"u","role":"{role}"}}"#),
            )
            .unwrap();
        SessionManager::restore(Arc::new(Unreachable), store, SessionConfig::default())
    }

    #[test]
    fn test_logged_out_is_rejected() {
        let session = SessionManager::new(
            Arc::new(Unreachable),
            Arc::new(MemoryStore::new()),
            SessionConfig::default(),
        );
        assert_eq!(
            require_authenticated(&session),
            Err(GuardError::NotAuthenticated)
        );
        assert_eq!(
            require_role(&session, &[Role::Admin]),
            Err(GuardError::NotAuthenticated)
        );
    }

    #[test]
    fn test_matching_role_is_admitted() {
        let session = session_as("data_scientist");
        let user = require_role(&session, &[Role::Admin, Role::DataScientist]).unwrap();
        assert_eq!(user.id, 9);
    }

    #[test]
    fn test_other_role_is_forbidden() {
        let session = session_as("marketing_manager");
        assert_eq!(
            require_role(&session, &[Role::Admin]),
            Err(GuardError::Forbidden {
                required: vec![Role::Admin],
                actual: Role::MarketingManager,
            })
        );
        assert!(require_role(&session, &[]).is_err());
    }
}
