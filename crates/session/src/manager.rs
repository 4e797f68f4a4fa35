//! The session manager
//!
//! State machine: `LoggedOut -(login)-> LoggedIn -(refresh ok)-> LoggedIn
//! -(refresh failure | logout)-> LoggedOut`.
//!
//! The access token, refresh token and profile form one unit. Memory and the
//! persisted mirror are updated inside the same write-lock section, and every
//! unit carries a generation number so a login or refresh that finishes after
//! the session was replaced cannot write into the new one.

use crate::backend::AuthBackend;
use crate::error::AuthError;
use crate::store::{
    ACCESS_TOKEN_KEY, PersistenceStore, REFRESH_TOKEN_KEY, SESSION_KEYS, USER_KEY,
};
use crate::token;
use chrono::{TimeDelta, Utc};
use churn_http::types::{Credentials, RefreshedToken, Role, UserProfile};
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tracing::{debug, info, warn};

type PendingRefresh = Shared<BoxFuture<'static, Result<String, AuthError>>>;

/// Tunables for a [`SessionManager`]
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Refresh a JWT access token this long before its `exp` claim
    pub refresh_skew: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            refresh_skew: Duration::from_secs(30),
        }
    }
}

/// Coarse session state for display and routing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    LoggedOut,
    LoggedIn,
}

#[derive(Debug, Default)]
struct SessionSlot {
    access_token: Option<String>,
    refresh_token: Option<String>,
    user: Option<UserProfile>,
    generation: u64,
}

impl SessionSlot {
    const fn is_complete(&self) -> bool {
        self.access_token.is_some() && self.refresh_token.is_some() && self.user.is_some()
    }

    fn clear(&mut self) {
        self.access_token = None;
        self.refresh_token = None;
        self.user = None;
        self.generation += 1;
    }
}

struct Inner {
    backend: Arc<dyn AuthBackend>,
    store: Arc<dyn PersistenceStore>,
    slot: RwLock<SessionSlot>,
    pending_refresh: Mutex<Option<PendingRefresh>>,
    refresh_skew: TimeDelta,
}

/// Owner of the authenticated session.
///
/// Cloning yields another handle to the same session; an application builds
/// one at its composition root and hands clones to whatever needs it.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

impl SessionManager {
    /// Start logged out without consulting the store
    pub fn new(
        backend: Arc<dyn AuthBackend>,
        store: Arc<dyn PersistenceStore>,
        config: SessionConfig,
    ) -> Self {
        Self::from_slot(backend, store, config, SessionSlot::default())
    }

    /// Rebuild the session persisted in `store`.
    ///
    /// Only a complete unit is restored. Anything partial (including a `user`
    /// value that is empty or not valid JSON) is wiped and the manager starts
    /// logged out.
    pub fn restore(
        backend: Arc<dyn AuthBackend>,
        store: Arc<dyn PersistenceStore>,
        config: SessionConfig,
    ) -> Self {
        let slot = load_slot(store.as_ref());
        Self::from_slot(backend, store, config, slot)
    }

    fn from_slot(
        backend: Arc<dyn AuthBackend>,
        store: Arc<dyn PersistenceStore>,
        config: SessionConfig,
        slot: SessionSlot,
    ) -> Self {
        let refresh_skew = TimeDelta::from_std(config.refresh_skew).unwrap_or(TimeDelta::MAX);
        Self {
            inner: Arc::new(Inner {
                backend,
                store,
                slot: RwLock::new(slot),
                pending_refresh: Mutex::new(None),
                refresh_skew,
            }),
        }
    }

    /// Log in and return the user's profile.
    ///
    /// Any previous session is discarded first. On failure the session is left
    /// fully cleared and the cause is wrapped in [`AuthError::LoginFailed`].
    pub async fn login(&self, credentials: &Credentials) -> Result<UserProfile, AuthError> {
        info!(identifier = %credentials.identifier, "Logging in");
        let generation = self.inner.reset();

        match self.inner.establish(credentials, generation).await {
            Ok(profile) => {
                info!(user_id = profile.id, role = %profile.role, "Logged in");
                Ok(profile)
            }
            Err(cause) => {
                warn!("Login failed: {cause}");
                self.inner.clear_if_current(generation);
                Err(AuthError::login_failed(cause))
            }
        }
    }

    /// End the session. Calling this while logged out does nothing.
    pub fn logout(&self) {
        if self.inner.end_session() {
            info!("Logged out");
        }
    }

    /// Mint a new access token from the refresh token.
    ///
    /// Concurrent callers share one backend call and all observe its outcome.
    /// Missing or rejected refresh tokens end the session.
    pub async fn refresh_access_token(&self) -> Result<String, AuthError> {
        let pending = {
            let mut slot = self
                .inner
                .pending_refresh
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if let Some(pending) = slot.as_ref() {
                debug!("Joining refresh already in flight");
                pending.clone()
            } else {
                let inner = Arc::clone(&self.inner);
                let pending = async move { inner.run_refresh().await }.boxed().shared();
                *slot = Some(pending.clone());
                pending
            }
        };

        let result = pending.clone().await;

        let mut slot = self
            .inner
            .pending_refresh
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|current| current.ptr_eq(&pending)) {
            *slot = None;
        }
        result
    }

    /// True iff access token, refresh token and profile are all present
    pub fn is_authenticated(&self) -> bool {
        self.inner.read().is_complete()
    }

    pub fn state(&self) -> SessionState {
        if self.is_authenticated() {
            SessionState::LoggedIn
        } else {
            SessionState::LoggedOut
        }
    }

    /// True iff a profile is present and its role is `role`
    pub fn has_role(&self, role: Role) -> bool {
        self.inner
            .read()
            .user
            .as_ref()
            .is_some_and(|user| user.role == role)
    }

    pub fn access_token(&self) -> Option<String> {
        self.inner.read().access_token.clone()
    }

    pub fn current_user(&self) -> Option<UserProfile> {
        self.inner.read().user.clone()
    }

    /// Whether the current access token is a JWT about to expire
    pub(crate) fn access_token_expiring(&self) -> bool {
        self.access_token().is_some_and(|token| {
            token::expires_within(&token, self.inner.refresh_skew, Utc::now())
        })
    }
}

impl Inner {
    fn read(&self) -> RwLockReadGuard<'_, SessionSlot> {
        self.slot.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionSlot> {
        self.slot.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn detach_pending_refresh(&self) {
        let mut pending = self
            .pending_refresh
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if pending.take().is_some() {
            debug!("Detached in-flight refresh from the ended session");
        }
    }

    fn wipe_store(&self) {
        if let Err(e) = self.store.remove_many(&SESSION_KEYS) {
            warn!("Failed to clear persisted session: {e}");
        }
    }

    /// Clear everything and start a new generation for a login attempt
    fn reset(&self) -> u64 {
        let generation = {
            let mut slot = self.write();
            slot.clear();
            self.wipe_store();
            slot.generation
        };
        self.detach_pending_refresh();
        generation
    }

    /// Clear the session; returns whether there was anything to clear
    fn end_session(&self) -> bool {
        let had_state = {
            let mut slot = self.write();
            let had_state = slot.access_token.is_some()
                || slot.refresh_token.is_some()
                || slot.user.is_some();
            slot.clear();
            self.wipe_store();
            had_state
        };
        self.detach_pending_refresh();
        had_state
    }

    /// Clear the session only if it is still generation `generation`
    fn clear_if_current(&self, generation: u64) -> bool {
        let cleared = {
            let mut slot = self.write();
            if slot.generation == generation {
                slot.clear();
                self.wipe_store();
                true
            } else {
                false
            }
        };
        if cleared {
            self.detach_pending_refresh();
        }
        cleared
    }

    /// Persist `entries` and apply `mutate` if the session is still `generation`
    fn commit<F>(
        &self,
        generation: u64,
        entries: &[(&'static str, String)],
        mutate: F,
    ) -> Result<(), AuthError>
    where
        F: FnOnce(&mut SessionSlot),
    {
        let mut slot = self.write();
        if slot.generation != generation {
            return Err(AuthError::Superseded);
        }
        self.store.set_many(entries)?;
        mutate(&mut slot);
        Ok(())
    }

    async fn establish(
        &self,
        credentials: &Credentials,
        generation: u64,
    ) -> Result<UserProfile, AuthError> {
        let pair = self.backend.obtain_tokens(credentials).await?;
        let (Some(access), Some(refresh)) = (non_empty(pair.access), non_empty(pair.refresh))
        else {
            return Err(AuthError::MissingTokens);
        };

        self.commit(
            generation,
            &[
                (ACCESS_TOKEN_KEY, access.clone()),
                (REFRESH_TOKEN_KEY, refresh.clone()),
            ],
            |slot| {
                slot.access_token = Some(access.clone());
                slot.refresh_token = Some(refresh);
            },
        )?;
        debug!("Tokens stored, fetching profile");

        let profile = self
            .backend
            .fetch_profile(&access)
            .await?
            .ok_or(AuthError::MissingProfile)?;
        let serialized =
            serde_json::to_string(&profile).map_err(|e| AuthError::Storage(e.to_string()))?;

        self.commit(generation, &[(USER_KEY, serialized)], |slot| {
            slot.user = Some(profile.clone());
        })?;
        Ok(profile)
    }

    async fn run_refresh(&self) -> Result<String, AuthError> {
        let (refresh_token, generation) = {
            let slot = self.read();
            (slot.refresh_token.clone(), slot.generation)
        };

        let Some(refresh_token) = refresh_token else {
            warn!("No refresh token on record, ending session");
            self.clear_if_current(generation);
            return Err(AuthError::NoRefreshToken);
        };

        debug!("Refreshing access token");
        let reason = match self.backend.refresh(&refresh_token).await {
            Ok(RefreshedToken { access }) => match non_empty(access) {
                Some(access) => {
                    let committed = self.commit(
                        generation,
                        &[(ACCESS_TOKEN_KEY, access.clone())],
                        |slot| slot.access_token = Some(access.clone()),
                    );
                    match committed {
                        Ok(()) => {
                            debug!("Access token refreshed");
                            return Ok(access);
                        }
                        Err(AuthError::Superseded) => {
                            debug!("Session changed during refresh, discarding new token");
                            return Err(AuthError::Superseded);
                        }
                        Err(e) => e.to_string(),
                    }
                }
                None => "refresh response did not contain an access token".to_string(),
            },
            Err(e) => e.to_string(),
        };

        if self.clear_if_current(generation) {
            warn!("Token refresh failed, session ended: {reason}");
            Err(AuthError::RefreshFailed(reason))
        } else {
            debug!("Token refresh failed for a session that already ended: {reason}");
            Err(AuthError::Superseded)
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn read_key(store: &dyn PersistenceStore, key: &str) -> Option<String> {
    match store.get(key) {
        Ok(value) => non_empty(value),
        Err(e) => {
            warn!("Failed to read persisted {key}: {e}");
            None
        }
    }
}

fn parse_user(raw: &str) -> Option<UserProfile> {
    if raw == "undefined" || raw == "null" {
        return None;
    }
    match serde_json::from_str(raw) {
        Ok(user) => Some(user),
        Err(e) => {
            warn!("Persisted user is not a valid profile: {e}");
            None
        }
    }
}

fn load_slot(store: &dyn PersistenceStore) -> SessionSlot {
    let access_token = read_key(store, ACCESS_TOKEN_KEY);
    let refresh_token = read_key(store, REFRESH_TOKEN_KEY);
    let user = read_key(store, USER_KEY).and_then(|raw| parse_user(&raw));

    match (access_token, refresh_token, user) {
        (Some(access_token), Some(refresh_token), Some(user)) => {
            debug!(user_id = user.id, "Restored persisted session");
            SessionSlot {
                access_token: Some(access_token),
                refresh_token: Some(refresh_token),
                user: Some(user),
                generation: 0,
            }
        }
        (None, None, None) => SessionSlot::default(),
        _ => {
            warn!("Discarding incomplete persisted session");
            if let Err(e) = store.remove_many(&SESSION_KEYS) {
                warn!("Failed to clear persisted session: {e}");
            }
            SessionSlot::default()
        }
    }
}
