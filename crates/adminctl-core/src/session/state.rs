//! Observable authentication state.
//!
//! The current [`AuthSnapshot`] is published through a `watch` channel so
//! observers always see a whole snapshot; one-shot notifications (refreshed,
//! expired, logged out) go through a `broadcast` channel.

use std::fmt;

use adminctl_types::AuthUser;
use anyhow::Result;
use tokio::sync::{broadcast, watch};

use super::store::SessionStore;
use super::token::mask_token;

/// Where the session stands.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthPhase {
    /// `initialize()` has not finished yet.
    Uninitialized,
    Anonymous,
    Authenticated(AuthUser),
    /// Tokens were issued but the profile could not be loaded.
    ProfileUnavailable,
}

#[derive(Clone, PartialEq)]
pub struct AuthSnapshot {
    pub phase: AuthPhase,
    pub token: Option<String>,
    pub is_loading: bool,
    /// Last non-fatal error, cleared by `clear_error()`.
    pub error: Option<String>,
}

impl AuthSnapshot {
    pub fn is_authenticated(&self) -> bool {
        matches!(
            self.phase,
            AuthPhase::Authenticated(_) | AuthPhase::ProfileUnavailable
        )
    }

    pub fn user(&self) -> Option<&AuthUser> {
        match &self.phase {
            AuthPhase::Authenticated(user) => Some(user),
            _ => None,
        }
    }
}

impl Default for AuthSnapshot {
    fn default() -> Self {
        Self {
            phase: AuthPhase::Uninitialized,
            token: None,
            is_loading: true,
            error: None,
        }
    }
}

impl fmt::Debug for AuthSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSnapshot")
            .field("phase", &self.phase)
            .field("token", &self.token.as_deref().map(mask_token))
            .field("is_loading", &self.is_loading)
            .field("error", &self.error)
            .finish()
    }
}

/// One-shot session notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// The credential pair was rotated.
    Refreshed,
    /// Refresh failed for good; the user must log in again.
    Expired,
    LoggedOut,
}

const EVENT_CAPACITY: usize = 16;

/// Shared holder of the live snapshot.
pub struct SessionState {
    snapshot: watch::Sender<AuthSnapshot>,
    events: broadcast::Sender<SessionEvent>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    pub fn new() -> Self {
        let (snapshot, _) = watch::channel(AuthSnapshot::default());
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self { snapshot, events }
    }

    pub fn snapshot(&self) -> AuthSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthSnapshot> {
        self.snapshot.subscribe()
    }

    pub fn events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub(crate) fn update(&self, f: impl FnOnce(&mut AuthSnapshot)) {
        self.snapshot.send_modify(f);
    }

    pub(crate) fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    pub(crate) fn set_anonymous(&self) {
        self.update(|s| {
            s.phase = AuthPhase::Anonymous;
            s.token = None;
            s.is_loading = false;
        });
    }

    pub(crate) fn set_authenticated(&self, user: AuthUser, token: Option<String>) {
        self.update(|s| {
            s.phase = AuthPhase::Authenticated(user);
            s.token = token;
            s.is_loading = false;
        });
    }

    /// Logout: anonymous with no lingering error.
    pub(crate) fn reset(&self) {
        self.update(|s| {
            *s = AuthSnapshot {
                phase: AuthPhase::Anonymous,
                token: None,
                is_loading: false,
                error: None,
            };
        });
    }

    pub fn clear_error(&self) {
        self.update(|s| s.error = None);
    }

    /// Reloads token and cached user from the store without touching the
    /// network. A missing token means the session is gone.
    ///
    /// # Errors
    /// Returns an error if the token cannot be read from storage.
    pub fn resync(&self, store: &SessionStore) -> Result<()> {
        let token = store.token()?;
        let user = store.user();
        self.update(|s| match token {
            None => {
                s.phase = AuthPhase::Anonymous;
                s.token = None;
            }
            Some(token) => {
                if let Some(user) = user {
                    s.phase = AuthPhase::Authenticated(user);
                }
                s.token = Some(token);
            }
        });
        Ok(())
    }
}
