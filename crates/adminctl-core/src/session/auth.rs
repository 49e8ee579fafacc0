use std::sync::Arc;

use adminctl_types::AuthUser;
use anyhow::Result;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use super::state::{AuthPhase, AuthSnapshot, SessionEvent, SessionState};
use super::store::SessionStore;
use super::token;
use crate::api::AdminApi;
use crate::gateway::GatewayError;

/// Error recorded on the snapshot when tokens were issued but `/users/me`
/// failed.
pub const PROFILE_UNAVAILABLE_MESSAGE: &str = "Login successful but could not load user profile";

/// Result of a successful credential exchange.
#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome {
    Authenticated(AuthUser),
    /// Logged in, but the profile could not be fetched.
    ProfileUnavailable,
}

/// Session lifecycle: restore, login, logout.
pub struct AuthSession {
    store: Arc<SessionStore>,
    state: Arc<SessionState>,
    api: AdminApi,
}

impl AuthSession {
    pub fn new(store: Arc<SessionStore>, state: Arc<SessionState>, api: AdminApi) -> Self {
        Self { store, state, api }
    }

    pub fn snapshot(&self) -> AuthSnapshot {
        self.state.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthSnapshot> {
        self.state.subscribe()
    }

    pub fn events(&self) -> broadcast::Receiver<SessionEvent> {
        self.state.events()
    }

    pub fn clear_error(&self) {
        self.state.clear_error();
    }

    /// Restores the session from storage.
    ///
    /// Never fails: anything unexpected discards the stored session and
    /// leaves the state anonymous. Loading is always off on return.
    pub async fn initialize(&self) -> AuthSnapshot {
        self.state.update(|s| s.is_loading = true);

        if let Err(err) = self.restore().await {
            warn!(error = %format!("{err:#}"), "could not restore session, starting anonymous");
            self.discard();
        }

        self.state.snapshot()
    }

    async fn restore(&self) -> Result<()> {
        let Some(stored) = self.store.token()? else {
            debug!("no stored token");
            self.state.set_anonymous();
            return Ok(());
        };

        if token::is_expired(&stored) {
            debug!("stored token expired, validating with the backend");
            return self.load_profile().await;
        }

        if let Some(user) = self.store.user() {
            debug!(user = %user.display_name(), "restored session from cache");
            self.state.set_authenticated(user, Some(stored));
            return Ok(());
        }

        self.load_profile().await
    }

    /// Fetches `/users/me` (the gateway refreshes an expired token first).
    async fn load_profile(&self) -> Result<()> {
        match self.api.get_me().await {
            Ok(user) => {
                self.store.set_user(&user)?;
                let current = self.store.token()?;
                self.state.set_authenticated(user, current);
            }
            Err(err) => {
                debug!(error = %err, "profile fetch failed, discarding session");
                self.discard();
            }
        }
        Ok(())
    }

    fn discard(&self) {
        if let Err(err) = self.store.clear() {
            warn!(error = %format!("{err:#}"), "could not clear stored session");
        }
        self.state.set_anonymous();
    }

    /// Exchanges credentials for tokens, then loads the profile.
    ///
    /// # Errors
    /// Returns the login failure (also recorded as the snapshot error), or
    /// `SessionExpired` if the session was torn down while loading the
    /// profile.
    pub async fn login(
        &self,
        identifier: &str,
        password: &str,
    ) -> Result<LoginOutcome, GatewayError> {
        self.state.update(|s| {
            s.is_loading = true;
            s.error = None;
        });

        let pair = match self.api.login(identifier, password).await {
            Ok(pair) => pair,
            Err(err) => return Err(self.fail_login(err)),
        };
        if let Err(err) = self.store.start_session(&pair) {
            return Err(self.fail_login(GatewayError::Storage(err)));
        }
        info!(identifier, token = %token::mask_token(&pair.access_token), "logged in");

        match self.api.get_me().await {
            Ok(user) => {
                if let Err(err) = self.store.set_user(&user) {
                    warn!(error = %format!("{err:#}"), "could not cache user profile");
                }
                let current = self.store.token().ok().flatten();
                self.state.set_authenticated(user.clone(), current);
                Ok(LoginOutcome::Authenticated(user))
            }
            Err(err @ GatewayError::SessionExpired) => Err(self.fail_login(err)),
            Err(err) => {
                warn!(error = %err, "logged in but could not load profile");
                let current = self.store.token().ok().flatten();
                self.state.update(|s| {
                    s.phase = AuthPhase::ProfileUnavailable;
                    s.token = current;
                    s.is_loading = false;
                    s.error = Some(PROFILE_UNAVAILABLE_MESSAGE.to_string());
                });
                Ok(LoginOutcome::ProfileUnavailable)
            }
        }
    }

    fn fail_login(&self, err: GatewayError) -> GatewayError {
        warn!(error = %err, "login failed");
        let message = err.to_string();
        self.state.update(|s| {
            s.is_loading = false;
            s.error = Some(message);
        });
        err
    }

    /// Forgets the session locally. No network call.
    ///
    /// # Errors
    /// Returns an error if the store could not be cleared; the in-memory
    /// state is reset regardless.
    pub fn logout(&self) -> Result<()> {
        let cleared = self.store.clear();
        self.state.reset();
        self.state.emit(SessionEvent::LoggedOut);
        info!("logged out");
        cleared
    }
}
