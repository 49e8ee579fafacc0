//! Wiring for one admin session.

use std::sync::Arc;

use anyhow::Result;

use crate::api::AdminApi;
use crate::config::Config;
use crate::gateway::{Gateway, api_root};
use crate::session::{AuthSession, SessionState, SessionStore, Storage};

/// Store, state, gateway, API and auth operations sharing one session.
pub struct Client {
    store: Arc<SessionStore>,
    state: Arc<SessionState>,
    gateway: Arc<Gateway>,
    api: AdminApi,
    auth: AuthSession,
}

impl Client {
    /// Builds a client against `config.base_url` + `config.api_prefix`.
    ///
    /// # Errors
    /// Returns an error if the base URL is invalid or the HTTP client cannot
    /// be built.
    pub fn new(config: &Config, storage: impl Storage + 'static) -> Result<Self> {
        let base_url = config.resolve_base_url(None)?;
        let store = Arc::new(SessionStore::new(storage));
        let state = Arc::new(SessionState::new());
        let gateway = Arc::new(Gateway::new(
            api_root(&base_url, &config.api_prefix),
            config.request_timeout(),
            Arc::clone(&store),
            Arc::clone(&state),
        )?);
        let api = AdminApi::new(Arc::clone(&gateway));
        let auth = AuthSession::new(Arc::clone(&store), Arc::clone(&state), api.clone());

        Ok(Self {
            store,
            state,
            gateway,
            api,
            auth,
        })
    }

    pub fn api(&self) -> &AdminApi {
        &self.api
    }

    pub fn auth(&self) -> &AuthSession {
        &self.auth
    }

    pub fn gateway(&self) -> &Arc<Gateway> {
        &self.gateway
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub fn state(&self) -> &Arc<SessionState> {
        &self.state
    }
}
