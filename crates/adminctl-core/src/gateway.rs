//! HTTP request gateway.
//!
//! Every authenticated call goes through [`Gateway::request`], which attaches
//! the stored bearer token, refreshes it when it looks expired, and recovers
//! from a single 401 by refreshing once and retrying once. When recovery is
//! impossible the session is torn down and [`GatewayError::SessionExpired`]
//! is returned.

use std::sync::Arc;
use std::time::Duration;

use adminctl_types::{RefreshRequest, TokenPair};
use anyhow::Context;
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{Instrument, debug, debug_span, info, warn};

use crate::session::{SessionEvent, SessionState, SessionStore, token};

/// User-Agent sent with every request.
pub const USER_AGENT: &str = concat!("adminctl/", env!("CARGO_PKG_VERSION"));

const REFRESH_PATH: &str = "/auth/refresh";

#[derive(Debug, Error)]
pub enum GatewayError {
    /// Non-2xx response other than a recovered 401.
    #[error("{}: {message}", .status.as_u16())]
    Http { status: StatusCode, message: String },
    #[error("Session expired. Please log in again.")]
    SessionExpired,
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid JSON: {0}")]
    Decode(#[from] serde_json::Error),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl GatewayError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            GatewayError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_session_expired(&self) -> bool {
        matches!(self, GatewayError::SessionExpired)
    }
}

/// Joins origin and prefix with exactly one `/` between them.
pub fn api_root(base_url: &str, api_prefix: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    let prefix = api_prefix.trim().trim_matches('/');
    if prefix.is_empty() {
        base.to_string()
    } else {
        format!("{base}/{prefix}")
    }
}

pub struct Gateway {
    http: reqwest::Client,
    root: String,
    store: Arc<SessionStore>,
    state: Arc<SessionState>,
    /// Serializes refreshes so racing callers share one rotation.
    refresh_lock: Mutex<()>,
}

impl Gateway {
    /// Creates a gateway rooted at `root` (origin plus API prefix).
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        root: impl Into<String>,
        timeout: Option<Duration>,
        store: Arc<SessionStore>,
        state: Arc<SessionState>,
    ) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .cookie_store(true);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            root: root.into().trim_end_matches('/').to_string(),
            store,
            state,
            refresh_lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub fn state(&self) -> &Arc<SessionState> {
        &self.state
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.root, path.trim_start_matches('/'))
    }

    /// Sends an authenticated request.
    ///
    /// # Errors
    /// `SessionExpired` when the session could not be recovered, `Http` for
    /// any other non-2xx status, `Transport`/`Storage` for I/O failures.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Response, GatewayError> {
        let span = debug_span!(
            "request",
            request_id = %uuid::Uuid::new_v4(),
            method = %method,
            path
        );
        self.request_with_recovery(method, path, body)
            .instrument(span)
            .await
    }

    async fn request_with_recovery(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Response, GatewayError> {
        let mut bearer = self.store.token()?;
        let mut refreshed = false;

        if let Some(stale) = bearer.clone()
            && token::is_expired(&stale)
        {
            debug!("stored token looks expired, refreshing before send");
            match self.refresh(Some(&stale)).await {
                Ok(fresh) => {
                    bearer = Some(fresh);
                    refreshed = true;
                }
                Err(err) => {
                    warn!(error = %format!("{err:#}"), "token refresh failed, logging out");
                    return Err(self.expire_session());
                }
            }
        }

        let response = self.send(&method, path, body, bearer.as_deref()).await?;
        if response.status() != StatusCode::UNAUTHORIZED || refreshed {
            return check_status(response).await;
        }

        debug!("got 401, refreshing and retrying once");
        let fresh = match self.refresh(bearer.as_deref()).await {
            Ok(fresh) => fresh,
            Err(err) => {
                warn!(error = %format!("{err:#}"), "token refresh after 401 failed, logging out");
                return Err(self.expire_session());
            }
        };

        match self.send(&method, path, body, Some(&fresh)).await {
            Ok(retry) if retry.status().is_success() => Ok(retry),
            Ok(retry) => {
                warn!(status = %retry.status(), "retry after refresh failed, logging out");
                Err(self.expire_session())
            }
            Err(err) => {
                warn!(error = %err, "retry after refresh failed, logging out");
                Err(self.expire_session())
            }
        }
    }

    /// Sends a request without any stored-token handling.
    ///
    /// # Errors
    /// `Http` for non-2xx, `Transport` for network failures.
    pub async fn public_request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Response, GatewayError> {
        let span = debug_span!(
            "public_request",
            request_id = %uuid::Uuid::new_v4(),
            method = %method,
            path
        );
        async {
            let response = self.send(&method, path, body, None).await?;
            check_status(response).await
        }
        .instrument(span)
        .await
    }

    /// GETs `path` and decodes the JSON body.
    ///
    /// # Errors
    /// See [`Gateway::request`]; `Decode` if the body does not match `T`.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, GatewayError> {
        let response = self.request(Method::GET, path, None).await?;
        decode_json(response).await
    }

    /// Sends `body` with `method` and decodes the JSON reply.
    ///
    /// # Errors
    /// See [`Gateway::request`]; `Decode` if the body does not match `T`.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<T, GatewayError> {
        let response = self.request(method, path, body).await?;
        decode_json(response).await
    }

    /// Like [`Gateway::send_json`] but discards the reply body.
    ///
    /// # Errors
    /// See [`Gateway::request`].
    pub async fn send_empty(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<(), GatewayError> {
        self.request(method, path, body).await?;
        Ok(())
    }

    /// Public call with a JSON reply; used by login.
    ///
    /// # Errors
    /// See [`Gateway::public_request`]; `Decode` if the body does not match `T`.
    pub async fn public_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<T, GatewayError> {
        let response = self.public_request(method, path, body).await?;
        decode_json(response).await
    }

    async fn send(
        &self,
        method: &Method,
        path: &str,
        body: Option<&Value>,
        bearer: Option<&str>,
    ) -> Result<Response, GatewayError> {
        let mut builder = self.http.request(method.clone(), self.url(path));
        if let Some(bearer) = bearer {
            builder = builder.bearer_auth(bearer);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        debug!(authenticated = bearer.is_some(), "sending");
        let response = builder.send().await?;
        debug!(status = %response.status(), "received");
        Ok(response)
    }

    /// Rotates the credential pair and returns the new access token.
    ///
    /// `stale` is the access token the caller saw. If the store already holds
    /// a different, unexpired token once the lock is acquired, another caller
    /// refreshed in the meantime and that token is reused.
    async fn refresh(&self, stale: Option<&str>) -> anyhow::Result<String> {
        let _guard = self.refresh_lock.lock().await;

        if let Some(current) = self.store.token()?
            && Some(current.as_str()) != stale
            && !token::is_expired(&current)
        {
            debug!("token already rotated by a concurrent request");
            return Ok(current);
        }

        let refresh_token = self
            .store
            .refresh_token()?
            .context("No refresh token available")?;
        let body = serde_json::to_value(RefreshRequest {
            refresh_token: &refresh_token,
        })?;

        let response = match self
            .public_request(Method::POST, REFRESH_PATH, Some(&body))
            .await
        {
            Ok(response) => response,
            Err(GatewayError::Http { status, .. }) => {
                self.store.clear()?;
                anyhow::bail!("Failed to refresh token ({status})");
            }
            Err(err) => return Err(err.into()),
        };

        let pair: TokenPair = decode_json(response).await?;
        self.store.set_credentials(&pair)?;
        self.state.resync(&self.store)?;
        self.state.emit(SessionEvent::Refreshed);
        info!(token = %token::mask_token(&pair.access_token), "access token refreshed");

        Ok(pair.access_token)
    }

    /// Ends the session after an unrecoverable auth failure.
    fn expire_session(&self) -> GatewayError {
        if let Err(err) = self.store.clear() {
            warn!(error = %format!("{err:#}"), "could not clear session");
        }
        self.state.reset();
        self.state.emit(SessionEvent::Expired);
        GatewayError::SessionExpired
    }
}

async fn check_status(response: Response) -> Result<Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = if text.trim().is_empty() {
        status.canonical_reason().unwrap_or("Request failed").to_string()
    } else {
        text
    };
    Err(GatewayError::Http { status, message })
}

/// Decodes a JSON body; an empty body decodes as `null`.
async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, GatewayError> {
    let bytes = response.bytes().await?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(serde_json::from_value(Value::Null)?);
    }
    Ok(serde_json::from_slice(&bytes)?)
}
