//! CLI command handlers.

pub mod auth;
pub mod badges;
pub mod config;
pub mod content;
pub mod dashboard;
pub mod disputes;
pub mod jobs;
pub mod kyc;
pub mod output;
pub mod payments;
pub mod request;
pub mod reviews;
pub mod users;

use adminctl_core::Client;
use adminctl_core::config::{Config, paths};
use adminctl_core::session::FileStorage;
use anyhow::{Context, Result, bail};

/// Client on the persisted session. Nothing is restored yet.
pub fn client(config: &Config) -> Result<Client> {
    Client::new(config, FileStorage::new(paths::session_path())).context("create API client")
}

/// Restores the session and requires a signed-in admin.
pub async fn signed_in(config: &Config) -> Result<Client> {
    let client = client(config)?;
    let snapshot = client.auth().initialize().await;
    if !snapshot.is_authenticated() {
        bail!("Not logged in. Run `adminctl login` first.");
    }
    Ok(client)
}
