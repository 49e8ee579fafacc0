//! Raw gateway access for endpoints without a dedicated command.

use adminctl_core::config::Config;
use anyhow::{Context, Result};
use reqwest::Method;
use serde_json::Value;
use tracing::debug;

use super::output::Output;

pub async fn run(config: &Config, method: &str, path: &str, data: Option<&str>) -> Result<()> {
    let method = Method::from_bytes(method.trim().to_ascii_uppercase().as_bytes())
        .with_context(|| format!("invalid HTTP method '{method}'"))?;
    let body = data
        .map(serde_json::from_str::<Value>)
        .transpose()
        .context("--data is not valid JSON")?;

    let client = super::client(config)?;
    client.auth().initialize().await;

    let response = client
        .gateway()
        .request(method, path, body.as_ref())
        .await?;
    let status = response.status();
    let text = response.text().await.context("read response body")?;
    debug!(%status, bytes = text.len(), "raw request finished");

    match serde_json::from_str::<Value>(&text) {
        Ok(json) => Output::json(&json),
        Err(_) => {
            if !text.is_empty() {
                println!("{text}");
            }
            Ok(())
        }
    }
}
