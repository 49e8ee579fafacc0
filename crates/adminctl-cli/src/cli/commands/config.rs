//! Config command handlers.

use adminctl_core::config;
use anyhow::{Context, Result};

pub fn path() {
    println!("{}", config::paths::config_path().display());
}

pub fn init() -> Result<()> {
    let config_path = config::paths::config_path();
    config::Config::init(&config_path)
        .with_context(|| format!("init config at {}", config_path.display()))?;
    println!("Created config at {}", config_path.display());
    Ok(())
}

pub fn set_url(url: &str) -> Result<()> {
    let config_path = config::paths::config_path();
    config::Config::save_base_url(url)
        .with_context(|| format!("update config at {}", config_path.display()))?;
    let saved = config::Config::load_from(&config_path)?;
    println!("✓ Base URL set to {}", saved.base_url);
    println!("  Config: {}", config_path.display());
    Ok(())
}
