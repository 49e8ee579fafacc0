//! Login, logout and session inspection.

use std::io::{BufRead, IsTerminal};

use adminctl_core::config::{Config, paths};
use adminctl_core::session::token::{self, Expiry};
use adminctl_core::session::{AuthPhase, LoginOutcome, PROFILE_UNAVAILABLE_MESSAGE};
use anyhow::{Context, Result, bail};
use serde_json::json;

use super::output::{Output, or_dash};

const PASSWORD_ENV: &str = "ADMINCTL_PASSWORD";

pub async fn login(config: &Config, identifier: &str, password_stdin: bool) -> Result<()> {
    let identifier = identifier.trim();
    if identifier.is_empty() {
        bail!("Identifier cannot be empty");
    }
    let password = read_password(password_stdin)?;

    let client = super::client(config)?;
    let outcome = client
        .auth()
        .login(identifier, &password)
        .await
        .context("Login failed")?;

    match outcome {
        LoginOutcome::Authenticated(user) => {
            println!("✓ Logged in as {} ({})", user.display_name(), user.role);
        }
        LoginOutcome::ProfileUnavailable => {
            println!("⚠ {PROFILE_UNAVAILABLE_MESSAGE}");
        }
    }
    println!("  Session saved to: {}", paths::session_path().display());
    Ok(())
}

/// Password from `ADMINCTL_PASSWORD`, else one line of stdin.
fn read_password(from_stdin: bool) -> Result<String> {
    if !from_stdin
        && let Ok(password) = std::env::var(PASSWORD_ENV)
        && !password.is_empty()
    {
        return Ok(password);
    }

    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        eprint!("Password: ");
    }
    let mut line = String::new();
    stdin
        .lock()
        .read_line(&mut line)
        .context("read password from stdin")?;

    let password = line.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        bail!("No password provided. Set {PASSWORD_ENV} or pass it on stdin.");
    }
    Ok(password.to_string())
}

pub fn logout(config: &Config) -> Result<()> {
    let client = super::client(config)?;
    if !client.store().has_session()? {
        println!("Not logged in (no session found).");
        return Ok(());
    }

    client.auth().logout().context("clear session")?;
    println!("✓ Logged out");
    println!("  Removed session from: {}", paths::session_path().display());
    Ok(())
}

pub async fn whoami(config: &Config, out: &Output) -> Result<()> {
    let client = super::client(config)?;
    let snapshot = client.auth().initialize().await;

    match &snapshot.phase {
        AuthPhase::Authenticated(user) => out.record(
            user,
            vec![
                ("Name", user.display_name().to_string()),
                ("Email", or_dash(Some(user.email.as_str()))),
                ("Role", or_dash(Some(user.role.as_str()))),
                ("ID", user.id.clone()),
            ],
        ),
        AuthPhase::ProfileUnavailable => {
            println!("Logged in (profile unavailable).");
            Ok(())
        }
        AuthPhase::Anonymous | AuthPhase::Uninitialized => {
            println!("Not logged in.");
            Ok(())
        }
    }
}

pub async fn status(config: &Config, out: &Output) -> Result<()> {
    let client = super::client(config)?;
    let snapshot = client.auth().initialize().await;

    let phase = match &snapshot.phase {
        AuthPhase::Authenticated(_) => "authenticated",
        AuthPhase::ProfileUnavailable => "authenticated (profile unavailable)",
        AuthPhase::Anonymous => "anonymous",
        AuthPhase::Uninitialized => "uninitialized",
    };
    let (masked, expiry) = match snapshot.token.as_deref() {
        Some(access) => (
            token::mask_token(access),
            describe_expiry(&token::inspect(access)),
        ),
        None => ("-".to_string(), "-".to_string()),
    };
    let user = snapshot.user().map(|u| u.display_name().to_string());
    let session_path = paths::session_path();

    let summary = json!({
        "backend": client.gateway().root(),
        "session_file": session_path,
        "state": phase,
        "user": user,
        "token": masked,
        "expires": expiry,
        "error": snapshot.error,
    });
    out.record(
        &summary,
        vec![
            ("Backend", client.gateway().root().to_string()),
            ("Session file", session_path.display().to_string()),
            ("State", phase.to_string()),
            ("User", or_dash(user.as_deref())),
            ("Token", masked),
            ("Expires", expiry),
        ],
    )
}

fn describe_expiry(expiry: &Expiry) -> String {
    match expiry {
        Expiry::Valid { exp } => format!("{} (valid)", format_epoch(*exp)),
        Expiry::Expired { exp } => format!("{} (expired)", format_epoch(*exp)),
        Expiry::Unreadable(err) => format!("unknown ({err})"),
    }
}

fn format_epoch(secs: f64) -> String {
    chrono::DateTime::from_timestamp(secs as i64, 0).map_or_else(
        || secs.to_string(),
        |dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

#[cfg(test)]
mod tests {
    use adminctl_core::session::token::TokenDecodeError;

    use super::*;

    #[test]
    fn test_describe_expiry() {
        assert_eq!(
            describe_expiry(&Expiry::Valid {
                exp: 1_767_225_600.0
            }),
            "2026-01-01 00:00:00 UTC (valid)"
        );
        assert_eq!(
            describe_expiry(&Expiry::Unreadable(TokenDecodeError::MissingExp)),
            "unknown (token payload has no numeric exp claim)"
        );
    }
}
