//! Tracing subscriber setup.
//!
//! Stderr only carries warnings unless `--verbose` is given; the rotated log
//! file under `logs_dir()` follows `ADMINCTL_LOG` or the configured level.

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer};
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{LogConfig, paths};

/// Environment variable holding a full `EnvFilter` directive.
pub const LOG_ENV: &str = "ADMINCTL_LOG";

const LOG_FILE_PREFIX: &str = "adminctl.log";

/// Picks the filter directive: `ADMINCTL_LOG` > `--verbose` > config level.
fn directive(env: Option<&str>, config: &LogConfig, verbose: bool) -> String {
    if let Some(env) = env.map(str::trim).filter(|env| !env.is_empty()) {
        return env.to_string();
    }
    if verbose {
        return "debug".to_string();
    }
    config.level.clone()
}

/// Installs the global subscriber.
///
/// The returned guard flushes the file writer on drop; keep it alive for the
/// whole process.
///
/// # Errors
/// Returns an error if the filter is invalid or a subscriber is already set.
pub fn init(config: &LogConfig, verbose: bool) -> Result<Option<WorkerGuard>> {
    let env = std::env::var(LOG_ENV).ok();
    let directive = directive(env.as_deref(), config, verbose);
    let stderr_directive = if verbose { directive.as_str() } else { "warn" };

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(
            EnvFilter::try_new(stderr_directive)
                .with_context(|| format!("invalid log filter '{stderr_directive}'"))?,
        );

    let (file_layer, guard) = if config.file {
        let logs_dir = paths::logs_dir();
        let appender = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix(LOG_FILE_PREFIX)
            .build(&logs_dir)
            .with_context(|| format!("open log directory {}", logs_dir.display()))?;
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_filter(
                EnvFilter::try_new(&directive)
                    .with_context(|| format!("invalid log filter '{directive}'"))?,
            );
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("install tracing subscriber")?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(level: &str) -> LogConfig {
        LogConfig {
            level: level.to_string(),
            file: false,
        }
    }

    #[test]
    fn test_directive_falls_back_to_config_level() {
        assert_eq!(directive(None, &config("warn"), false), "warn");
        assert_eq!(directive(Some("  "), &config("warn"), false), "warn");
    }

    #[test]
    fn test_directive_verbose_beats_config() {
        assert_eq!(directive(None, &config("warn"), true), "debug");
    }

    #[test]
    fn test_directive_env_beats_everything() {
        assert_eq!(
            directive(Some("adminctl_core=trace"), &config("warn"), true),
            "adminctl_core=trace"
        );
        assert_eq!(directive(Some("error"), &config("info"), false), "error");
    }
}
