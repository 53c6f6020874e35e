//! Shared observability helpers for the binary and integration tests.
//!
//! [`init_logging`] installs one global `tracing` subscriber that writes to a
//! daily rolling file and, optionally, to `stderr`. Call it once near process
//! start; later calls are no-ops that hand back the first resolved log path.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();
static LOG_PATH: OnceLock<PathBuf> = OnceLock::new();

const LOG_DIR_ENV: &str = "SCROLLCAST_LOG_DIR";

/// Output encoding for structured logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> anyhow::Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(anyhow::anyhow!("unknown log format '{other}'")),
        }
    }
}

/// Configuration passed to [`init_logging`].
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Logical name of the component (used for defaults and file names).
    pub app_name: &'static str,
    /// Optional explicit directory for log output. If `None`, we consult
    /// `SCROLLCAST_LOG_DIR` and finally fall back to `<local data dir>/<app_name>/logs`.
    pub log_dir: Option<PathBuf>,
    /// Whether to duplicate events to `stderr` in addition to the file sink.
    pub emit_stderr: bool,
    pub format: LogFormat,
    /// Filter applied when `RUST_LOG` is unset.
    pub default_filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            app_name: "scrollcast",
            log_dir: None,
            emit_stderr: false,
            format: LogFormat::Text,
            default_filter: "info".to_string(),
        }
    }
}

/// Initialise the global `tracing` subscriber.
///
/// Returns the concrete log file path for the current day.
pub fn init_logging(config: LogConfig) -> anyhow::Result<PathBuf> {
    if let Some(path) = LOG_PATH.get() {
        return Ok(path.clone());
    }

    let resolved_dir = resolve_log_dir(config.app_name, config.log_dir.as_deref());
    std::fs::create_dir_all(&resolved_dir)
        .with_context(|| format!("failed to create log directory: {}", resolved_dir.display()))?;

    let log_filename = format!("{}.log", config.app_name);
    let full_path = log_file_path(&resolved_dir, &log_filename, Utc::now());

    let appender = rolling::daily(&resolved_dir, &log_filename);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let _ = LOG_GUARD.set(guard);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

    // `Option<Layer>` is itself a layer, so stderr duplication is a toggle.
    let installed = match config.format {
        LogFormat::Text => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_writer(writer).with_ansi(false))
            .with(
                config
                    .emit_stderr
                    .then(|| fmt::layer().with_writer(std::io::stderr)),
            )
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(writer))
            .with(
                config
                    .emit_stderr
                    .then(|| fmt::layer().json().with_writer(std::io::stderr)),
            )
            .try_init(),
    };
    installed.map_err(|e| anyhow::anyhow!("tracing setup failed: {e}"))?;

    let _ = LOG_PATH.set(full_path.clone());
    Ok(full_path)
}

fn resolve_log_dir(app_name: &str, explicit: Option<&Path>) -> PathBuf {
    if let Some(dir) = explicit {
        return expand_home(dir);
    }

    if let Ok(env_dir) = std::env::var(LOG_DIR_ENV) {
        return expand_home(Path::new(&env_dir));
    }

    default_data_dir(app_name)
}

/// File the daily appender writes to at `now`; it rotates on UTC dates.
fn log_file_path(dir: &Path, log_filename: &str, now: DateTime<Utc>) -> PathBuf {
    dir.join(format!("{log_filename}.{}", now.format("%Y-%m-%d")))
}

fn expand_home(path: &Path) -> PathBuf {
    match (
        path.to_str().and_then(|s| s.strip_prefix("~/")),
        dirs::home_dir(),
    ) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

fn default_data_dir(app_name: &str) -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(app_name)
        .join("logs")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_dir_wins() {
        let dir = resolve_log_dir("scrollcast", Some(Path::new("/var/log/scrollcast")));
        assert_eq!(dir, PathBuf::from("/var/log/scrollcast"));
    }

    #[test]
    fn log_file_follows_the_utc_date() {
        let late_evening_west = DateTime::parse_from_rfc3339("2026-03-01T23:30:00-05:00")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(
            log_file_path(Path::new("/var/log/sc"), "scrollcast.log", late_evening_west),
            PathBuf::from("/var/log/sc/scrollcast.log.2026-03-02")
        );
    }

    #[test]
    fn relative_paths_are_left_alone() {
        assert_eq!(expand_home(Path::new("logs")), PathBuf::from("logs"));
    }

    #[test]
    fn log_format_parses_case_insensitively() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
