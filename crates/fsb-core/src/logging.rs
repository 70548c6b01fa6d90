use std::{fs::OpenOptions, path::Path, sync::Mutex};

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{errors::Error, Result};

/// Crates that are chatty at info level; capped at warn unless `RUST_LOG`
/// says otherwise.
const QUIET_TARGETS: &[&str] = &["teloxide", "sqlx", "hyper", "tower_http", "reqwest"];

/// Initialize tracing: colored output on stdout plus a plain-text copy
/// appended to `log_file`.
///
/// `level` is the `LOG_LEVEL` setting (`DEBUG`, `INFO`, ...). `RUST_LOG`
/// takes precedence when set.
pub fn init(level: &str, log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));

    let console = fmt::layer().with_target(true).with_ansi(true);

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                fmt::layer()
                    .with_target(true)
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .try_init()
        .map_err(|e| Error::External(format!("failed to install tracing subscriber: {e}")))
}

/// Console-only subscriber for startup checks that run before the config,
/// and so the log level and log file, are known.
pub fn console() -> impl tracing::Subscriber + Send + Sync {
    fmt()
        .with_target(false)
        .with_ansi(true)
        .with_env_filter(EnvFilter::new("info"))
        .finish()
}

fn default_directives(level: &str) -> String {
    let level = normalize_level(level);
    let mut directives = vec![level.to_string()];
    for target in QUIET_TARGETS {
        directives.push(format!("{target}=warn"));
    }
    directives.join(",")
}

/// Map Python-style level names onto tracing's.
fn normalize_level(level: &str) -> &'static str {
    match level.trim().to_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "warn" | "warning" => "warn",
        "error" | "critical" | "fatal" => "error",
        _ => "info",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn python_level_names_are_understood() {
        assert_eq!(normalize_level("WARNING"), "warn");
        assert_eq!(normalize_level("CRITICAL"), "error");
        assert_eq!(normalize_level("Debug"), "debug");
        assert_eq!(normalize_level("nonsense"), "info");
    }

    #[test]
    fn default_directives_quiet_dependencies() {
        let d = default_directives("INFO");
        assert!(d.starts_with("info,"));
        assert!(d.contains("teloxide=warn"));
        assert!(d.contains("sqlx=warn"));
    }
}
