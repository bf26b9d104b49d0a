// src/logging.rs
use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingConfig;

/// Map a configured level name onto a filter directive. Unknown names → info.
pub fn level_directive(level: &str) -> &'static str {
    match level.trim().to_ascii_uppercase().as_str() {
        "TRACE" => "trace",
        "DEBUG" => "debug",
        "WARNING" | "WARN" => "warn",
        "ERROR" | "CRITICAL" => "error",
        _ => "info",
    }
}

/// Install the global subscriber: console always (text or JSON lines), plus a
/// plain-text file when `cfg.file` is set. `RUST_LOG` overrides the configured level.
///
/// A subscriber that is already installed is left in place.
pub fn init(cfg: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_directive(&cfg.level)));

    let file_layer = if cfg.file.trim().is_empty() {
        None
    } else {
        let path = Path::new(cfg.file.trim());
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating log directory {}", dir.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("opening log file {}", path.display()))?;
        Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
    };

    let (text_console, json_console) = if cfg.json {
        (None, Some(fmt::layer().json().with_current_span(false)))
    } else {
        (Some(fmt::layer().with_target(true)), None)
    };

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(text_console)
        .with(json_console)
        .with(file_layer)
        .try_init();

    for key in cfg.ignored_rotation_keys() {
        tracing::warn!(key, "log rotation is not supported; setting ignored");
    }
    Ok(())
}
