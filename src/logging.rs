//! File-backed tracing output.
//!
//! Stdout belongs to the renderer, so events only go to the file named by
//! `SANBOT_TUI_LOG`. Without it nothing is installed.

use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::config::EnvConfig;
use crate::error::{Result, TuiError};

pub const DEFAULT_LOG_FILTER: &str = "sanbot_tui=debug";

/// Installs the global subscriber from the environment. Returns whether one was
/// installed.
pub fn init_from_env() -> Result<bool> {
    init(&EnvConfig::from_env())
}

pub fn init(config: &EnvConfig) -> Result<bool> {
    let Some(path) = config.log_file.as_deref() else {
        return Ok(false);
    };

    let filter = EnvFilter::try_new(config.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER))
        .map_err(|err| TuiError::Logging(err.to_string()))?;
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|err| TuiError::Logging(err.to_string()))?;

    tracing::debug!(path, "logging initialized");
    Ok(true)
}
