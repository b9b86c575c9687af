//! Logging bootstrap for the CLI.
//!
//! Library modules log through the `log` facade with `key=value` messages.
//! The binary calls [`init_logging`] once to route them to stderr.

use std::sync::OnceLock;

use anyhow::{Context, Result};
use flexi_logger::{Logger, LoggerHandle};

static LOGGER: OnceLock<LoggerHandle> = OnceLock::new();

/// Starts the stderr logger with a `flexi_logger` level spec.
///
/// Calling this again after a successful start is a no-op.
///
/// # Errors
///
/// Returns an error when the level spec is invalid or the backend fails to start.
pub fn init_logging(level: &str) -> Result<()> {
    if LOGGER.get().is_some() {
        return Ok(());
    }

    let handle = Logger::try_with_str(level)
        .with_context(|| format!("Invalid log level '{level}'"))?
        .log_to_stderr()
        .format(flexi_logger::default_format)
        .start()
        .context("Failed to start logger")?;

    if LOGGER.set(handle).is_ok() {
        log::info!(
            "event=app_start level={} version={}",
            level,
            env!("CARGO_PKG_VERSION")
        );
    }
    Ok(())
}
