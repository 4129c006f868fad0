use std::fs;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

/// Initialize structured logging to `~/.local/state/merlin/merlin.log`.
///
/// The terminal belongs to the picker, so nothing is written to stdout or stderr.
pub(crate) fn init_logging() -> Result<()> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("merlin")?;
    let log_dir = xdg_dirs.get_state_home();

    fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create log directory: {}", log_dir.display()))?;
    let log_file_path = log_dir.join("merlin.log");

    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file_path)
        .with_context(|| format!("failed to open log file: {}", log_file_path.display()))?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,merlin=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();

    tracing::info!("merlin logging initialized at {}", log_file_path.display());

    Ok(())
}
