/// Tracing setup
///
/// One-shot commands log to stderr. The TUI owns the terminal, so it logs to
/// `<cache_dir>/catalog-admin/catalog-admin.log` instead.
///
///   RUST_LOG=catalog_admin=debug catalog-admin list architecture

use anyhow::{anyhow, Context, Result};
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

use super::app_config::APP_DIR;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    File,
}

#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Debug level unless RUST_LOG is set
    pub debug: bool,
    pub target: LogTarget,
}

fn env_filter(debug: bool) -> EnvFilter {
    let default = if debug { "debug" } else { "info" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

pub fn log_file_path() -> Result<PathBuf> {
    let cache_dir = dirs::cache_dir().context("Could not determine the user cache directory")?;
    Ok(cache_dir.join(APP_DIR).join("catalog-admin.log"))
}

pub fn init(config: &TracingConfig) -> Result<()> {
    let filter = env_filter(config.debug);

    match config.target {
        LogTarget::Stderr => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(config.debug)
            .with_writer(std::io::stderr)
            .compact()
            .try_init()
            .map_err(|err| anyhow!(err)),
        LogTarget::File => {
            let path = log_file_path()?;
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).context("Failed to create log directory")?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;

            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
                .map_err(|err| anyhow!(err))
        }
    }
}
