use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "fpl_terminal=info";

pub enum LogTarget {
    Stderr,
    File(PathBuf),
    /// No subscriber is installed.
    Off,
}

impl LogTarget {
    /// `FPL_LOG_FILE` if set, otherwise off. Used by the dashboard, which owns the terminal.
    pub fn file_from_env() -> Self {
        match std::env::var("FPL_LOG_FILE") {
            Ok(path) if !path.trim().is_empty() => LogTarget::File(PathBuf::from(path.trim())),
            _ => LogTarget::Off,
        }
    }
}

pub fn init(target: LogTarget) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

    match target {
        LogTarget::Off => Ok(()),
        LogTarget::Stderr => builder
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|err| anyhow::anyhow!("install log subscriber: {err}")),
        LogTarget::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("open log file {}", path.display()))?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
                .map_err(|err| anyhow::anyhow!("install log subscriber: {err}"))
        }
    }
}
