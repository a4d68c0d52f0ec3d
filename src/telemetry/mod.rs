mod broadcast;
mod layer;


pub use broadcast::{LogBroadcaster, LogRecord};
pub use layer::BroadcastLayer;

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Install the global subscriber
///
/// Human-readable output goes to stdout. When `log_file` is set, JSON lines
/// are appended to it as well. Every event is also published on
/// `broadcaster` for live streaming.
pub fn init(level: &str, log_file: Option<&Path>, broadcaster: &LogBroadcaster) -> Result<()> {
    let filter = level_filter(level)?;

    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create log directory {}", parent.display()))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;

            Some(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .with(BroadcastLayer::new(broadcaster.clone()))
        .try_init()
        .context("failed to install tracing subscriber")?;

    Ok(())
}

fn level_filter(level: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(level).with_context(|| format!("invalid log level directive {:?}", level))
}
