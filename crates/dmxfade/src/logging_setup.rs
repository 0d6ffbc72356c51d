//! Tracing subscriber for the daemon
//!
//! Console output goes to stderr. File output rolls over daily in
//! `log_dir` (`dmxfade.YYYY-MM-DD.log`), since the daemon usually runs for
//! days at a time. `RUST_LOG` overrides the configured level for both.

use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer,
};

use crate::config::LogConfig;

const LOG_FILE_PREFIX: &str = "dmxfade";
const LOG_FILE_SUFFIX: &str = "log";

/// Handle to keep the file writer thread alive
pub struct LogGuard {
    _guard: WorkerGuard,
}

fn env_filter(config: &LogConfig) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(config.parse_level().into())
        .from_env_lossy()
}

/// Daily rolling appender in `config.log_dir`
fn file_appender(config: &LogConfig) -> Result<RollingFileAppender> {
    config
        .ensure_log_directory()
        .with_context(|| format!("Failed to create log directory: {:?}", config.log_dir))?;

    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix(LOG_FILE_SUFFIX)
        .build(&config.log_dir)
        .with_context(|| format!("Failed to open log file in {:?}", config.log_dir))
}

/// Install the global subscriber.
///
/// Returns a guard when file output is enabled; buffered lines are flushed
/// when it drops, so hold it until the end of `main`.
pub fn init(config: &LogConfig, config_path: Option<&Path>) -> Result<Option<LogGuard>> {
    // Refresh and ambient threads are named after their universe
    let console_layer = config.console_output.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_names(true)
            .with_filter(env_filter(config))
    });

    let (file_layer, guard) = if config.file_output {
        let (writer, guard) = tracing_appender::non_blocking(file_appender(config)?);
        let layer = fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_thread_names(true)
            .with_filter(env_filter(config));
        (Some(layer), Some(LogGuard { _guard: guard }))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();

    tracing::info!(
        "dmxfade {} logging at level {}",
        env!("CARGO_PKG_VERSION"),
        config.level
    );
    if config.file_output {
        tracing::info!(
            "Writing {}.*.{} files to {:?}",
            LOG_FILE_PREFIX,
            LOG_FILE_SUFFIX,
            config.log_dir
        );
    }
    match config_path {
        Some(path) => tracing::info!("Configuration loaded from {:?}", path),
        None => tracing::info!("No configuration file given, using defaults"),
    }

    Ok(guard)
}
