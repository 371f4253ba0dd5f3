//! Logging configuration for askrag

use std::path::Path;

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::{
    self,
};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::Registry;

use crate::config::LoggingConfig;
use crate::AskRagError;
use crate::Result;

const LOG_FILE_PREFIX: &str = "askrag.log";

/// Build the filter: `RUST_LOG` wins, otherwise the configured level
fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{level},askrag={level}")))
}

/// Initialize logging from the `[logging]` config section
pub fn init_logging_with_config(config: &LoggingConfig) -> Result<()> {
    init_logging_with_level(&config.level, config.file_output.then_some(config.directory.as_str()))
}

/// Initialize logging with a custom log level and an optional log directory
pub fn init_logging_with_level(level: &str, directory: Option<&str>) -> Result<()> {
    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr);

    let file_layer = match directory {
        Some(dir) => {
            let logs_dir = Path::new(dir);
            if !logs_dir.exists() {
                std::fs::create_dir_all(logs_dir)?;
            }

            let file_appender = tracing_appender::rolling::daily(logs_dir, LOG_FILE_PREFIX);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            // The writer thread must outlive every span; the process owns it until exit
            std::mem::forget(guard);

            Some(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .with_writer(non_blocking)
                    .with_ansi(false)
                    .boxed(),
            )
        }
        None => None,
    };

    Registry::default()
        .with(build_filter(level))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| AskRagError::ConfigError(format!("Failed to initialize logging: {e}")))?;

    tracing::info!("Logging initialized with level: {}", level);
    if let Some(dir) = directory {
        tracing::info!("Log files will be saved to: {}/{}.YYYY-MM-DD", dir, LOG_FILE_PREFIX);
    }

    Ok(())
}

/// Initialize simple console logging for tests and one-shot commands
pub fn init_simple_logging() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(true)
        .with_max_level(tracing::Level::INFO)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| AskRagError::ConfigError(format!("Failed to initialize logging: {e}")))?;

    tracing::info!("Simple logging initialized");
    Ok(())
}
