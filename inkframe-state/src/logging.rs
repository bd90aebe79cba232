//! Logging setup for InkFrame components
//!
//! Libraries only emit `tracing` events; this module installs a subscriber
//! for the process that hosts them.

use tracing_subscriber::{fmt, EnvFilter, Registry};

/// Logging mode for different use cases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggingMode {
    /// No subscriber installed
    Silent,
    /// Compact stderr output
    Development,
    /// Verbose diagnostics with source locations
    Debug,
}

/// Logging configuration error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracingInit(String),
}

/// Initialize logging with the specified mode
///
/// Call once, early, before the control loop starts.
///
/// # Environment Variables
///
/// - `INKFRAME_LOG_LEVEL`: filter directive (e.g. `debug`, `api_client=trace`)
/// - `RUST_LOG`: used when `INKFRAME_LOG_LEVEL` is unset
pub fn init_logging(mode: LoggingMode) -> Result<(), LoggingError> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    match mode {
        LoggingMode::Silent => Ok(()),
        LoggingMode::Development => {
            let subscriber = Registry::default()
                .with(
                    fmt::layer()
                        .with_target(false)
                        .with_thread_ids(false)
                        .with_file(false)
                        .with_line_number(false)
                        .compact(),
                )
                .with(create_env_filter("info"));

            subscriber
                .try_init()
                .map_err(|e| LoggingError::TracingInit(e.to_string()))
        }
        LoggingMode::Debug => {
            let subscriber = Registry::default()
                .with(
                    fmt::layer()
                        .pretty()
                        .with_thread_ids(true)
                        .with_file(true)
                        .with_line_number(true),
                )
                .with(create_env_filter("debug"));

            subscriber
                .try_init()
                .map_err(|e| LoggingError::TracingInit(e.to_string()))
        }
    }
}

/// Parse a mode name as used by `INKFRAME_LOG_MODE` and the agent's CLI
///
/// Unknown names map to `Development`.
pub fn mode_from_name(name: &str) -> LoggingMode {
    match name.to_ascii_lowercase().as_str() {
        "silent" => LoggingMode::Silent,
        "debug" => LoggingMode::Debug,
        _ => LoggingMode::Development,
    }
}

/// Initialize logging from `INKFRAME_LOG_MODE` (silent, development, debug)
///
/// Defaults to `Development` when the variable is unset.
pub fn init_logging_from_env() -> Result<(), LoggingError> {
    let mode = std::env::var("INKFRAME_LOG_MODE")
        .map(|name| mode_from_name(&name))
        .unwrap_or(LoggingMode::Development);

    init_logging(mode)
}

fn create_env_filter(default_level: &str) -> EnvFilter {
    if let Ok(level) = std::env::var("INKFRAME_LOG_LEVEL") {
        EnvFilter::new(level)
    } else if let Ok(rust_log) = std::env::var("RUST_LOG") {
        EnvFilter::new(rust_log)
    } else {
        EnvFilter::new(default_level)
    }
}

/// Check if a global subscriber has been installed
pub fn is_initialized() -> bool {
    tracing::dispatcher::has_been_set()
}
