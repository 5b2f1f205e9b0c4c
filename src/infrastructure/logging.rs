//! Logging system configuration and initialization
//!
//! This module provides the logging setup with:
//! - Console output and/or a non-blocking log file
//! - Configuration based log level control with `RUST_LOG` override
//! - Structured JSON logging (optional)
//! - Local time stamps

#![allow(clippy::uninlined_format_args)]

use lazy_static::lazy_static;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing::info;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{
    fmt::{self, time::FormatTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

pub use crate::infrastructure::config::LoggingConfig;

// Global guard to keep the log file writer alive
lazy_static! {
    static ref LOG_GUARDS: Mutex<Vec<tracing_appender::non_blocking::WorkerGuard>> =
        Mutex::new(Vec::new());
}

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Failed to create log directory {path:?}: {source}")]
    Directory {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("No logging output configured")]
    NoOutput,

    #[error("Invalid log filter: {0}")]
    Filter(String),

    #[error("Logging already initialized: {0}")]
    AlreadyInitialized(String),
}

/// Local time formatter, millisecond precision
struct LocalTimeFormatter;

impl FormatTime for LocalTimeFormatter {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

/// Resolve the log directory against the working directory
pub fn get_log_directory(config: &LoggingConfig) -> PathBuf {
    if config.directory.is_absolute() {
        config.directory.clone()
    } else {
        std::env::current_dir()
            .unwrap_or_default()
            .join(&config.directory)
    }
}

/// Build the level filter. Dependency noise stays at warn/info unless TRACE is requested.
fn build_filter(level: &str) -> Result<EnvFilter, LoggingError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let mut filter = EnvFilter::try_new(level).map_err(|e| LoggingError::Filter(e.to_string()))?;
    if !level.to_lowercase().contains("trace") {
        for directive in [
            "sqlx::query=warn",
            "sqlx::sqlite=warn",
            "reqwest=info",
            "hyper=warn",
            "hyper_util=warn",
            "h2=warn",
            "html5ever=warn",
            "selectors=warn",
        ] {
            let parsed = directive
                .parse()
                .map_err(|e: tracing_subscriber::filter::ParseError| LoggingError::Filter(e.to_string()))?;
            filter = filter.add_directive(parsed);
        }
    }
    Ok(filter)
}

/// Initialize the logging system with default configuration
pub fn init_logging() -> Result<(), LoggingError> {
    init_logging_with_config(&LoggingConfig::default())
}

/// Initialize logging with custom configuration
///
/// # Environment Variable Override
/// ```bash
/// # Show all SQL statements
/// RUST_LOG="debug,sqlx::query=debug" cargo run
///
/// # Show detailed HTTP logs
/// RUST_LOG="debug,reqwest=debug,hyper=debug" cargo run
/// ```
pub fn init_logging_with_config(config: &LoggingConfig) -> Result<(), LoggingError> {
    if !config.file_output && !config.console_output {
        return Err(LoggingError::NoOutput);
    }

    let filter = build_filter(&config.level)?;
    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

    if config.console_output {
        let console_layer = fmt::Layer::new()
            .with_writer(std::io::stdout)
            .with_timer(LocalTimeFormatter)
            .with_target(false);
        layers.push(console_layer.boxed());
    }

    let log_dir = get_log_directory(config);
    if config.file_output {
        std::fs::create_dir_all(&log_dir).map_err(|source| LoggingError::Directory {
            path: log_dir.clone(),
            source,
        })?;

        let file_appender = rolling::never(&log_dir, &config.file_name);
        let (file_writer, file_guard) = non_blocking(file_appender);
        if let Ok(mut guards) = LOG_GUARDS.lock() {
            guards.push(file_guard);
        }

        if config.json_format {
            let file_layer = fmt::Layer::new()
                .json()
                .with_writer(file_writer)
                .with_timer(LocalTimeFormatter)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_ansi(false);
            layers.push(file_layer.boxed());
        } else {
            let file_layer = fmt::Layer::new()
                .with_writer(file_writer)
                .with_timer(LocalTimeFormatter)
                .with_target(false)
                .with_ansi(false);
            layers.push(file_layer.boxed());
        }
    }

    Registry::default()
        .with(layers)
        .with(filter)
        .try_init()
        .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))?;

    info!("Logging system initialized");
    info!("Log level: {}", config.level);
    if config.file_output {
        info!("Log file: {:?}", log_dir.join(&config.file_name));
    }
    Ok(())
}

/// Log system information for diagnostics
pub fn log_system_info(config_path: Option<&Path>) {
    info!("=== Salary Crawler ===");
    info!("Application version: {}", env!("CARGO_PKG_VERSION"));
    info!("Operating system: {}", std::env::consts::OS);
    if let Ok(current_dir) = std::env::current_dir() {
        info!("Working directory: {:?}", current_dir);
    }
    match config_path {
        Some(path) => info!("Configuration: {:?}", path),
        None => info!("Configuration: defaults"),
    }
}
