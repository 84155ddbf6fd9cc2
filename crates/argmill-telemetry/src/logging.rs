//! Structured logging for argmill.
//!
//! This module wires the `tracing` events emitted by the parser, the
//! middleware registry and the execution engine into a `tracing-subscriber`
//! formatter.
//!
//! # Features
//!
//! - JSON or pretty output on stderr
//! - `RUST_LOG`-style filter directives
//! - Standard field names for invocation and middleware events
//!
//! # Example
//!
//! ```rust,ignore
//! use argmill_telemetry::logging::{LogConfig, init_logging};
//!
//! init_logging(&LogConfig::development())?;
//!
//! tracing::debug!(invocation = "inv-1", "running middleware chain");
//! ```

use crate::error::TelemetryError;
use crate::TelemetryResult;
use argmill_config::{LogFormat, LoggingSection};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Whether logging is enabled.
    pub enabled: bool,

    /// Filter directive (e.g., "info", "argmill_middleware=trace").
    pub level: String,

    /// Whether to output JSON format.
    pub json_format: bool,

    /// Whether to include file/line info.
    pub file_line_info: bool,

    /// Whether to include target (module path).
    pub include_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            json_format: false,
            file_line_info: false,
            include_target: true,
        }
    }
}

impl LogConfig {
    /// Creates a development configuration with human-readable output.
    #[must_use]
    pub fn development() -> Self {
        Self {
            enabled: true,
            level: "debug".to_string(),
            json_format: false,
            file_line_info: true,
            include_target: true,
        }
    }

    /// Creates a production configuration with JSON output.
    #[must_use]
    pub fn production() -> Self {
        Self {
            enabled: true,
            level: "warn".to_string(),
            json_format: true,
            file_line_info: false,
            include_target: true,
        }
    }
}

impl From<&LoggingSection> for LogConfig {
    fn from(section: &LoggingSection) -> Self {
        Self {
            enabled: section.enabled,
            level: section.level.to_lowercase(),
            json_format: section.format == LogFormat::Json,
            file_line_info: section.include_location,
            include_target: true,
        }
    }
}

/// Initializes the global logging subscriber.
///
/// Does nothing when `config.enabled` is false.
///
/// # Errors
///
/// Returns `TelemetryError::InvalidFilter` if the level is not a valid
/// filter directive, and `TelemetryError::LoggingInit` if a global
/// subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let filter = create_env_filter(&config.level)?;

    if config.json_format {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_file(config.file_line_info)
            .with_line_number(config.file_line_info)
            .with_target(config.include_target)
            .with_filter(filter);

        tracing_subscriber::registry()
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .pretty()
            .with_writer(std::io::stderr)
            .with_file(config.file_line_info)
            .with_line_number(config.file_line_info)
            .with_target(config.include_target)
            .with_filter(filter);

        tracing_subscriber::registry()
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;
    }

    Ok(())
}

/// Creates an env filter from a directive string.
///
/// # Errors
///
/// Returns `TelemetryError::InvalidFilter` if the directive is invalid.
pub fn create_env_filter(filter: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(filter).map_err(|e| TelemetryError::InvalidFilter(format!("{filter}: {e}")))
}

/// Standard log field names.
pub mod fields {
    /// Invocation ID field name.
    pub const INVOCATION_ID: &str = "invocation";

    /// Middleware entry ID field name.
    pub const ENTRY_ID: &str = "entry";

    /// Resolved command path field name.
    pub const COMMAND_PATH: &str = "command_path";

    /// Engine phase field name.
    pub const PHASE: &str = "phase";

    /// Error field name.
    pub const ERROR: &str = "error";
}

/// Logs the start of an invocation.
#[macro_export]
macro_rules! log_invocation_start {
    ($invocation:expr, $command_path:expr) => {
        tracing::debug!(
            invocation = %$invocation,
            command_path = ?$command_path,
            "invocation started"
        );
    };
}

/// Logs an invocation failure.
#[macro_export]
macro_rules! log_invocation_failed {
    ($invocation:expr, $error:expr) => {
        tracing::error!(
            invocation = %$invocation,
            error = %$error,
            "invocation failed"
        );
    };
}
