//! Structured logging for argmill.
//!
//! Every argmill crate logs through `tracing`. This crate installs a
//! `tracing-subscriber` pipeline for applications that want to see those
//! events: pretty output while developing, JSON lines in production. Output
//! goes to stderr so it never mixes with a command's own stdout.
//!
//! # Example
//!
//! ```rust,ignore
//! use argmill_config::ConfigLoader;
//! use argmill_telemetry::{init_logging, LogConfig};
//!
//! let config = ConfigLoader::new().with_env_prefix("ARGMILL").load()?;
//! init_logging(&LogConfig::from(&config.logging))?;
//!
//! tracing::info!(command = "build", "starting");
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, fields, init_logging, LogConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
