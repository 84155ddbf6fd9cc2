//! Typed configuration system for argmill.
//!
//! This crate provides strongly-typed configuration for an argmill parser
//! with support for:
//! - TOML and JSON configuration files
//! - Environment variable overrides
//! - Strict validation (fails on unknown fields)
//! - Layered configuration (defaults → file → env)
//!
//! # Overview
//!
//! The configuration system is built around the [`ArgmillConfig`] struct:
//!
//! - [`ParserSection`] - Failure handling policy
//! - [`LoggingSection`] - Structured logging settings
//! - [`MiddlewareSection`] - Named middleware registered on every parser
//!
//! # Example
//!
//! ```no_run
//! use argmill_config::{ArgmillConfig, ConfigLoader};
//!
//! # fn main() -> Result<(), argmill_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_defaults()
//!     .with_file("argmill.toml")?
//!     .with_env_prefix("ARGMILL")
//!     .load()?;
//!
//! println!("exit on failure: {}", config.parser.exit_process);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [parser]
//! exit_process = false
//!
//! [logging]
//! enabled = true
//! level = "debug"
//! format = "pretty"
//!
//! [middleware]
//! global = ["normalize-paths"]
//! before_validation = ["load-defaults"]
//! ```
//!
//! # Environment Variable Overrides
//!
//! Values can be overridden via environment variables using the format
//! `PREFIX__SECTION__KEY`. Lists are comma-separated. For example:
//!
//! - `ARGMILL__PARSER__EXIT_PROCESS=false`
//! - `ARGMILL__LOGGING__LEVEL=trace`
//! - `ARGMILL__MIDDLEWARE__GLOBAL=normalize-paths,stamp`

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::*;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;
