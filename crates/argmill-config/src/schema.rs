//! Configuration sections.

use serde::{Deserialize, Serialize};

/// Log levels accepted by [`LoggingSection::level`].
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Parser behaviour on failure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ParserSection {
    /// Terminate the process when an invocation fails and no failure sink is
    /// registered.
    #[serde(default = "default_true")]
    pub exit_process: bool,
}

impl Default for ParserSection {
    fn default() -> Self {
        Self { exit_process: true }
    }
}

/// Log format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON formatted logs.
    Json,
    /// Human-readable pretty format.
    #[default]
    Pretty,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include source file and line in logs.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            include_location: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

/// Named middleware registered on every parser built from configuration.
///
/// Names are looked up in the application's middleware catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct MiddlewareSection {
    /// Middleware that runs after validation, in order.
    #[serde(default)]
    pub global: Vec<String>,

    /// Middleware that runs before validation, in order.
    #[serde(default)]
    pub before_validation: Vec<String>,
}

impl MiddlewareSection {
    /// Returns `true` if no middleware is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.global.is_empty() && self.before_validation.is_empty()
    }

    /// Iterates over every configured name.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.before_validation
            .iter()
            .chain(&self.global)
            .map(String::as_str)
    }
}
