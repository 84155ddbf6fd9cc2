//! Main configuration types.
//!
//! This module provides the top-level [`ArgmillConfig`] struct and its builder.

use serde::{Deserialize, Serialize};

use crate::{LogFormat, LoggingSection, MiddlewareSection, ParserSection, LOG_LEVELS};

/// Complete argmill configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load configuration from files
/// and environment variables.
///
/// # Example
///
/// ```
/// use argmill_config::ArgmillConfig;
///
/// let config = ArgmillConfig::default();
/// assert!(config.parser.exit_process);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct ArgmillConfig {
    /// Parser failure policy.
    #[serde(default)]
    pub parser: ParserSection,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSection,

    /// Middleware registered by name.
    #[serde(default)]
    pub middleware: MiddlewareSection,
}

impl ArgmillConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> ArgmillConfigBuilder {
        ArgmillConfigBuilder::new()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - The log level is not one of [`LOG_LEVELS`]
    /// - A middleware name is empty
    pub fn validate(&self) -> Result<(), crate::ConfigError> {
        let level = self.logging.level.to_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(crate::ConfigError::invalid_value(
                "logging.level",
                format!("unknown level: {}", self.logging.level),
            ));
        }

        for (field, names) in [
            ("middleware.before_validation", &self.middleware.before_validation),
            ("middleware.global", &self.middleware.global),
        ] {
            if names.iter().any(|name| name.trim().is_empty()) {
                return Err(crate::ConfigError::invalid_value(field, "empty middleware name"));
            }
        }

        Ok(())
    }

    /// Create a development configuration preset.
    ///
    /// Debug level, pretty output with source locations, and failures are
    /// returned instead of terminating the process.
    ///
    /// # Example
    ///
    /// ```
    /// use argmill_config::ArgmillConfig;
    ///
    /// let config = ArgmillConfig::development();
    /// assert_eq!(config.logging.level, "debug");
    /// assert!(!config.parser.exit_process);
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config.logging.include_location = true;
        config.parser.exit_process = false;
        config
    }

    /// Create a production configuration preset.
    ///
    /// # Example
    ///
    /// ```
    /// use argmill_config::{ArgmillConfig, LogFormat};
    ///
    /// let config = ArgmillConfig::production();
    /// assert_eq!(config.logging.format, LogFormat::Json);
    /// ```
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();
        config.logging.level = "warn".to_string();
        config.logging.format = LogFormat::Json;
        config
    }
}

/// Builder for [`ArgmillConfig`].
#[derive(Debug, Default)]
pub struct ArgmillConfigBuilder {
    parser: Option<ParserSection>,
    logging: Option<LoggingSection>,
    middleware: Option<MiddlewareSection>,
}

impl ArgmillConfigBuilder {
    /// Create a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the parser section.
    #[must_use]
    pub fn parser(mut self, parser: ParserSection) -> Self {
        self.parser = Some(parser);
        self
    }

    /// Set the logging section.
    #[must_use]
    pub fn logging(mut self, logging: LoggingSection) -> Self {
        self.logging = Some(logging);
        self
    }

    /// Set the middleware section.
    #[must_use]
    pub fn middleware(mut self, middleware: MiddlewareSection) -> Self {
        self.middleware = Some(middleware);
        self
    }

    /// Build the configuration; unset sections use their defaults.
    #[must_use]
    pub fn build(self) -> ArgmillConfig {
        ArgmillConfig {
            parser: self.parser.unwrap_or_default(),
            logging: self.logging.unwrap_or_default(),
            middleware: self.middleware.unwrap_or_default(),
        }
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if validation fails.
    pub fn build_validated(self) -> Result<ArgmillConfig, crate::ConfigError> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}
