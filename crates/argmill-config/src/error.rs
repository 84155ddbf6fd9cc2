//! Errors raised while loading or validating parser configuration.

use std::path::PathBuf;
use thiserror::Error;

/// A configuration layer could not be applied, or the result is invalid.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required configuration file does not exist.
    #[error("no configuration file at {path}")]
    Missing {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// A configuration file exists but could not be read.
    #[error("cannot read configuration file {path}")]
    Read {
        /// Path of the file.
        path: PathBuf,
        /// I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The layer is neither TOML nor JSON.
    #[error("unsupported configuration format `{format}` (expected toml or json)")]
    UnsupportedFormat {
        /// Extension or format name that was given.
        format: String,
    },

    /// A TOML layer does not parse.
    #[error("malformed TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// A JSON layer does not parse, or the merged layers do not fit the
    /// schema (unknown keys, wrong types).
    #[error("malformed configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// A `.env` file exists but could not be parsed.
    #[error("cannot load .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),

    /// An environment override has an unusable value.
    #[error("environment override {var}: {reason}")]
    EnvVar {
        /// Full variable name.
        var: String,
        /// What was expected.
        reason: String,
    },

    /// A field holds a value outside its allowed set.
    #[error("invalid value for {field}: {reason}")]
    InvalidValue {
        /// Dotted field path, e.g. `logging.level`.
        field: String,
        /// What is wrong with it.
        reason: String,
    },
}

impl ConfigError {
    /// A required file is absent.
    pub fn missing(path: impl Into<PathBuf>) -> Self {
        Self::Missing { path: path.into() }
    }

    /// A file could not be read.
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// A layer's format is not supported.
    pub fn unsupported_format(format: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            format: format.into(),
        }
    }

    /// An environment override is unusable.
    pub fn env_var(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EnvVar {
            var: var.into(),
            reason: reason.into(),
        }
    }

    /// A field value is not allowed.
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
