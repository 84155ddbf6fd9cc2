//! Error types for argmill.
//!
//! This module provides the [`ArgmillError`] type, which is the standard error
//! type used throughout the argmill crates.
//!
//! # Error taxonomy
//!
//! | Variant              | Raised                   | Routed to failure sink as |
//! |----------------------|--------------------------|---------------------------|
//! | `InvalidMiddleware`  | at registration          | never (returned directly) |
//! | `SynchronyViolation` | before validation        | `(None, Some(err))`       |
//! | `Validation`         | by the validation stage  | `(Some(message), None)`   |
//! | `Application`        | by middleware / handler  | `(None, Some(err))`       |
//! | `Config`             | when building a parser   | never (returned directly) |

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using [`ArgmillError`].
pub type ArgmillResult<T> = Result<T, ArgmillError>;

/// Message used when a deferred outcome is produced before validation.
pub const SYNCHRONY_VIOLATION_MESSAGE: &str =
    "middleware cannot return a promise when applyBeforeValidation is true";

/// Message used when a registered callback cannot be invoked.
pub const INVALID_MIDDLEWARE_MESSAGE: &str = "middleware must be a function";

/// Categories of errors for classification and routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Programmer error discovered while configuring a parser.
    Configuration,
    /// A before-validation middleware produced deferred work.
    Synchrony,
    /// The user's input failed validation.
    Validation,
    /// A middleware action or command handler failed.
    Application,
}

impl ErrorCategory {
    /// Returns `true` if errors of this category are raised during execution
    /// and therefore go through the failure sink.
    #[must_use]
    pub const fn is_execution_error(&self) -> bool {
        !matches!(self, Self::Configuration)
    }

    /// Returns the process exit status used when no failure sink is set.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Configuration | Self::Synchrony => 2,
            Self::Validation | Self::Application => 1,
        }
    }
}

/// Standard error type for argmill.
///
/// # Example
///
/// ```
/// use argmill_core::{ArgmillError, ErrorCategory};
///
/// let err = ArgmillError::validation_missing(["mw"]);
/// assert_eq!(err.category(), ErrorCategory::Validation);
/// assert_eq!(err.to_string(), "Missing required argument: mw");
/// ```
#[derive(Error, Debug)]
pub enum ArgmillError {
    /// A registered callback is not invocable.
    #[error("{reason}")]
    InvalidMiddleware {
        /// Human-readable reason.
        reason: String,
        /// Position of the offending element in the registered list.
        position: usize,
    },

    /// A before-validation middleware returned deferred work.
    #[error("{}", SYNCHRONY_VIOLATION_MESSAGE)]
    SynchronyViolation {
        /// Identifier of the offending middleware entry.
        entry: u64,
    },

    /// The validation stage rejected the arguments.
    #[error("{message}")]
    Validation {
        /// Usage message shown to the user.
        message: String,
        /// Options that were demanded but absent.
        missing: Vec<String>,
    },

    /// A middleware action or handler failed.
    #[error(transparent)]
    Application(anyhow::Error),

    /// The parser could not be built from configuration.
    #[error("invalid parser configuration: {0}")]
    Config(String),
}

impl ArgmillError {
    /// Creates an invalid-middleware error for the element at `position`.
    #[must_use]
    pub fn invalid_middleware(position: usize) -> Self {
        Self::InvalidMiddleware {
            reason: INVALID_MIDDLEWARE_MESSAGE.to_string(),
            position,
        }
    }

    /// Creates a synchrony violation for the given entry.
    #[must_use]
    pub const fn synchrony_violation(entry: u64) -> Self {
        Self::SynchronyViolation { entry }
    }

    /// Creates a free-form validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            missing: Vec::new(),
        }
    }

    /// Creates a validation error listing missing demanded options.
    #[must_use]
    pub fn validation_missing<I, S>(missing: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let missing: Vec<String> = missing.into_iter().map(Into::into).collect();
        let message = if missing.len() == 1 {
            format!("Missing required argument: {}", missing[0])
        } else {
            format!("Missing required arguments: {}", missing.join(", "))
        };
        Self::Validation { message, missing }
    }

    /// Wraps an application error raised by middleware or a handler.
    pub fn application(source: impl Into<anyhow::Error>) -> Self {
        Self::Application(source.into())
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidMiddleware { .. } | Self::Config(_) => ErrorCategory::Configuration,
            Self::SynchronyViolation { .. } => ErrorCategory::Synchrony,
            Self::Validation { .. } => ErrorCategory::Validation,
            Self::Application(_) => ErrorCategory::Application,
        }
    }

    /// Returns the usage message, present only for validation failures.
    #[must_use]
    pub fn usage_message(&self) -> Option<&str> {
        match self {
            Self::Validation { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Returns the underlying application error, if any.
    #[must_use]
    pub fn as_application(&self) -> Option<&anyhow::Error> {
        match self {
            Self::Application(err) => Some(err),
            _ => None,
        }
    }
}
