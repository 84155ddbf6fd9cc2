//! Failure routing.
//!
//! Execution-time failures are delivered to a single [`FailureSink`]. When
//! none is registered the process terminates, unless exiting has been turned
//! off with [`Parser::exit_process`](crate::Parser::exit_process); the error
//! is then only returned to the caller.
//!
//! | Error                 | Sink arguments          |
//! |-----------------------|-------------------------|
//! | `Validation`          | `(Some(message), None)` |
//! | `SynchronyViolation`  | `(None, Some(error))`   |
//! | `Application`         | `(None, Some(error))`   |

use argmill_core::{ArgmillError, InvocationId};
use argmill_telemetry::log_invocation_failed;
use std::fmt;
use std::sync::Arc;

/// Callback receiving `(message, error)` when an invocation fails.
pub type FailureSink = Arc<dyn Fn(Option<&str>, Option<&ArgmillError>) + Send + Sync + 'static>;

/// Delivers invocation failures according to the parser's policy.
#[derive(Clone)]
pub struct FailureRouter {
    sink: Option<FailureSink>,
    exit_process: bool,
}

impl FailureRouter {
    /// Creates a router with no sink that exits the process on failure.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sink: None,
            exit_process: true,
        }
    }

    /// Registers the failure sink, replacing any previous one.
    pub fn set_sink(&mut self, sink: FailureSink) {
        self.sink = Some(sink);
    }

    /// Sets whether a failure without a sink terminates the process.
    pub fn set_exit_process(&mut self, exit_process: bool) {
        self.exit_process = exit_process;
    }

    /// Returns `true` if a sink is registered.
    #[must_use]
    pub fn has_sink(&self) -> bool {
        self.sink.is_some()
    }

    /// Returns `true` if a failure without a sink terminates the process.
    #[must_use]
    pub fn exits_process(&self) -> bool {
        self.exit_process
    }

    /// Splits an error into the sink's `(message, error)` pair.
    #[must_use]
    pub fn sink_arguments(error: &ArgmillError) -> (Option<&str>, Option<&ArgmillError>) {
        match error.usage_message() {
            Some(message) => (Some(message), None),
            None => (None, Some(error)),
        }
    }

    /// Delivers `error`.
    ///
    /// Calls the sink if one is registered. Otherwise, when exiting is
    /// enabled, logs the error, prints it to stderr and exits with the
    /// category's status code.
    pub fn route(&self, invocation: InvocationId, error: &ArgmillError) {
        if let Some(sink) = &self.sink {
            tracing::debug!(
                invocation = %invocation,
                category = ?error.category(),
                "delivering failure to sink"
            );
            let (message, error) = Self::sink_arguments(error);
            sink(message, error);
            return;
        }

        if self.exit_process {
            log_invocation_failed!(invocation, error);
            eprintln!("{error}");
            std::process::exit(error.category().exit_code());
        }

        tracing::debug!(
            invocation = %invocation,
            error = %error,
            "no failure sink; returning error to caller"
        );
    }
}

impl Default for FailureRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FailureRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FailureRouter")
            .field("has_sink", &self.has_sink())
            .field("exit_process", &self.exit_process)
            .finish()
    }
}
