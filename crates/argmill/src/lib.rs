//! # Argmill
//!
//! **Command-line argument parsing with a composable middleware chain**
//!
//! Argmill turns an argv vector into an argument object, routes it to a
//! command handler and runs user callbacks ("middleware") in between:
//!
//! - **Global and per-command middleware**: global entries apply to every
//!   invocation; command entries apply to that command and its descendants
//! - **Before or after validation**: pre-validation middleware can fill in
//!   demanded options; post-validation middleware sees validated input
//! - **Deferred work**: after validation, middleware and handlers may return
//!   futures, which run strictly in order
//! - **Single failure path**: validation and execution errors reach one sink
//!
//! ## Quick Start
//!
//! ```
//! use argmill::prelude::*;
//!
//! let mut parser = Parser::new();
//! parser
//!     .exit_process(false)
//!     .middleware(Callback::new(|args: &mut Arguments, _: &ParserContext| {
//!         args.set("user", "ops");
//!     }))
//!     .unwrap()
//!     .command(
//!         "deploy <target>",
//!         "deploy a build",
//!         |scope| {
//!             scope.alias("force", "f");
//!             Ok(())
//!         },
//!         |args: &mut Arguments, _: &ParserContext| {
//!             args.set("deployed", true);
//!         },
//!     )
//!     .unwrap();
//!
//! let args = parser
//!     .parse(["deploy", "staging", "-f"])
//!     .unwrap()
//!     .into_resolved()
//!     .unwrap();
//!
//! assert_eq!(args.get_str("target"), Some("staging"));
//! assert_eq!(args.get_bool("force"), Some(true));
//! assert_eq!(args.get_str("user"), Some("ops"));
//! assert_eq!(args.get_bool("deployed"), Some(true));
//! ```
//!
//! ## Architecture
//!
//! ```text
//! argv → Tokenizer → Dispatcher → AliasResolver → ExecutionEngine → Resolution
//!                        │                              │
//!                 command tree + global registry        └─ failure → FailureSink
//! ```

#![doc(html_root_url = "https://docs.rs/argmill/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod command;
mod dispatcher;
mod failure;
mod parser;

pub use command::{CommandNode, CommandScope, Placeholder};
pub use dispatcher::{Dispatcher, Route};
pub use failure::{FailureRouter, FailureSink};
pub use parser::Parser;

// Re-export core types
pub use argmill_core as core;

// Re-export middleware types
pub use argmill_middleware as middleware;

// Re-export configuration
pub use argmill_config as config;

// Re-export logging setup
pub use argmill_telemetry as telemetry;

pub use argmill_core::{ArgmillError, ArgmillResult, Arguments, ParserContext};
pub use argmill_middleware::{Callback, MiddlewareOutcome, Resolution};

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```
/// use argmill::prelude::*;
///
/// let parser = Parser::new();
/// assert!(parser.commands().is_empty());
/// ```
pub mod prelude {
    pub use crate::{CommandScope, Parser};

    pub use argmill_core::{
        AliasResolver, ArgmillError, ArgmillResult, Arguments, ParserContext, Tokenizer,
        ValidationStage,
    };

    pub use argmill_middleware::{
        Callback, Callbacks, Middleware, MiddlewareCatalog, MiddlewareOutcome, Resolution,
    };

    pub use argmill_config::{ArgmillConfig, ConfigLoader};
}
