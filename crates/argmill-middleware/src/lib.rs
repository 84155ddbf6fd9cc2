//! # Argmill Middleware
//!
//! Middleware registration and execution for the argmill command-line
//! processor.
//!
//! Middleware are callbacks that run between tokenizing the command line and
//! invoking a command handler. Each one receives the argument object of the
//! current invocation and may mutate it, return a patch, or return deferred
//! work.
//!
//! ## Execution Order
//!
//! ```text
//! argv → tokenize → aliases → before-validation middleware → validation
//!                                                              ↓
//!                 handler ← after-validation middleware ←──────┘
//! ```
//!
//! The chain for one invocation is the global registry followed by the
//! registry of every command on the resolved path, outermost first. It is
//! rebuilt for every invocation; no registry is ever modified by a run.
//!
//! ## Synchrony
//!
//! - Before validation, every middleware must complete synchronously.
//!   Deferred work there fails with [`ArgmillError::SynchronyViolation`].
//! - After validation, the first deferred outcome turns the rest of the run
//!   into a [`Resolution::Deferred`]; later middleware and the handler still
//!   run strictly in order.
//!
//! ## Example
//!
//! ```
//! use argmill_middleware::{Phase, Resolution};
//!
//! assert_eq!(Phase::Validating.name(), "validating");
//! assert!(!Resolution::Resolved(()).is_deferred());
//! ```
//!
//! [`ArgmillError::SynchronyViolation`]: argmill_core::ArgmillError::SynchronyViolation

#![doc(html_root_url = "https://docs.rs/argmill-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod chain;
pub mod middleware;
pub mod pipeline;
pub mod registry;
pub mod types;

// Re-export main types at crate root
pub use chain::{ExecutionChain, ExecutionChainBuilder};
pub use middleware::{
    Callback, Callbacks, DeferredPatch, EntryId, FnMiddleware, IntoOutcome, IntoPatch,
    Middleware, MiddlewareCatalog, MiddlewareEntry, MiddlewareOutcome,
};
pub use pipeline::{ExecutionEngine, ExecutionEngineBuilder, Handler, Phase, PhaseObserver};
pub use registry::{MiddlewareFactory, MiddlewareRegistry};
pub use types::{BoxFuture, Resolution};
