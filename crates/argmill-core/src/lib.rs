//! # Argmill Core
//!
//! Core types and collaborator traits for the argmill command-line
//! middleware engine.
//!
//! This crate provides the foundational types used throughout argmill:
//!
//! - [`Arguments`] - The argument object shared by one invocation
//! - [`ParserContext`] - Read-only parser handle passed to middleware
//! - [`ArgmillError`] - Standard error types
//! - [`AliasResolver`], [`ValidationStage`], [`Tokenizer`] - Collaborator seams

#![doc(html_root_url = "https://docs.rs/argmill-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod alias;
mod arguments;
mod context;
mod error;
mod tokenizer;
mod validation;

pub use alias::{AliasResolver, AliasTable};
pub use arguments::{Arguments, POSITIONAL_KEY};
pub use context::{InvocationId, ParserContext, ParserContextBuilder};
pub use error::{
    ArgmillError, ArgmillResult, ErrorCategory, INVALID_MIDDLEWARE_MESSAGE,
    SYNCHRONY_VIOLATION_MESSAGE,
};
pub use tokenizer::{DefaultTokenizer, Tokenizer};
pub use validation::{AcceptAll, DemandValidator, ValidationStage};
