//! Execution engine.
//!
//! This module runs an [`ExecutionChain`] against the arguments of one
//! invocation. The engine is an explicit state machine:
//!
//! ```text
//! Idle → RunningPreValidation → Validating → RunningPostValidation → Handling → Done
//!              │                    │                 │                  │
//!              └────────────────────┴─────────────────┴──────────────────┴──→ Failed
//! ```
//!
//! Entries run strictly in order. Before validation every entry must finish
//! synchronously. After validation the first deferred outcome switches the
//! remainder of the run (later entries and the handler) into a single future
//! that awaits each step in turn.

use crate::chain::ExecutionChain;
use crate::middleware::{DeferredPatch, MiddlewareEntry, MiddlewareOutcome, Middleware};
use crate::types::Resolution;
use argmill_core::{
    AcceptAll, ArgmillError, ArgmillResult, Arguments, InvocationId, ParserContext,
    ValidationStage,
};
use std::fmt;
use std::sync::Arc;

/// The command handler invoked once the chain completes.
pub type Handler = Arc<dyn Middleware>;

/// Callback notified on every phase transition.
pub type PhaseObserver = Arc<dyn Fn(Phase) + Send + Sync + 'static>;

/// States of the execution engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Phase {
    /// Nothing has run yet.
    Idle = 0,
    /// Running the before-validation partition.
    RunningPreValidation = 1,
    /// Handing the arguments to the validation stage.
    Validating = 2,
    /// Running the after-validation partition.
    RunningPostValidation = 3,
    /// Running the command handler.
    Handling = 4,
    /// Finished successfully.
    Done = 5,
    /// Aborted; absorbing.
    Failed = 6,
}

impl Phase {
    /// Returns the phase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::RunningPreValidation => "running_pre_validation",
            Self::Validating => "validating",
            Self::RunningPostValidation => "running_post_validation",
            Self::Handling => "handling",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    /// Returns true for `Done` and `Failed`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Returns true between `Idle` and a terminal phase.
    #[must_use]
    pub const fn is_running(self) -> bool {
        !self.is_terminal() && !matches!(self, Self::Idle)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Tracks the current phase and reports transitions.
struct Machine {
    phase: Phase,
    invocation: InvocationId,
    observer: Option<PhaseObserver>,
}

impl Machine {
    fn new(invocation: InvocationId, observer: Option<PhaseObserver>) -> Self {
        Self {
            phase: Phase::Idle,
            invocation,
            observer,
        }
    }

    fn advance(&mut self, next: Phase) {
        debug_assert!(!self.phase.is_terminal(), "engine already finished");
        tracing::debug!(
            invocation = %self.invocation,
            from = %self.phase,
            to = %next,
            "middleware engine transition"
        );
        self.phase = next;
        if let Some(observer) = &self.observer {
            observer(next);
        }
    }

    fn fail(&mut self, error: ArgmillError) -> ArgmillError {
        tracing::warn!(
            invocation = %self.invocation,
            phase = %self.phase,
            error = %error,
            "middleware chain failed"
        );
        self.advance(Phase::Failed);
        error
    }

    fn guard<T>(&mut self, result: ArgmillResult<T>) -> ArgmillResult<T> {
        result.map_err(|error| self.fail(error))
    }
}

/// Result of applying one outcome.
enum Step {
    Continue,
    Suspend(DeferredPatch),
}

fn apply(args: &mut Arguments, outcome: MiddlewareOutcome) -> Step {
    match outcome {
        MiddlewareOutcome::Unchanged => Step::Continue,
        MiddlewareOutcome::Merge(patch) => {
            args.merge(patch);
            Step::Continue
        }
        MiddlewareOutcome::Deferred(future) => Step::Suspend(future),
    }
}

async fn settle(
    machine: &mut Machine,
    args: &mut Arguments,
    pending: DeferredPatch,
) -> ArgmillResult<()> {
    let patch = machine.guard(pending.await.map_err(ArgmillError::Application))?;
    if let Some(patch) = patch {
        args.merge(patch);
    }
    Ok(())
}

/// Runs a chain, validation and a handler for one invocation.
///
/// # Example
///
/// ```
/// use argmill_core::{Arguments, ParserContext};
/// use argmill_middleware::{
///     Callback, ExecutionChain, ExecutionEngine, MiddlewareCatalog, MiddlewareFactory,
///     MiddlewareRegistry,
/// };
///
/// let catalog = MiddlewareCatalog::new();
/// let mut global = MiddlewareRegistry::new();
/// MiddlewareFactory::new(&mut global, &catalog)
///     .register(Callback::new(|args: &mut Arguments, _: &ParserContext| {
///         args.set("mw", "mw");
///     }), false)
///     .unwrap();
///
/// let engine = ExecutionEngine::builder()
///     .chain(ExecutionChain::from_registries([&global]))
///     .build();
///
/// let ctx = ParserContext::builder().build();
/// let args = engine.run(Arguments::new(), &ctx).unwrap().into_resolved().unwrap();
/// assert_eq!(args.get_str("mw"), Some("mw"));
/// ```
pub struct ExecutionEngine {
    chain: ExecutionChain,
    validator: Arc<dyn ValidationStage>,
    handler: Option<Handler>,
    observer: Option<PhaseObserver>,
}

impl ExecutionEngine {
    /// Creates an engine builder.
    #[must_use]
    pub fn builder() -> ExecutionEngineBuilder {
        ExecutionEngineBuilder::new()
    }

    /// Returns the chain this engine will run.
    #[must_use]
    pub fn chain(&self) -> &ExecutionChain {
        &self.chain
    }

    /// Runs the invocation.
    ///
    /// Returns `Resolution::Resolved` when everything completed synchronously
    /// and `Resolution::Deferred` once any entry or the handler produced
    /// deferred work; the deferred value resolves after the handler finishes.
    ///
    /// # Errors
    ///
    /// - [`ArgmillError::SynchronyViolation`] if a before-validation entry
    ///   returns deferred work
    /// - [`ArgmillError::Validation`] if the validation stage rejects the
    ///   arguments
    /// - [`ArgmillError::Application`] if an entry or the handler fails
    pub fn run(
        self,
        mut args: Arguments,
        ctx: &ParserContext,
    ) -> ArgmillResult<Resolution<Arguments>> {
        let mut machine = Machine::new(ctx.invocation_id(), self.observer.clone());
        let (pre, post) = self.chain.partition();

        tracing::debug!(
            invocation = %ctx.invocation_id(),
            before_validation = pre.len(),
            after_validation = post.len(),
            handler = self.handler.is_some(),
            "running middleware chain"
        );

        machine.advance(Phase::RunningPreValidation);
        for entry in &pre {
            let outcome = machine.guard(entry.invoke(&mut args, ctx))?;
            if let Step::Suspend(_) = apply(&mut args, outcome) {
                return Err(machine.fail(ArgmillError::synchrony_violation(entry.id().get())));
            }
        }

        machine.advance(Phase::Validating);
        machine.guard(self.validator.validate(&args, ctx))?;

        machine.advance(Phase::RunningPostValidation);
        let mut remaining = post.into_iter();
        while let Some(entry) = remaining.next() {
            let outcome = machine.guard(entry.invoke(&mut args, ctx))?;
            if let Step::Suspend(pending) = apply(&mut args, outcome) {
                tracing::debug!(
                    invocation = %ctx.invocation_id(),
                    entry = %entry.id(),
                    "middleware deferred; continuing asynchronously"
                );
                let rest: Vec<Arc<MiddlewareEntry>> = remaining.collect();
                return Ok(Resolution::Deferred(Box::pin(finish_deferred(
                    machine,
                    pending,
                    rest,
                    self.handler,
                    args,
                    ctx.clone(),
                ))));
            }
        }

        machine.advance(Phase::Handling);
        if let Some(handler) = &self.handler {
            let outcome = machine.guard(handler.call(&mut args, ctx).map_err(ArgmillError::Application))?;
            if let Step::Suspend(pending) = apply(&mut args, outcome) {
                return Ok(Resolution::Deferred(Box::pin(async move {
                    settle(&mut machine, &mut args, pending).await?;
                    machine.advance(Phase::Done);
                    Ok(args)
                })));
            }
        }

        machine.advance(Phase::Done);
        Ok(Resolution::Resolved(args))
    }
}

async fn finish_deferred(
    mut machine: Machine,
    pending: DeferredPatch,
    rest: Vec<Arc<MiddlewareEntry>>,
    handler: Option<Handler>,
    mut args: Arguments,
    ctx: ParserContext,
) -> ArgmillResult<Arguments> {
    settle(&mut machine, &mut args, pending).await?;

    for entry in rest {
        let outcome = machine.guard(entry.invoke(&mut args, &ctx))?;
        if let Step::Suspend(pending) = apply(&mut args, outcome) {
            settle(&mut machine, &mut args, pending).await?;
        }
    }

    machine.advance(Phase::Handling);
    if let Some(handler) = handler {
        let outcome =
            machine.guard(handler.call(&mut args, &ctx).map_err(ArgmillError::Application))?;
        if let Step::Suspend(pending) = apply(&mut args, outcome) {
            settle(&mut machine, &mut args, pending).await?;
        }
    }

    machine.advance(Phase::Done);
    Ok(args)
}

impl fmt::Debug for ExecutionEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionEngine")
            .field("chain", &self.chain)
            .field("handler", &self.handler.as_ref().map(|h| h.name().to_string()))
            .finish_non_exhaustive()
    }
}

/// Builder for [`ExecutionEngine`].
pub struct ExecutionEngineBuilder {
    chain: ExecutionChain,
    validator: Arc<dyn ValidationStage>,
    handler: Option<Handler>,
    observer: Option<PhaseObserver>,
}

impl ExecutionEngineBuilder {
    /// Creates a builder with an empty chain, no handler and a validator
    /// that accepts everything.
    #[must_use]
    pub fn new() -> Self {
        Self {
            chain: ExecutionChain::default(),
            validator: Arc::new(AcceptAll),
            handler: None,
            observer: None,
        }
    }

    /// Sets the chain to run.
    #[must_use]
    pub fn chain(mut self, chain: ExecutionChain) -> Self {
        self.chain = chain;
        self
    }

    /// Sets the validation stage.
    #[must_use]
    pub fn validator(mut self, validator: Arc<dyn ValidationStage>) -> Self {
        self.validator = validator;
        self
    }

    /// Sets the command handler.
    #[must_use]
    pub fn handler(mut self, handler: Option<Handler>) -> Self {
        self.handler = handler;
        self
    }

    /// Sets a callback notified on every phase transition.
    #[must_use]
    pub fn observer(mut self, observer: PhaseObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Builds the engine.
    #[must_use]
    pub fn build(self) -> ExecutionEngine {
        ExecutionEngine {
            chain: self.chain,
            validator: self.validator,
            handler: self.handler,
            observer: self.observer,
        }
    }
}

impl Default for ExecutionEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
