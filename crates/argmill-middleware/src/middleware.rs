//! Core middleware trait and types.
//!
//! This module defines the [`Middleware`] trait, the [`MiddlewareOutcome`]
//! an action hands back, and the [`Callback`] values accepted at
//! registration time.
//!
//! # Example
//!
//! ```
//! use argmill_core::{Arguments, ParserContext};
//! use argmill_middleware::{Callback, MiddlewareOutcome};
//!
//! // Mutate in place.
//! let in_place = Callback::new(|args: &mut Arguments, _ctx: &ParserContext| {
//!     args.set("mw", "mw");
//! });
//!
//! // Hand back deferred work; the resolved patch is merged into the arguments.
//! let deferred = Callback::new(|_args: &mut Arguments, _ctx: &ParserContext| {
//!     MiddlewareOutcome::deferred(async {
//!         Ok::<_, anyhow::Error>([("hello", "world")].into_iter().collect::<Arguments>())
//!     })
//! });
//! # let _ = (in_place, deferred);
//! ```

use crate::types::BoxFuture;
use argmill_core::{ArgmillError, ArgmillResult, Arguments, ParserContext};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Deferred work produced by a middleware action.
///
/// Resolves to an optional patch that is merged into the arguments.
pub type DeferredPatch = BoxFuture<'static, anyhow::Result<Option<Arguments>>>;

/// What a middleware action hands back to the engine.
pub enum MiddlewareOutcome {
    /// The arguments were mutated in place, or left alone.
    Unchanged,
    /// Merge this patch into the arguments.
    Merge(Arguments),
    /// Suspend the chain until the future resolves, then merge its patch.
    Deferred(DeferredPatch),
}

impl MiddlewareOutcome {
    /// Creates a deferred outcome from a future.
    ///
    /// The future may resolve to `()` (nothing to merge) or to an
    /// [`Arguments`] patch.
    pub fn deferred<F, T, E>(future: F) -> Self
    where
        F: Future<Output = Result<T, E>> + Send + 'static,
        T: IntoPatch + 'static,
        E: Into<anyhow::Error> + 'static,
    {
        Self::Deferred(Box::pin(async move {
            future.await.map(IntoPatch::into_patch).map_err(Into::into)
        }))
    }

    /// Creates a patch setting a single key.
    pub fn set(key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        let mut patch = Arguments::patch();
        patch.set(key, value);
        Self::Merge(patch)
    }

    /// Returns `true` if this outcome suspends the chain.
    #[must_use]
    pub fn is_deferred(&self) -> bool {
        matches!(self, Self::Deferred(_))
    }
}

impl fmt::Debug for MiddlewareOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unchanged => f.write_str("Unchanged"),
            Self::Merge(patch) => f.debug_tuple("Merge").field(patch).finish(),
            Self::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

/// Values a deferred future may resolve to.
pub trait IntoPatch {
    /// Converts into an optional patch.
    fn into_patch(self) -> Option<Arguments>;
}

impl IntoPatch for () {
    fn into_patch(self) -> Option<Arguments> {
        None
    }
}

impl IntoPatch for Arguments {
    fn into_patch(self) -> Option<Arguments> {
        Some(self)
    }
}

/// Return types accepted from middleware closures and handlers.
pub trait IntoOutcome {
    /// Converts into an outcome, or the error the action failed with.
    fn into_outcome(self) -> anyhow::Result<MiddlewareOutcome>;
}

impl IntoOutcome for () {
    fn into_outcome(self) -> anyhow::Result<MiddlewareOutcome> {
        Ok(MiddlewareOutcome::Unchanged)
    }
}

impl IntoOutcome for Arguments {
    fn into_outcome(self) -> anyhow::Result<MiddlewareOutcome> {
        Ok(MiddlewareOutcome::Merge(self))
    }
}

impl IntoOutcome for MiddlewareOutcome {
    fn into_outcome(self) -> anyhow::Result<MiddlewareOutcome> {
        Ok(self)
    }
}

impl<T, E> IntoOutcome for Result<T, E>
where
    T: IntoOutcome,
    E: Into<anyhow::Error>,
{
    fn into_outcome(self) -> anyhow::Result<MiddlewareOutcome> {
        self.map_err(Into::into)?.into_outcome()
    }
}

/// The core middleware trait.
///
/// An action receives the invocation's arguments and a read-only parser
/// context. It either mutates the arguments in place, returns a patch, or
/// returns deferred work.
pub trait Middleware: Send + Sync + 'static {
    /// Returns the name of this middleware, used in logs.
    fn name(&self) -> &str;

    /// Runs the action.
    fn call(&self, args: &mut Arguments, ctx: &ParserContext) -> anyhow::Result<MiddlewareOutcome>;
}

/// A middleware built from a closure.
pub struct FnMiddleware<F> {
    name: String,
    func: F,
}

impl<F> FnMiddleware<F> {
    /// Creates a new function-based middleware.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F, R> Middleware for FnMiddleware<F>
where
    F: Fn(&mut Arguments, &ParserContext) -> R + Send + Sync + 'static,
    R: IntoOutcome,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn call(&self, args: &mut Arguments, ctx: &ParserContext) -> anyhow::Result<MiddlewareOutcome> {
        (self.func)(args, ctx).into_outcome()
    }
}

/// A callback handed to a registration call.
///
/// `Action` is always invocable. `Named` refers to an action in a
/// [`MiddlewareCatalog`]; an unknown name cannot be invoked and fails
/// registration.
#[derive(Clone)]
pub enum Callback {
    /// A concrete action.
    Action(Arc<dyn Middleware>),
    /// A reference to a catalog entry.
    Named(String),
}

impl Callback {
    /// Creates a callback from a closure.
    pub fn new<F, R>(func: F) -> Self
    where
        F: Fn(&mut Arguments, &ParserContext) -> R + Send + Sync + 'static,
        R: IntoOutcome,
    {
        Self::Action(Arc::new(FnMiddleware::new("anonymous", func)))
    }

    /// Creates a callback from a closure with a name for logs.
    pub fn with_name<F, R>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&mut Arguments, &ParserContext) -> R + Send + Sync + 'static,
        R: IntoOutcome,
    {
        Self::Action(Arc::new(FnMiddleware::new(name, func)))
    }

    /// Creates a callback from a [`Middleware`] implementation.
    pub fn from_middleware<M: Middleware>(middleware: M) -> Self {
        Self::Action(Arc::new(middleware))
    }

    /// Creates a reference to a catalog entry.
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// Resolves this callback to an invocable action.
    pub(crate) fn resolve(&self, catalog: &MiddlewareCatalog) -> Option<Arc<dyn Middleware>> {
        match self {
            Self::Action(action) => Some(Arc::clone(action)),
            Self::Named(name) => catalog.get(name),
        }
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Action(action) => f.debug_tuple("Action").field(&action.name()).finish(),
            Self::Named(name) => f.debug_tuple("Named").field(name).finish(),
        }
    }
}

/// One callback or an ordered list of callbacks.
#[derive(Debug, Clone, Default)]
pub struct Callbacks(Vec<Callback>);

impl Callbacks {
    /// Returns the callbacks in order.
    #[must_use]
    pub fn as_slice(&self) -> &[Callback] {
        &self.0
    }

    /// Returns the number of callbacks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no callbacks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Callback> for Callbacks {
    fn from(callback: Callback) -> Self {
        Self(vec![callback])
    }
}

impl From<Vec<Callback>> for Callbacks {
    fn from(callbacks: Vec<Callback>) -> Self {
        Self(callbacks)
    }
}

impl<const N: usize> From<[Callback; N]> for Callbacks {
    fn from(callbacks: [Callback; N]) -> Self {
        Self(callbacks.into())
    }
}

impl FromIterator<Callback> for Callbacks {
    fn from_iter<T: IntoIterator<Item = Callback>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Named middleware that configuration can refer to.
///
/// # Example
///
/// ```
/// use argmill_core::{Arguments, ParserContext};
/// use argmill_middleware::MiddlewareCatalog;
///
/// let mut catalog = MiddlewareCatalog::new();
/// catalog.insert_fn("stamp", |args: &mut Arguments, _ctx: &ParserContext| {
///     args.set("stamped", true);
/// });
///
/// assert!(catalog.contains("stamp"));
/// assert!(!catalog.contains("missing"));
/// ```
#[derive(Clone, Default)]
pub struct MiddlewareCatalog {
    actions: HashMap<String, Arc<dyn Middleware>>,
}

impl MiddlewareCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a [`Middleware`] under `name`, replacing any previous entry.
    pub fn insert<M: Middleware>(&mut self, name: impl Into<String>, middleware: M) {
        self.actions.insert(name.into(), Arc::new(middleware));
    }

    /// Adds a closure under `name`, replacing any previous entry.
    pub fn insert_fn<F, R>(&mut self, name: impl Into<String>, func: F)
    where
        F: Fn(&mut Arguments, &ParserContext) -> R + Send + Sync + 'static,
        R: IntoOutcome,
    {
        let name = name.into();
        self.actions
            .insert(name.clone(), Arc::new(FnMiddleware::new(name, func)));
    }

    /// Returns the action registered under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn Middleware>> {
        self.actions.get(name).cloned()
    }

    /// Returns `true` if `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    /// Returns the registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.actions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for MiddlewareCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareCatalog")
            .field("names", &self.names())
            .finish()
    }
}

static NEXT_ENTRY: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of a registered entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(u64);

impl EntryId {
    fn next() -> Self {
        Self(NEXT_ENTRY.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mw-{}", self.0)
    }
}

/// A registered middleware: an action plus its validation placement.
pub struct MiddlewareEntry {
    id: EntryId,
    action: Arc<dyn Middleware>,
    applies_before_validation: bool,
}

impl MiddlewareEntry {
    /// Creates an entry with a fresh identifier.
    pub fn new(action: Arc<dyn Middleware>, applies_before_validation: bool) -> Self {
        Self {
            id: EntryId::next(),
            action,
            applies_before_validation,
        }
    }

    /// Returns the entry identifier.
    #[must_use]
    pub fn id(&self) -> EntryId {
        self.id
    }

    /// Returns the action's name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.action.name()
    }

    /// Returns `true` if this entry runs before validation.
    #[must_use]
    pub fn applies_before_validation(&self) -> bool {
        self.applies_before_validation
    }

    /// Returns the action.
    #[must_use]
    pub fn action(&self) -> &Arc<dyn Middleware> {
        &self.action
    }

    /// Runs the action, wrapping its failure as an application error.
    pub fn invoke(
        &self,
        args: &mut Arguments,
        ctx: &ParserContext,
    ) -> ArgmillResult<MiddlewareOutcome> {
        tracing::trace!(
            entry = %self.id,
            name = self.action.name(),
            invocation = %ctx.invocation_id(),
            before_validation = self.applies_before_validation,
            "running middleware"
        );
        self.action.call(args, ctx).map_err(ArgmillError::Application)
    }
}

impl fmt::Debug for MiddlewareEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareEntry")
            .field("id", &self.id)
            .field("name", &self.action.name())
            .field("applies_before_validation", &self.applies_before_validation)
            .finish()
    }
}
