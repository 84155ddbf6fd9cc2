//! Middleware registries.
//!
//! A [`MiddlewareRegistry`] is an append-only, ordered list of entries. The
//! parser owns one global registry and every command node owns one more.
//! Both are filled through a [`MiddlewareFactory`], which is what keeps the
//! two kinds structurally identical while their lifetimes differ.

use crate::middleware::{Callbacks, MiddlewareCatalog, MiddlewareEntry};
use argmill_core::{ArgmillError, ArgmillResult};
use std::sync::Arc;

/// Ordered, append-only list of middleware entries.
#[derive(Debug, Clone, Default)]
pub struct MiddlewareRegistry {
    entries: Vec<Arc<MiddlewareEntry>>,
}

impl MiddlewareRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the entries in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<MiddlewareEntry>> {
        self.entries.iter()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of entries that run before validation.
    #[must_use]
    pub fn before_validation_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.applies_before_validation())
            .count()
    }

    /// Returns the number of entries that run after validation.
    #[must_use]
    pub fn after_validation_count(&self) -> usize {
        self.len() - self.before_validation_count()
    }

    /// Appends an already-built entry, sharing it with other registries.
    pub fn push_entry(&mut self, entry: Arc<MiddlewareEntry>) {
        self.entries.push(entry);
    }
}

/// Binds registration to a target registry.
///
/// Every element is resolved before anything is stored, so a list with one
/// bad element registers none of them.
///
/// # Example
///
/// ```
/// use argmill_core::{Arguments, ParserContext};
/// use argmill_middleware::{Callback, MiddlewareCatalog, MiddlewareFactory, MiddlewareRegistry};
///
/// let catalog = MiddlewareCatalog::new();
/// let mut global = MiddlewareRegistry::new();
///
/// MiddlewareFactory::new(&mut global, &catalog)
///     .register(
///         vec![
///             Callback::new(|_: &mut Arguments, _: &ParserContext| {}),
///             Callback::new(|_: &mut Arguments, _: &ParserContext| {}),
///         ],
///         false,
///     )
///     .unwrap();
///
/// assert_eq!(global.len(), 2);
/// ```
#[derive(Debug)]
pub struct MiddlewareFactory<'a> {
    target: &'a mut MiddlewareRegistry,
    catalog: &'a MiddlewareCatalog,
}

impl<'a> MiddlewareFactory<'a> {
    /// Creates a factory that appends to `target`, resolving names in `catalog`.
    pub fn new(target: &'a mut MiddlewareRegistry, catalog: &'a MiddlewareCatalog) -> Self {
        Self { target, catalog }
    }

    /// Registers one callback or a list of callbacks.
    ///
    /// Returns the number of entries appended.
    ///
    /// # Errors
    ///
    /// Returns [`ArgmillError::InvalidMiddleware`] if any callback cannot be
    /// resolved to an action. The registry is left untouched in that case.
    pub fn register(
        &mut self,
        callbacks: impl Into<Callbacks>,
        applies_before_validation: bool,
    ) -> ArgmillResult<usize> {
        let callbacks = callbacks.into();

        let actions = callbacks
            .as_slice()
            .iter()
            .enumerate()
            .map(|(position, callback)| {
                callback.resolve(self.catalog).ok_or_else(|| {
                    tracing::warn!(position, callback = ?callback, "middleware is not invocable");
                    ArgmillError::invalid_middleware(position)
                })
            })
            .collect::<ArgmillResult<Vec<_>>>()?;

        let count = actions.len();
        for action in actions {
            let entry = MiddlewareEntry::new(action, applies_before_validation);
            tracing::debug!(
                entry = %entry.id(),
                name = entry.name(),
                before_validation = applies_before_validation,
                "registered middleware"
            );
            self.target.push_entry(Arc::new(entry));
        }

        Ok(count)
    }
}
