//! Per-invocation execution chains.
//!
//! An [`ExecutionChain`] is the concatenation of the registries that apply to
//! one invocation (global, then ancestor commands outer to inner, then the
//! leaf command). It is built fresh for every invocation and never written
//! back into any registry.

use crate::middleware::MiddlewareEntry;
use crate::registry::MiddlewareRegistry;
use std::collections::HashSet;
use std::sync::Arc;

/// The ordered, deduplicated entries that run for one invocation.
#[derive(Debug, Clone, Default)]
pub struct ExecutionChain {
    entries: Vec<Arc<MiddlewareEntry>>,
}

impl ExecutionChain {
    /// Creates a chain builder.
    #[must_use]
    pub fn builder() -> ExecutionChainBuilder {
        ExecutionChainBuilder::default()
    }

    /// Concatenates `registries` in order.
    pub fn from_registries<'a, I>(registries: I) -> Self
    where
        I: IntoIterator<Item = &'a MiddlewareRegistry>,
    {
        let mut builder = Self::builder();
        for registry in registries {
            builder.push_registry(registry);
        }
        builder.build()
    }

    /// Returns the entries in execution order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<MiddlewareEntry>> {
        self.entries.iter()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the chain is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Splits the chain into before-validation and after-validation entries.
    ///
    /// Relative order inside each partition is preserved.
    #[must_use]
    pub fn partition(&self) -> (Vec<Arc<MiddlewareEntry>>, Vec<Arc<MiddlewareEntry>>) {
        self.entries
            .iter()
            .cloned()
            .partition(|entry| entry.applies_before_validation())
    }
}

/// Builder for [`ExecutionChain`].
///
/// Entries are deduplicated by identity: an entry reached through several
/// registries is kept once, at its first position. Separate registrations of
/// the same callback are separate entries and all run.
#[derive(Debug, Default)]
pub struct ExecutionChainBuilder {
    entries: Vec<Arc<MiddlewareEntry>>,
    seen: HashSet<usize>,
}

impl ExecutionChainBuilder {
    /// Appends every entry of `registry`.
    pub fn push_registry(&mut self, registry: &MiddlewareRegistry) -> &mut Self {
        for entry in registry.iter() {
            self.push_entry(Arc::clone(entry));
        }
        self
    }

    /// Appends one entry; returns `false` if it was a duplicate.
    pub fn push_entry(&mut self, entry: Arc<MiddlewareEntry>) -> bool {
        if !self.seen.insert(Arc::as_ptr(&entry) as usize) {
            tracing::trace!(entry = %entry.id(), name = entry.name(), "skipping duplicate middleware");
            return false;
        }

        self.entries.push(entry);
        true
    }

    /// Finishes the chain.
    #[must_use]
    pub fn build(self) -> ExecutionChain {
        ExecutionChain {
            entries: self.entries,
        }
    }
}
