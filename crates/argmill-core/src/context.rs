//! Read-only parser context handed to middleware.
//!
//! The [`ParserContext`] lets middleware introspect the parser that is
//! running it: which command path was resolved, which options are declared or
//! demanded, and how names are aliased. It is cheap to clone so deferred
//! middleware can move it into a future.

use crate::alias::{AliasResolver, AliasTable};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_INVOCATION: AtomicU64 = AtomicU64::new(1);

/// A process-unique identifier for one `parse` call.
///
/// Used to correlate log lines emitted while a single chain runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InvocationId(u64);

impl InvocationId {
    /// Allocates the next invocation identifier.
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_INVOCATION.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for InvocationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "inv-{}", self.0)
    }
}

#[derive(Debug)]
struct Inner {
    invocation_id: InvocationId,
    command_path: Vec<String>,
    commands: Vec<String>,
    demanded: BTreeSet<String>,
    aliases: AliasTable,
}

/// Read-only view of the parser, passed to every middleware action.
///
/// # Example
///
/// ```
/// use argmill_core::{AliasTable, ParserContext};
///
/// let mut aliases = AliasTable::new();
/// aliases.alias("foo", "f");
///
/// let ctx = ParserContext::builder()
///     .command_path(["mw"])
///     .demand("mw")
///     .aliases(aliases)
///     .build();
///
/// assert_eq!(ctx.command_path(), &["mw".to_string()]);
/// assert!(ctx.is_demanded("mw"));
/// assert_eq!(ctx.aliases_of("f"), vec!["foo".to_string()]);
/// ```
#[derive(Debug, Clone)]
pub struct ParserContext {
    inner: Arc<Inner>,
}

impl ParserContext {
    /// Creates a context builder.
    #[must_use]
    pub fn builder() -> ParserContextBuilder {
        ParserContextBuilder::default()
    }

    /// Returns the identifier of the invocation this context belongs to.
    #[must_use]
    pub fn invocation_id(&self) -> InvocationId {
        self.inner.invocation_id
    }

    /// Returns the names of the resolved commands, outermost first.
    #[must_use]
    pub fn command_path(&self) -> &[String] {
        &self.inner.command_path
    }

    /// Returns `true` if a command named `name` is reachable from the
    /// invoked command path: top-level commands and the subcommands of every
    /// matched command.
    #[must_use]
    pub fn has_command(&self, name: &str) -> bool {
        self.inner.commands.iter().any(|c| c == name)
    }

    /// Returns the names of the commands known to this invocation.
    #[must_use]
    pub fn commands(&self) -> &[String] {
        &self.inner.commands
    }

    /// Returns `true` if `key` (or one of its aliases) is demanded.
    #[must_use]
    pub fn is_demanded(&self, key: &str) -> bool {
        self.inner.demanded.contains(key)
            || self
                .aliases_of(key)
                .iter()
                .any(|alias| self.inner.demanded.contains(alias))
    }

    /// Returns the demanded option names, sorted.
    pub fn demanded(&self) -> impl Iterator<Item = &str> {
        self.inner.demanded.iter().map(String::as_str)
    }

    /// Returns every option name the parser knows about, sorted.
    #[must_use]
    pub fn declared_options(&self) -> Vec<String> {
        let mut names: BTreeSet<String> = self.inner.demanded.clone();
        names.extend(self.inner.aliases.names().map(ToString::to_string));
        names.into_iter().collect()
    }

    /// Returns every other name `key` is aliased to.
    #[must_use]
    pub fn aliases_of(&self, key: &str) -> Vec<String> {
        self.inner.aliases.aliases_of(key)
    }

    /// Returns the alias table in effect for this invocation.
    #[must_use]
    pub fn aliases(&self) -> &AliasTable {
        &self.inner.aliases
    }
}

/// Builder for [`ParserContext`].
#[derive(Debug, Default)]
pub struct ParserContextBuilder {
    invocation_id: Option<InvocationId>,
    command_path: Vec<String>,
    commands: Vec<String>,
    demanded: BTreeSet<String>,
    aliases: AliasTable,
}

impl ParserContextBuilder {
    /// Sets the invocation identifier; a fresh one is allocated otherwise.
    #[must_use]
    pub fn invocation_id(mut self, id: InvocationId) -> Self {
        self.invocation_id = Some(id);
        self
    }

    /// Sets the resolved command path.
    #[must_use]
    pub fn command_path<I, S>(mut self, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.command_path = path.into_iter().map(Into::into).collect();
        self
    }

    /// Records a known command name.
    #[must_use]
    pub fn command(mut self, name: impl Into<String>) -> Self {
        self.commands.push(name.into());
        self
    }

    /// Marks an option as demanded.
    #[must_use]
    pub fn demand(mut self, key: impl Into<String>) -> Self {
        self.demanded.insert(key.into());
        self
    }

    /// Sets the alias table.
    #[must_use]
    pub fn aliases(mut self, aliases: AliasTable) -> Self {
        self.aliases = aliases;
        self
    }

    /// Builds the context.
    #[must_use]
    pub fn build(self) -> ParserContext {
        ParserContext {
            inner: Arc::new(Inner {
                invocation_id: self.invocation_id.unwrap_or_else(InvocationId::next),
                command_path: self.command_path,
                commands: self.commands,
                demanded: self.demanded,
                aliases: self.aliases,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_ids_are_unique() {
        let a = InvocationId::next();
        let b = InvocationId::next();
        assert_ne!(a, b);
        assert!(a.to_string().starts_with("inv-"));
    }

    #[test]
    fn test_declared_options_include_aliases() {
        let mut aliases = AliasTable::new();
        aliases.alias("foo", "f");

        let ctx = ParserContext::builder()
            .demand("mw")
            .aliases(aliases)
            .build();

        assert_eq!(ctx.declared_options(), vec!["f", "foo", "mw"]);
    }

    #[test]
    fn test_is_demanded_through_alias() {
        let mut aliases = AliasTable::new();
        aliases.alias("name", "n");

        let ctx = ParserContext::builder().demand("name").aliases(aliases).build();
        assert!(ctx.is_demanded("n"));
        assert!(!ctx.is_demanded("other"));
    }

    #[test]
    fn test_clone_shares_state() {
        let ctx = ParserContext::builder().command("build").build();
        let clone = ctx.clone();
        assert_eq!(ctx.invocation_id(), clone.invocation_id());
        assert!(clone.has_command("build"));
        assert!(!clone.has_command("test"));
    }
}
