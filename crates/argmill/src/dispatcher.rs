//! Command resolution and chain assembly.
//!
//! The [`Dispatcher`] turns tokenized arguments into a [`Route`]: the
//! root-to-leaf list of matched commands. From a route it derives the
//! [`ParserContext`] and the [`ExecutionChain`] of one invocation. It only
//! ever reads the command tree and the global registry.

use crate::command::CommandNode;
use argmill_core::{AliasTable, Arguments, InvocationId, ParserContext};
use argmill_middleware::{ExecutionChain, Handler, MiddlewareRegistry};
use serde_json::Value;
use std::iter;

/// The commands matched for one invocation, outermost first.
#[derive(Debug, Default)]
pub struct Route<'p> {
    nodes: Vec<&'p CommandNode>,
}

impl<'p> Route<'p> {
    /// Returns the matched commands, outermost first.
    #[must_use]
    pub fn nodes(&self) -> &[&'p CommandNode] {
        &self.nodes
    }

    /// Returns the innermost matched command.
    #[must_use]
    pub fn leaf(&self) -> Option<&'p CommandNode> {
        self.nodes.last().copied()
    }

    /// Returns the names of the matched commands.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.nodes.iter().map(|n| n.name().to_string()).collect()
    }

    /// Returns the handler of the innermost command.
    #[must_use]
    pub fn handler(&self) -> Option<Handler> {
        self.leaf().and_then(CommandNode::handler).cloned()
    }

    /// Returns `true` if no command matched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Resolves commands and assembles per-invocation state.
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher<'p> {
    root: &'p CommandNode,
    global: &'p MiddlewareRegistry,
}

impl<'p> Dispatcher<'p> {
    /// Creates a dispatcher over a command tree and the global registry.
    #[must_use]
    pub fn new(root: &'p CommandNode, global: &'p MiddlewareRegistry) -> Self {
        Self { root, global }
    }

    /// Matches leading positionals against the command tree.
    ///
    /// Matched command names are removed from the positional list. The
    /// leaf's placeholders are then bound from the positionals that remain.
    pub fn resolve(&self, args: &mut Arguments) -> Route<'p> {
        let mut route = Route::default();
        let mut node = self.root;

        while let Some(child) = args
            .positionals()
            .first()
            .and_then(Value::as_str)
            .and_then(|token| node.find_child(token))
        {
            args.shift_positional();
            route.nodes.push(child);
            node = child;
        }

        if let Some(leaf) = route.leaf() {
            bind_placeholders(leaf, args);
        }

        tracing::debug!(command_path = ?route.names(), "resolved command");
        route
    }

    /// Builds the read-only context for one invocation.
    ///
    /// Known commands, demands and aliases are collected from the root and
    /// every matched command, so the subcommands of each command on the path
    /// are known. Required placeholders of the leaf are demanded too.
    #[must_use]
    pub fn context(&self, route: &Route<'p>, invocation: InvocationId) -> ParserContext {
        let mut aliases = AliasTable::new();
        let mut builder = ParserContext::builder()
            .invocation_id(invocation)
            .command_path(route.names());

        for node in iter::once(self.root).chain(route.nodes.iter().copied()) {
            for command in node.children() {
                builder = builder.command(command.name());
            }
            aliases.extend(node.aliases());
            for key in node.demanded() {
                builder = builder.demand(key.clone());
            }
        }

        if let Some(leaf) = route.leaf() {
            for placeholder in leaf.placeholders().iter().filter(|p| p.is_required()) {
                builder = builder.demand(placeholder.name());
            }
        }

        builder.aliases(aliases).build()
    }

    /// Concatenates the global registry and every matched command's registry.
    #[must_use]
    pub fn chain(&self, route: &Route<'p>) -> ExecutionChain {
        ExecutionChain::from_registries(
            iter::once(self.global).chain(route.nodes.iter().map(|node| node.middleware())),
        )
    }
}

fn bind_placeholders(leaf: &CommandNode, args: &mut Arguments) {
    for placeholder in leaf.placeholders() {
        if placeholder.is_variadic() {
            let mut rest = Vec::new();
            while let Some(value) = args.shift_positional() {
                rest.push(value);
            }
            if !rest.is_empty() || placeholder.is_required() {
                args.set(placeholder.name(), Value::Array(rest));
            }
        } else if let Some(value) = args.shift_positional() {
            args.set(placeholder.name(), value);
        }
    }
}
