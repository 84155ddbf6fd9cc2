//! Command tree.
//!
//! Commands form a tree rooted at the parser. Each [`CommandNode`] owns its
//! own middleware registry, demanded options, option aliases and children.
//! A node is configured exactly once, by its builder, when it is declared;
//! after that it is only ever read.
//!
//! ```text
//!                (root)
//!                  │
//!          ┌───────┴───────┐
//!          │               │
//!       "remote"        "build <target> [profile]"
//!          │
//!     ┌────┴────┐
//!     │         │
//!   "add"   "remove <name>"
//! ```

use argmill_core::{AliasTable, ArgmillError, ArgmillResult, Arguments, ParserContext};
use argmill_middleware::{
    Callbacks, FnMiddleware, Handler, IntoOutcome, MiddlewareCatalog, MiddlewareFactory,
    MiddlewareRegistry,
};
use std::fmt;
use std::sync::Arc;

/// A positional slot declared after a command name.
///
/// `<name>` is required, `[name]` is optional, and a trailing `..` (as in
/// `[files..]`) collects every remaining positional into an array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    name: String,
    required: bool,
    variadic: bool,
}

impl Placeholder {
    /// Parses a single placeholder token.
    ///
    /// Returns `None` if `token` is not wrapped in `<>` or `[]`.
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        let (inner, required) = if let Some(inner) =
            token.strip_prefix('<').and_then(|s| s.strip_suffix('>'))
        {
            (inner, true)
        } else if let Some(inner) = token.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
            (inner, false)
        } else {
            return None;
        };

        let (name, variadic) = match inner.strip_suffix("..") {
            Some(name) => (name, true),
            None => (inner, false),
        };

        if name.is_empty() {
            return None;
        }

        Some(Self {
            name: name.to_string(),
            required,
            variadic,
        })
    }

    /// Returns the key the positional is bound to.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` for `<name>` placeholders.
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Returns `true` for `..` placeholders.
    #[must_use]
    pub fn is_variadic(&self) -> bool {
        self.variadic
    }
}

/// Splits a declaration such as `"build <target> [profile]"`.
fn parse_declaration(declaration: &str) -> ArgmillResult<(String, Vec<Placeholder>)> {
    let mut tokens = declaration.split_whitespace();
    let name = tokens
        .next()
        .filter(|name| Placeholder::parse(name).is_none())
        .ok_or_else(|| {
            ArgmillError::config(format!("command declaration `{declaration}` has no name"))
        })?;

    let mut placeholders = Vec::new();
    for token in tokens {
        let placeholder = Placeholder::parse(token).ok_or_else(|| {
            ArgmillError::config(format!(
                "invalid positional `{token}` in command declaration `{declaration}`"
            ))
        })?;
        if placeholders.last().is_some_and(Placeholder::is_variadic) {
            return Err(ArgmillError::config(format!(
                "variadic positional must be last in command declaration `{declaration}`"
            )));
        }
        placeholders.push(placeholder);
    }

    Ok((name.to_string(), placeholders))
}

/// A node of the command tree.
pub struct CommandNode {
    name: String,
    description: String,
    command_aliases: Vec<String>,
    placeholders: Vec<Placeholder>,
    handler: Option<Handler>,
    middleware: MiddlewareRegistry,
    demanded: Vec<String>,
    aliases: AliasTable,
    children: Vec<CommandNode>,
}

impl CommandNode {
    /// Creates the unnamed root node that holds parser-wide settings.
    pub(crate) fn root() -> Self {
        Self::new(String::new(), String::new(), Vec::new())
    }

    fn new(name: String, description: String, placeholders: Vec<Placeholder>) -> Self {
        Self {
            name,
            description,
            command_aliases: Vec::new(),
            placeholders,
            handler: None,
            middleware: MiddlewareRegistry::new(),
            demanded: Vec::new(),
            aliases: AliasTable::new(),
            children: Vec::new(),
        }
    }

    /// Builds a node: runs its builder, then registers its declared list.
    pub(crate) fn declare<B, H, R>(
        catalog: &MiddlewareCatalog,
        declaration: &str,
        description: &str,
        builder: B,
        handler: H,
        declared: Callbacks,
    ) -> ArgmillResult<Self>
    where
        B: FnOnce(&mut CommandScope<'_>) -> ArgmillResult<()>,
        H: Fn(&mut Arguments, &ParserContext) -> R + Send + Sync + 'static,
        R: IntoOutcome,
    {
        let (name, placeholders) = parse_declaration(declaration)?;
        let mut node = Self::new(name, description.to_string(), placeholders);
        let handler_name = format!("{} handler", node.name);
        node.handler = Some(Arc::new(FnMiddleware::new(handler_name, handler)));

        builder(&mut CommandScope::new(&mut node, catalog))?;
        MiddlewareFactory::new(&mut node.middleware, catalog).register(declared, false)?;

        tracing::debug!(
            command = %node.name,
            middleware = node.middleware.len(),
            subcommands = node.children.len(),
            "declared command"
        );
        Ok(node)
    }

    /// Adds `child`, replacing an earlier command with the same name.
    pub(crate) fn attach(&mut self, child: CommandNode) {
        match self.children.iter_mut().find(|c| c.name == child.name) {
            Some(slot) => {
                tracing::debug!(command = %child.name, "replacing command declaration");
                *slot = child;
            }
            None => self.children.push(child),
        }
    }

    pub(crate) fn demand(&mut self, key: impl Into<String>) {
        let key = key.into();
        if !self.demanded.contains(&key) {
            self.demanded.push(key);
        }
    }

    pub(crate) fn alias(&mut self, key: impl Into<String>, alias: impl Into<String>) {
        self.aliases.alias(key, alias);
    }

    /// Returns the command name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the description given at declaration.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the alternative names this command answers to.
    #[must_use]
    pub fn command_aliases(&self) -> &[String] {
        &self.command_aliases
    }

    /// Returns the declared positional placeholders.
    #[must_use]
    pub fn placeholders(&self) -> &[Placeholder] {
        &self.placeholders
    }

    /// Returns the handler.
    #[must_use]
    pub fn handler(&self) -> Option<&Handler> {
        self.handler.as_ref()
    }

    /// Returns this command's middleware registry.
    #[must_use]
    pub fn middleware(&self) -> &MiddlewareRegistry {
        &self.middleware
    }

    /// Returns the options this command demands.
    #[must_use]
    pub fn demanded(&self) -> &[String] {
        &self.demanded
    }

    /// Returns the option aliases this command declares.
    #[must_use]
    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    /// Returns the subcommands in declaration order.
    #[must_use]
    pub fn children(&self) -> &[CommandNode] {
        &self.children
    }

    /// Returns `true` if this node answers to `token`.
    #[must_use]
    pub fn matches(&self, token: &str) -> bool {
        self.name == token || self.command_aliases.iter().any(|a| a == token)
    }

    /// Finds the subcommand answering to `token`.
    #[must_use]
    pub fn find_child(&self, token: &str) -> Option<&CommandNode> {
        self.children.iter().find(|child| child.matches(token))
    }
}

impl fmt::Debug for CommandNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandNode")
            .field("name", &self.name)
            .field("command_aliases", &self.command_aliases)
            .field("placeholders", &self.placeholders)
            .field("middleware", &self.middleware.len())
            .field("demanded", &self.demanded)
            .field("children", &self.children)
            .finish_non_exhaustive()
    }
}

/// Configuration surface handed to a command builder.
///
/// # Example
///
/// ```
/// use argmill::{Arguments, Callback, Parser, ParserContext};
///
/// let mut parser = Parser::new();
/// parser
///     .command(
///         "remote",
///         "manage remotes",
///         |remote| {
///             remote
///                 .middleware(Callback::new(|args: &mut Arguments, _: &ParserContext| {
///                     args.set("scoped", true);
///                 }))?
///                 .command("add <name>", "add a remote", |_| Ok(()), |_: &mut Arguments, _: &ParserContext| {})?;
///             Ok(())
///         },
///         |_: &mut Arguments, _: &ParserContext| {},
///     )
///     .unwrap();
///
/// let remote = parser.find_command("remote").unwrap();
/// assert_eq!(remote.middleware().len(), 1);
/// assert_eq!(remote.children()[0].name(), "add");
/// ```
pub struct CommandScope<'a> {
    node: &'a mut CommandNode,
    catalog: &'a MiddlewareCatalog,
}

impl<'a> CommandScope<'a> {
    fn new(node: &'a mut CommandNode, catalog: &'a MiddlewareCatalog) -> Self {
        Self { node, catalog }
    }

    /// Returns the name of the command being configured.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.node.name
    }

    /// Registers command-scoped middleware that runs after validation.
    ///
    /// # Errors
    ///
    /// Returns [`ArgmillError::InvalidMiddleware`] if any callback cannot be
    /// resolved; nothing is registered in that case.
    pub fn middleware(&mut self, callbacks: impl Into<Callbacks>) -> ArgmillResult<&mut Self> {
        MiddlewareFactory::new(&mut self.node.middleware, self.catalog).register(callbacks, false)?;
        Ok(self)
    }

    /// Registers command-scoped middleware that runs before validation.
    ///
    /// # Errors
    ///
    /// Returns [`ArgmillError::InvalidMiddleware`] if any callback cannot be
    /// resolved; nothing is registered in that case.
    pub fn middleware_before_validation(
        &mut self,
        callbacks: impl Into<Callbacks>,
    ) -> ArgmillResult<&mut Self> {
        MiddlewareFactory::new(&mut self.node.middleware, self.catalog).register(callbacks, true)?;
        Ok(self)
    }

    /// Demands an option whenever this command runs.
    pub fn demand(&mut self, key: impl Into<String>) -> &mut Self {
        self.node.demand(key);
        self
    }

    /// Declares an option alias that applies while this command runs.
    pub fn alias(&mut self, key: impl Into<String>, alias: impl Into<String>) -> &mut Self {
        self.node.alias(key, alias);
        self
    }

    /// Adds an alternative name for this command.
    pub fn command_alias(&mut self, alias: impl Into<String>) -> &mut Self {
        self.node.command_aliases.push(alias.into());
        self
    }

    /// Declares a subcommand.
    ///
    /// # Errors
    ///
    /// Returns an error if the declaration is malformed or the builder fails.
    pub fn command<B, H, R>(
        &mut self,
        declaration: &str,
        description: &str,
        builder: B,
        handler: H,
    ) -> ArgmillResult<&mut Self>
    where
        B: FnOnce(&mut CommandScope<'_>) -> ArgmillResult<()>,
        H: Fn(&mut Arguments, &ParserContext) -> R + Send + Sync + 'static,
        R: IntoOutcome,
    {
        self.command_with_middleware(declaration, description, builder, handler, Callbacks::default())
    }

    /// Declares a subcommand together with a list of its own middleware.
    ///
    /// The list runs after any middleware the builder registers.
    ///
    /// # Errors
    ///
    /// Returns an error if the declaration is malformed, the builder fails,
    /// or a callback cannot be resolved. The subcommand is not added then.
    pub fn command_with_middleware<B, H, R>(
        &mut self,
        declaration: &str,
        description: &str,
        builder: B,
        handler: H,
        callbacks: impl Into<Callbacks>,
    ) -> ArgmillResult<&mut Self>
    where
        B: FnOnce(&mut CommandScope<'_>) -> ArgmillResult<()>,
        H: Fn(&mut Arguments, &ParserContext) -> R + Send + Sync + 'static,
        R: IntoOutcome,
    {
        let child = CommandNode::declare(
            self.catalog,
            declaration,
            description,
            builder,
            handler,
            callbacks.into(),
        )?;
        self.node.attach(child);
        Ok(self)
    }
}

impl fmt::Debug for CommandScope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandScope")
            .field("command", &self.node.name)
            .finish_non_exhaustive()
    }
}
