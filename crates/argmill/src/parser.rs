//! The parser.
//!
//! [`Parser`] owns everything configured up front (the global middleware
//! registry, the command tree, collaborators and the failure policy) and
//! runs one invocation per [`Parser::parse`] call:
//!
//! ```text
//! argv → Tokenizer → Dispatcher → AliasResolver → ExecutionEngine → Resolution
//!                                                       │
//!                                                       └─ failure → FailureRouter
//! ```

use crate::command::{CommandNode, CommandScope};
use crate::dispatcher::Dispatcher;
use crate::failure::FailureRouter;
use argmill_config::ArgmillConfig;
use argmill_core::{
    AliasResolver, ArgmillError, ArgmillResult, Arguments, DefaultTokenizer, DemandValidator,
    InvocationId, ParserContext, Tokenizer, ValidationStage,
};
use argmill_middleware::{
    Callback, Callbacks, ExecutionEngine, IntoOutcome, MiddlewareCatalog, MiddlewareFactory,
    MiddlewareRegistry, Resolution,
};
use argmill_telemetry::log_invocation_start;
use std::fmt;
use std::sync::Arc;

/// A command-line parser with middleware.
///
/// # Example
///
/// ```
/// use argmill::{Arguments, Callback, Parser, ParserContext};
///
/// let mut parser = Parser::new();
/// parser
///     .exit_process(false)
///     .middleware(Callback::new(|args: &mut Arguments, _: &ParserContext| {
///         args.set("mw", "mw");
///     }))
///     .unwrap();
///
/// let args = parser
///     .parse(["--foo", "99"])
///     .unwrap()
///     .into_resolved()
///     .unwrap();
///
/// assert_eq!(args.get_str("mw"), Some("mw"));
/// assert_eq!(args.get_i64("foo"), Some(99));
/// ```
pub struct Parser {
    root: CommandNode,
    global: MiddlewareRegistry,
    catalog: MiddlewareCatalog,
    tokenizer: Arc<dyn Tokenizer>,
    validator: Arc<dyn ValidationStage>,
    failure: FailureRouter,
}

impl Parser {
    /// Creates a parser with the default tokenizer and demand validation.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: CommandNode::root(),
            global: MiddlewareRegistry::new(),
            catalog: MiddlewareCatalog::new(),
            tokenizer: Arc::new(DefaultTokenizer::new()),
            validator: Arc::new(DemandValidator),
            failure: FailureRouter::new(),
        }
    }

    /// Creates a parser whose named callbacks resolve against `catalog`.
    #[must_use]
    pub fn with_catalog(catalog: MiddlewareCatalog) -> Self {
        let mut parser = Self::new();
        parser.catalog = catalog;
        parser
    }

    /// Creates a parser from configuration.
    ///
    /// The exit policy comes from `config.parser`. Every name listed under
    /// `config.middleware` is looked up in `catalog` and registered globally,
    /// before-validation names first.
    ///
    /// # Errors
    ///
    /// Returns [`ArgmillError::Config`] if a configured name is not in
    /// `catalog`.
    pub fn from_config(config: &ArgmillConfig, catalog: MiddlewareCatalog) -> ArgmillResult<Self> {
        if let Some(unknown) = config
            .middleware
            .names()
            .find(|name| !catalog.contains(name))
        {
            return Err(ArgmillError::config(format!(
                "unknown middleware `{unknown}`; known: {}",
                catalog.names().join(", ")
            )));
        }

        let mut parser = Self::with_catalog(catalog);
        parser.exit_process(config.parser.exit_process);

        let before: Callbacks = config
            .middleware
            .before_validation
            .iter()
            .map(Callback::named)
            .collect();
        let after: Callbacks = config.middleware.global.iter().map(Callback::named).collect();
        parser.middleware_before_validation(before)?.middleware(after)?;

        tracing::debug!(
            exit_process = config.parser.exit_process,
            middleware = parser.global.len(),
            "built parser from configuration"
        );
        Ok(parser)
    }

    /// Registers global middleware that runs after validation.
    ///
    /// Accepts a single [`Callback`] or a list. Global middleware applies to
    /// every invocation, whether it was registered before or after the
    /// commands were declared.
    ///
    /// # Errors
    ///
    /// Returns [`ArgmillError::InvalidMiddleware`] if any callback cannot be
    /// resolved; nothing is registered in that case.
    pub fn middleware(&mut self, callbacks: impl Into<Callbacks>) -> ArgmillResult<&mut Self> {
        MiddlewareFactory::new(&mut self.global, &self.catalog).register(callbacks, false)?;
        Ok(self)
    }

    /// Registers global middleware that runs before validation.
    ///
    /// Such middleware must complete synchronously.
    ///
    /// # Errors
    ///
    /// Returns [`ArgmillError::InvalidMiddleware`] if any callback cannot be
    /// resolved; nothing is registered in that case.
    pub fn middleware_before_validation(
        &mut self,
        callbacks: impl Into<Callbacks>,
    ) -> ArgmillResult<&mut Self> {
        MiddlewareFactory::new(&mut self.global, &self.catalog).register(callbacks, true)?;
        Ok(self)
    }

    /// Declares a top-level command.
    ///
    /// `declaration` is the command name optionally followed by positional
    /// placeholders, e.g. `"build <target> [profile]"`. `builder` runs once,
    /// immediately, to configure the command.
    ///
    /// # Errors
    ///
    /// Returns an error if the declaration is malformed or the builder fails.
    /// The command is not added then.
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

    /// Declares a top-level command together with a list of its own
    /// middleware.
    ///
    /// The list runs after validation and after any middleware the builder
    /// registers.
    ///
    /// # Errors
    ///
    /// Returns an error if the declaration is malformed, the builder fails,
    /// or a callback cannot be resolved. The command is not added then.
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
        let node = CommandNode::declare(
            &self.catalog,
            declaration,
            description,
            builder,
            handler,
            callbacks.into(),
        )?;
        self.root.attach(node);
        Ok(self)
    }

    /// Registers the failure sink.
    ///
    /// The sink receives `(Some(message), None)` for validation failures and
    /// `(None, Some(error))` for everything else.
    pub fn fail<F>(&mut self, sink: F) -> &mut Self
    where
        F: Fn(Option<&str>, Option<&ArgmillError>) + Send + Sync + 'static,
    {
        self.failure.set_sink(Arc::new(sink));
        self
    }

    /// Declares an option alias for every invocation.
    pub fn alias(&mut self, key: impl Into<String>, alias: impl Into<String>) -> &mut Self {
        self.root.alias(key, alias);
        self
    }

    /// Demands an option for every invocation.
    pub fn demand(&mut self, key: impl Into<String>) -> &mut Self {
        self.root.demand(key);
        self
    }

    /// Sets whether a failure without a sink terminates the process.
    ///
    /// Defaults to `true`.
    pub fn exit_process(&mut self, exit_process: bool) -> &mut Self {
        self.failure.set_exit_process(exit_process);
        self
    }

    /// Replaces the catalog used to resolve named callbacks.
    ///
    /// Only affects registrations made afterwards.
    pub fn catalog(&mut self, catalog: MiddlewareCatalog) -> &mut Self {
        self.catalog = catalog;
        self
    }

    /// Replaces the tokenizer.
    pub fn tokenizer<T: Tokenizer>(&mut self, tokenizer: T) -> &mut Self {
        self.tokenizer = Arc::new(tokenizer);
        self
    }

    /// Replaces the validation stage.
    pub fn validator<V: ValidationStage>(&mut self, validator: V) -> &mut Self {
        self.validator = Arc::new(validator);
        self
    }

    /// Returns the global middleware registry.
    #[must_use]
    pub fn global_middleware(&self) -> &MiddlewareRegistry {
        &self.global
    }

    /// Returns the top-level commands.
    #[must_use]
    pub fn commands(&self) -> &[CommandNode] {
        self.root.children()
    }

    /// Finds a top-level command by name or command alias.
    #[must_use]
    pub fn find_command(&self, name: &str) -> Option<&CommandNode> {
        self.root.find_child(name)
    }

    /// Parses `argv` and runs the middleware chain and handler.
    ///
    /// Returns `Resolution::Resolved` when everything ran synchronously and
    /// `Resolution::Deferred` when some middleware or the handler returned
    /// deferred work. Failures are routed to the failure sink and returned.
    ///
    /// # Errors
    ///
    /// - [`ArgmillError::Validation`] if validation rejects the arguments
    /// - [`ArgmillError::SynchronyViolation`] if before-validation middleware
    ///   returns deferred work
    /// - [`ArgmillError::Application`] if middleware or the handler fails
    pub fn parse<I, S>(&self, argv: I) -> ArgmillResult<Resolution<Arguments>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let argv: Vec<String> = argv.into_iter().map(Into::into).collect();
        let invocation = InvocationId::next();

        let mut args = self.tokenizer.tokenize(&argv);
        let dispatcher = Dispatcher::new(&self.root, &self.global);
        let route = dispatcher.resolve(&mut args);
        let ctx = dispatcher.context(&route, invocation);
        ctx.aliases().resolve(&mut args);

        log_invocation_start!(invocation, ctx.command_path());

        let engine = ExecutionEngine::builder()
            .chain(dispatcher.chain(&route))
            .validator(Arc::clone(&self.validator))
            .handler(route.handler())
            .build();

        match engine.run(args, &ctx) {
            Ok(Resolution::Resolved(args)) => Ok(Resolution::Resolved(args)),
            Ok(deferred) => {
                let failure = self.failure.clone();
                Ok(deferred.inspect_deferred(move |result| {
                    if let Err(error) = result {
                        failure.route(invocation, error);
                    }
                }))
            }
            Err(error) => {
                self.failure.route(invocation, &error);
                Err(error)
            }
        }
    }

    /// Parses `argv` and waits for any deferred work to finish.
    ///
    /// # Errors
    ///
    /// Same as [`Parser::parse`].
    pub async fn parse_async<I, S>(&self, argv: I) -> ArgmillResult<Arguments>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parse(argv)?.resolve().await
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Parser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parser")
            .field("global", &self.global)
            .field("commands", &self.root.children())
            .field("catalog", &self.catalog)
            .field("failure", &self.failure)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argmill_config::MiddlewareSection;

    fn quiet() -> Parser {
        let mut parser = Parser::new();
        parser.exit_process(false);
        parser
    }

    #[test]
    fn test_middleware_returns_parser_for_chaining() {
        let mut parser = quiet();
        parser
            .middleware(Callback::new(|_: &mut Arguments, _: &ParserContext| {}))
            .unwrap()
            .middleware_before_validation(Callback::new(|_: &mut Arguments, _: &ParserContext| {}))
            .unwrap();

        assert_eq!(parser.global_middleware().len(), 2);
        assert_eq!(parser.global_middleware().before_validation_count(), 1);
    }

    #[test]
    fn test_invalid_list_leaves_registry_empty() {
        let mut parser = quiet();
        let err = parser
            .middleware(vec![
                Callback::new(|_: &mut Arguments, _: &ParserContext| {}),
                Callback::named("callback1"),
            ])
            .unwrap_err();

        assert_eq!(err.to_string(), "middleware must be a function");
        assert!(parser.global_middleware().is_empty());
    }

    #[test]
    fn test_malformed_declaration_is_not_added() {
        let mut parser = quiet();
        let result = parser.command(
            "<oops>",
            "",
            |_| Ok(()),
            |_: &mut Arguments, _: &ParserContext| {},
        );
        assert!(matches!(result, Err(ArgmillError::Config(_))));
        assert!(parser.commands().is_empty());
    }

    #[test]
    fn test_from_config_registers_named_middleware() {
        let mut catalog = MiddlewareCatalog::new();
        catalog.insert_fn("defaults", |args: &mut Arguments, _: &ParserContext| {
            args.set("token", "from-defaults");
        });
        catalog.insert_fn("stamp", |args: &mut Arguments, _: &ParserContext| {
            args.set("stamped", true);
        });

        let config = ArgmillConfig::builder()
            .parser(argmill_config::ParserSection {
                exit_process: false,
            })
            .middleware(MiddlewareSection {
                global: vec!["stamp".to_string()],
                before_validation: vec!["defaults".to_string()],
            })
            .build();

        let mut parser = Parser::from_config(&config, catalog).unwrap();
        parser.demand("token");

        let args = parser
            .parse(Vec::<String>::new())
            .unwrap()
            .into_resolved()
            .unwrap();
        assert_eq!(args.get_str("token"), Some("from-defaults"));
        assert_eq!(args.get_bool("stamped"), Some(true));
    }

    #[test]
    fn test_from_config_rejects_unknown_name() {
        let config = ArgmillConfig::builder()
            .middleware(MiddlewareSection {
                global: vec!["missing".to_string()],
                ..Default::default()
            })
            .build();

        let err = Parser::from_config(&config, MiddlewareCatalog::new()).unwrap_err();
        assert!(matches!(err, ArgmillError::Config(_)));
        assert!(err.to_string().contains("missing"));
    }
}
