//! Validation stage.
//!
//! Validation runs between the before-validation and after-validation
//! middleware partitions. A failure aborts the invocation: the remaining
//! middleware and the handler never run.

use crate::arguments::Arguments;
use crate::context::ParserContext;
use crate::error::{ArgmillError, ArgmillResult};

/// Checks arguments against the parser's declared constraints.
pub trait ValidationStage: Send + Sync + 'static {
    /// Validates `args`, returning an [`ArgmillError::Validation`] on failure.
    fn validate(&self, args: &Arguments, ctx: &ParserContext) -> ArgmillResult<()>;
}

/// Validator that enforces demanded options.
///
/// An option counts as present if it, or any of its aliases, has a value.
#[derive(Debug, Clone, Copy, Default)]
pub struct DemandValidator;

impl ValidationStage for DemandValidator {
    fn validate(&self, args: &Arguments, ctx: &ParserContext) -> ArgmillResult<()> {
        let missing: Vec<&str> = ctx
            .demanded()
            .filter(|key| {
                !args.contains_key(key)
                    && !ctx
                        .aliases_of(key)
                        .iter()
                        .any(|alias| args.contains_key(alias))
            })
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            tracing::debug!(missing = ?missing, "demanded options missing");
            Err(ArgmillError::validation_missing(missing))
        }
    }
}

/// Validator that accepts everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl ValidationStage for AcceptAll {
    fn validate(&self, _args: &Arguments, _ctx: &ParserContext) -> ArgmillResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alias::AliasTable;

    #[test]
    fn test_missing_demand_fails() {
        let ctx = ParserContext::builder().demand("mw").build();
        let err = DemandValidator
            .validate(&Arguments::new(), &ctx)
            .unwrap_err();
        assert_eq!(err.to_string(), "Missing required argument: mw");
    }

    #[test]
    fn test_present_demand_passes() {
        let ctx = ParserContext::builder().demand("mw").build();
        let args: Arguments = [("mw", "mw")].into_iter().collect();
        assert!(DemandValidator.validate(&args, &ctx).is_ok());
    }

    #[test]
    fn test_demand_satisfied_by_alias() {
        let mut aliases = AliasTable::new();
        aliases.alias("name", "n");
        let ctx = ParserContext::builder().demand("name").aliases(aliases).build();

        let args: Arguments = [("n", "x")].into_iter().collect();
        assert!(DemandValidator.validate(&args, &ctx).is_ok());
    }

    #[test]
    fn test_accept_all() {
        let ctx = ParserContext::builder().demand("mw").build();
        assert!(AcceptAll.validate(&Arguments::new(), &ctx).is_ok());
    }
}
