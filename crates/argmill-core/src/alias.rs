//! Alias expansion.
//!
//! Aliases are applied once, before any middleware observes the arguments.
//! After [`AliasResolver::resolve`] every name of an alias group holds the
//! same value.

use crate::arguments::Arguments;

/// Expands option aliases into the argument object.
pub trait AliasResolver: Send + Sync + 'static {
    /// Mirrors aliased values across every name of their group.
    fn resolve(&self, args: &mut Arguments);

    /// Returns every other name that `key` is aliased to.
    fn aliases_of(&self, key: &str) -> Vec<String>;
}

/// Alias groups declared with [`AliasTable::alias`].
///
/// Declaring `alias("foo", "f")` and `alias("f", "F")` puts all three names
/// in one group.
///
/// # Example
///
/// ```
/// use argmill_core::{AliasResolver, AliasTable, Arguments};
///
/// let mut table = AliasTable::new();
/// table.alias("foo", "f");
///
/// let mut args: Arguments = [("foo", 99)].into_iter().collect();
/// table.resolve(&mut args);
/// assert_eq!(args.get_i64("f"), Some(99));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasTable {
    groups: Vec<Vec<String>>,
}

impl AliasTable {
    /// Creates an empty alias table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares `alias` as another name for `key`.
    pub fn alias(&mut self, key: impl Into<String>, alias: impl Into<String>) {
        let key = key.into();
        let alias = alias.into();

        let key_group = self.group_index(&key);
        let alias_group = self.group_index(&alias);

        match (key_group, alias_group) {
            (Some(a), Some(b)) if a == b => {}
            (Some(a), Some(b)) => {
                let (keep, drop) = (a.min(b), a.max(b));
                let moved = self.groups.remove(drop);
                for name in moved {
                    if !self.groups[keep].contains(&name) {
                        self.groups[keep].push(name);
                    }
                }
            }
            (Some(a), None) => self.groups[a].push(alias),
            (None, Some(b)) => self.groups[b].insert(0, key),
            (None, None) => self.groups.push(vec![key, alias]),
        }
    }

    /// Adds every group of `other` to this table.
    pub fn extend(&mut self, other: &AliasTable) {
        for group in &other.groups {
            if let Some((first, rest)) = group.split_first() {
                for name in rest {
                    self.alias(first.clone(), name.clone());
                }
            }
        }
    }

    /// Returns every declared name, in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().flatten().map(String::as_str)
    }

    /// Returns `true` if no alias is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    fn group_index(&self, name: &str) -> Option<usize> {
        self.groups
            .iter()
            .position(|group| group.iter().any(|n| n == name))
    }
}

impl AliasResolver for AliasTable {
    fn resolve(&self, args: &mut Arguments) {
        for group in &self.groups {
            // The first name present in the group supplies the value.
            let Some(value) = group.iter().find_map(|name| args.get(name).cloned()) else {
                continue;
            };
            for name in group {
                if args.get(name) != Some(&value) {
                    tracing::trace!(alias = %name, "mirroring aliased value");
                    args.set(name.clone(), value.clone());
                }
            }
        }
    }

    fn aliases_of(&self, key: &str) -> Vec<String> {
        self.group_index(key)
            .map(|idx| {
                self.groups[idx]
                    .iter()
                    .filter(|name| *name != key)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_mirrors_in_both_directions() {
        let mut table = AliasTable::new();
        table.alias("foo", "f");

        let mut long: Arguments = [("foo", 1)].into_iter().collect();
        table.resolve(&mut long);
        assert_eq!(long.get_i64("f"), Some(1));

        let mut short: Arguments = [("f", 2)].into_iter().collect();
        table.resolve(&mut short);
        assert_eq!(short.get_i64("foo"), Some(2));
    }

    #[test]
    fn test_groups_are_transitive() {
        let mut table = AliasTable::new();
        table.alias("foo", "f");
        table.alias("f", "F");

        assert_eq!(table.aliases_of("F"), vec!["foo", "f"]);

        let mut args: Arguments = [("F", "x")].into_iter().collect();
        table.resolve(&mut args);
        assert_eq!(args.get("foo"), Some(&json!("x")));
        assert_eq!(args.get("f"), Some(&json!("x")));
    }

    #[test]
    fn test_joining_two_groups() {
        let mut table = AliasTable::new();
        table.alias("a", "b");
        table.alias("c", "d");
        table.alias("b", "c");

        let mut aliases = table.aliases_of("a");
        aliases.sort();
        assert_eq!(aliases, vec!["b", "c", "d"]);
    }

    #[test]
    fn test_absent_group_is_untouched() {
        let mut table = AliasTable::new();
        table.alias("foo", "f");

        let mut args = Arguments::new();
        table.resolve(&mut args);
        assert!(!args.contains_key("foo"));
        assert!(!args.contains_key("f"));
    }

    #[test]
    fn test_extend() {
        let mut scoped = AliasTable::new();
        scoped.alias("verbose", "v");

        let mut table = AliasTable::new();
        table.alias("foo", "f");
        table.extend(&scoped);

        assert_eq!(table.aliases_of("v"), vec!["verbose"]);
        assert_eq!(table.names().count(), 4);
    }

    proptest! {
        #[test]
        fn prop_chain_of_aliases_mirrors_to_every_name(len in 2usize..8, pick in 0usize..8, value in any::<i64>()) {
            let names: Vec<String> = (0..len).map(|i| format!("n{i}")).collect();
            let mut table = AliasTable::new();
            for pair in names.windows(2) {
                table.alias(pair[0].clone(), pair[1].clone());
            }

            let mut args = Arguments::new();
            args.set(names[pick % len].clone(), value);
            table.resolve(&mut args);

            for name in &names {
                prop_assert_eq!(args.get_i64(name), Some(value));
            }
        }
    }
}
