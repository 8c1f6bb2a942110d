//! Named, hierarchical command lookup.

use crate::command::Command;
use crate::error::{CommandError, Result};
use log::{debug, trace};
use std::collections::BTreeMap;
use std::collections::btree_map;
use std::ops::Bound;

/// Mapping from command names to commands at one level of the tree.
///
/// Names are unique within a registry and iterate in lexicographic order.
/// A registry is built once and only read afterwards.
#[derive(Debug, Default)]
pub struct CommandRegistry {
    /// Commands keyed by name; the ordering gives sorted listings and prefix
    /// ranges for free.
    commands: BTreeMap<String, Command>,
}

/// Outcome of [`CommandRegistry::resolve`].
#[derive(Debug)]
pub struct Resolution<'r, 't, S> {
    /// The command to run.
    pub command: &'r Command,
    /// Names consumed while descending, in order.
    pub path: Vec<&'r str>,
    /// Tokens after the consumed path.
    pub args: &'t [S],
}

impl CommandRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `command` under `name`.
    ///
    /// Fails with [`CommandError::DuplicateName`] if the name is taken and with
    /// [`CommandError::InvalidName`] if it is empty or contains whitespace.
    /// The registry is left untouched on failure.
    pub fn register(&mut self, name: impl Into<String>, command: Command) -> Result<()> {
        let name = name.into();
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(CommandError::InvalidName { name });
        }
        match self.commands.entry(name) {
            btree_map::Entry::Occupied(entry) => Err(CommandError::DuplicateName {
                name: entry.key().clone(),
            }),
            btree_map::Entry::Vacant(entry) => {
                trace!("registering command {}", entry.key());
                entry.insert(command);
                Ok(())
            }
        }
    }

    /// Exact lookup.
    pub fn get(&self, name: &str) -> Option<&Command> {
        self.commands.get(name)
    }

    /// Number of commands at this level, not counting sub-commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// `true` for a registry without commands, such as the sub-registry of
    /// an empty tree.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Command names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.commands.keys().map(String::as_str)
    }

    /// Entries whose name starts with `prefix`, in sorted order.
    /// An empty prefix matches everything.
    pub fn prefix_matches<'a>(&'a self, prefix: &'a str) -> PrefixMatches<'a> {
        PrefixMatches {
            range: self
                .commands
                .range::<str, _>((Bound::Included(prefix), Bound::Unbounded)),
            prefix,
        }
    }

    /// Walks `tokens` down the tree using exact name matches only.
    ///
    /// Descends into tree commands that have sub-commands. Stops at a leaf or
    /// at a tree without sub-commands; everything after that token becomes
    /// [`Resolution::args`]. Running out of tokens on a tree resolves to that
    /// tree with no arguments.
    pub fn resolve<'r, 't, S: AsRef<str>>(
        &'r self,
        tokens: &'t [S],
    ) -> Result<Resolution<'r, 't, S>> {
        let no_match = || CommandError::NoMatch {
            tokens: tokens.iter().map(|t| t.as_ref().to_string()).collect(),
        };

        let mut commands = self;
        let mut path = Vec::new();
        let mut found = None;
        for (i, token) in tokens.iter().enumerate() {
            let Some((name, command)) = commands.commands.get_key_value(token.as_ref()) else {
                debug!("no command named {:?} at depth {}", token.as_ref(), i);
                return Err(no_match());
            };
            path.push(name.as_str());
            found = Some(command);
            match command.sub_commands() {
                Some(sub) if !sub.is_empty() => commands = sub,
                _ => {
                    trace!("resolved {:?} with {} argument(s)", path, tokens.len() - i - 1);
                    return Ok(Resolution {
                        command,
                        path,
                        args: &tokens[i + 1..],
                    });
                }
            }
        }

        match found {
            Some(command) => {
                trace!("resolved {:?} to a tree command", path);
                Ok(Resolution {
                    command,
                    path,
                    args: &tokens[tokens.len()..],
                })
            }
            None => Err(no_match()),
        }
    }
}

/// View over the entries of a registry sharing a name prefix.
pub struct PrefixMatches<'a> {
    /// Entries from the first name not less than `prefix` onwards.
    range: btree_map::Range<'a, String, Command>,
    prefix: &'a str,
}

impl<'a> PrefixMatches<'a> {
    /// Matching names only.
    pub fn names(self) -> impl Iterator<Item = &'a str> {
        self.map(|(name, _)| name)
    }
}

impl<'a> Iterator for PrefixMatches<'a> {
    type Item = (&'a str, &'a Command);

    fn next(&mut self) -> Option<Self::Item> {
        let (name, command) = self.range.next()?;
        if name.starts_with(self.prefix) {
            Some((name.as_str(), command))
        } else {
            // Sorted order: once a key stops matching, none after it can match.
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::FnCommand;

    fn leaf() -> Command {
        Command::leaf(FnCommand::new(|_, _, _| Ok(0)))
    }

    fn people() -> CommandRegistry {
        let mut commands = CommandRegistry::new();
        for name in ["john", "james", "mary", "nancy"] {
            commands.register(name, leaf()).unwrap();
        }
        commands
    }

    /// `tlc` -> { subCmd1, subCmd2 }
    fn nested() -> CommandRegistry {
        let mut sub = CommandRegistry::new();
        sub.register("subCmd1", leaf()).unwrap();
        sub.register("subCmd2", leaf()).unwrap();
        let mut commands = CommandRegistry::new();
        commands.register("tlc", Command::tree(sub)).unwrap();
        commands
    }

    #[test]
    fn test_register_then_resolve() {
        let mut commands = people();
        commands.register("rita", leaf()).unwrap();

        let found = commands.resolve(&["rita"]).unwrap();
        assert!(std::ptr::eq(found.command, commands.get("rita").unwrap()));
        assert!(found.args.is_empty());
        assert_eq!(found.path, vec!["rita"]);
    }

    #[test]
    fn test_register_duplicate_leaves_registry_unchanged() {
        let mut commands = people();
        let before = commands.get("john").unwrap() as *const Command;

        let err = commands
            .register("john", Command::tree(CommandRegistry::new()))
            .unwrap_err();

        assert_eq!(
            err,
            CommandError::DuplicateName {
                name: "john".to_string()
            }
        );
        assert_eq!(commands.len(), 4);
        assert!(std::ptr::eq(before, commands.get("john").unwrap()));
        assert!(commands.get("john").unwrap().sub_commands().is_none());
    }

    #[test]
    fn test_register_rejects_invalid_names() {
        let mut commands = people();
        for name in ["", "two words", " "] {
            let err = commands.register(name, leaf()).unwrap_err();
            assert_eq!(
                err,
                CommandError::InvalidName {
                    name: name.to_string()
                }
            );
        }
        assert_eq!(commands.len(), 4);
    }

    #[test]
    fn test_prefix_matches_empty_prefix_returns_everything() {
        let commands = people();
        let names: Vec<&str> = commands.prefix_matches("").names().collect();
        assert_eq!(names, vec!["james", "john", "mary", "nancy"]);
    }

    #[test]
    fn test_prefix_matches_filters_by_prefix() {
        let commands = people();
        let names: Vec<&str> = commands.prefix_matches("j").names().collect();
        assert_eq!(names, vec!["james", "john"]);

        assert_eq!(commands.prefix_matches("x").count(), 0);
        assert_eq!(commands.prefix_matches("johnny").count(), 0);
        assert_eq!(commands.len(), 4);
    }

    #[test]
    fn test_resolve_empty_tokens_fails() {
        let commands = people();
        let tokens: [&str; 0] = [];
        let err = commands.resolve(&tokens).unwrap_err();
        assert_eq!(err, CommandError::NoMatch { tokens: vec![] });
    }

    #[test]
    fn test_resolve_unknown_token_fails() {
        let commands = people();
        let err = commands.resolve(&["cmd1", "arg"]).unwrap_err();
        assert_eq!(
            err,
            CommandError::NoMatch {
                tokens: vec!["cmd1".to_string(), "arg".to_string()]
            }
        );
    }

    #[test]
    fn test_resolve_leaf_returns_arguments() {
        let commands = people();
        let found = commands.resolve(&["mary", "arg1", "arg2"]).unwrap();
        assert!(std::ptr::eq(found.command, commands.get("mary").unwrap()));
        assert_eq!(found.args, &["arg1", "arg2"]);
    }

    #[test]
    fn test_resolve_sub_command() {
        let commands = nested();
        let sub = commands.get("tlc").unwrap().sub_commands().unwrap();

        let found = commands
            .resolve(&["tlc", "subCmd1", "arg1", "arg2"])
            .unwrap();
        assert!(std::ptr::eq(found.command, sub.get("subCmd1").unwrap()));
        assert_eq!(found.path, vec!["tlc", "subCmd1"]);
        assert_eq!(found.args, &["arg1", "arg2"]);

        let found = commands.resolve(&["tlc", "subCmd2"]).unwrap();
        assert!(std::ptr::eq(found.command, sub.get("subCmd2").unwrap()));
        assert!(found.args.is_empty());
    }

    #[test]
    fn test_resolve_tree_alone() {
        let commands = nested();
        let found = commands.resolve(&["tlc"]).unwrap();
        assert!(std::ptr::eq(found.command, commands.get("tlc").unwrap()));
        assert!(found.args.is_empty());
    }

    #[test]
    fn test_resolve_unknown_sub_command_fails() {
        let commands = nested();
        assert!(matches!(
            commands.resolve(&["tlc", "subCmd3"]),
            Err(CommandError::NoMatch { .. })
        ));
    }

    #[test]
    fn test_resolve_empty_tree_keeps_remaining_tokens() {
        let mut commands = nested();
        commands
            .register("treeCmd", Command::tree(CommandRegistry::new()))
            .unwrap();

        let found = commands.resolve(&["treeCmd", "arg", "arg2"]).unwrap();
        assert!(std::ptr::eq(found.command, commands.get("treeCmd").unwrap()));
        assert_eq!(found.args, &["arg", "arg2"]);
    }

    #[test]
    fn test_resolve_does_not_accept_prefixes() {
        let commands = nested();
        assert!(matches!(
            commands.resolve(&["tl"]),
            Err(CommandError::NoMatch { .. })
        ));
        assert!(commands.resolve(&["tlc", "subCmd"]).is_err());
        let mut single = CommandRegistry::new();
        single.register("interfaces", leaf()).unwrap();
        assert!(single.resolve(&["interface"]).is_err());
    }

    #[test]
    fn test_resolve_owned_tokens() {
        let commands = nested();
        let tokens: Vec<String> = "tlc subCmd1 x"
            .split_whitespace()
            .map(String::from)
            .collect();
        let found = commands.resolve(&tokens).unwrap();
        assert_eq!(found.args, &["x".to_string()]);
    }
}
