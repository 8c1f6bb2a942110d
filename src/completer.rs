//! Tab completion over a [`CommandRegistry`].
//!
//! The completer walks the registry with the fields typed before the cursor,
//! the same way [`CommandRegistry::resolve`] walks submitted tokens, and
//! proposes replacements for the field under the cursor.

use crate::command::{Command, Completable, CompletionContext};
use crate::env::Environment;
use crate::registry::CommandRegistry;
use log::{debug, trace};
use std::cell::RefCell;
use std::rc::Rc;

/// Result of a completion request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    /// Fields already matched before the one being completed, each followed
    /// by a single space.
    pub head: String,
    /// Sorted replacements for the field being completed.
    pub candidates: Vec<String>,
    /// Text after the cursor, unmodified.
    pub tail: String,
}

/// Where the walk stands after consuming a field.
enum Position<'a> {
    /// Completing a command name at this level.
    Commands(&'a CommandRegistry),
    /// Completing arguments of a leaf (or of a tree without sub-commands).
    Arguments(Option<&'a dyn Completable>),
}

/// Produces completion candidates for partially typed command lines.
#[derive(Debug, Clone)]
pub struct Completer {
    commands: Rc<CommandRegistry>,
    env: Rc<RefCell<Environment>>,
}

impl Completer {
    /// A completer over `commands` with its own snapshot of the process
    /// environment.
    pub fn new(commands: Rc<CommandRegistry>) -> Self {
        Self {
            commands,
            env: Rc::new(RefCell::new(Environment::new())),
        }
    }

    /// Hands leaf completions a shared environment instead, so they follow
    /// its working directory and variables as they change.
    pub fn with_env(mut self, env: Rc<RefCell<Environment>>) -> Self {
        self.env = env;
        self
    }

    /// Completes the field ending at byte offset `cursor` of `line`.
    ///
    /// A cursor past the end of the line is treated as the end; a cursor
    /// inside a multi-byte character is moved back to its start. Never fails:
    /// input that matches nothing yields no candidates.
    pub fn complete(&self, line: &str, cursor: usize) -> Completion {
        let (typed, tail) = line.split_at(char_boundary(line, cursor));
        let tail = tail.to_string();
        let mut fields: Vec<&str> = typed.split_whitespace().collect();
        if typed.is_empty() || typed.ends_with(char::is_whitespace) {
            fields.push("");
        }
        let Some((&current, consumed)) = fields.split_last() else {
            return Completion {
                tail,
                ..Completion::default()
            };
        };

        let mut head = String::new();
        let mut args = Vec::new();
        let mut position = Position::Commands(self.commands.as_ref());
        for &field in consumed {
            position = match position {
                Position::Commands(commands) => match commands.get(field) {
                    Some(Command::Tree(tree)) if !tree.commands().is_empty() => {
                        Position::Commands(tree.commands())
                    }
                    Some(command) => Position::Arguments(command.completable()),
                    None => {
                        // The walk stops here; the field is completed in place
                        // and whatever follows it is dropped.
                        debug!("{:?} is not a command, completing it as typed", field);
                        return Completion {
                            candidates: matching_names(commands, field),
                            head,
                            tail,
                        };
                    }
                },
                arguments @ Position::Arguments(_) => {
                    args.push(field);
                    arguments
                }
            };
            head.push_str(field);
            head.push(' ');
        }

        let candidates = match position {
            Position::Commands(commands) => matching_names(commands, current),
            Position::Arguments(Some(completable)) => {
                self.argument_candidates(completable, current, &args)
            }
            Position::Arguments(None) => Vec::new(),
        };
        trace!(
            "completing {:?} after {:?}: {} candidate(s)",
            current,
            head,
            candidates.len()
        );

        Completion {
            head,
            candidates,
            tail,
        }
    }

    fn argument_candidates(
        &self,
        completable: &dyn Completable,
        prefix: &str,
        args: &[&str],
    ) -> Vec<String> {
        let Ok(env) = self.env.try_borrow() else {
            debug!("environment is busy, no argument completions");
            return Vec::new();
        };
        let ctx = CompletionContext { args, env: &env };
        let mut candidates: Vec<String> = completable
            .completions(prefix, &ctx)
            .into_iter()
            .filter(|candidate| candidate.starts_with(prefix))
            .collect();
        candidates.sort();
        candidates.dedup();
        candidates
    }
}

fn matching_names(commands: &CommandRegistry, prefix: &str) -> Vec<String> {
    commands
        .prefix_matches(prefix)
        .names()
        .map(String::from)
        .collect()
}

fn char_boundary(line: &str, cursor: usize) -> usize {
    let mut cursor = cursor.min(line.len());
    while !line.is_char_boundary(cursor) {
        cursor -= 1;
    }
    cursor
}
