//! Command-tree dispatch and tab completion for interactive shells.
//!
//! Commands live in a [`CommandRegistry`]: leaves are executable and may
//! offer completions for their arguments, trees group further registries.
//! [`CommandRegistry::resolve`] turns a submitted token sequence into the
//! command to run plus its arguments, and [`Completer`] walks the same tree
//! while a line is still being typed.
//!
//! [`Shell`] ties both to a rustyline editor. The public modules [`command`],
//! [`registry`] and [`completer`] can be used without it.

mod builtin;
pub mod command;
pub mod completer;
pub mod config;
pub mod env;
pub mod error;
pub mod io_adapters;
mod line_editor;
pub mod registry;
mod shell;

pub use builtin::builtin_commands;
pub use command::{
    Command, Completable, CompletionContext, ExitCode, FnCommand, Invocation, LeafCommand,
};
pub use completer::{Completer, Completion};
pub use error::CommandError;
pub use line_editor::ShellHelper;
pub use registry::CommandRegistry;

/// Just a convenient re-export of the interactive shell.
///
/// See [`Shell`] for the high-level API and examples.
pub use shell::Shell;
