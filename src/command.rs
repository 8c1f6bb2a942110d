use crate::env::Environment;
use crate::error::Result as RegistryResult;
use crate::registry::CommandRegistry;
use anyhow::Result;
use std::fmt;
use std::io::Write;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// This mirrors the convention used by POSIX shells and many command-line tools.
pub type ExitCode = i32;

/// What a leaf command receives when it is run.
///
/// `path` holds the command names that were consumed while descending the
/// registry (e.g. `["show", "env"]`), `args` everything typed after them.
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    pub path: &'a [&'a str],
    pub args: &'a [String],
}

impl Invocation<'_> {
    /// Full command name as typed, path segments joined by single spaces.
    pub fn name(&self) -> String {
        self.path.join(" ")
    }
}

/// An executable command with no sub-namespace.
pub trait LeafCommand {
    /// Executes the command.
    ///
    /// Return value should follow shell conventions: 0 for success, non-zero for error.
    fn execute(
        &self,
        invocation: &Invocation<'_>,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode>;

    /// Dynamic argument completion, if the command offers any.
    fn completable(&self) -> Option<&dyn Completable> {
        None
    }
}

/// What a [`Completable`] can see besides the text being completed.
#[derive(Debug, Clone, Copy)]
pub struct CompletionContext<'a> {
    /// Argument fields already typed before the one being completed.
    pub args: &'a [&'a str],
    /// The shell's environment; relative paths complete against its
    /// `current_dir`.
    pub env: &'a Environment,
}

/// Optional capability of a leaf command: propose values for the argument
/// currently being typed.
pub trait Completable {
    /// Candidates for an argument starting with `prefix`. Implementations may
    /// return unrelated entries; the completer filters and sorts them.
    fn completions(&self, prefix: &str, ctx: &CompletionContext<'_>) -> Vec<String>;
}

/// A command that only groups other commands. Running it does nothing.
#[derive(Debug, Default)]
pub struct TreeCommand {
    commands: CommandRegistry,
}

impl TreeCommand {
    pub fn new(commands: CommandRegistry) -> Self {
        Self { commands }
    }

    pub fn commands(&self) -> &CommandRegistry {
        &self.commands
    }

    /// Registers a sub-command; see [`CommandRegistry::register`].
    pub fn add(&mut self, name: impl Into<String>, command: Command) -> RegistryResult<()> {
        self.commands.register(name, command)
    }
}

/// Node of the command tree.
pub enum Command {
    Leaf(Box<dyn LeafCommand>),
    Tree(TreeCommand),
}

impl Command {
    pub fn leaf(command: impl LeafCommand + 'static) -> Self {
        Command::Leaf(Box::new(command))
    }

    pub fn tree(commands: CommandRegistry) -> Self {
        Command::Tree(TreeCommand::new(commands))
    }

    /// Sub-commands of a tree command, `None` for leaves.
    pub fn sub_commands(&self) -> Option<&CommandRegistry> {
        match self {
            Command::Leaf(_) => None,
            Command::Tree(tree) => Some(tree.commands()),
        }
    }

    pub fn completable(&self) -> Option<&dyn Completable> {
        match self {
            Command::Leaf(leaf) => leaf.completable(),
            Command::Tree(_) => None,
        }
    }

    pub fn execute(
        &self,
        invocation: &Invocation<'_>,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        match self {
            Command::Leaf(leaf) => leaf.execute(invocation, stdout, env),
            Command::Tree(_) => Ok(0),
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Leaf(leaf) => f
                .debug_struct("Leaf")
                .field("completable", &leaf.completable().is_some())
                .finish(),
            Command::Tree(tree) => f.debug_tuple("Tree").field(tree.commands()).finish(),
        }
    }
}

type RunFn = dyn Fn(&Invocation<'_>, &mut dyn Write, &mut Environment) -> Result<ExitCode>;
type CompleteFn = dyn Fn(&str, &CompletionContext<'_>) -> Vec<String>;

/// Leaf command backed by closures.
///
/// ```
/// use std::io::Write;
/// use treesh::command::{Command, FnCommand};
/// let hello = Command::leaf(FnCommand::new(|_, out, _| {
///     writeln!(out, "hello")?;
///     Ok(0)
/// }));
/// assert!(hello.sub_commands().is_none());
/// ```
pub struct FnCommand {
    run: Box<RunFn>,
    complete: Option<Box<CompleteFn>>,
}

impl FnCommand {
    pub fn new<F>(run: F) -> Self
    where
        F: Fn(&Invocation<'_>, &mut dyn Write, &mut Environment) -> Result<ExitCode> + 'static,
    {
        Self {
            run: Box::new(run),
            complete: None,
        }
    }

    /// Attaches a dynamic completion source.
    pub fn with_completions<G>(mut self, complete: G) -> Self
    where
        G: Fn(&str, &CompletionContext<'_>) -> Vec<String> + 'static,
    {
        self.complete = Some(Box::new(complete));
        self
    }
}

impl LeafCommand for FnCommand {
    fn execute(
        &self,
        invocation: &Invocation<'_>,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        (self.run)(invocation, stdout, env)
    }

    fn completable(&self) -> Option<&dyn Completable> {
        self.complete.as_ref().map(|_| self as &dyn Completable)
    }
}

impl Completable for FnCommand {
    fn completions(&self, prefix: &str, ctx: &CompletionContext<'_>) -> Vec<String> {
        self.complete
            .as_ref()
            .map(|complete| complete(prefix, ctx))
            .unwrap_or_default()
    }
}
