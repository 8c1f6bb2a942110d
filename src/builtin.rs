use crate::command::{Command, Completable, CompletionContext, ExitCode, Invocation, LeafCommand};
use crate::env::Environment;
use crate::registry::CommandRegistry;
use anyhow::{Context, Result};
use argh::{EarlyExit, FromArgs};
use log::warn;
use std::env;
use std::fs;
use std::io::Write;
use std::marker::PhantomData;
use std::path::Path;

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) from the
/// arguments left over after resolution, and executed in-process.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Whether [`BuiltinCommand::completions`] should be consulted.
    const COMPLETES_ARGUMENTS: bool = false;

    /// Executes the command using the provided output stream and environment.
    ///
    /// Return value should follow shell conventions: 0 for success, non-zero for error.
    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode>;

    /// Candidates for the argument currently being typed.
    fn completions(_prefix: &str, _ctx: &CompletionContext<'_>) -> Vec<String> {
        Vec::new()
    }
}

/// Registers a [`BuiltinCommand`] type as a leaf in the command tree.
pub(crate) struct Builtin<T> {
    _phantom: PhantomData<fn() -> T>,
}

impl<T> Default for Builtin<T> {
    fn default() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<T: BuiltinCommand + 'static> Builtin<T> {
    pub(crate) fn command() -> Command {
        Command::leaf(Self::default())
    }
}

impl<T: BuiltinCommand> LeafCommand for Builtin<T> {
    fn execute(
        &self,
        invocation: &Invocation<'_>,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        let args: Vec<&str> = invocation.args.iter().map(String::as_str).collect();
        match T::from_args(invocation.path, &args) {
            Ok(cmd) => cmd.execute(stdout, env),
            // --help or a usage error: argh already formatted the message.
            Err(EarlyExit { output, status }) => {
                stdout.write_all(output.as_bytes())?;
                Ok(if status.is_err() { 1 } else { 0 })
            }
        }
    }

    fn completable(&self) -> Option<&dyn Completable> {
        T::COMPLETES_ARGUMENTS.then_some(self as &dyn Completable)
    }
}

impl<T: BuiltinCommand> Completable for Builtin<T> {
    fn completions(&self, prefix: &str, ctx: &CompletionContext<'_>) -> Vec<String> {
        T::completions(prefix, ctx)
    }
}

/// The default command tree: `cd`, `echo`, `exit`, `pwd`, `set` and
/// `show env|path`.
pub fn builtin_commands() -> crate::error::Result<CommandRegistry> {
    let mut show = CommandRegistry::new();
    show.register("env", Builtin::<ShowEnv>::command())?;
    show.register("path", Builtin::<ShowPath>::command())?;

    let mut commands = CommandRegistry::new();
    commands.register("cd", Builtin::<Cd>::command())?;
    commands.register("echo", Builtin::<Echo>::command())?;
    commands.register("exit", Builtin::<Exit>::command())?;
    commands.register("pwd", Builtin::<Pwd>::command())?;
    commands.register("set", Builtin::<Set>::command())?;
    commands.register("show", Command::tree(show))?;
    Ok(commands)
}

#[derive(FromArgs)]
/// Print the current working directory to standard output.
pub struct Pwd {}

impl BuiltinCommand for Pwd {
    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        writeln!(stdout, "{}", env.current_dir.to_string_lossy())?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Change the current working directory.
/// If no target is provided, changes to the directory specified by the HOME environment variable.
pub struct Cd {
    #[argh(positional)]
    /// directory to switch to; absolute or relative to the current directory. Defaults to $HOME when omitted.
    pub target: Option<String>,
}

impl BuiltinCommand for Cd {
    const COMPLETES_ARGUMENTS: bool = true;

    fn execute(self, _stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        let target = match &self.target {
            Some(t) if !t.is_empty() => t.clone(),
            _ => env
                .get_var("HOME")
                .ok_or_else(|| anyhow::anyhow!("cd: no target and HOME not set"))?,
        };

        let new_dir = env.resolve_path(&target);
        let canonical = fs::canonicalize(&new_dir)
            .with_context(|| format!("cd: can't canonicalize {}", new_dir.display()))?;
        if !canonical.is_dir() {
            return Err(anyhow::anyhow!("cd: {} is not a directory", target));
        }

        env::set_current_dir(&canonical)
            .with_context(|| format!("cd: can't chdir to {}", canonical.display()))?;
        env.current_dir = canonical;
        Ok(0)
    }

    fn completions(prefix: &str, ctx: &CompletionContext<'_>) -> Vec<String> {
        if !ctx.args.is_empty() {
            return Vec::new();
        }
        dir_completions(&ctx.env.current_dir, prefix)
    }
}

/// Sub-directories matching `prefix`, each with a trailing `/`.
///
/// The directory part of `prefix` (up to its last `/`) is listed relative to
/// `base` unless absolute, and kept in front of every candidate.
fn dir_completions(base: &Path, prefix: &str) -> Vec<String> {
    let (dir, name) = match prefix.rfind('/') {
        Some(i) => prefix.split_at(i + 1),
        None => ("", prefix),
    };
    let listed = if dir.is_empty() {
        base.to_path_buf()
    } else {
        base.join(dir)
    };

    let entries = match fs::read_dir(&listed) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("can't list {}: {}", listed.display(), e);
            return Vec::new();
        }
    };

    let mut candidates: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|entry_name| entry_name.starts_with(name))
        .map(|entry_name| format!("{}{}/", dir, entry_name))
        .collect();
    candidates.sort();
    candidates
}

#[derive(FromArgs)]
/// Ask the shell to stop after this command.
pub struct Exit {
    #[argh(positional)]
    /// exit status to report, 0 when omitted.
    pub code: Option<ExitCode>,
}

impl BuiltinCommand for Exit {
    fn execute(self, _stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        env.should_exit = true;
        Ok(self.code.unwrap_or(0))
    }
}

#[derive(FromArgs)]
/// write the arguments to standard output, separated by spaces.
/// by default, a trailing newline is printed.
pub struct Echo {
    #[argh(switch, short = 'n')]
    /// do not output the trailing newline.
    pub no_newline: bool,

    #[argh(positional, greedy)]
    /// values to print as-is, separated by spaces.
    pub args: Vec<String>,
}

impl BuiltinCommand for Echo {
    fn execute(self, stdout: &mut dyn Write, _env: &mut Environment) -> Result<ExitCode> {
        let s = self.args.join(" ");
        if self.no_newline {
            write!(stdout, "{}", s)?;
        } else {
            writeln!(stdout, "{}", s)?;
        }
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Set a shell variable.
pub struct Set {
    #[argh(positional)]
    /// variable name.
    pub name: String,

    #[argh(positional, greedy)]
    /// value words, joined by single spaces.
    pub value: Vec<String>,
}

impl BuiltinCommand for Set {
    const COMPLETES_ARGUMENTS: bool = true;

    fn execute(self, _stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        env.set_var(self.name, self.value.join(" "));
        Ok(0)
    }

    fn completions(_prefix: &str, ctx: &CompletionContext<'_>) -> Vec<String> {
        // Only the name is completed, never the value words.
        if !ctx.args.is_empty() {
            return Vec::new();
        }
        var_names(ctx.env)
    }
}

#[derive(FromArgs)]
/// Print shell variables, all of them when no name is given.
pub struct ShowEnv {
    #[argh(positional, greedy)]
    /// variables to print.
    pub names: Vec<String>,
}

impl BuiltinCommand for ShowEnv {
    const COMPLETES_ARGUMENTS: bool = true;

    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        if self.names.is_empty() {
            let mut vars: Vec<_> = env.vars.iter().collect();
            vars.sort();
            for (name, value) in vars {
                writeln!(stdout, "{}={}", name, value)?;
            }
            return Ok(0);
        }

        let mut code = 0;
        for name in &self.names {
            match env.get_var(name) {
                Some(value) => writeln!(stdout, "{}={}", name, value)?,
                None => {
                    writeln!(stdout, "{}: not set", name)?;
                    code = 1;
                }
            }
        }
        Ok(code)
    }

    fn completions(_prefix: &str, ctx: &CompletionContext<'_>) -> Vec<String> {
        var_names(ctx.env)
    }
}

#[derive(FromArgs)]
/// Print the entries of PATH, one per line.
pub struct ShowPath {}

impl BuiltinCommand for ShowPath {
    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        let Some(paths) = env.get_var("PATH") else {
            return Err(anyhow::anyhow!("PATH is not set"));
        };
        for path in env::split_paths(&paths) {
            writeln!(stdout, "{}", path.display())?;
        }
        Ok(0)
    }
}

fn var_names(env: &Environment) -> Vec<String> {
    env.vars.keys().cloned().collect()
}
