use crate::command::{ExitCode, Invocation};
use crate::completer::Completer;
use crate::config::ShellConfig;
use crate::env::Environment;
use crate::line_editor::ShellHelper;
use crate::registry::CommandRegistry;
use anyhow::{Context, Result};
use log::{debug, info, warn};
use rustyline::Editor;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use std::cell::{Ref, RefCell, RefMut};
use std::io::{self, Write};
use std::rc::Rc;

type Prompter = Box<dyn Fn(&Environment) -> String>;

/// Interactive shell over a command tree.
///
/// The shell owns an [`Environment`] handed to every command, resolves each
/// submitted line through its [`CommandRegistry`] and feeds the same
/// registry to the line editor for tab completion.
///
/// Example
/// ```
/// use treesh::{Shell, builtin_commands};
/// use treesh::io_adapters::MemWriter;
///
/// let out = MemWriter::new();
/// let mut sh = Shell::new(builtin_commands().unwrap());
/// sh.set_stdout(out.clone());
/// assert_eq!(sh.run_line("echo hello world").unwrap(), 0);
/// assert_eq!(out.contents(), "hello world\n");
/// ```
pub struct Shell {
    /// Command tree, shared with every completer handed out.
    commands: Rc<CommandRegistry>,
    /// Passed to commands while they run and read by completions otherwise.
    env: Rc<RefCell<Environment>>,
    config: ShellConfig,
    /// Takes precedence over `config.prompt` when set.
    prompter: Option<Prompter>,
    stdout: Box<dyn Write>,
    stderr: Box<dyn Write>,
}

impl Shell {
    /// A shell over `commands` with default settings, writing to the
    /// process's standard streams.
    pub fn new(commands: CommandRegistry) -> Self {
        Self::with_config(commands, ShellConfig::default())
    }

    pub fn with_config(commands: CommandRegistry, config: ShellConfig) -> Self {
        Self {
            commands: Rc::new(commands),
            env: Rc::new(RefCell::new(Environment::new())),
            config,
            prompter: None,
            stdout: Box::new(io::stdout()),
            stderr: Box::new(io::stderr()),
        }
    }

    /// Overrides the prompt template from the configuration.
    pub fn set_prompter(&mut self, prompter: impl Fn(&Environment) -> String + 'static) {
        self.prompter = Some(Box::new(prompter));
    }

    pub fn set_stdout(&mut self, stdout: impl Write + 'static) {
        self.stdout = Box::new(stdout);
    }

    pub fn set_stderr(&mut self, stderr: impl Write + 'static) {
        self.stderr = Box::new(stderr);
    }

    pub fn commands(&self) -> &CommandRegistry {
        &self.commands
    }

    pub fn env(&self) -> Ref<'_, Environment> {
        self.env.borrow()
    }

    pub fn env_mut(&mut self) -> RefMut<'_, Environment> {
        self.env.borrow_mut()
    }

    /// A completer sharing this shell's command tree and environment.
    pub fn completer(&self) -> Completer {
        Completer::new(Rc::clone(&self.commands)).with_env(Rc::clone(&self.env))
    }

    pub fn prompt(&self) -> String {
        let env = self.env.borrow();
        match &self.prompter {
            Some(prompter) => prompter(&env),
            None => self.config.render_prompt(&env),
        }
    }

    /// Resolves `tokens` and runs the command found.
    pub fn execute(&mut self, tokens: &[String]) -> Result<ExitCode> {
        let commands = Rc::clone(&self.commands);
        let found = commands.resolve(tokens)?;
        debug!("running {:?} with {:?}", found.path, found.args);
        let invocation = Invocation {
            path: &found.path,
            args: found.args,
        };
        let code = found
            .command
            .execute(&invocation, &mut self.stdout, &mut self.env.borrow_mut())
            .with_context(|| format!("{} failed", invocation.name()));
        self.stdout.flush()?;
        code
    }

    /// Splits `line` on whitespace and executes it. Failures are reported on
    /// the error stream and turn into exit code 1; blank lines do nothing.
    ///
    /// Only a failure to write that report is returned as an error.
    pub fn run_line(&mut self, line: &str) -> io::Result<ExitCode> {
        let tokens: Vec<String> = line.split_whitespace().map(String::from).collect();
        if tokens.is_empty() {
            return Ok(0);
        }
        match self.execute(&tokens) {
            Ok(code) => Ok(code),
            Err(e) => {
                writeln!(self.stderr, "{:#}", e)?;
                self.stderr.flush()?;
                Ok(1)
            }
        }
    }

    /// Read-eval loop on the terminal with history and tab completion.
    ///
    /// Returns on end of input, on interrupt, or once a command sets
    /// [`Environment::should_exit`]. The history file is written back even
    /// when the loop ends with an error.
    pub fn repl(&mut self) -> Result<()> {
        let mut rl: Editor<ShellHelper, DefaultHistory> =
            Editor::with_config(self.config.editor_config()?)?;
        rl.set_helper(Some(ShellHelper::new(self.completer())));
        if let Some(path) = &self.config.history_file {
            if let Err(e) = rl.load_history(path) {
                debug!("no history loaded from {}: {}", path.display(), e);
            }
        }

        info!("shell started with {} top-level command(s)", self.commands.len());
        let outcome = self.read_eval(&mut rl);

        let outcome = match &self.config.history_file {
            Some(path) => {
                let saved = rl
                    .save_history(path)
                    .with_context(|| format!("can't save history to {}", path.display()));
                first_error(outcome, saved)
            }
            None => outcome,
        };
        info!("shell stopped");
        outcome
    }

    fn read_eval(&mut self, rl: &mut Editor<ShellHelper, DefaultHistory>) -> Result<()> {
        while !self.env.borrow().should_exit {
            match rl.readline(&self.prompt()) {
                Ok(line) => {
                    if self.config.auto_add_history && !line.trim().is_empty() {
                        rl.add_history_entry(line.as_str())?;
                    }
                    self.run_line(&line)?;
                }
                Err(ReadlineError::Interrupted) => {
                    writeln!(self.stdout, "Interrupted")?;
                    return Ok(());
                }
                Err(ReadlineError::Eof) => return Ok(()),
                Err(err) => return Err(err).context("can't read input"),
            }
        }
        Ok(())
    }
}

/// The loop's own error wins; a later failure is only logged.
fn first_error(outcome: Result<()>, then: Result<()>) -> Result<()> {
    match (outcome, then) {
        (Err(e), Err(later)) => {
            warn!("{:#}", later);
            Err(e)
        }
        (Err(e), Ok(())) => Err(e),
        (Ok(()), then) => then,
    }
}
