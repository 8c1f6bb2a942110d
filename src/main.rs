use argh::FromArgs;
use std::path::PathBuf;
use treesh::config::ShellConfig;
use treesh::{Shell, builtin_commands};

#[derive(FromArgs)]
/// Interactive command shell with tab completion.
struct Args {
    #[argh(option)]
    /// read settings from this TOML file.
    config: Option<PathBuf>,

    #[argh(option)]
    /// prompt template; {cwd} expands to the working directory.
    prompt: Option<String>,

    #[argh(option)]
    /// history file, loaded at start and saved on exit.
    history: Option<PathBuf>,

    #[argh(positional, greedy)]
    /// run this command line once instead of starting the shell.
    command: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args: Args = argh::from_env();

    let mut config = match &args.config {
        Some(path) => ShellConfig::load(path)?,
        None => ShellConfig::default(),
    };
    if let Some(prompt) = args.prompt {
        config.prompt = prompt;
    }
    if let Some(history) = args.history {
        config.history_file = Some(history);
    }

    let mut shell = Shell::with_config(builtin_commands()?, config);
    if !args.command.is_empty() {
        let code = shell.run_line(&args.command.join(" "))?;
        std::process::exit(code);
    }
    shell.repl()
}
