//! Shell settings, optionally read from a TOML file.

use crate::env::Environment;
use anyhow::{Context, Result};
use rustyline::CompletionType;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// How the line editor presents several candidates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionStyle {
    /// Complete the common part, list the candidates on a second tab.
    #[default]
    List,
    /// Cycle through the candidates in place.
    Circular,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShellConfig {
    /// Prompt template; `{cwd}` is replaced by the working directory.
    pub prompt: String,
    pub history_size: usize,
    /// Record every non-blank submitted line in the history.
    pub auto_add_history: bool,
    pub completion: CompletionStyle,
    /// Loaded before the loop starts and written back when it ends.
    pub history_file: Option<PathBuf>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            prompt: "> ".to_string(),
            history_size: 100,
            auto_add_history: true,
            completion: CompletionStyle::List,
            history_file: None,
        }
    }
}

impl ShellConfig {
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("invalid shell configuration")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("can't read {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("in {}", path.display()))
    }

    pub fn render_prompt(&self, env: &Environment) -> String {
        self.prompt
            .replace("{cwd}", &env.current_dir.to_string_lossy())
    }

    pub(crate) fn editor_config(&self) -> rustyline::Result<rustyline::Config> {
        let completion_type = match self.completion {
            CompletionStyle::List => CompletionType::List,
            CompletionStyle::Circular => CompletionType::Circular,
        };
        Ok(rustyline::Config::builder()
            .max_history_size(self.history_size)?
            .completion_type(completion_type)
            .build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = ShellConfig::default();
        assert_eq!(config.prompt, "> ");
        assert_eq!(config.completion, CompletionStyle::List);
        assert!(config.history_file.is_none());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = ShellConfig::from_toml(
            r#"
prompt = "{cwd}$ "
completion = "circular"
"#,
        )
        .unwrap();
        assert_eq!(config.prompt, "{cwd}$ ");
        assert_eq!(config.completion, CompletionStyle::Circular);
        assert_eq!(config.history_size, 100);
        assert!(config.auto_add_history);
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(ShellConfig::from_toml("promt = \"> \"").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("treesh.toml");
        fs::write(&path, "history_size = 5\nhistory_file = \"/tmp/h\"\n").unwrap();

        let config = ShellConfig::load(&path).unwrap();
        assert_eq!(config.history_size, 5);
        assert_eq!(config.history_file, Some(PathBuf::from("/tmp/h")));

        assert!(ShellConfig::load(&dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn test_render_prompt() {
        let env = Environment {
            vars: HashMap::new(),
            current_dir: PathBuf::from("/home/user"),
            should_exit: false,
        };
        let config = ShellConfig {
            prompt: "{cwd}> ".to_string(),
            ..ShellConfig::default()
        };
        assert_eq!(config.render_prompt(&env), "/home/user> ");
        assert_eq!(ShellConfig::default().render_prompt(&env), "> ");
    }

    #[test]
    fn test_editor_config() {
        let config = ShellConfig {
            history_size: 7,
            completion: CompletionStyle::Circular,
            ..ShellConfig::default()
        };
        let editor = config.editor_config().unwrap();
        assert_eq!(editor.max_history_size(), 7);
        assert_eq!(editor.completion_type(), CompletionType::Circular);
    }
}
