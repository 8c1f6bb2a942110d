use std::collections::HashMap;
use std::env as stdenv;
use std::path::{Path, PathBuf};

/// Mutable, user-level view of the process environment handed to every command.
///
/// The environment contains:
/// - `vars`: shell variables, seeded from the process environment.
/// - `current_dir`: the working directory commands operate in.
/// - `should_exit`: set by a command to ask the read-eval loop to stop.
#[derive(Debug, Clone)]
pub struct Environment {
    /// Shell variables. Lookups fall back to the process environment.
    pub vars: HashMap<String, String>,
    /// Directory relative paths are resolved against, by commands and by
    /// completions alike.
    pub current_dir: PathBuf,
    /// Checked by the read-eval loop before reading the next line.
    pub should_exit: bool,
}

impl Environment {
    /// Capture the current process state into a new `Environment` instance.
    pub fn new() -> Self {
        let vars = stdenv::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            vars,
            current_dir,
            should_exit: false,
        }
    }

    /// Get the value of a variable, falling back to the process environment.
    pub fn get_var(&self, key: &str) -> Option<String> {
        self.vars
            .get(key)
            .cloned()
            .or_else(|| stdenv::var(key).ok())
    }

    /// Set or overwrite a shell variable. The process environment is not touched.
    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }

    /// `path` made absolute against `current_dir`.
    pub fn resolve_path(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.current_dir.join(path)
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
