//! Glue between the [`Completer`] and rustyline.

use crate::completer::Completer;
use rustyline::completion::Pair;

/// rustyline helper offering command-tree completions on tab.
pub struct ShellHelper {
    completer: Completer,
}

impl ShellHelper {
    pub fn new(completer: Completer) -> Self {
        Self { completer }
    }

    /// Replacements for everything before the cursor, each one the
    /// completion's head followed by a candidate. The text after the cursor
    /// is left to rustyline.
    fn candidates(&self, line: &str, pos: usize) -> (usize, Vec<Pair>) {
        let completion = self.completer.complete(line, pos);
        let pairs = completion
            .candidates
            .into_iter()
            .map(|candidate| Pair {
                replacement: format!("{}{}", completion.head, candidate),
                display: candidate,
            })
            .collect();
        (0, pairs)
    }
}

impl rustyline::Helper for ShellHelper {}

impl rustyline::highlight::Highlighter for ShellHelper {}

impl rustyline::hint::Hinter for ShellHelper {
    type Hint = String;

    fn hint(&self, _line: &str, _pos: usize, _ctx: &rustyline::Context<'_>) -> Option<String> {
        None
    }
}

impl rustyline::validate::Validator for ShellHelper {}

impl rustyline::completion::Completer for ShellHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        Ok(self.candidates(line, pos))
    }
}
