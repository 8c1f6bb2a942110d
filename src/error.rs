/// Errors produced while building or walking a [`CommandRegistry`](crate::registry::CommandRegistry).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// A command with the same name already exists at this level.
    #[error("command {name} already exists")]
    DuplicateName { name: String },

    /// Names must be a single non-empty token.
    #[error("invalid command name {name:?}")]
    InvalidName { name: String },

    /// No command matched the given token sequence.
    #[error("no matching command for {tokens:?}")]
    NoMatch { tokens: Vec<String> },
}

pub type Result<T> = std::result::Result<T, CommandError>;
