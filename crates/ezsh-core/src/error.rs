//! Error types for the command spine.

use std::fmt;

use crate::command::CommandId;
use crate::shortcut::ShortcutError;

/// Result type alias for registry and router operations.
pub type Result<T> = std::result::Result<T, CommandError>;

/// Boxed error returned by command handlers.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// What a failed lookup was searching by.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Lookup {
    /// A command id.
    Id(CommandId),
    /// A shortcut (canonical form when it could be normalized).
    Shortcut(String),
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "command id {id:?}"),
            Self::Shortcut(shortcut) => write!(f, "shortcut {shortcut}"),
        }
    }
}

/// Errors raised by the command registry and surfaced through the key router.
///
/// None of these are swallowed inside the core. The host decides at its
/// input boundary whether a failure is worth more than a log line.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Malformed shortcut string.
    #[error(transparent)]
    InvalidShortcut(#[from] ShortcutError),

    /// No command registered under the id, or no command bound to the shortcut.
    #[error("command not found for {0}")]
    CommandNotFound(Lookup),

    /// A command was registered with an empty id.
    #[error("command id must be a non-empty string")]
    EmptyCommandId,

    /// Registration with an id that is already taken.
    #[error("duplicate command id: {0:?}")]
    DuplicateCommand(CommandId),

    /// The canonical shortcut already maps to a different command.
    #[error("shortcut already bound: {shortcut} -> {existing}")]
    ShortcutAlreadyBound { shortcut: String, existing: CommandId },

    /// The command's enablement evaluated false.
    #[error("command not enabled: {0:?}")]
    CommandNotEnabled(CommandId),

    /// The command's visibility evaluated false while visibility was required.
    #[error("command not visible: {0:?}")]
    CommandNotVisible(CommandId),

    /// The handler ran and reported a failure.
    #[error("command {id:?} failed: {source}")]
    HandlerFailed {
        id: CommandId,
        #[source]
        source: HandlerError,
    },
}

impl CommandError {
    /// Create a not-found error for a command id.
    pub fn not_found(id: impl Into<CommandId>) -> Self {
        Self::CommandNotFound(Lookup::Id(id.into()))
    }

    /// Create a not-found error for an unbound shortcut.
    pub fn shortcut_not_bound(shortcut: impl Into<String>) -> Self {
        Self::CommandNotFound(Lookup::Shortcut(shortcut.into()))
    }

    /// Stable short name of the error kind, suitable for telemetry attributes.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidShortcut(_) => "InvalidShortcut",
            Self::CommandNotFound(_) => "CommandNotFound",
            Self::EmptyCommandId => "EmptyCommandId",
            Self::DuplicateCommand(_) => "DuplicateCommand",
            Self::ShortcutAlreadyBound { .. } => "ShortcutAlreadyBound",
            Self::CommandNotEnabled(_) => "CommandNotEnabled",
            Self::CommandNotVisible(_) => "CommandNotVisible",
            Self::HandlerFailed { .. } => "HandlerFailed",
        }
    }
}

/// Errors raised while editing a [`KeyMap`](crate::keymap::KeyMap).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyMapError {
    /// The key sequence was empty.
    #[error("key sequence must be a non-empty string")]
    EmptyKeySequence,

    /// The command id was empty.
    #[error("command id must be a non-empty string")]
    EmptyCommandId,

    /// The exact key sequence is already bound and overwriting was refused.
    #[error("key binding already exists for {keyseq:?} (bound to {existing:?})")]
    BindingExists { keyseq: String, existing: CommandId },
}
