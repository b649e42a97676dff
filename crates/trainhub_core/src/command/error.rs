use crate::model::{EntityId, EntityKind, ValidationError};
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

use super::CommandState;

pub type CommandResult<T> = Result<T, CommandError>;

/// Which history stack an operation was popping from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryDirection {
    Undo,
    Redo,
}

impl HistoryDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Undo => "undo",
            Self::Redo => "redo",
        }
    }
}

/// Error returned by commands and command handlers.
#[derive(Debug)]
pub enum CommandError {
    /// A row with the same unique key already exists.
    DuplicateEntity { kind: EntityKind, key: String },
    NotFound { kind: EntityKind, id: EntityId },
    /// Nothing to undo or redo for this kind.
    EmptyHistory {
        kind: EntityKind,
        direction: HistoryDirection,
    },
    /// `execute`/`undo` called from a state that does not allow it.
    InvalidState {
        kind: EntityKind,
        state: CommandState,
        action: &'static str,
    },
    Validation(ValidationError),
    Repo(RepoError),
}

impl Display for CommandError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateEntity { kind, key } => {
                write!(f, "{} `{key}` already exists", kind.display_name())
            }
            Self::NotFound { kind, id } => {
                write!(f, "{} with id {id} does not exist", kind.display_name())
            }
            Self::EmptyHistory { kind, direction } => write!(
                f,
                "nothing to {} for {} operations",
                direction.as_str(),
                kind.display_name()
            ),
            Self::InvalidState {
                kind,
                state,
                action,
            } => write!(
                f,
                "cannot {action} a {} command in state {}",
                kind.display_name(),
                state.as_str()
            ),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CommandError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for CommandError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for CommandError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Duplicate { kind, key } => Self::DuplicateEntity { kind, key },
            RepoError::NotFound { kind, id } => Self::NotFound { kind, id },
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}
