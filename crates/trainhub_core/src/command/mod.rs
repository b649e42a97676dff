//! Reversible catalog commands and per-kind undo/redo history.
//!
//! # Responsibility
//! - Wrap every catalog mutation in a [`Command`] that can be undone and
//!   re-applied from state it captured itself.
//! - Keep one [`CommandHandler`] history per record kind.
//!
//! # Invariants
//! - A command moves `Unexecuted -> Executed -> Undone -> Executed ...`;
//!   any other transition fails with `CommandError::InvalidState`.
//! - Redo never takes fresh input: it replays what the first execution
//!   captured.
//! - Search mirror failures are logged and never fail a command.

mod commands;
mod error;
mod handler;

use crate::model::{Entity, EntityId};
use crate::repo::EntityStore;
use crate::search::SearchMirror;

pub use commands::{CreateCommand, DeleteCommand, UpdateCommand};
pub use error::{CommandError, CommandResult, HistoryDirection};
pub use handler::{CommandHandler, DEFAULT_HISTORY_LIMIT};

/// Lifecycle tag of one command instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandState {
    Unexecuted,
    Executed,
    Undone,
}

impl CommandState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unexecuted => "unexecuted",
            Self::Executed => "executed",
            Self::Undone => "undone",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandAction {
    Create,
    Update,
    Delete,
}

impl CommandAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// Collaborators a command runs against.
pub struct CommandContext<'a, K: Entity> {
    pub store: &'a dyn EntityStore<K>,
    pub mirror: &'a dyn SearchMirror,
}

impl<'a, K: Entity> CommandContext<'a, K> {
    pub fn new(store: &'a dyn EntityStore<K>, mirror: &'a dyn SearchMirror) -> Self {
        Self { store, mirror }
    }
}

/// A reversible mutation of one record kind.
pub trait Command<K: Entity>: Send {
    fn action(&self) -> CommandAction;

    fn state(&self) -> CommandState;

    /// Identity this command operates on, once known.
    fn target(&self) -> Option<EntityId>;

    /// First run from `Unexecuted`, or redo from `Undone`.
    fn execute(&mut self, ctx: &CommandContext<'_, K>) -> CommandResult<K>;

    /// Reverts the last execution; only valid from `Executed`.
    fn undo(&mut self, ctx: &CommandContext<'_, K>) -> CommandResult<()>;
}
