//! Per-kind undo/redo history.

use super::{Command, CommandContext, CommandError, CommandResult, HistoryDirection};
use crate::model::Entity;
use log::{info, warn};
use parking_lot::Mutex;
use std::collections::VecDeque;

pub const DEFAULT_HISTORY_LIMIT: usize = 100;

struct History<K: Entity> {
    undo: VecDeque<Box<dyn Command<K>>>,
    redo: Vec<Box<dyn Command<K>>>,
}

/// Executes commands of one kind and keeps their undo/redo stacks.
///
/// The lock is held across the whole read-modify-write of each operation,
/// so concurrent callers see history operations one at a time.
pub struct CommandHandler<K: Entity> {
    history: Mutex<History<K>>,
    history_limit: usize,
}

impl<K: Entity> Default for CommandHandler<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Entity> CommandHandler<K> {
    pub fn new() -> Self {
        Self::with_history_limit(DEFAULT_HISTORY_LIMIT)
    }

    /// Keeps at most `history_limit` undoable commands (minimum 1); the
    /// oldest entry is dropped first.
    pub fn with_history_limit(history_limit: usize) -> Self {
        Self {
            history: Mutex::new(History {
                undo: VecDeque::new(),
                redo: Vec::new(),
            }),
            history_limit: history_limit.max(1),
        }
    }

    pub fn history_limit(&self) -> usize {
        self.history_limit
    }

    /// Runs `command` and records it; a failed command leaves history as is.
    pub fn execute<C>(&self, ctx: &CommandContext<'_, K>, command: C) -> CommandResult<K>
    where
        C: Command<K> + 'static,
    {
        let mut command: Box<dyn Command<K>> = Box::new(command);
        let mut history = self.history.lock();

        let record = match command.execute(ctx) {
            Ok(record) => record,
            Err(err) => {
                warn!(
                    "event=command_execute module=command status=error kind={} action={} error={}",
                    K::KIND,
                    command.action().as_str(),
                    err
                );
                return Err(err);
            }
        };

        info!(
            "event=command_execute module=command status=ok kind={} action={} id={}",
            K::KIND,
            command.action().as_str(),
            record.id()
        );
        history.undo.push_back(command);
        if history.undo.len() > self.history_limit {
            history.undo.pop_front();
        }
        history.redo.clear();
        Ok(record)
    }

    /// Reverts the most recent command and moves it to the redo stack.
    pub fn undo(&self, ctx: &CommandContext<'_, K>) -> CommandResult<()> {
        let mut history = self.history.lock();
        let mut command = history.undo.pop_back().ok_or(CommandError::EmptyHistory {
            kind: K::KIND,
            direction: HistoryDirection::Undo,
        })?;

        if let Err(err) = command.undo(ctx) {
            warn!(
                "event=command_undo module=command status=error kind={} action={} error={}",
                K::KIND,
                command.action().as_str(),
                err
            );
            history.undo.push_back(command);
            return Err(err);
        }

        info!(
            "event=command_undo module=command status=ok kind={} action={} id={}",
            K::KIND,
            command.action().as_str(),
            display_target(command.as_ref())
        );
        history.redo.push(command);
        Ok(())
    }

    /// Re-applies the most recently undone command from its captured state.
    pub fn redo(&self, ctx: &CommandContext<'_, K>) -> CommandResult<K> {
        let mut history = self.history.lock();
        let mut command = history.redo.pop().ok_or(CommandError::EmptyHistory {
            kind: K::KIND,
            direction: HistoryDirection::Redo,
        })?;

        let record = match command.execute(ctx) {
            Ok(record) => record,
            Err(err) => {
                warn!(
                    "event=command_redo module=command status=error kind={} action={} error={}",
                    K::KIND,
                    command.action().as_str(),
                    err
                );
                history.redo.push(command);
                return Err(err);
            }
        };

        info!(
            "event=command_redo module=command status=ok kind={} action={} id={}",
            K::KIND,
            command.action().as_str(),
            record.id()
        );
        history.undo.push_back(command);
        if history.undo.len() > self.history_limit {
            history.undo.pop_front();
        }
        Ok(record)
    }

    pub fn undo_depth(&self) -> usize {
        self.history.lock().undo.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.history.lock().redo.len()
    }

    /// Drops both stacks.
    pub fn clear(&self) {
        let mut history = self.history.lock();
        history.undo.clear();
        history.redo.clear();
    }
}

fn display_target<K: Entity>(command: &dyn Command<K>) -> String {
    command
        .target()
        .map_or_else(|| "none".to_string(), |id| id.to_string())
}
