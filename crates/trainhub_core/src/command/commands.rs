//! Create, update and delete commands.

use super::{Command, CommandAction, CommandContext, CommandError, CommandResult, CommandState};
use crate::model::{Entity, EntityId, EntityKind};
use crate::repo::Deletion;
use crate::search::{SearchDocument, SearchMirror};
use log::{debug, warn};

/// Inserts a new record; undo deletes it, redo restores it under the same id.
pub struct CreateCommand<K: Entity> {
    draft: K::Draft,
    created_id: Option<EntityId>,
    deletion: Option<Deletion<K>>,
    state: CommandState,
}

impl<K: Entity> CreateCommand<K> {
    pub fn new(draft: K::Draft) -> Self {
        Self {
            draft,
            created_id: None,
            deletion: None,
            state: CommandState::Unexecuted,
        }
    }
}

impl<K: Entity> Command<K> for CreateCommand<K> {
    fn action(&self) -> CommandAction {
        CommandAction::Create
    }

    fn state(&self) -> CommandState {
        self.state
    }

    fn target(&self) -> Option<EntityId> {
        self.created_id
    }

    fn execute(&mut self, ctx: &CommandContext<'_, K>) -> CommandResult<K> {
        match self.state {
            CommandState::Unexecuted => {
                K::validate_draft(&self.draft)?;
                if ctx.store.exists_conflict(&self.draft, None)? {
                    return Err(CommandError::DuplicateEntity {
                        kind: K::KIND,
                        key: K::unique_key(&self.draft),
                    });
                }
                let record = ctx.store.create(&self.draft, None)?;
                self.created_id = Some(record.id());
                sync_upsert(ctx, &record);
                self.state = CommandState::Executed;
                Ok(record)
            }
            CommandState::Undone => {
                let deletion = self
                    .deletion
                    .as_ref()
                    .ok_or_else(|| invalid_state::<K>(self.state, "execute"))?;
                ctx.store.restore(deletion)?;
                sync_restored(ctx, deletion);
                let record = deletion.record.clone();
                self.deletion = None;
                self.state = CommandState::Executed;
                Ok(record)
            }
            CommandState::Executed => Err(invalid_state::<K>(self.state, "execute")),
        }
    }

    fn undo(&mut self, ctx: &CommandContext<'_, K>) -> CommandResult<()> {
        let id = match (self.state, self.created_id) {
            (CommandState::Executed, Some(id)) => id,
            _ => return Err(invalid_state::<K>(self.state, "undo")),
        };
        let deletion = ctx.store.delete(id)?;
        sync_removed(ctx, &deletion);
        self.deletion = Some(deletion);
        self.state = CommandState::Undone;
        Ok(())
    }
}

/// Assigns a subset of fields; undo re-assigns the captured prior values of
/// exactly those fields.
pub struct UpdateCommand<K: Entity> {
    id: EntityId,
    patch: K::Patch,
    previous: Option<K::Patch>,
    state: CommandState,
}

impl<K: Entity> UpdateCommand<K> {
    pub fn new(id: EntityId, patch: K::Patch) -> Self {
        Self {
            id,
            patch,
            previous: None,
            state: CommandState::Unexecuted,
        }
    }
}

impl<K: Entity> Command<K> for UpdateCommand<K> {
    fn action(&self) -> CommandAction {
        CommandAction::Update
    }

    fn state(&self) -> CommandState {
        self.state
    }

    fn target(&self) -> Option<EntityId> {
        Some(self.id)
    }

    fn execute(&mut self, ctx: &CommandContext<'_, K>) -> CommandResult<K> {
        match self.state {
            CommandState::Unexecuted => {
                let current = ctx.store.get(self.id)?.ok_or(CommandError::NotFound {
                    kind: K::KIND,
                    id: self.id,
                })?;
                let previous = current.capture(&self.patch);
                let updated = ctx.store.update(self.id, &self.patch)?;
                debug!(
                    "event=command_update module=command status=ok kind={} id={} fields={}",
                    K::KIND,
                    self.id,
                    K::patch_fields(&self.patch).join(",")
                );
                self.previous = Some(previous);
                sync_updated(ctx, &updated);
                self.state = CommandState::Executed;
                Ok(updated)
            }
            CommandState::Undone => {
                let updated = ctx.store.update(self.id, &self.patch)?;
                sync_updated(ctx, &updated);
                self.state = CommandState::Executed;
                Ok(updated)
            }
            CommandState::Executed => Err(invalid_state::<K>(self.state, "execute")),
        }
    }

    fn undo(&mut self, ctx: &CommandContext<'_, K>) -> CommandResult<()> {
        let previous = match (self.state, self.previous.as_ref()) {
            (CommandState::Executed, Some(previous)) => previous,
            _ => return Err(invalid_state::<K>(self.state, "undo")),
        };
        let restored = ctx.store.update(self.id, previous)?;
        sync_updated(ctx, &restored);
        self.state = CommandState::Undone;
        Ok(())
    }
}

/// Deletes a record and the trains cascading from it; undo re-creates all of
/// them with their original identities.
pub struct DeleteCommand<K: Entity> {
    id: EntityId,
    deletion: Option<Deletion<K>>,
    state: CommandState,
}

impl<K: Entity> DeleteCommand<K> {
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            deletion: None,
            state: CommandState::Unexecuted,
        }
    }
}

impl<K: Entity> Command<K> for DeleteCommand<K> {
    fn action(&self) -> CommandAction {
        CommandAction::Delete
    }

    fn state(&self) -> CommandState {
        self.state
    }

    fn target(&self) -> Option<EntityId> {
        Some(self.id)
    }

    fn execute(&mut self, ctx: &CommandContext<'_, K>) -> CommandResult<K> {
        if self.state == CommandState::Executed {
            return Err(invalid_state::<K>(self.state, "execute"));
        }
        let deletion = ctx.store.delete(self.id)?;
        sync_removed(ctx, &deletion);
        let record = deletion.record.clone();
        self.deletion = Some(deletion);
        self.state = CommandState::Executed;
        Ok(record)
    }

    fn undo(&mut self, ctx: &CommandContext<'_, K>) -> CommandResult<()> {
        let deletion = match (self.state, self.deletion.as_ref()) {
            (CommandState::Executed, Some(deletion)) => deletion,
            _ => return Err(invalid_state::<K>(self.state, "undo")),
        };
        ctx.store.restore(deletion)?;
        sync_restored(ctx, deletion);
        self.state = CommandState::Undone;
        Ok(())
    }
}

fn invalid_state<K: Entity>(state: CommandState, action: &'static str) -> CommandError {
    CommandError::InvalidState {
        kind: K::KIND,
        state,
        action,
    }
}

fn sync_upsert<K: Entity>(ctx: &CommandContext<'_, K>, record: &K) {
    match ctx.store.document(record) {
        Ok(document) => upsert_document(ctx.mirror, &document),
        Err(err) => warn!(
            "event=mirror_sync module=command status=error op=build kind={} id={} error={}",
            K::KIND,
            record.id(),
            err
        ),
    }
}

/// Upserts `record` and re-upserts the trains that embed it.
fn sync_updated<K: Entity>(ctx: &CommandContext<'_, K>, record: &K) {
    sync_upsert(ctx, record);
    sync_dependents(ctx, record.id());
}

fn sync_removed<K: Entity>(ctx: &CommandContext<'_, K>, deletion: &Deletion<K>) {
    remove_document(ctx.mirror, K::KIND, deletion.record.id());
    for train in &deletion.cascaded {
        remove_document(ctx.mirror, EntityKind::Train, train.id);
    }
}

/// After a restore the dependent trains are exactly the cascaded ones.
fn sync_restored<K: Entity>(ctx: &CommandContext<'_, K>, deletion: &Deletion<K>) {
    sync_upsert(ctx, &deletion.record);
    if !deletion.cascaded.is_empty() {
        sync_dependents(ctx, deletion.record.id());
    }
}

fn sync_dependents<K: Entity>(ctx: &CommandContext<'_, K>, id: EntityId) {
    match ctx.store.dependent_documents(id) {
        Ok(documents) => {
            for document in &documents {
                upsert_document(ctx.mirror, document);
            }
        }
        Err(err) => warn!(
            "event=mirror_sync module=command status=error op=build_dependents kind={} id={} error={}",
            K::KIND,
            id,
            err
        ),
    }
}

fn upsert_document(mirror: &dyn SearchMirror, document: &SearchDocument) {
    match mirror.upsert(document) {
        Ok(()) => debug!(
            "event=mirror_sync module=command status=ok op=upsert kind={} id={}",
            document.kind, document.entity_id
        ),
        Err(err) => warn!(
            "event=mirror_sync module=command status=error op=upsert kind={} id={} error={}",
            document.kind, document.entity_id, err
        ),
    }
}

fn remove_document(mirror: &dyn SearchMirror, kind: EntityKind, id: EntityId) {
    match mirror.remove(kind, id) {
        Ok(()) => debug!(
            "event=mirror_sync module=command status=ok op=remove kind={} id={}",
            kind, id
        ),
        Err(err) => warn!(
            "event=mirror_sync module=command status=error op=remove kind={} id={} error={}",
            kind, id, err
        ),
    }
}
