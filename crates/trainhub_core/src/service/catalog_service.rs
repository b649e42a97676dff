//! Catalog use-case service.
//!
//! # Invariants
//! - Every mutation goes through a [`CommandHandler`], so it is undoable.
//! - Service APIs stay storage-agnostic: any `EntityStore` implementation
//!   can back them.

use crate::command::{
    CommandContext, CommandHandler, CommandResult, CreateCommand, DeleteCommand, UpdateCommand,
    DEFAULT_HISTORY_LIMIT,
};
use crate::model::railway_company::RailwayCompany;
use crate::model::station::Station;
use crate::model::train::Train;
use crate::model::train_hall::TrainHall;
use crate::model::{Entity, EntityId};
use crate::repo::{EntityStore, RepoResult};
use crate::search::SearchMirror;

/// One command handler per record kind; histories never mix.
pub struct Handlers {
    pub stations: CommandHandler<Station>,
    pub railway_companies: CommandHandler<RailwayCompany>,
    pub train_halls: CommandHandler<TrainHall>,
    pub trains: CommandHandler<Train>,
}

impl Handlers {
    pub fn new(history_limit: usize) -> Self {
        Self {
            stations: CommandHandler::with_history_limit(history_limit),
            railway_companies: CommandHandler::with_history_limit(history_limit),
            train_halls: CommandHandler::with_history_limit(history_limit),
            trains: CommandHandler::with_history_limit(history_limit),
        }
    }
}

impl Default for Handlers {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

/// Record kinds that own a handler in [`Handlers`].
pub trait HandledEntity: Entity {
    fn handler(handlers: &Handlers) -> &CommandHandler<Self>;
}

impl HandledEntity for Station {
    fn handler(handlers: &Handlers) -> &CommandHandler<Self> {
        &handlers.stations
    }
}

impl HandledEntity for RailwayCompany {
    fn handler(handlers: &Handlers) -> &CommandHandler<Self> {
        &handlers.railway_companies
    }
}

impl HandledEntity for TrainHall {
    fn handler(handlers: &Handlers) -> &CommandHandler<Self> {
        &handlers.train_halls
    }
}

impl HandledEntity for Train {
    fn handler(handlers: &Handlers) -> &CommandHandler<Self> {
        &handlers.trains
    }
}

/// Use-case service wrapper binding handlers to one store and mirror.
pub struct CatalogService<'a, S> {
    handlers: &'a Handlers,
    store: S,
    mirror: &'a dyn SearchMirror,
}

impl<'a, S> CatalogService<'a, S> {
    pub fn new(handlers: &'a Handlers, store: S, mirror: &'a dyn SearchMirror) -> Self {
        Self {
            handlers,
            store,
            mirror,
        }
    }

    fn context<K>(&self) -> CommandContext<'_, K>
    where
        K: Entity,
        S: EntityStore<K>,
    {
        CommandContext::new(&self.store, self.mirror)
    }

    pub fn create<K>(&self, draft: K::Draft) -> CommandResult<K>
    where
        K: HandledEntity,
        S: EntityStore<K>,
    {
        K::handler(self.handlers).execute(&self.context(), CreateCommand::<K>::new(draft))
    }

    pub fn update<K>(&self, id: EntityId, patch: K::Patch) -> CommandResult<K>
    where
        K: HandledEntity,
        S: EntityStore<K>,
    {
        K::handler(self.handlers).execute(&self.context(), UpdateCommand::<K>::new(id, patch))
    }

    /// Returns the deleted record.
    pub fn delete<K>(&self, id: EntityId) -> CommandResult<K>
    where
        K: HandledEntity,
        S: EntityStore<K>,
    {
        K::handler(self.handlers).execute(&self.context(), DeleteCommand::<K>::new(id))
    }

    pub fn undo<K>(&self) -> CommandResult<()>
    where
        K: HandledEntity,
        S: EntityStore<K>,
    {
        K::handler(self.handlers).undo(&self.context())
    }

    pub fn redo<K>(&self) -> CommandResult<K>
    where
        K: HandledEntity,
        S: EntityStore<K>,
    {
        K::handler(self.handlers).redo(&self.context())
    }

    pub fn list<K>(&self) -> RepoResult<Vec<K>>
    where
        K: Entity,
        S: EntityStore<K>,
    {
        self.store.list()
    }

    pub fn get<K>(&self, id: EntityId) -> RepoResult<Option<K>>
    where
        K: Entity,
        S: EntityStore<K>,
    {
        self.store.get(id)
    }

    /// Lookup by name (or train number for trains).
    pub fn find_by_key<K>(&self, key: &str) -> RepoResult<Option<K>>
    where
        K: Entity,
        S: EntityStore<K>,
    {
        self.store.find_by_key(key)
    }
}
