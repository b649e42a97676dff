//! Core domain logic for TrainHub, a train-ticketing catalog backend.
//! This crate owns the catalog invariants, the undoable command layer and
//! the search mirror.

pub mod command;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;

pub use command::{
    Command, CommandAction, CommandContext, CommandError, CommandHandler, CommandResult,
    CommandState, CreateCommand, DeleteCommand, HistoryDirection, UpdateCommand,
};
pub use config::{ConfigError, TrainHubConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError, LoggingSettings};
pub use model::pricing::{final_price, Percent};
pub use model::railway_company::{RailwayCompany, RailwayCompanyDraft, RailwayCompanyPatch};
pub use model::station::{Station, StationDraft, StationPatch};
pub use model::train::{Train, TrainDraft, TrainPatch, TrainType};
pub use model::train_hall::{TrainHall, TrainHallDraft, TrainHallPatch};
pub use model::{Entity, EntityId, EntityKind, ValidationError};
pub use repo::{Deletion, EntityStore, RepoError, RepoResult, SqliteStore};
pub use search::{
    search_all, SearchDocument, SearchError, SearchHit, SearchMirror, SearchQuery, SearchResult,
    SqliteSearchMirror,
};
pub use service::{CatalogService, HandledEntity, Handlers};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
