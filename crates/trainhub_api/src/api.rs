//! Query/mutation use-case API.
//!
//! # Responsibility
//! - Expose one function per catalog operation with stable response
//!   envelopes.
//! - Own the per-kind command histories for the lifetime of the facade.
//!
//! # Invariants
//! - Operations never panic and never return `Err`; failures are reported
//!   through `ApiResponse::failure`.
//! - Each call opens its own connection; command histories outlive it.

use crate::input::{TrainInput, TrainUpdateInput};
use log::{info, warn};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use trainhub_core::db::open_db;
use trainhub_core::repo::TableMapping;
use trainhub_core::{
    init_logging, search_all, CatalogService, CommandError, ConfigError, DbError, EntityId,
    EntityKind, HandledEntity, Handlers, LoggingError, RailwayCompany, RailwayCompanyDraft,
    RailwayCompanyPatch, RepoError, SearchError, SearchQuery, SqliteSearchMirror, SqliteStore,
    Station, StationDraft, StationPatch, Train, TrainHall, TrainHallDraft, TrainHallPatch,
    TrainHubConfig, ValidationError,
};

const SEARCH_DEFAULT_LIMIT: u32 = 20;
const SEARCH_LIMIT_MAX: u32 = 100;
const UNDO_MESSAGE: &str = "Last operation undone successfully.";
const REDO_MESSAGE: &str = "Last undone operation redone successfully.";

/// Error surfaced inside failure envelopes.
#[derive(Debug)]
pub enum ApiError {
    Config(ConfigError),
    Logging(LoggingError),
    Db(DbError),
    Repo(RepoError),
    Search(SearchError),
    Command(CommandError),
    Validation(ValidationError),
    InvalidInput {
        field: &'static str,
        message: String,
    },
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Logging(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Search(err) => write!(f, "{err}"),
            Self::Command(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::InvalidInput { field, message } => write!(f, "invalid {field}: {message}"),
        }
    }
}

impl Error for ApiError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Logging(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Search(err) => Some(err),
            Self::Command(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::InvalidInput { .. } => None,
        }
    }
}

impl From<ConfigError> for ApiError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<LoggingError> for ApiError {
    fn from(value: LoggingError) -> Self {
        Self::Logging(value)
    }
}

impl From<DbError> for ApiError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<RepoError> for ApiError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<SearchError> for ApiError {
    fn from(value: SearchError) -> Self {
        Self::Search(value)
    }
}

impl From<CommandError> for ApiError {
    fn from(value: CommandError) -> Self {
        Self::Command(value)
    }
}

impl From<ValidationError> for ApiError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Response envelope shared by every operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub data: Option<T>,
    /// Human-readable outcome for UI/diagnostics.
    pub message: String,
}

impl<T> ApiResponse<T> {
    fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            ok: true,
            data: Some(data),
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            message: message.into(),
        }
    }
}

/// Search hit as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchItem {
    /// Index name (`stations|railway_companies|train_halls|trains`).
    pub index: String,
    pub entity_id: EntityId,
    pub snippet: String,
}

/// Catalog facade bound to one database file.
pub struct TrainHubApi {
    db_path: PathBuf,
    handlers: Handlers,
}

impl TrainHubApi {
    /// Builds the facade; starts file logging when `log_dir` is configured.
    pub fn new(config: &TrainHubConfig) -> Result<Self, ApiError> {
        if let Some(settings) = config.logging_settings() {
            init_logging(&settings)?;
        }
        info!(
            "event=api_init module=api status=ok db_path={} history_limit={}",
            config.db_path.display(),
            config.history_limit
        );
        Ok(Self {
            db_path: config.db_path.clone(),
            handlers: Handlers::new(config.history_limit),
        })
    }

    /// Same as [`TrainHubApi::new`] with `TRAINHUB_*` environment settings.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::new(&TrainHubConfig::from_env()?)
    }

    pub fn ping(&self) -> String {
        trainhub_core::ping().to_owned()
    }

    pub fn core_version(&self) -> String {
        trainhub_core::core_version().to_owned()
    }

    // Stations

    pub fn create_station(
        &self,
        station_name: &str,
        station_city: &str,
        station_province: &str,
    ) -> ApiResponse<Station> {
        self.create(
            "create_station",
            StationDraft::new(station_name.trim(), station_city.trim(), station_province.trim()),
        )
    }

    pub fn update_station(&self, station_id: EntityId, patch: StationPatch) -> ApiResponse<Station> {
        let patch = StationPatch {
            station_name: trim_field(patch.station_name),
            station_city: trim_field(patch.station_city),
            station_province: trim_field(patch.station_province),
        };
        self.update("update_station", station_id, patch)
    }

    pub fn delete_station(&self, station_id: EntityId) -> ApiResponse<Station> {
        self.delete("delete_station", station_id)
    }

    pub fn undo_station_operation(&self) -> ApiResponse<()> {
        self.undo::<Station>("undo_station_operation")
    }

    pub fn redo_station_operation(&self) -> ApiResponse<Station> {
        self.redo("redo_station_operation")
    }

    pub fn all_stations(&self) -> ApiResponse<Vec<Station>> {
        self.list("all_stations")
    }

    pub fn station_by_name(&self, station_name: &str) -> ApiResponse<Option<Station>> {
        self.by_key("station_by_name", station_name)
    }

    // Railway companies

    pub fn create_railway_company(
        &self,
        railway_name: &str,
        railway_description: &str,
        refund_policy: &str,
        railway_logo: Option<&str>,
    ) -> ApiResponse<RailwayCompany> {
        let mut draft = RailwayCompanyDraft::new(
            railway_name.trim(),
            railway_description.trim(),
            refund_policy.trim(),
        );
        draft.railway_logo = railway_logo.map(str::to_string);
        self.create("create_railway_company", draft)
    }

    pub fn update_railway_company(
        &self,
        company_id: EntityId,
        patch: RailwayCompanyPatch,
    ) -> ApiResponse<RailwayCompany> {
        let patch = RailwayCompanyPatch {
            railway_name: trim_field(patch.railway_name),
            railway_description: trim_field(patch.railway_description),
            refund_policy: trim_field(patch.refund_policy),
            railway_logo: patch.railway_logo,
        };
        self.update("update_railway_company", company_id, patch)
    }

    pub fn delete_railway_company(&self, company_id: EntityId) -> ApiResponse<RailwayCompany> {
        self.delete("delete_railway_company", company_id)
    }

    pub fn undo_railway_company_operation(&self) -> ApiResponse<()> {
        self.undo::<RailwayCompany>("undo_railway_company_operation")
    }

    pub fn redo_railway_company_operation(&self) -> ApiResponse<RailwayCompany> {
        self.redo("redo_railway_company_operation")
    }

    pub fn all_railway_companies(&self) -> ApiResponse<Vec<RailwayCompany>> {
        self.list("all_railway_companies")
    }

    pub fn railway_company_by_name(
        &self,
        railway_name: &str,
    ) -> ApiResponse<Option<RailwayCompany>> {
        self.by_key("railway_company_by_name", railway_name)
    }

    // Train halls

    pub fn create_train_hall(
        &self,
        hall_name: &str,
        hall_description: Option<&str>,
    ) -> ApiResponse<TrainHall> {
        self.create(
            "create_train_hall",
            TrainHallDraft::new(hall_name.trim(), hall_description.map(str::to_string)),
        )
    }

    pub fn update_train_hall(&self, hall_id: EntityId, patch: TrainHallPatch) -> ApiResponse<TrainHall> {
        let patch = TrainHallPatch {
            hall_name: trim_field(patch.hall_name),
            hall_description: patch.hall_description,
        };
        self.update("update_train_hall", hall_id, patch)
    }

    pub fn delete_train_hall(&self, hall_id: EntityId) -> ApiResponse<TrainHall> {
        self.delete("delete_train_hall", hall_id)
    }

    pub fn undo_train_hall_operation(&self) -> ApiResponse<()> {
        self.undo::<TrainHall>("undo_train_hall_operation")
    }

    pub fn redo_train_hall_operation(&self) -> ApiResponse<TrainHall> {
        self.redo("redo_train_hall_operation")
    }

    pub fn all_train_halls(&self) -> ApiResponse<Vec<TrainHall>> {
        self.list("all_train_halls")
    }

    pub fn train_hall_by_name(&self, hall_name: &str) -> ApiResponse<Option<TrainHall>> {
        self.by_key("train_hall_by_name", hall_name)
    }

    // Trains

    pub fn create_train(&self, input: TrainInput) -> ApiResponse<Train> {
        match input.into_draft() {
            Ok(draft) => self.create("create_train", draft),
            Err(err) => respond("create_train", Err(err), |_: &Train| String::new()),
        }
    }

    pub fn update_train(&self, train_id: EntityId, input: TrainUpdateInput) -> ApiResponse<Train> {
        match input.into_patch() {
            Ok(patch) => self.update("update_train", train_id, patch),
            Err(err) => respond("update_train", Err(err), |_: &Train| String::new()),
        }
    }

    pub fn delete_train(&self, train_id: EntityId) -> ApiResponse<Train> {
        self.delete("delete_train", train_id)
    }

    pub fn undo_train_operation(&self) -> ApiResponse<()> {
        self.undo::<Train>("undo_train_operation")
    }

    pub fn redo_train_operation(&self) -> ApiResponse<Train> {
        self.redo("redo_train_operation")
    }

    pub fn all_trains(&self) -> ApiResponse<Vec<Train>> {
        self.list("all_trains")
    }

    pub fn train_by_number(&self, train_number: &str) -> ApiResponse<Option<Train>> {
        self.by_key("train_by_number", train_number)
    }

    // Search

    /// Keyword search over the mirror; `index` narrows to one index name.
    pub fn search(
        &self,
        text: &str,
        index: Option<&str>,
        limit: Option<u32>,
    ) -> ApiResponse<Vec<SearchItem>> {
        let result = parse_index(index).and_then(|kind| {
            let conn = open_db(&self.db_path)?;
            let mut query = SearchQuery::new(text.trim());
            query.kind = kind;
            query.limit = normalize_search_limit(limit);
            let hits = search_all(&conn, &query)?;
            Ok(hits
                .into_iter()
                .map(|hit| SearchItem {
                    index: hit.kind.index_name().to_string(),
                    entity_id: hit.entity_id,
                    snippet: hit.snippet,
                })
                .collect::<Vec<_>>())
        });
        respond("search", result, |items| {
            if items.is_empty() {
                "No results.".to_string()
            } else {
                format!("Found {} result(s).", items.len())
            }
        })
    }

    fn with_service<T>(
        &self,
        f: impl FnOnce(&CatalogService<'_, SqliteStore<'_>>) -> Result<T, ApiError>,
    ) -> Result<T, ApiError> {
        let conn = open_db(&self.db_path)?;
        let store = SqliteStore::try_new(&conn)?;
        let mirror = SqliteSearchMirror::try_new(&conn)?;
        let service = CatalogService::new(&self.handlers, store, &mirror);
        f(&service)
    }

    fn create<K>(&self, op: &'static str, draft: K::Draft) -> ApiResponse<K>
    where
        K: HandledEntity + TableMapping,
    {
        let result = self.with_service(|service| Ok(service.create::<K>(draft)?));
        respond(op, result, |_| {
            format!("{} created successfully.", K::KIND.display_name())
        })
    }

    fn update<K>(&self, op: &'static str, id: EntityId, patch: K::Patch) -> ApiResponse<K>
    where
        K: HandledEntity + TableMapping,
    {
        let result = self.with_service(|service| Ok(service.update::<K>(id, patch)?));
        respond(op, result, |_| {
            format!("{} updated successfully.", K::KIND.display_name())
        })
    }

    fn delete<K>(&self, op: &'static str, id: EntityId) -> ApiResponse<K>
    where
        K: HandledEntity + TableMapping,
    {
        let result = self.with_service(|service| Ok(service.delete::<K>(id)?));
        respond(op, result, |record| {
            format!(
                "{} {} deleted successfully.",
                K::KIND.display_name(),
                record.label()
            )
        })
    }

    fn undo<K>(&self, op: &'static str) -> ApiResponse<()>
    where
        K: HandledEntity + TableMapping,
    {
        let result = self.with_service(|service| Ok(service.undo::<K>()?));
        respond(op, result, |_| UNDO_MESSAGE.to_string())
    }

    fn redo<K>(&self, op: &'static str) -> ApiResponse<K>
    where
        K: HandledEntity + TableMapping,
    {
        let result = self.with_service(|service| Ok(service.redo::<K>()?));
        respond(op, result, |_| REDO_MESSAGE.to_string())
    }

    fn list<K>(&self, op: &'static str) -> ApiResponse<Vec<K>>
    where
        K: HandledEntity + TableMapping,
    {
        let result = self.with_service(|service| Ok(service.list::<K>()?));
        respond(op, result, |records| {
            format!("Found {} {}.", records.len(), K::KIND.index_name())
        })
    }

    fn by_key<K>(&self, op: &'static str, key: &str) -> ApiResponse<Option<K>>
    where
        K: HandledEntity + TableMapping,
    {
        let result = self.with_service(|service| Ok(service.find_by_key::<K>(key.trim())?));
        respond(op, result, |record| match record {
            Some(_) => format!("{} found.", K::KIND.display_name()),
            None => format!("{} not found.", K::KIND.display_name()),
        })
    }
}

fn respond<T>(
    op: &'static str,
    result: Result<T, ApiError>,
    message: impl FnOnce(&T) -> String,
) -> ApiResponse<T> {
    match result {
        Ok(data) => {
            info!("event=api_call module=api status=ok op={op}");
            let message = message(&data);
            ApiResponse::success(data, message)
        }
        Err(err) => {
            warn!("event=api_call module=api status=error op={op} error={err}");
            ApiResponse::failure(format!("{op} failed: {err}"))
        }
    }
}

fn trim_field(value: Option<String>) -> Option<String> {
    value.map(|value| value.trim().to_string())
}

fn parse_index(index: Option<&str>) -> Result<Option<EntityKind>, ApiError> {
    let Some(raw) = index.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(None);
    };
    EntityKind::ALL
        .into_iter()
        .find(|kind| kind.index_name() == raw || kind.as_str() == raw)
        .map(Some)
        .ok_or_else(|| ApiError::InvalidInput {
            field: "index",
            message: format!("unknown index `{raw}`"),
        })
}

fn normalize_search_limit(limit: Option<u32>) -> u32 {
    match limit {
        None | Some(0) => SEARCH_DEFAULT_LIMIT,
        Some(value) => value.min(SEARCH_LIMIT_MAX),
    }
}
