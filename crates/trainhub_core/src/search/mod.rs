//! Search mirror: a denormalized read index kept in sync with catalog writes.
//!
//! # Responsibility
//! - Define the [`SearchMirror`] contract notified after every committed
//!   create/update/delete.
//! - Provide an FTS5-backed mirror and keyword search over it.
//!
//! # Invariants
//! - Documents are keyed by `(kind, entity_id)`; upsert replaces in place.
//! - Mirror writes are best-effort; callers log failures and move on.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod document;
pub mod fts;
pub mod mirror;

pub use document::{SearchDocument, SearchMirror};
pub use fts::{search_all, SearchHit, SearchQuery};
pub use mirror::SqliteSearchMirror;

/// Result type for search APIs.
pub type SearchResult<T> = Result<T, SearchError>;

/// Search-layer error for query parsing, DB interaction and result decoding.
#[derive(Debug)]
pub enum SearchError {
    /// User-provided query cannot be parsed by FTS5 syntax.
    InvalidQuery {
        query: String,
        message: String,
    },
    Db(DbError),
    /// Document body could not be encoded or decoded.
    Serialization(serde_json::Error),
    InvalidData(String),
    /// Mirror table is missing on the provided connection.
    MissingIndex(&'static str),
}

impl Display for SearchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidQuery { query, message } => {
                write!(f, "invalid full-text query `{query}`: {message}")
            }
            Self::Db(err) => write!(f, "{err}"),
            Self::Serialization(err) => write!(f, "search document encoding failed: {err}"),
            Self::InvalidData(message) => write!(f, "invalid search row: {message}"),
            Self::MissingIndex(table) => write!(f, "search mirror requires table `{table}`"),
        }
    }
}

impl Error for SearchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Serialization(err) => Some(err),
            Self::InvalidQuery { .. } | Self::InvalidData(_) | Self::MissingIndex(_) => None,
        }
    }
}

impl From<DbError> for SearchError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for SearchError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for SearchError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}
