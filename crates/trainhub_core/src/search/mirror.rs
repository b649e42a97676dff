//! SQLite FTS5-backed search mirror.
//!
//! # Invariants
//! - `search_documents` holds at most one row per `(kind, entity_id)`.
//! - The FTS index is maintained by triggers on `search_documents`.

use super::document::{SearchDocument, SearchMirror};
use super::{SearchError, SearchResult};
use crate::model::{EntityId, EntityKind};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;

/// Mirror writing into the `search_documents` table of a migrated catalog.
pub struct SqliteSearchMirror<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSearchMirror<'conn> {
    /// Constructs a mirror from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> SearchResult<Self> {
        for table in ["search_documents", "search_documents_fts"] {
            let exists: i64 = conn.query_row(
                "SELECT EXISTS(
                    SELECT 1
                    FROM sqlite_master
                    WHERE name = ?1
                );",
                [table],
                |row| row.get(0),
            )?;
            if exists != 1 {
                return Err(SearchError::MissingIndex(table));
            }
        }
        Ok(Self { conn })
    }

    /// Loads the mirrored JSON body, if present.
    pub fn load(&self, kind: EntityKind, entity_id: EntityId) -> SearchResult<Option<Value>> {
        let body: Option<String> = self
            .conn
            .query_row(
                "SELECT body FROM search_documents WHERE kind = ?1 AND entity_id = ?2;",
                params![kind.as_str(), entity_id],
                |row| row.get(0),
            )
            .optional()?;
        body.map(|text| serde_json::from_str(&text).map_err(SearchError::from))
            .transpose()
    }

    /// Number of mirrored documents of one kind.
    pub fn count(&self, kind: EntityKind) -> SearchResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM search_documents WHERE kind = ?1;",
            [kind.as_str()],
            |row| row.get(0),
        )?;
        u64::try_from(count).map_err(|_| SearchError::InvalidData(format!("negative count {count}")))
    }
}

impl SearchMirror for SqliteSearchMirror<'_> {
    fn upsert(&self, document: &SearchDocument) -> SearchResult<()> {
        let body = serde_json::to_string(&document.body)?;
        self.conn.execute(
            "INSERT INTO search_documents (kind, entity_id, body, search_text)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(kind, entity_id) DO UPDATE SET
                body = excluded.body,
                search_text = excluded.search_text,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![
                document.kind.as_str(),
                document.entity_id,
                body,
                document.search_text.as_str(),
            ],
        )?;
        debug!(
            "event=mirror_upsert module=search status=ok index={} entity_id={}",
            document.kind.index_name(),
            document.entity_id
        );
        Ok(())
    }

    fn remove(&self, kind: EntityKind, entity_id: EntityId) -> SearchResult<()> {
        self.conn.execute(
            "DELETE FROM search_documents WHERE kind = ?1 AND entity_id = ?2;",
            params![kind.as_str(), entity_id],
        )?;
        debug!(
            "event=mirror_remove module=search status=ok index={} entity_id={entity_id}",
            kind.index_name()
        );
        Ok(())
    }
}
