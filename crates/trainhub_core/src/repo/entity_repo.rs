//! Entity store contract and its SQLite implementation.
//!
//! # Invariants
//! - Identities come from `AUTOINCREMENT` and are never reused, so a deleted
//!   row can be restored later under its original identity.
//! - Multi-row writes (update, delete with cascade snapshot, restore) run in
//!   a single transaction.
//! - `trains.final_price` is written from the draft on every insert/update.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::railway_company::RailwayCompany;
use crate::model::station::Station;
use crate::model::train::Train;
use crate::model::train_hall::TrainHall;
use crate::model::{Entity, EntityId, EntityKind, ValidationError};
use crate::search::SearchDocument;
use rusqlite::types::Value;
use rusqlite::{ffi, params_from_iter, Connection, ErrorCode, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for catalog persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Db(DbError),
    NotFound {
        kind: EntityKind,
        id: EntityId,
    },
    /// A unique key or identity is already taken.
    Duplicate {
        kind: EntityKind,
        key: String,
    },
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    /// Cascade deletes would silently not happen.
    ForeignKeysDisabled,
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { kind, id } => {
                write!(f, "{} with id {id} does not exist", kind.display_name())
            }
            Self::Duplicate { kind, key } => {
                write!(f, "{} `{key}` already exists", kind.display_name())
            }
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "catalog store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "catalog store requires table `{table}`")
            }
            Self::ForeignKeysDisabled => {
                write!(f, "catalog store requires `PRAGMA foreign_keys = ON`")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted catalog data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Snapshot captured by a delete: the row itself plus every train removed by
/// foreign-key cascade.
#[derive(Debug, Clone, PartialEq)]
pub struct Deletion<K> {
    pub record: K,
    pub cascaded: Vec<Train>,
}

/// Store operations the command layer relies on.
pub trait EntityStore<K: Entity> {
    /// Whether another row already holds the unique key of `draft`.
    fn exists_conflict(&self, draft: &K::Draft, exclude: Option<EntityId>) -> RepoResult<bool>;
    fn get(&self, id: EntityId) -> RepoResult<Option<K>>;
    /// All rows ordered by identity.
    fn list(&self) -> RepoResult<Vec<K>>;
    /// First row (lowest identity) whose key column equals `key`.
    fn find_by_key(&self, key: &str) -> RepoResult<Option<K>>;
    /// Inserts a row; `id` forces the identity instead of allocating one.
    fn create(&self, draft: &K::Draft, id: Option<EntityId>) -> RepoResult<K>;
    /// Applies `patch` as one write and returns the stored row.
    fn update(&self, id: EntityId, patch: &K::Patch) -> RepoResult<K>;
    fn delete(&self, id: EntityId) -> RepoResult<Deletion<K>>;
    /// Re-inserts a deleted row and its cascaded trains with original identities.
    fn restore(&self, deletion: &Deletion<K>) -> RepoResult<()>;
    /// Mirror document for one row.
    fn document(&self, record: &K) -> RepoResult<SearchDocument>;
    /// Mirror documents of trains that reference row `id`.
    fn dependent_documents(&self, id: EntityId) -> RepoResult<Vec<SearchDocument>>;
}

/// Table layout for one record kind.
pub trait TableMapping: Entity {
    const TABLE: &'static str;
    /// Writable columns, in the order produced by `column_values`.
    const COLUMNS: &'static [&'static str];
    /// Column used by `find_by_key`.
    const KEY_COLUMN: &'static str;
    /// Columns forming the unique key, in the order produced by `unique_values`.
    const UNIQUE_COLUMNS: &'static [&'static str];
    /// `trains` columns referencing this table.
    const TRAIN_REFERENCES: &'static [&'static str];

    fn from_row(row: &Row<'_>) -> RepoResult<Self>;
    fn column_values(draft: &Self::Draft) -> Vec<Value>;
    fn unique_values(draft: &Self::Draft) -> Vec<Value>;

    /// Identities this draft points at.
    fn references(_draft: &Self::Draft) -> Vec<(EntityKind, EntityId)> {
        Vec::new()
    }

    fn search_document(&self, conn: &Connection) -> RepoResult<SearchDocument>;
}

/// SQLite-backed catalog store.
pub struct SqliteStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStore<'conn> {
    /// Constructs a store from a migrated connection with foreign keys on.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_catalog_ready(conn)?;
        Ok(Self { conn })
    }
}

impl<K: TableMapping> EntityStore<K> for SqliteStore<'_> {
    fn exists_conflict(&self, draft: &K::Draft, exclude: Option<EntityId>) -> RepoResult<bool> {
        conflict_exists::<K>(self.conn, draft, exclude)
    }

    fn get(&self, id: EntityId) -> RepoResult<Option<K>> {
        load::<K>(self.conn, id)
    }

    fn list(&self) -> RepoResult<Vec<K>> {
        load_where::<K>(self.conn, "1 = 1", Vec::new())
    }

    fn find_by_key(&self, key: &str) -> RepoResult<Option<K>> {
        let rows = load_where::<K>(
            self.conn,
            &format!("{} = ?", K::KEY_COLUMN),
            vec![Value::Text(key.to_string())],
        )?;
        Ok(rows.into_iter().next())
    }

    fn create(&self, draft: &K::Draft, id: Option<EntityId>) -> RepoResult<K> {
        K::validate_draft(draft)?;
        ensure_references::<K>(self.conn, draft)?;
        let id = insert_row::<K>(self.conn, draft, id)?;
        load_required::<K>(self.conn, id)
    }

    fn update(&self, id: EntityId, patch: &K::Patch) -> RepoResult<K> {
        let tx = self.conn.unchecked_transaction()?;
        let current = load_required::<K>(&tx, id)?;
        let draft = current.patched(patch);
        K::validate_draft(&draft)?;
        if conflict_exists::<K>(&tx, &draft, Some(id))? {
            return Err(RepoError::Duplicate {
                kind: K::KIND,
                key: K::unique_key(&draft),
            });
        }
        ensure_references::<K>(&tx, &draft)?;

        let assignments = K::COLUMNS
            .iter()
            .map(|column| format!("{column} = ?"))
            .collect::<Vec<_>>()
            .join(", ");
        let mut values = K::column_values(&draft);
        values.push(Value::Integer(id));
        tx.execute(
            &format!(
                "UPDATE {}
                 SET {assignments}, updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?;",
                K::TABLE
            ),
            params_from_iter(values),
        )
        .map_err(|err| map_write_error(err, K::KIND, || K::unique_key(&draft)))?;

        let updated = load_required::<K>(&tx, id)?;
        tx.commit()?;
        Ok(updated)
    }

    fn delete(&self, id: EntityId) -> RepoResult<Deletion<K>> {
        let tx = self.conn.unchecked_transaction()?;
        let record = load_required::<K>(&tx, id)?;
        let cascaded = dependent_trains(&tx, K::TRAIN_REFERENCES, id)?;
        tx.execute(
            &format!("DELETE FROM {} WHERE id = ?1;", K::TABLE),
            [id],
        )?;
        tx.commit()?;
        Ok(Deletion { record, cascaded })
    }

    fn restore(&self, deletion: &Deletion<K>) -> RepoResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        restore_row::<K>(&tx, &deletion.record)?;
        for train in &deletion.cascaded {
            if load::<Train>(&tx, train.id)?.is_none() {
                restore_row::<Train>(&tx, train)?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn document(&self, record: &K) -> RepoResult<SearchDocument> {
        record.search_document(self.conn)
    }

    fn dependent_documents(&self, id: EntityId) -> RepoResult<Vec<SearchDocument>> {
        dependent_trains(self.conn, K::TRAIN_REFERENCES, id)?
            .iter()
            .map(|train| train.search_document(self.conn))
            .collect()
    }
}

fn select_sql<K: TableMapping>() -> String {
    format!("SELECT id, {} FROM {}", K::COLUMNS.join(", "), K::TABLE)
}

pub(crate) fn load<K: TableMapping>(conn: &Connection, id: EntityId) -> RepoResult<Option<K>> {
    let rows = load_where::<K>(conn, "id = ?", vec![Value::Integer(id)])?;
    Ok(rows.into_iter().next())
}

fn load_required<K: TableMapping>(conn: &Connection, id: EntityId) -> RepoResult<K> {
    load::<K>(conn, id)?.ok_or(RepoError::NotFound { kind: K::KIND, id })
}

fn load_where<K: TableMapping>(
    conn: &Connection,
    condition: &str,
    bind_values: Vec<Value>,
) -> RepoResult<Vec<K>> {
    let sql = format!("{} WHERE {condition} ORDER BY id ASC;", select_sql::<K>());
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(bind_values))?;
    let mut records = Vec::new();
    while let Some(row) = rows.next()? {
        records.push(K::from_row(row)?);
    }
    Ok(records)
}

fn insert_row<K: TableMapping>(
    conn: &Connection,
    draft: &K::Draft,
    id: Option<EntityId>,
) -> RepoResult<EntityId> {
    let mut columns = K::COLUMNS.to_vec();
    let mut values = K::column_values(draft);
    if let Some(id) = id {
        columns.push("id");
        values.push(Value::Integer(id));
    }
    let placeholders = vec!["?"; columns.len()].join(", ");

    conn.execute(
        &format!(
            "INSERT INTO {} ({}) VALUES ({placeholders});",
            K::TABLE,
            columns.join(", ")
        ),
        params_from_iter(values),
    )
    .map_err(|err| {
        map_write_error(err, K::KIND, || match id {
            Some(id) => format!("id {id}"),
            None => K::unique_key(draft),
        })
    })?;

    Ok(id.unwrap_or_else(|| conn.last_insert_rowid()))
}

fn restore_row<K: TableMapping>(conn: &Connection, record: &K) -> RepoResult<()> {
    let draft = record.to_draft();
    if conflict_exists::<K>(conn, &draft, None)? {
        return Err(RepoError::Duplicate {
            kind: K::KIND,
            key: K::unique_key(&draft),
        });
    }
    ensure_references::<K>(conn, &draft)?;
    insert_row::<K>(conn, &draft, Some(record.id()))?;
    Ok(())
}

fn conflict_exists<K: TableMapping>(
    conn: &Connection,
    draft: &K::Draft,
    exclude: Option<EntityId>,
) -> RepoResult<bool> {
    let mut condition = K::UNIQUE_COLUMNS
        .iter()
        .map(|column| format!("{column} = ?"))
        .collect::<Vec<_>>()
        .join(" AND ");
    let mut values = K::unique_values(draft);
    if let Some(id) = exclude {
        condition.push_str(" AND id != ?");
        values.push(Value::Integer(id));
    }

    let exists: i64 = conn.query_row(
        &format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE {condition});",
            K::TABLE
        ),
        params_from_iter(values),
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn ensure_references<K: TableMapping>(conn: &Connection, draft: &K::Draft) -> RepoResult<()> {
    for (kind, id) in K::references(draft) {
        let exists: i64 = conn.query_row(
            &format!(
                "SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1);",
                table_for(kind)
            ),
            [id],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(RepoError::NotFound { kind, id });
        }
    }
    Ok(())
}

fn dependent_trains(
    conn: &Connection,
    references: &[&str],
    id: EntityId,
) -> RepoResult<Vec<Train>> {
    if references.is_empty() {
        return Ok(Vec::new());
    }
    let condition = references
        .iter()
        .map(|column| format!("{column} = ?"))
        .collect::<Vec<_>>()
        .join(" OR ");
    let values = references.iter().map(|_| Value::Integer(id)).collect();
    load_where::<Train>(conn, &format!("({condition})"), values)
}

fn table_for(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Station => Station::TABLE,
        EntityKind::RailwayCompany => RailwayCompany::TABLE,
        EntityKind::TrainHall => TrainHall::TABLE,
        EntityKind::Train => Train::TABLE,
    }
}

fn map_write_error(
    err: rusqlite::Error,
    kind: EntityKind,
    key: impl FnOnce() -> String,
) -> RepoError {
    if let rusqlite::Error::SqliteFailure(failure, _) = &err {
        let unique_violation = matches!(
            failure.extended_code,
            ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY
        );
        if failure.code == ErrorCode::ConstraintViolation && unique_violation {
            return RepoError::Duplicate { kind, key: key() };
        }
    }
    RepoError::from(err)
}

fn ensure_catalog_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for kind in EntityKind::ALL {
        let table = table_for(kind);
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }

    let foreign_keys: i64 = conn.query_row("PRAGMA foreign_keys;", [], |row| row.get(0))?;
    if foreign_keys != 1 {
        return Err(RepoError::ForeignKeysDisabled);
    }

    Ok(())
}
