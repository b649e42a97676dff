//! Repository layer: the entity store behind the command layer.
//!
//! # Responsibility
//! - Define the [`EntityStore`] contract the command layer executes against.
//! - Keep SQLite query details behind one generic implementation plus one
//!   thin table mapping per record kind.
//!
//! # Invariants
//! - Write paths validate drafts and referenced identities before SQL
//!   mutations.
//! - Repository APIs return semantic errors (`NotFound`, `Duplicate`) in
//!   addition to DB transport errors.

pub mod entity_repo;
mod tables;

pub use entity_repo::{Deletion, EntityStore, RepoError, RepoResult, SqliteStore, TableMapping};
