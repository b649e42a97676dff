//! Catalog domain model for the train-ticketing backend.
//!
//! # Responsibility
//! - Define the four catalog records (station, railway company, train hall,
//!   train) together with their create drafts and partial-update patches.
//! - Describe every record kind through the [`Entity`] adapter so the
//!   repository and command layers can stay generic.
//!
//! # Invariants
//! - Every record is identified by a store-assigned `EntityId` that is never
//!   reused for another row of the same kind.
//! - Deletion is physical; there are no tombstones.
//! - `Train::final_price` is derived from base price, tax and discount at
//!   write time and never computed lazily.

pub mod pricing;
pub mod railway_company;
pub mod station;
pub mod train;
pub mod train_hall;
pub mod validation;

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::{Debug, Display, Formatter};

pub use validation::ValidationError;

/// Store-assigned, auto-incrementing row identity.
pub type EntityId = i64;

/// The four catalog record kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Station,
    RailwayCompany,
    TrainHall,
    Train,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Station,
        EntityKind::RailwayCompany,
        EntityKind::TrainHall,
        EntityKind::Train,
    ];

    /// Stable storage/log token.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Station => "station",
            Self::RailwayCompany => "railway_company",
            Self::TrainHall => "train_hall",
            Self::Train => "train",
        }
    }

    /// Parses a storage token produced by [`EntityKind::as_str`].
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }

    /// Human-readable name used in API messages.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Station => "Station",
            Self::RailwayCompany => "Railway Company",
            Self::TrainHall => "Train Hall",
            Self::Train => "Train",
        }
    }

    /// Search index name that mirrors this kind.
    pub fn index_name(self) -> &'static str {
        match self {
            Self::Station => "stations",
            Self::RailwayCompany => "railway_companies",
            Self::TrainHall => "train_halls",
            Self::Train => "trains",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field-mapping adapter implemented once per catalog record kind.
///
/// A record is the persisted row (with identity); a `Draft` carries every
/// writable field without identity; a `Patch` names a subset of fields to
/// assign, leaving the rest untouched.
pub trait Entity: Clone + Debug + PartialEq + Send + 'static {
    type Draft: Clone + Debug + PartialEq + Send + 'static;
    type Patch: Clone + Debug + Default + PartialEq + Send + 'static;

    const KIND: EntityKind;

    fn id(&self) -> EntityId;

    /// Name used in operation messages, e.g. the station name.
    fn label(&self) -> String;

    /// Full snapshot of writable fields.
    fn to_draft(&self) -> Self::Draft;

    /// Draft that results from applying `patch` to this record.
    fn patched(&self, patch: &Self::Patch) -> Self::Draft;

    /// Current values of exactly the fields named by `patch`.
    fn capture(&self, patch: &Self::Patch) -> Self::Patch;

    /// Names of the fields assigned by `patch`, in declaration order.
    fn patch_fields(patch: &Self::Patch) -> Vec<&'static str>;

    /// Human-readable unique key used in duplicate errors.
    fn unique_key(draft: &Self::Draft) -> String;

    fn validate_draft(draft: &Self::Draft) -> Result<(), ValidationError>;
}

/// Deserializes a clearable patch field: a present key (even `null`) becomes
/// `Some(_)`. Pair with `#[serde(default)]` so an absent key stays `None`.
pub(crate) fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
