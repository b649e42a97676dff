//! Train record and its derived price.
//!
//! # Invariants
//! - `train_number` is unique.
//! - `final_price == pricing::final_price(base_price, tax, discount)` for
//!   every persisted row; the store writes it from the draft on each insert
//!   and update.
//! - Station, company and hall references are identities; deleting a
//!   referenced row cascades to the train.

use super::pricing::{self, Percent};
use super::{Entity, EntityId, EntityKind, ValidationError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub const DEFAULT_STARS: i64 = 3;
const MAX_STARS: i64 = 5;

static TRAIN_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\S{1,50}$").expect("valid train number regex"));

/// Coach layout of a train.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrainType {
    /// Four-seat compartments.
    #[serde(rename = "4_coupe")]
    FourCoupe,
    /// Open bus-style seating.
    #[serde(rename = "bus")]
    Bus,
    /// Six-seat compartments.
    #[serde(rename = "6_coupe")]
    SixCoupe,
}

impl TrainType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FourCoupe => "4_coupe",
            Self::Bus => "bus",
            Self::SixCoupe => "6_coupe",
        }
    }

    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value {
            "4_coupe" => Ok(Self::FourCoupe),
            "bus" => Ok(Self::Bus),
            "6_coupe" => Ok(Self::SixCoupe),
            other => Err(ValidationError::UnknownTrainType(other.to_string())),
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::FourCoupe => "Coupe 4-seater",
            Self::Bus => "Bus-style",
            Self::SixCoupe => "Coupe 6-seater",
        }
    }
}

impl Display for TrainType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Train {
    pub id: EntityId,
    pub train_number: String,
    /// Unix epoch milliseconds.
    pub departure_at: i64,
    /// Unix epoch milliseconds, never earlier than `departure_at`.
    pub arrival_at: i64,
    pub departure_station_id: EntityId,
    pub arrival_station_id: EntityId,
    pub railway_company_id: EntityId,
    pub hall_id: EntityId,
    pub train_type: TrainType,
    pub capacity: i64,
    pub stars: i64,
    pub base_price: i64,
    pub tax: Percent,
    pub discount: Percent,
    pub final_price: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainDraft {
    pub train_number: String,
    pub departure_at: i64,
    pub arrival_at: i64,
    pub departure_station_id: EntityId,
    pub arrival_station_id: EntityId,
    pub railway_company_id: EntityId,
    pub hall_id: EntityId,
    pub train_type: TrainType,
    pub capacity: i64,
    #[serde(default = "default_stars")]
    pub stars: i64,
    pub base_price: i64,
    #[serde(default)]
    pub tax: Percent,
    #[serde(default)]
    pub discount: Percent,
}

fn default_stars() -> i64 {
    DEFAULT_STARS
}

impl TrainDraft {
    /// Price that will be persisted for this draft.
    pub fn final_price(&self) -> i64 {
        pricing::final_price(self.base_price, self.tax, self.discount)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainPatch {
    pub train_number: Option<String>,
    pub departure_at: Option<i64>,
    pub arrival_at: Option<i64>,
    pub departure_station_id: Option<EntityId>,
    pub arrival_station_id: Option<EntityId>,
    pub railway_company_id: Option<EntityId>,
    pub hall_id: Option<EntityId>,
    pub train_type: Option<TrainType>,
    pub capacity: Option<i64>,
    pub stars: Option<i64>,
    pub base_price: Option<i64>,
    pub tax: Option<Percent>,
    pub discount: Option<Percent>,
}

fn pick<T: Clone>(patch: &Option<T>, current: &T) -> T {
    patch.clone().unwrap_or_else(|| current.clone())
}

fn keep<T: Clone, P>(patch: &Option<P>, current: &T) -> Option<T> {
    patch.as_ref().map(|_| current.clone())
}

impl Entity for Train {
    type Draft = TrainDraft;
    type Patch = TrainPatch;

    const KIND: EntityKind = EntityKind::Train;

    fn id(&self) -> EntityId {
        self.id
    }

    fn label(&self) -> String {
        self.train_number.clone()
    }

    fn to_draft(&self) -> TrainDraft {
        TrainDraft {
            train_number: self.train_number.clone(),
            departure_at: self.departure_at,
            arrival_at: self.arrival_at,
            departure_station_id: self.departure_station_id,
            arrival_station_id: self.arrival_station_id,
            railway_company_id: self.railway_company_id,
            hall_id: self.hall_id,
            train_type: self.train_type,
            capacity: self.capacity,
            stars: self.stars,
            base_price: self.base_price,
            tax: self.tax,
            discount: self.discount,
        }
    }

    fn patched(&self, patch: &TrainPatch) -> TrainDraft {
        TrainDraft {
            train_number: pick(&patch.train_number, &self.train_number),
            departure_at: pick(&patch.departure_at, &self.departure_at),
            arrival_at: pick(&patch.arrival_at, &self.arrival_at),
            departure_station_id: pick(&patch.departure_station_id, &self.departure_station_id),
            arrival_station_id: pick(&patch.arrival_station_id, &self.arrival_station_id),
            railway_company_id: pick(&patch.railway_company_id, &self.railway_company_id),
            hall_id: pick(&patch.hall_id, &self.hall_id),
            train_type: pick(&patch.train_type, &self.train_type),
            capacity: pick(&patch.capacity, &self.capacity),
            stars: pick(&patch.stars, &self.stars),
            base_price: pick(&patch.base_price, &self.base_price),
            tax: pick(&patch.tax, &self.tax),
            discount: pick(&patch.discount, &self.discount),
        }
    }

    fn capture(&self, patch: &TrainPatch) -> TrainPatch {
        TrainPatch {
            train_number: keep(&patch.train_number, &self.train_number),
            departure_at: keep(&patch.departure_at, &self.departure_at),
            arrival_at: keep(&patch.arrival_at, &self.arrival_at),
            departure_station_id: keep(&patch.departure_station_id, &self.departure_station_id),
            arrival_station_id: keep(&patch.arrival_station_id, &self.arrival_station_id),
            railway_company_id: keep(&patch.railway_company_id, &self.railway_company_id),
            hall_id: keep(&patch.hall_id, &self.hall_id),
            train_type: keep(&patch.train_type, &self.train_type),
            capacity: keep(&patch.capacity, &self.capacity),
            stars: keep(&patch.stars, &self.stars),
            base_price: keep(&patch.base_price, &self.base_price),
            tax: keep(&patch.tax, &self.tax),
            discount: keep(&patch.discount, &self.discount),
        }
    }

    fn patch_fields(patch: &TrainPatch) -> Vec<&'static str> {
        [
            ("train_number", patch.train_number.is_some()),
            ("departure_at", patch.departure_at.is_some()),
            ("arrival_at", patch.arrival_at.is_some()),
            ("departure_station_id", patch.departure_station_id.is_some()),
            ("arrival_station_id", patch.arrival_station_id.is_some()),
            ("railway_company_id", patch.railway_company_id.is_some()),
            ("hall_id", patch.hall_id.is_some()),
            ("train_type", patch.train_type.is_some()),
            ("capacity", patch.capacity.is_some()),
            ("stars", patch.stars.is_some()),
            ("base_price", patch.base_price.is_some()),
            ("tax", patch.tax.is_some()),
            ("discount", patch.discount.is_some()),
        ]
        .into_iter()
        .filter_map(|(field, present)| present.then_some(field))
        .collect()
    }

    fn unique_key(draft: &TrainDraft) -> String {
        draft.train_number.clone()
    }

    fn validate_draft(draft: &TrainDraft) -> Result<(), ValidationError> {
        if !TRAIN_NUMBER_RE.is_match(&draft.train_number) {
            return Err(ValidationError::InvalidTrainNumber(
                draft.train_number.clone(),
            ));
        }
        if draft.arrival_at < draft.departure_at {
            return Err(ValidationError::ArrivalBeforeDeparture {
                departure_at: draft.departure_at,
                arrival_at: draft.arrival_at,
            });
        }
        if draft.departure_station_id == draft.arrival_station_id {
            return Err(ValidationError::SameStation(draft.departure_station_id));
        }
        if draft.capacity <= 0 {
            return Err(ValidationError::NonPositiveCapacity(draft.capacity));
        }
        if !(1..=MAX_STARS).contains(&draft.stars) {
            return Err(ValidationError::StarsOutOfRange(draft.stars));
        }
        if draft.base_price < 0 {
            return Err(ValidationError::NegativePrice(draft.base_price));
        }
        Ok(())
    }
}
