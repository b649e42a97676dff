//! Station record.
//!
//! # Invariants
//! - `(station_name, station_city, station_province)` is unique.

use super::validation::require_text;
use super::{Entity, EntityId, EntityKind, ValidationError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Station {
    pub id: EntityId,
    pub station_name: String,
    pub station_city: String,
    pub station_province: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationDraft {
    pub station_name: String,
    pub station_city: String,
    pub station_province: String,
}

impl StationDraft {
    pub fn new(
        station_name: impl Into<String>,
        station_city: impl Into<String>,
        station_province: impl Into<String>,
    ) -> Self {
        Self {
            station_name: station_name.into(),
            station_city: station_city.into(),
            station_province: station_province.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StationPatch {
    pub station_name: Option<String>,
    pub station_city: Option<String>,
    pub station_province: Option<String>,
}

impl Entity for Station {
    type Draft = StationDraft;
    type Patch = StationPatch;

    const KIND: EntityKind = EntityKind::Station;

    fn id(&self) -> EntityId {
        self.id
    }

    fn label(&self) -> String {
        self.station_name.clone()
    }

    fn to_draft(&self) -> StationDraft {
        StationDraft {
            station_name: self.station_name.clone(),
            station_city: self.station_city.clone(),
            station_province: self.station_province.clone(),
        }
    }

    fn patched(&self, patch: &StationPatch) -> StationDraft {
        StationDraft {
            station_name: patch
                .station_name
                .clone()
                .unwrap_or_else(|| self.station_name.clone()),
            station_city: patch
                .station_city
                .clone()
                .unwrap_or_else(|| self.station_city.clone()),
            station_province: patch
                .station_province
                .clone()
                .unwrap_or_else(|| self.station_province.clone()),
        }
    }

    fn capture(&self, patch: &StationPatch) -> StationPatch {
        StationPatch {
            station_name: patch.station_name.as_ref().map(|_| self.station_name.clone()),
            station_city: patch.station_city.as_ref().map(|_| self.station_city.clone()),
            station_province: patch
                .station_province
                .as_ref()
                .map(|_| self.station_province.clone()),
        }
    }

    fn patch_fields(patch: &StationPatch) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if patch.station_name.is_some() {
            fields.push("station_name");
        }
        if patch.station_city.is_some() {
            fields.push("station_city");
        }
        if patch.station_province.is_some() {
            fields.push("station_province");
        }
        fields
    }

    fn unique_key(draft: &StationDraft) -> String {
        format!(
            "{}/{}/{}",
            draft.station_name, draft.station_city, draft.station_province
        )
    }

    fn validate_draft(draft: &StationDraft) -> Result<(), ValidationError> {
        require_text("station_name", &draft.station_name)?;
        require_text("station_city", &draft.station_city)?;
        require_text("station_province", &draft.station_province)
    }
}
