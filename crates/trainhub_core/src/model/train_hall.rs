//! Train hall record. `hall_name` is unique.

use super::validation::require_text;
use super::{Entity, EntityId, EntityKind, ValidationError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainHall {
    pub id: EntityId,
    pub hall_name: String,
    pub hall_description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainHallDraft {
    pub hall_name: String,
    #[serde(default)]
    pub hall_description: Option<String>,
}

impl TrainHallDraft {
    pub fn new(hall_name: impl Into<String>, hall_description: Option<String>) -> Self {
        Self {
            hall_name: hall_name.into(),
            hall_description,
        }
    }
}

/// `hall_description: Some(None)` (JSON `null`) clears the description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainHallPatch {
    pub hall_name: Option<String>,
    #[serde(
        deserialize_with = "super::present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub hall_description: Option<Option<String>>,
}

impl Entity for TrainHall {
    type Draft = TrainHallDraft;
    type Patch = TrainHallPatch;

    const KIND: EntityKind = EntityKind::TrainHall;

    fn id(&self) -> EntityId {
        self.id
    }

    fn label(&self) -> String {
        self.hall_name.clone()
    }

    fn to_draft(&self) -> TrainHallDraft {
        TrainHallDraft {
            hall_name: self.hall_name.clone(),
            hall_description: self.hall_description.clone(),
        }
    }

    fn patched(&self, patch: &TrainHallPatch) -> TrainHallDraft {
        TrainHallDraft {
            hall_name: patch
                .hall_name
                .clone()
                .unwrap_or_else(|| self.hall_name.clone()),
            hall_description: patch
                .hall_description
                .clone()
                .unwrap_or_else(|| self.hall_description.clone()),
        }
    }

    fn capture(&self, patch: &TrainHallPatch) -> TrainHallPatch {
        TrainHallPatch {
            hall_name: patch.hall_name.as_ref().map(|_| self.hall_name.clone()),
            hall_description: patch
                .hall_description
                .as_ref()
                .map(|_| self.hall_description.clone()),
        }
    }

    fn patch_fields(patch: &TrainHallPatch) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if patch.hall_name.is_some() {
            fields.push("hall_name");
        }
        if patch.hall_description.is_some() {
            fields.push("hall_description");
        }
        fields
    }

    fn unique_key(draft: &TrainHallDraft) -> String {
        draft.hall_name.clone()
    }

    fn validate_draft(draft: &TrainHallDraft) -> Result<(), ValidationError> {
        require_text("hall_name", &draft.hall_name)
    }
}
