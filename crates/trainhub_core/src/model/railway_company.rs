//! Railway company record.
//!
//! # Invariants
//! - `railway_name` is unique.
//! - `railway_logo` is an opaque reference (path or URL); it is never read.

use super::validation::require_text;
use super::{Entity, EntityId, EntityKind, ValidationError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RailwayCompany {
    pub id: EntityId,
    pub railway_name: String,
    pub railway_description: String,
    pub refund_policy: String,
    pub railway_logo: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RailwayCompanyDraft {
    pub railway_name: String,
    pub railway_description: String,
    pub refund_policy: String,
    #[serde(default)]
    pub railway_logo: Option<String>,
}

impl RailwayCompanyDraft {
    pub fn new(
        railway_name: impl Into<String>,
        railway_description: impl Into<String>,
        refund_policy: impl Into<String>,
    ) -> Self {
        Self {
            railway_name: railway_name.into(),
            railway_description: railway_description.into(),
            refund_policy: refund_policy.into(),
            railway_logo: None,
        }
    }

    pub fn with_logo(mut self, logo: impl Into<String>) -> Self {
        self.railway_logo = Some(logo.into());
        self
    }
}

/// `railway_logo: Some(None)` clears the logo; in JSON that is an explicit
/// `null`, while an absent key leaves the logo untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RailwayCompanyPatch {
    pub railway_name: Option<String>,
    pub railway_description: Option<String>,
    pub refund_policy: Option<String>,
    #[serde(
        deserialize_with = "super::present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub railway_logo: Option<Option<String>>,
}

impl Entity for RailwayCompany {
    type Draft = RailwayCompanyDraft;
    type Patch = RailwayCompanyPatch;

    const KIND: EntityKind = EntityKind::RailwayCompany;

    fn id(&self) -> EntityId {
        self.id
    }

    fn label(&self) -> String {
        self.railway_name.clone()
    }

    fn to_draft(&self) -> RailwayCompanyDraft {
        RailwayCompanyDraft {
            railway_name: self.railway_name.clone(),
            railway_description: self.railway_description.clone(),
            refund_policy: self.refund_policy.clone(),
            railway_logo: self.railway_logo.clone(),
        }
    }

    fn patched(&self, patch: &RailwayCompanyPatch) -> RailwayCompanyDraft {
        let mut draft = self.to_draft();
        if let Some(value) = &patch.railway_name {
            draft.railway_name = value.clone();
        }
        if let Some(value) = &patch.railway_description {
            draft.railway_description = value.clone();
        }
        if let Some(value) = &patch.refund_policy {
            draft.refund_policy = value.clone();
        }
        if let Some(value) = &patch.railway_logo {
            draft.railway_logo = value.clone();
        }
        draft
    }

    fn capture(&self, patch: &RailwayCompanyPatch) -> RailwayCompanyPatch {
        RailwayCompanyPatch {
            railway_name: patch.railway_name.as_ref().map(|_| self.railway_name.clone()),
            railway_description: patch
                .railway_description
                .as_ref()
                .map(|_| self.railway_description.clone()),
            refund_policy: patch
                .refund_policy
                .as_ref()
                .map(|_| self.refund_policy.clone()),
            railway_logo: patch.railway_logo.as_ref().map(|_| self.railway_logo.clone()),
        }
    }

    fn patch_fields(patch: &RailwayCompanyPatch) -> Vec<&'static str> {
        [
            ("railway_name", patch.railway_name.is_some()),
            ("railway_description", patch.railway_description.is_some()),
            ("refund_policy", patch.refund_policy.is_some()),
            ("railway_logo", patch.railway_logo.is_some()),
        ]
        .into_iter()
        .filter_map(|(field, present)| present.then_some(field))
        .collect()
    }

    fn unique_key(draft: &RailwayCompanyDraft) -> String {
        draft.railway_name.clone()
    }

    fn validate_draft(draft: &RailwayCompanyDraft) -> Result<(), ValidationError> {
        require_text("railway_name", &draft.railway_name)?;
        require_text("railway_description", &draft.railway_description)?;
        require_text("refund_policy", &draft.refund_policy)
    }
}
