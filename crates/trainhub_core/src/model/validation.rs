//! Validation errors shared by all catalog drafts.

use super::EntityId;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Draft rejected before any store write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required text field is empty after trimming.
    BlankField(&'static str),
    /// Train number is empty, too long or contains whitespace.
    InvalidTrainNumber(String),
    ArrivalBeforeDeparture {
        departure_at: i64,
        arrival_at: i64,
    },
    /// Departure and arrival reference the same station.
    SameStation(EntityId),
    NonPositiveCapacity(i64),
    StarsOutOfRange(i64),
    NegativePrice(i64),
    /// Percentage outside `0.00..=100.00` or not representable.
    PercentOutOfRange(String),
    /// Unknown train type tag.
    UnknownTrainType(String),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankField(field) => write!(f, "{field} must not be blank"),
            Self::InvalidTrainNumber(value) => write!(
                f,
                "train_number `{value}` must be 1-50 characters without whitespace"
            ),
            Self::ArrivalBeforeDeparture {
                departure_at,
                arrival_at,
            } => write!(
                f,
                "arrival_at ({arrival_at}) must not be earlier than departure_at ({departure_at})"
            ),
            Self::SameStation(id) => write!(
                f,
                "departure and arrival station must differ (both are {id})"
            ),
            Self::NonPositiveCapacity(value) => {
                write!(f, "capacity must be positive, got {value}")
            }
            Self::StarsOutOfRange(value) => write!(f, "stars must be within 1..=5, got {value}"),
            Self::NegativePrice(value) => {
                write!(f, "base_price must not be negative, got {value}")
            }
            Self::PercentOutOfRange(value) => {
                write!(f, "percentage `{value}` must be within 0.00..=100.00")
            }
            Self::UnknownTrainType(value) => write!(
                f,
                "unknown train type `{value}`; expected 4_coupe|bus|6_coupe"
            ),
        }
    }
}

impl Error for ValidationError {}

/// Rejects empty or whitespace-only required text.
pub(crate) fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::BlankField(field));
    }
    Ok(())
}
