//! String-typed train inputs and their conversion into core drafts.
//!
//! Timestamps are RFC 3339 strings; naive `YYYY-MM-DDTHH:MM:SS` values are
//! read as UTC. Percentages are floats rounded to two fractional digits.

use crate::api::ApiError;
use chrono::{DateTime, NaiveDateTime};
use serde::Deserialize;
use trainhub_core::model::train::DEFAULT_STARS;
use trainhub_core::{EntityId, Percent, TrainDraft, TrainPatch, TrainType};

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TrainInput {
    pub train_number: String,
    pub departure_datetime: String,
    pub arrival_datetime: String,
    pub departure_station_id: EntityId,
    pub arrival_station_id: EntityId,
    pub railway_company_id: EntityId,
    pub hall_id: EntityId,
    /// `4_coupe`, `bus` or `6_coupe`.
    pub train_type: String,
    pub capacity: i64,
    #[serde(default)]
    pub stars: Option<i64>,
    pub base_price: i64,
    #[serde(default)]
    pub tax: Option<f64>,
    #[serde(default)]
    pub discount: Option<f64>,
}

impl TrainInput {
    pub fn into_draft(self) -> Result<TrainDraft, ApiError> {
        Ok(TrainDraft {
            departure_at: parse_datetime("departure_datetime", &self.departure_datetime)?,
            arrival_at: parse_datetime("arrival_datetime", &self.arrival_datetime)?,
            train_type: parse_train_type(&self.train_type)?,
            tax: parse_percent("tax", self.tax)?.unwrap_or(Percent::ZERO),
            discount: parse_percent("discount", self.discount)?.unwrap_or(Percent::ZERO),
            stars: self.stars.unwrap_or(DEFAULT_STARS),
            train_number: self.train_number.trim().to_string(),
            departure_station_id: self.departure_station_id,
            arrival_station_id: self.arrival_station_id,
            railway_company_id: self.railway_company_id,
            hall_id: self.hall_id,
            capacity: self.capacity,
            base_price: self.base_price,
        })
    }
}

/// Partial train update; `None` fields stay untouched.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrainUpdateInput {
    pub train_number: Option<String>,
    pub departure_datetime: Option<String>,
    pub arrival_datetime: Option<String>,
    pub departure_station_id: Option<EntityId>,
    pub arrival_station_id: Option<EntityId>,
    pub railway_company_id: Option<EntityId>,
    pub hall_id: Option<EntityId>,
    pub train_type: Option<String>,
    pub capacity: Option<i64>,
    pub stars: Option<i64>,
    pub base_price: Option<i64>,
    pub tax: Option<f64>,
    pub discount: Option<f64>,
}

impl TrainUpdateInput {
    pub fn into_patch(self) -> Result<TrainPatch, ApiError> {
        Ok(TrainPatch {
            departure_at: self
                .departure_datetime
                .as_deref()
                .map(|value| parse_datetime("departure_datetime", value))
                .transpose()?,
            arrival_at: self
                .arrival_datetime
                .as_deref()
                .map(|value| parse_datetime("arrival_datetime", value))
                .transpose()?,
            train_type: self
                .train_type
                .as_deref()
                .map(parse_train_type)
                .transpose()?,
            tax: parse_percent("tax", self.tax)?,
            discount: parse_percent("discount", self.discount)?,
            train_number: self.train_number.map(|value| value.trim().to_string()),
            departure_station_id: self.departure_station_id,
            arrival_station_id: self.arrival_station_id,
            railway_company_id: self.railway_company_id,
            hall_id: self.hall_id,
            capacity: self.capacity,
            stars: self.stars,
            base_price: self.base_price,
        })
    }
}

/// Parses a timestamp into Unix epoch milliseconds.
pub fn parse_datetime(field: &'static str, value: &str) -> Result<i64, ApiError> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.timestamp_millis());
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc().timestamp_millis())
        .ok_or_else(|| ApiError::InvalidInput {
            field,
            message: format!("`{value}` is not an RFC 3339 datetime"),
        })
}

fn parse_train_type(value: &str) -> Result<TrainType, ApiError> {
    Ok(TrainType::parse(value.trim())?)
}

fn parse_percent(field: &'static str, value: Option<f64>) -> Result<Option<Percent>, ApiError> {
    value
        .map(|value| {
            Percent::from_f64(value).map_err(|err| ApiError::InvalidInput {
                field,
                message: err.to_string(),
            })
        })
        .transpose()
}
