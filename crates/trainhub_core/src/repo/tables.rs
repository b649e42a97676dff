//! Per-kind table layouts and mirror document builders.

use super::entity_repo::{load, RepoError, RepoResult, TableMapping};
use crate::model::pricing::Percent;
use crate::model::railway_company::{RailwayCompany, RailwayCompanyDraft};
use crate::model::station::{Station, StationDraft};
use crate::model::train::{Train, TrainDraft, TrainType};
use crate::model::train_hall::{TrainHall, TrainHallDraft};
use crate::model::{Entity, EntityId, EntityKind};
use crate::search::SearchDocument;
use rusqlite::types::Value;
use rusqlite::{Connection, Row};
use serde_json::{json, Value as JsonValue};

impl TableMapping for Station {
    const TABLE: &'static str = "stations";
    const COLUMNS: &'static [&'static str] = &["station_name", "station_city", "station_province"];
    const KEY_COLUMN: &'static str = "station_name";
    const UNIQUE_COLUMNS: &'static [&'static str] =
        &["station_name", "station_city", "station_province"];
    const TRAIN_REFERENCES: &'static [&'static str] =
        &["departure_station_id", "arrival_station_id"];

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            station_name: row.get("station_name")?,
            station_city: row.get("station_city")?,
            station_province: row.get("station_province")?,
        })
    }

    fn column_values(draft: &StationDraft) -> Vec<Value> {
        Self::unique_values(draft)
    }

    fn unique_values(draft: &StationDraft) -> Vec<Value> {
        vec![
            Value::from(draft.station_name.clone()),
            Value::from(draft.station_city.clone()),
            Value::from(draft.station_province.clone()),
        ]
    }

    fn search_document(&self, _conn: &Connection) -> RepoResult<SearchDocument> {
        Ok(SearchDocument::new(
            Self::KIND,
            self.id,
            station_body(self),
            join_text([
                self.station_name.as_str(),
                self.station_city.as_str(),
                self.station_province.as_str(),
            ]),
        ))
    }
}

impl TableMapping for RailwayCompany {
    const TABLE: &'static str = "railway_companies";
    const COLUMNS: &'static [&'static str] = &[
        "railway_name",
        "railway_description",
        "refund_policy",
        "railway_logo",
    ];
    const KEY_COLUMN: &'static str = "railway_name";
    const UNIQUE_COLUMNS: &'static [&'static str] = &["railway_name"];
    const TRAIN_REFERENCES: &'static [&'static str] = &["railway_company_id"];

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            railway_name: row.get("railway_name")?,
            railway_description: row.get("railway_description")?,
            refund_policy: row.get("refund_policy")?,
            railway_logo: row.get("railway_logo")?,
        })
    }

    fn column_values(draft: &RailwayCompanyDraft) -> Vec<Value> {
        vec![
            Value::from(draft.railway_name.clone()),
            Value::from(draft.railway_description.clone()),
            Value::from(draft.refund_policy.clone()),
            Value::from(draft.railway_logo.clone()),
        ]
    }

    fn unique_values(draft: &RailwayCompanyDraft) -> Vec<Value> {
        vec![Value::from(draft.railway_name.clone())]
    }

    fn search_document(&self, _conn: &Connection) -> RepoResult<SearchDocument> {
        Ok(SearchDocument::new(
            Self::KIND,
            self.id,
            company_body(self),
            join_text([
                self.railway_name.as_str(),
                self.railway_description.as_str(),
                self.refund_policy.as_str(),
            ]),
        ))
    }
}

impl TableMapping for TrainHall {
    const TABLE: &'static str = "train_halls";
    const COLUMNS: &'static [&'static str] = &["hall_name", "hall_description"];
    const KEY_COLUMN: &'static str = "hall_name";
    const UNIQUE_COLUMNS: &'static [&'static str] = &["hall_name"];
    const TRAIN_REFERENCES: &'static [&'static str] = &["hall_id"];

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            hall_name: row.get("hall_name")?,
            hall_description: row.get("hall_description")?,
        })
    }

    fn column_values(draft: &TrainHallDraft) -> Vec<Value> {
        vec![
            Value::from(draft.hall_name.clone()),
            Value::from(draft.hall_description.clone()),
        ]
    }

    fn unique_values(draft: &TrainHallDraft) -> Vec<Value> {
        vec![Value::from(draft.hall_name.clone())]
    }

    fn search_document(&self, _conn: &Connection) -> RepoResult<SearchDocument> {
        Ok(SearchDocument::new(
            Self::KIND,
            self.id,
            hall_body(self),
            join_text([
                self.hall_name.as_str(),
                self.hall_description.as_deref().unwrap_or_default(),
            ]),
        ))
    }
}

impl TableMapping for Train {
    const TABLE: &'static str = "trains";
    const COLUMNS: &'static [&'static str] = &[
        "train_number",
        "departure_at",
        "arrival_at",
        "departure_station_id",
        "arrival_station_id",
        "railway_company_id",
        "hall_id",
        "train_type",
        "capacity",
        "stars",
        "base_price",
        "tax_hundredths",
        "discount_hundredths",
        "final_price",
    ];
    const KEY_COLUMN: &'static str = "train_number";
    const UNIQUE_COLUMNS: &'static [&'static str] = &["train_number"];
    const TRAIN_REFERENCES: &'static [&'static str] = &[];

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        let train_type: String = row.get("train_type")?;
        Ok(Self {
            id: row.get("id")?,
            train_number: row.get("train_number")?,
            departure_at: row.get("departure_at")?,
            arrival_at: row.get("arrival_at")?,
            departure_station_id: row.get("departure_station_id")?,
            arrival_station_id: row.get("arrival_station_id")?,
            railway_company_id: row.get("railway_company_id")?,
            hall_id: row.get("hall_id")?,
            train_type: TrainType::parse(&train_type)
                .map_err(|err| RepoError::InvalidData(err.to_string()))?,
            capacity: row.get("capacity")?,
            stars: row.get("stars")?,
            base_price: row.get("base_price")?,
            tax: percent_column(row, "tax_hundredths")?,
            discount: percent_column(row, "discount_hundredths")?,
            final_price: row.get("final_price")?,
        })
    }

    fn column_values(draft: &TrainDraft) -> Vec<Value> {
        vec![
            Value::from(draft.train_number.clone()),
            Value::from(draft.departure_at),
            Value::from(draft.arrival_at),
            Value::from(draft.departure_station_id),
            Value::from(draft.arrival_station_id),
            Value::from(draft.railway_company_id),
            Value::from(draft.hall_id),
            Value::from(draft.train_type.as_str().to_string()),
            Value::from(draft.capacity),
            Value::from(draft.stars),
            Value::from(draft.base_price),
            Value::Integer(i64::from(draft.tax.hundredths())),
            Value::Integer(i64::from(draft.discount.hundredths())),
            Value::from(draft.final_price()),
        ]
    }

    fn unique_values(draft: &TrainDraft) -> Vec<Value> {
        vec![Value::from(draft.train_number.clone())]
    }

    fn references(draft: &TrainDraft) -> Vec<(EntityKind, EntityId)> {
        vec![
            (EntityKind::Station, draft.departure_station_id),
            (EntityKind::Station, draft.arrival_station_id),
            (EntityKind::RailwayCompany, draft.railway_company_id),
            (EntityKind::TrainHall, draft.hall_id),
        ]
    }

    /// Embeds the referenced station, company and hall so a single document
    /// answers route and operator queries.
    fn search_document(&self, conn: &Connection) -> RepoResult<SearchDocument> {
        let departure = load::<Station>(conn, self.departure_station_id)?;
        let arrival = load::<Station>(conn, self.arrival_station_id)?;
        let company = load::<RailwayCompany>(conn, self.railway_company_id)?;
        let hall = load::<TrainHall>(conn, self.hall_id)?;

        let body = json!({
            "id": self.id,
            "train_number": self.train_number,
            "departure_at": self.departure_at,
            "arrival_at": self.arrival_at,
            "train_type": self.train_type.as_str(),
            "capacity": self.capacity,
            "stars": self.stars,
            "base_price": self.base_price,
            "tax": self.tax.to_string(),
            "discount": self.discount.to_string(),
            "final_price": self.final_price,
            "departure_station": departure.as_ref().map_or(JsonValue::Null, station_body),
            "arrival_station": arrival.as_ref().map_or(JsonValue::Null, station_body),
            "railway_company": company.as_ref().map_or(JsonValue::Null, company_body),
            "hall": hall.as_ref().map_or(JsonValue::Null, hall_body),
        });

        let mut text = vec![
            self.train_number.as_str(),
            self.train_type.as_str(),
            self.train_type.description(),
        ];
        for station in [departure.as_ref(), arrival.as_ref()].into_iter().flatten() {
            text.push(station.station_name.as_str());
            text.push(station.station_city.as_str());
        }
        if let Some(company) = company.as_ref() {
            text.push(company.railway_name.as_str());
        }
        if let Some(hall) = hall.as_ref() {
            text.push(hall.hall_name.as_str());
        }

        Ok(SearchDocument::new(
            Self::KIND,
            self.id,
            body,
            join_text(text),
        ))
    }
}

fn percent_column(row: &Row<'_>, column: &str) -> RepoResult<Percent> {
    let hundredths: u32 = row.get(column)?;
    Percent::from_hundredths(hundredths)
        .map_err(|err| RepoError::InvalidData(format!("{column}: {err}")))
}

fn station_body(station: &Station) -> JsonValue {
    json!({
        "id": station.id,
        "station_name": station.station_name,
        "station_city": station.station_city,
        "station_province": station.station_province,
    })
}

fn company_body(company: &RailwayCompany) -> JsonValue {
    json!({
        "id": company.id,
        "railway_name": company.railway_name,
        "railway_description": company.railway_description,
        "refund_policy": company.refund_policy,
    })
}

fn hall_body(hall: &TrainHall) -> JsonValue {
    json!({
        "id": hall.id,
        "hall_name": hall.hall_name,
        "hall_description": hall.hall_description,
    })
}

fn join_text<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    parts
        .into_iter()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
