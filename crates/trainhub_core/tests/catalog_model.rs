use trainhub_core::model::train::DEFAULT_STARS;
use trainhub_core::{
    Entity, Percent, RailwayCompany, RailwayCompanyPatch, Station, StationPatch, Train,
    TrainDraft, TrainPatch, TrainType, ValidationError,
};

fn sample_train() -> Train {
    Train {
        id: 7,
        train_number: "IR-7".to_string(),
        departure_at: 1_000,
        arrival_at: 2_000,
        departure_station_id: 1,
        arrival_station_id: 2,
        railway_company_id: 3,
        hall_id: 4,
        train_type: TrainType::FourCoupe,
        capacity: 100,
        stars: 4,
        base_price: 100_000,
        tax: Percent::from_whole(9).unwrap(),
        discount: Percent::from_whole(10).unwrap(),
        final_price: 98_100,
    }
}

#[test]
fn capture_records_only_patched_fields() {
    let station = Station {
        id: 1,
        station_name: "Tehran".to_string(),
        station_city: "Tehran".to_string(),
        station_province: "Tehran".to_string(),
    };
    let patch = StationPatch {
        station_city: Some("Rey".to_string()),
        ..StationPatch::default()
    };

    let captured = station.capture(&patch);
    assert_eq!(
        captured,
        StationPatch {
            station_city: Some("Tehran".to_string()),
            ..StationPatch::default()
        }
    );
    assert_eq!(Station::patch_fields(&patch), vec!["station_city"]);

    let draft = station.patched(&patch);
    assert_eq!(draft.station_city, "Rey");
    assert_eq!(draft.station_name, "Tehran");
}

#[test]
fn clearing_an_optional_field_is_captured_as_a_restore() {
    let company = RailwayCompany {
        id: 2,
        railway_name: "Raja".to_string(),
        railway_description: "State".to_string(),
        refund_policy: "24h".to_string(),
        railway_logo: Some("raja.png".to_string()),
    };
    let clear = RailwayCompanyPatch {
        railway_logo: Some(None),
        ..RailwayCompanyPatch::default()
    };

    assert_eq!(company.patched(&clear).railway_logo, None);
    let captured = company.capture(&clear);
    assert_eq!(captured.railway_logo, Some(Some("raja.png".to_string())));
}

#[test]
fn zero_tax_patch_drops_tax_from_final_price() {
    let patch = TrainPatch {
        tax: Some(Percent::ZERO),
        ..TrainPatch::default()
    };
    assert_eq!(Train::patch_fields(&patch), vec!["tax"]);

    let draft = sample_train().patched(&patch);
    assert_eq!(draft.final_price(), 90_000);
}

#[test]
fn train_validation_rules() {
    let valid = sample_train().to_draft();
    assert_eq!(Train::validate_draft(&valid), Ok(()));

    let long_number = "x".repeat(51);
    let cases = vec![
        (
            TrainDraft {
                train_number: "IR 7".to_string(),
                ..valid.clone()
            },
            ValidationError::InvalidTrainNumber("IR 7".to_string()),
        ),
        (
            TrainDraft {
                train_number: long_number.clone(),
                ..valid.clone()
            },
            ValidationError::InvalidTrainNumber(long_number),
        ),
        (
            TrainDraft {
                arrival_at: valid.departure_at - 1,
                ..valid.clone()
            },
            ValidationError::ArrivalBeforeDeparture {
                departure_at: 1_000,
                arrival_at: 999,
            },
        ),
        (
            TrainDraft {
                capacity: 0,
                ..valid.clone()
            },
            ValidationError::NonPositiveCapacity(0),
        ),
        (
            TrainDraft {
                stars: 6,
                ..valid.clone()
            },
            ValidationError::StarsOutOfRange(6),
        ),
        (
            TrainDraft {
                base_price: -1,
                ..valid.clone()
            },
            ValidationError::NegativePrice(-1),
        ),
    ];

    for (draft, expected) in cases {
        assert_eq!(Train::validate_draft(&draft), Err(expected));
    }
}

#[test]
fn train_draft_json_defaults_stars_and_percentages() {
    let draft: TrainDraft = serde_json::from_str(
        r#"{
            "train_number": "IR-9",
            "departure_at": 0,
            "arrival_at": 10,
            "departure_station_id": 1,
            "arrival_station_id": 2,
            "railway_company_id": 3,
            "hall_id": 4,
            "train_type": "6_coupe",
            "capacity": 50,
            "base_price": 1000
        }"#,
    )
    .unwrap();

    assert_eq!(draft.stars, DEFAULT_STARS);
    assert_eq!(draft.tax, Percent::ZERO);
    assert_eq!(draft.train_type, TrainType::SixCoupe);
    assert_eq!(draft.final_price(), 1000);
}

#[test]
fn train_type_tags_parse() {
    assert_eq!(TrainType::parse("bus"), Ok(TrainType::Bus));
    assert_eq!(
        TrainType::parse("sleeper"),
        Err(ValidationError::UnknownTrainType("sleeper".to_string()))
    );
    assert_eq!(TrainType::SixCoupe.description(), "Coupe 6-seater");
}

#[test]
fn blank_station_name_is_rejected() {
    let draft = trainhub_core::StationDraft::new("  ", "City", "Province");
    assert_eq!(
        Station::validate_draft(&draft),
        Err(ValidationError::BlankField("station_name"))
    );
}

#[test]
fn blank_company_description_is_rejected() {
    let draft = trainhub_core::RailwayCompanyDraft::new("Raja", "  ", "24h");
    assert_eq!(
        RailwayCompany::validate_draft(&draft),
        Err(ValidationError::BlankField("railway_description"))
    );
}

#[test]
fn json_null_clears_optional_fields_and_absent_keys_do_not() {
    let clear: RailwayCompanyPatch = serde_json::from_str(r#"{"railway_logo": null}"#).unwrap();
    assert_eq!(clear.railway_logo, Some(None));

    let untouched: RailwayCompanyPatch =
        serde_json::from_str(r#"{"railway_name": "Raja"}"#).unwrap();
    assert_eq!(untouched.railway_logo, None);

    let set: RailwayCompanyPatch =
        serde_json::from_str(r#"{"railway_logo": "raja.png"}"#).unwrap();
    assert_eq!(set.railway_logo, Some(Some("raja.png".to_string())));

    let hall: trainhub_core::TrainHallPatch =
        serde_json::from_str(r#"{"hall_description": null}"#).unwrap();
    assert_eq!(hall.hall_description, Some(None));
    assert_eq!(serde_json::to_string(&hall).unwrap(), r#"{"hall_name":null,"hall_description":null}"#);
}
