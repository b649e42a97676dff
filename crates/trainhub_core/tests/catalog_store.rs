use rusqlite::Connection;
use trainhub_core::db::open_db_in_memory;
use trainhub_core::model::train::DEFAULT_STARS;
use trainhub_core::{
    Deletion, EntityKind, EntityStore, Percent, RailwayCompany, RailwayCompanyDraft,
    RailwayCompanyPatch, RepoError, SqliteStore, Station, StationDraft, StationPatch, Train,
    TrainDraft, TrainHall, TrainHallDraft, TrainPatch, TrainType, ValidationError,
};

const DEPARTURE_MS: i64 = 1_700_000_000_000;
const HOUR_MS: i64 = 3_600_000;

struct Fixture {
    from: Station,
    to: Station,
    company: RailwayCompany,
    hall: TrainHall,
}

fn seed(store: &SqliteStore<'_>) -> Fixture {
    Fixture {
        from: store
            .create(&StationDraft::new("Tehran", "Tehran", "Tehran"), None)
            .unwrap(),
        to: store
            .create(&StationDraft::new("Mashhad", "Mashhad", "Khorasan"), None)
            .unwrap(),
        company: store
            .create(
                &RailwayCompanyDraft::new("Raja", "State operator", "Full refund 24h ahead"),
                None,
            )
            .unwrap(),
        hall: store
            .create(&TrainHallDraft::new("Hall A", None), None)
            .unwrap(),
    }
}

fn train_draft(fixture: &Fixture, number: &str) -> TrainDraft {
    TrainDraft {
        train_number: number.to_string(),
        departure_at: DEPARTURE_MS,
        arrival_at: DEPARTURE_MS + 12 * HOUR_MS,
        departure_station_id: fixture.from.id,
        arrival_station_id: fixture.to.id,
        railway_company_id: fixture.company.id,
        hall_id: fixture.hall.id,
        train_type: TrainType::FourCoupe,
        capacity: 240,
        stars: DEFAULT_STARS,
        base_price: 100_000,
        tax: Percent::from_whole(9).unwrap(),
        discount: Percent::from_whole(10).unwrap(),
    }
}

fn count_rows(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

#[test]
fn create_and_get_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();

    let created: Station = store
        .create(&StationDraft::new("Tabriz", "Tabriz", "East Azerbaijan"), None)
        .unwrap();
    let loaded: Station = store.get(created.id).unwrap().unwrap();

    assert_eq!(loaded, created);
    assert_eq!(loaded.station_name, "Tabriz");
    assert_eq!(loaded.station_province, "East Azerbaijan");
}

#[test]
fn train_final_price_is_persisted_on_create() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let fixture = seed(&store);

    let train: Train = store.create(&train_draft(&fixture, "T-100"), None).unwrap();
    assert_eq!(train.final_price, 98_100);

    let persisted: i64 = conn
        .query_row(
            "SELECT final_price FROM trains WHERE id = ?1;",
            [train.id],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(persisted, 98_100);
}

#[test]
fn update_recomputes_final_price_and_keeps_other_fields() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let fixture = seed(&store);
    let train: Train = store.create(&train_draft(&fixture, "T-200"), None).unwrap();

    let updated: Train = store
        .update(
            train.id,
            &TrainPatch {
                discount: Some(Percent::ZERO),
                ..TrainPatch::default()
            },
        )
        .unwrap();

    assert_eq!(updated.final_price, 109_000);
    assert_eq!(updated.train_number, "T-200");
    assert_eq!(updated.capacity, train.capacity);
    assert_eq!(updated.tax, train.tax);
}

#[test]
fn duplicate_station_key_is_detected() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let draft = StationDraft::new("Qom", "Qom", "Qom");
    let _: Station = store.create(&draft, None).unwrap();

    assert!(EntityStore::<Station>::exists_conflict(&store, &draft, None).unwrap());

    let err = EntityStore::<Station>::create(&store, &draft, None).unwrap_err();
    match err {
        RepoError::Duplicate { kind, key } => {
            assert_eq!(kind, EntityKind::Station);
            assert_eq!(key, "Qom/Qom/Qom");
        }
        other => panic!("unexpected error: {other}"),
    }

    let same_name_other_city = StationDraft::new("Qom", "Kashan", "Isfahan");
    assert!(!EntityStore::<Station>::exists_conflict(&store, &same_name_other_city, None).unwrap());
}

#[test]
fn update_into_another_rows_key_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let _: RailwayCompany = store
        .create(&RailwayCompanyDraft::new("Fadak", "Private", "No refunds"), None)
        .unwrap();
    let other: RailwayCompany = store
        .create(&RailwayCompanyDraft::new("Safir", "Private", "50% refund"), None)
        .unwrap();

    let err = EntityStore::<RailwayCompany>::update(
        &store,
        other.id,
        &RailwayCompanyPatch {
            railway_name: Some("Fadak".to_string()),
            ..RailwayCompanyPatch::default()
        },
    )
    .unwrap_err();
    assert!(matches!(err, RepoError::Duplicate { .. }));

    // Renaming to its own current name is not a conflict.
    let renamed: RailwayCompany = store
        .update(
            other.id,
            &RailwayCompanyPatch {
                railway_name: Some("Safir".to_string()),
                railway_logo: Some(Some("safir.png".to_string())),
                ..RailwayCompanyPatch::default()
            },
        )
        .unwrap();
    assert_eq!(renamed.railway_logo.as_deref(), Some("safir.png"));
}

#[test]
fn update_missing_row_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();

    let err = EntityStore::<Station>::update(&store, 42, &StationPatch::default()).unwrap_err();
    assert!(matches!(
        err,
        RepoError::NotFound {
            kind: EntityKind::Station,
            id: 42
        }
    ));
}

#[test]
fn invalid_drafts_never_reach_the_table() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let fixture = seed(&store);

    let mut draft = train_draft(&fixture, "T-300");
    draft.arrival_at = draft.departure_at - 1;
    let err = EntityStore::<Train>::create(&store, &draft, None).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::ArrivalBeforeDeparture { .. })
    ));

    let mut draft = train_draft(&fixture, "T-301");
    draft.arrival_station_id = draft.departure_station_id;
    let err = EntityStore::<Train>::create(&store, &draft, None).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::SameStation(_))
    ));

    assert_eq!(count_rows(&conn, "trains"), 0);
}

#[test]
fn train_with_unknown_reference_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let fixture = seed(&store);

    let mut draft = train_draft(&fixture, "T-400");
    draft.hall_id = 9_999;
    let err = EntityStore::<Train>::create(&store, &draft, None).unwrap_err();
    assert!(matches!(
        err,
        RepoError::NotFound {
            kind: EntityKind::TrainHall,
            id: 9_999
        }
    ));
}

#[test]
fn delete_snapshots_cascaded_trains() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let fixture = seed(&store);
    let first: Train = store.create(&train_draft(&fixture, "T-500"), None).unwrap();
    let second: Train = store.create(&train_draft(&fixture, "T-501"), None).unwrap();

    let deletion: Deletion<Station> = store.delete(fixture.to.id).unwrap();

    assert_eq!(deletion.record, fixture.to);
    assert_eq!(deletion.cascaded, vec![first, second]);
    assert_eq!(count_rows(&conn, "trains"), 0);
    assert!(EntityStore::<Station>::get(&store, fixture.to.id)
        .unwrap()
        .is_none());
}

#[test]
fn restore_brings_back_original_identities() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let fixture = seed(&store);
    let train: Train = store.create(&train_draft(&fixture, "T-600"), None).unwrap();

    let deletion: Deletion<TrainHall> = store.delete(fixture.hall.id).unwrap();
    store.restore(&deletion).unwrap();

    let hall: TrainHall = store.get(fixture.hall.id).unwrap().unwrap();
    assert_eq!(hall, fixture.hall);
    let restored: Train = store.get(train.id).unwrap().unwrap();
    assert_eq!(restored, train);

    // A fresh insert never reuses a freed identity.
    let next: TrainHall = store
        .create(&TrainHallDraft::new("Hall B", None), None)
        .unwrap();
    assert!(next.id > fixture.hall.id);
}

#[test]
fn restore_conflicts_when_key_was_taken_meanwhile() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let hall: TrainHall = store
        .create(&TrainHallDraft::new("Hall C", None), None)
        .unwrap();

    let deletion: Deletion<TrainHall> = store.delete(hall.id).unwrap();
    let _: TrainHall = store
        .create(&TrainHallDraft::new("Hall C", Some("rebuilt".to_string())), None)
        .unwrap();

    let err = store.restore(&deletion).unwrap_err();
    assert!(matches!(err, RepoError::Duplicate { .. }));
}

#[test]
fn find_by_key_and_list_are_ordered_by_identity() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let first: Station = store
        .create(&StationDraft::new("Ahvaz", "Ahvaz", "Khuzestan"), None)
        .unwrap();
    let second: Station = store
        .create(&StationDraft::new("Ahvaz", "Ahvaz", "Other"), None)
        .unwrap();

    let found: Station = store.find_by_key("Ahvaz").unwrap().unwrap();
    assert_eq!(found.id, first.id);

    let all: Vec<Station> = store.list().unwrap();
    assert_eq!(all, vec![first, second]);

    let missing: Option<Station> = store.find_by_key("Yazd").unwrap();
    assert!(missing.is_none());
}

#[test]
fn train_document_embeds_related_records() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let fixture = seed(&store);
    let train: Train = store.create(&train_draft(&fixture, "T-700"), None).unwrap();

    let document = store.document(&train).unwrap();
    assert_eq!(document.kind, EntityKind::Train);
    assert_eq!(document.entity_id, train.id);
    assert_eq!(document.body["departure_station"]["station_name"], "Tehran");
    assert_eq!(document.body["arrival_station"]["station_city"], "Mashhad");
    assert_eq!(document.body["railway_company"]["railway_name"], "Raja");
    assert_eq!(document.body["hall"]["hall_name"], "Hall A");
    assert_eq!(document.body["final_price"], 98_100);
    assert!(document.search_text.contains("Mashhad"));

    let dependents = EntityStore::<Station>::dependent_documents(&store, fixture.from.id).unwrap();
    assert_eq!(dependents.len(), 1);
    assert_eq!(dependents[0].entity_id, train.id);
}
