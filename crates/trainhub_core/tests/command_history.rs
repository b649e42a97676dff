use trainhub_core::db::open_db_in_memory;
use trainhub_core::model::train::DEFAULT_STARS;
use trainhub_core::{
    CatalogService, CommandContext, CommandError, CommandHandler, CommandState, CreateCommand,
    DeleteCommand, EntityKind, Handlers, HistoryDirection, Percent, RailwayCompany,
    RailwayCompanyDraft, RailwayCompanyPatch, SqliteSearchMirror, SqliteStore, Station,
    StationDraft, StationPatch, Train, TrainDraft, TrainHall, TrainHallDraft, TrainType,
};
use trainhub_core::Command;

fn station(name: &str) -> StationDraft {
    StationDraft::new(name, format!("{name} City"), "Province")
}

#[test]
fn create_then_undo_leaves_entity_absent() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let mirror = SqliteSearchMirror::try_new(&conn).unwrap();
    let handlers = Handlers::default();
    let service = CatalogService::new(&handlers, store, &mirror);

    let created: Station = service.create(station("Rasht")).unwrap();
    service.undo::<Station>().unwrap();

    assert!(service.get::<Station>(created.id).unwrap().is_none());
    assert_eq!(handlers.stations.undo_depth(), 0);
    assert_eq!(handlers.stations.redo_depth(), 1);
}

#[test]
fn create_redo_restores_the_same_identity() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let mirror = SqliteSearchMirror::try_new(&conn).unwrap();
    let handlers = Handlers::default();
    let service = CatalogService::new(&handlers, store, &mirror);

    let created: Station = service.create(station("Sari")).unwrap();
    service.undo::<Station>().unwrap();
    let redone: Station = service.redo().unwrap();

    assert_eq!(redone, created);
    assert_eq!(service.get::<Station>(created.id).unwrap(), Some(created));
}

#[test]
fn update_undo_restores_only_captured_fields() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let mirror = SqliteSearchMirror::try_new(&conn).unwrap();
    let handlers = Handlers::default();
    let service = CatalogService::new(&handlers, store, &mirror);

    let created: Station = service.create(station("Zanjan")).unwrap();
    let updated: Station = service
        .update(
            created.id,
            StationPatch {
                station_city: Some("New Zanjan".to_string()),
                ..StationPatch::default()
            },
        )
        .unwrap();
    assert_eq!(updated.station_city, "New Zanjan");

    // A change outside the command history must survive the undo.
    conn.execute(
        "UPDATE stations SET station_province = 'Changed' WHERE id = ?1;",
        [created.id],
    )
    .unwrap();

    service.undo::<Station>().unwrap();
    let current: Station = service.get(created.id).unwrap().unwrap();
    assert_eq!(current.station_city, created.station_city);
    assert_eq!(current.station_name, created.station_name);
    assert_eq!(current.station_province, "Changed");
}

#[test]
fn update_of_missing_entity_fails_and_leaves_history_empty() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let mirror = SqliteSearchMirror::try_new(&conn).unwrap();
    let handlers = Handlers::default();
    let service = CatalogService::new(&handlers, store, &mirror);

    let err = service
        .update::<Station>(77, StationPatch::default())
        .unwrap_err();
    assert!(matches!(
        err,
        CommandError::NotFound {
            kind: EntityKind::Station,
            id: 77
        }
    ));
    assert_eq!(handlers.stations.undo_depth(), 0);
}

#[test]
fn delete_then_undo_recreates_equal_entity_with_same_identity() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let mirror = SqliteSearchMirror::try_new(&conn).unwrap();
    let handlers = Handlers::default();
    let service = CatalogService::new(&handlers, store, &mirror);

    let created: RailwayCompany = service
        .create(RailwayCompanyDraft::new("Raja", "State", "24h").with_logo("raja.png"))
        .unwrap();
    let deleted: RailwayCompany = service.delete(created.id).unwrap();
    assert_eq!(deleted, created);
    assert!(service
        .get::<RailwayCompany>(created.id)
        .unwrap()
        .is_none());

    service.undo::<RailwayCompany>().unwrap();
    assert_eq!(
        service.get::<RailwayCompany>(created.id).unwrap(),
        Some(created)
    );
}

#[test]
fn new_execute_clears_redo_history() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let mirror = SqliteSearchMirror::try_new(&conn).unwrap();
    let handlers = Handlers::default();
    let service = CatalogService::new(&handlers, store, &mirror);

    let _: Station = service.create(station("Arak")).unwrap();
    service.undo::<Station>().unwrap();
    let _: Station = service.create(station("Ilam")).unwrap();

    let err = service.redo::<Station>().unwrap_err();
    assert!(matches!(
        err,
        CommandError::EmptyHistory {
            kind: EntityKind::Station,
            direction: HistoryDirection::Redo
        }
    ));
}

#[test]
fn undo_on_empty_history_fails_without_touching_the_store() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let mirror = SqliteSearchMirror::try_new(&conn).unwrap();
    let handlers = Handlers::default();
    let service = CatalogService::new(&handlers, store, &mirror);
    let _: TrainHall = service.create(TrainHallDraft::new("Hall 1", None)).unwrap();

    let err = service.undo::<Station>().unwrap_err();
    assert!(matches!(
        err,
        CommandError::EmptyHistory {
            kind: EntityKind::Station,
            direction: HistoryDirection::Undo
        }
    ));
    assert_eq!(service.list::<TrainHall>().unwrap().len(), 1);
    assert_eq!(handlers.train_halls.undo_depth(), 1);
}

#[test]
fn duplicate_station_fails_and_is_not_recorded() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let mirror = SqliteSearchMirror::try_new(&conn).unwrap();
    let handlers = Handlers::default();
    let service = CatalogService::new(&handlers, store, &mirror);

    let _: Station = service.create(station("Kerman")).unwrap();
    let err = service.create::<Station>(station("Kerman")).unwrap_err();

    match err {
        CommandError::DuplicateEntity { kind, key } => {
            assert_eq!(kind, EntityKind::Station);
            assert_eq!(key, "Kerman/Kerman City/Province");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(handlers.stations.undo_depth(), 1);
}

#[test]
fn double_undo_of_one_command_is_an_invalid_state() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let mirror = SqliteSearchMirror::try_new(&conn).unwrap();
    let ctx = CommandContext::<Station>::new(&store, &mirror);

    let mut create = CreateCommand::<Station>::new(station("Yasuj"));
    let created = create.execute(&ctx).unwrap();
    let mut delete = DeleteCommand::<Station>::new(created.id);
    delete.execute(&ctx).unwrap();
    delete.undo(&ctx).unwrap();

    let err = delete.undo(&ctx).unwrap_err();
    assert!(matches!(
        err,
        CommandError::InvalidState {
            state: CommandState::Undone,
            action: "undo",
            ..
        }
    ));
}

#[test]
fn failed_undo_keeps_the_command_on_the_undo_stack() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let mirror = SqliteSearchMirror::try_new(&conn).unwrap();
    let handlers = Handlers::default();
    let service = CatalogService::new(&handlers, store, &mirror);

    let hall: TrainHall = service.create(TrainHallDraft::new("Hall 2", None)).unwrap();
    let _: TrainHall = service.delete(hall.id).unwrap();
    // Another row takes the key while the delete is still undoable.
    conn.execute(
        "INSERT INTO train_halls (hall_name) VALUES ('Hall 2');",
        [],
    )
    .unwrap();

    let err = service.undo::<TrainHall>().unwrap_err();
    assert!(matches!(err, CommandError::DuplicateEntity { .. }));
    assert_eq!(handlers.train_halls.undo_depth(), 2);
    assert_eq!(handlers.train_halls.redo_depth(), 0);
}

#[test]
fn history_is_bounded_and_drops_oldest_entries() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let mirror = SqliteSearchMirror::try_new(&conn).unwrap();
    let ctx = CommandContext::<Station>::new(&store, &mirror);
    let handler = CommandHandler::<Station>::with_history_limit(2);

    let first = handler
        .execute(&ctx, CreateCommand::<Station>::new(station("One")))
        .unwrap();
    for name in ["Two", "Three"] {
        handler
            .execute(&ctx, CreateCommand::<Station>::new(station(name)))
            .unwrap();
    }
    assert_eq!(handler.undo_depth(), 2);

    handler.undo(&ctx).unwrap();
    handler.undo(&ctx).unwrap();
    assert!(matches!(
        handler.undo(&ctx),
        Err(CommandError::EmptyHistory { .. })
    ));

    let remaining: Vec<Station> = trainhub_core::EntityStore::list(&store).unwrap();
    assert_eq!(remaining, vec![first]);
}

#[test]
fn zero_history_limit_is_clamped_to_one() {
    let handler = CommandHandler::<Station>::with_history_limit(0);
    assert_eq!(handler.history_limit(), 1);
}

#[test]
fn histories_are_isolated_per_kind() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let mirror = SqliteSearchMirror::try_new(&conn).unwrap();
    let handlers = Handlers::default();
    let service = CatalogService::new(&handlers, store, &mirror);

    let from: Station = service.create(station("Bam")).unwrap();
    let to: Station = service.create(station("Zahedan")).unwrap();
    let company: RailwayCompany = service
        .create(RailwayCompanyDraft::new("Joopar", "Private", "None"))
        .unwrap();
    let hall: TrainHall = service.create(TrainHallDraft::new("Hall 3", None)).unwrap();
    let train: Train = service
        .create(TrainDraft {
            train_number: "BZ-1".to_string(),
            departure_at: 0,
            arrival_at: 3_600_000,
            departure_station_id: from.id,
            arrival_station_id: to.id,
            railway_company_id: company.id,
            hall_id: hall.id,
            train_type: TrainType::Bus,
            capacity: 40,
            stars: DEFAULT_STARS,
            base_price: 5,
            tax: Percent::ZERO,
            discount: Percent::from_whole(50).unwrap(),
        })
        .unwrap();
    // 2.5 rounds half to even.
    assert_eq!(train.final_price, 2);

    service.undo::<Station>().unwrap();
    assert!(service.get::<Train>(train.id).unwrap().is_none());
    assert_eq!(handlers.trains.undo_depth(), 1);
    assert_eq!(handlers.stations.undo_depth(), 1);

    let redone: Station = service.redo().unwrap();
    assert_eq!(redone, to);
    assert_eq!(service.get::<Train>(train.id).unwrap(), Some(train));
}

#[test]
fn clear_drops_both_histories_but_keeps_records() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let mirror = SqliteSearchMirror::try_new(&conn).unwrap();
    let handlers = Handlers::default();
    let service = CatalogService::new(&handlers, store, &mirror);

    let kept: Station = service.create(station("Kashan")).unwrap();
    let _: Station = service.create(station("Natanz")).unwrap();
    service.undo::<Station>().unwrap();
    assert_eq!(handlers.stations.undo_depth(), 1);
    assert_eq!(handlers.stations.redo_depth(), 1);

    handlers.stations.clear();
    assert_eq!(handlers.stations.undo_depth(), 0);
    assert_eq!(handlers.stations.redo_depth(), 0);
    assert!(matches!(
        service.redo::<Station>(),
        Err(CommandError::EmptyHistory {
            direction: HistoryDirection::Redo,
            ..
        })
    ));
    assert_eq!(service.get::<Station>(kept.id).unwrap(), Some(kept));
}

#[test]
fn json_null_patch_clears_logo_and_undo_brings_it_back() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let mirror = SqliteSearchMirror::try_new(&conn).unwrap();
    let handlers = Handlers::default();
    let service = CatalogService::new(&handlers, store, &mirror);

    let company: RailwayCompany = service
        .create(RailwayCompanyDraft::new("Raja", "State", "24h").with_logo("x.png"))
        .unwrap();
    let patch: RailwayCompanyPatch = serde_json::from_str(r#"{"railway_logo": null}"#).unwrap();

    let updated: RailwayCompany = service.update(company.id, patch).unwrap();
    assert_eq!(updated.railway_logo, None);

    service.undo::<RailwayCompany>().unwrap();
    assert_eq!(
        service.get::<RailwayCompany>(company.id).unwrap(),
        Some(company)
    );
}
