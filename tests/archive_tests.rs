use std::io::{Cursor, Write};

use bytes::Bytes;
use taskboard::archive::{
    export_archive, export_archive_to_file, import_archive, import_archive_from_file,
    ArchiveError, STATE_ENTRY,
};
use taskboard::blob_store::{BlobStore, LocalBlobStore};
use taskboard::storage::models::{
    create_default_state, AppState, Card, CollapseState, Deadline, Divider, IconType, TaskType,
    Zone, ZoneItem,
};
use taskboard::Store;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

fn test_store() -> (tempfile::TempDir, Store) {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::new(dir.path().join("data"));
    (dir, store)
}

fn card(id: &str, blob: Option<&str>, order: f64) -> ZoneItem {
    ZoneItem::Card(Card {
        id: id.to_string(),
        task_type_id: "1".to_string(),
        text: format!("task {id}"),
        image_blob_id: blob.map(str::to_string),
        deadline: None,
        order,
    })
}

fn board() -> AppState {
    let mut state = create_default_state();
    state.title = "Quest log".to_string();
    state.task_types.push(TaskType {
        id: "5".to_string(),
        name: "Custom".to_string(),
        icon: "data:image/png;base64,AAAA".to_string(),
        icon_type: IconType::Image,
    });

    let mut main = Zone::new("main", "Main", "#d32f2f");
    main.items = vec![
        card("c1", Some("img-1"), 0.0),
        ZoneItem::Divider(Divider {
            id: "d1".to_string(),
            text: "side".to_string(),
            order: 1.0,
        }),
        card("c2", None, 2.0),
    ];
    if let ZoneItem::Card(c) = &mut main.items[2] {
        c.deadline = Some(Deadline::new("2025-01-31", 23));
    }

    let mut side = Zone::new("side", "Side", "#388e3c");
    side.order = 1.0;
    side.items = vec![card("c3", Some("img-2"), 0.0), card("c4", Some("img-1"), 1.0)];

    state.zones = vec![main, side];
    state.set_collapse_state("side", CollapseState::Max);
    state.selected_zone_id = Some("main".to_string());
    state.global_min_toggle = true;
    state
}

fn entry_names(archive: &[u8]) -> Vec<String> {
    let zip = ZipArchive::new(Cursor::new(archive.to_vec())).unwrap();
    let mut names: Vec<String> = zip.file_names().map(str::to_string).collect();
    names.sort();
    names
}

fn zip_of(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in entries {
        zip.start_file(*name, SimpleFileOptions::default()).unwrap();
        zip.write_all(data.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

#[tokio::test]
async fn test_round_trip_restores_state_and_images() {
    let (_src_dir, source) = test_store();
    let img_1 = Bytes::from_static(b"\x89PNG\r\n\x1a\nfirst");
    let img_2 = Bytes::from(vec![7u8; 4096]);
    source.put_blob("img-1", img_1.clone()).await.unwrap();
    source.put_blob("img-2", img_2.clone()).await.unwrap();
    let state = board();

    let archive = export_archive(&state, &source).await.unwrap();

    let (_dst_dir, target) = test_store();
    let imported = import_archive(archive, &target).await.unwrap();

    assert_eq!(imported, state);
    assert_eq!(target.get_blob("img-1").await.unwrap(), Some(img_1));
    assert_eq!(target.get_blob("img-2").await.unwrap(), Some(img_2));
}

#[tokio::test]
async fn test_import_does_not_save_state() {
    let (_src_dir, source) = test_store();
    let archive = export_archive(&board(), &source).await.unwrap();

    let (_dst_dir, target) = test_store();
    import_archive(archive, &target).await.unwrap();

    assert!(target.load_state().await.unwrap().is_none());
}

#[tokio::test]
async fn test_export_layout() {
    let (_dir, store) = test_store();
    store.put_blob("img-1", Bytes::from("one")).await.unwrap();
    store.put_blob("img-2", Bytes::from("two")).await.unwrap();
    store.put_blob("unused", Bytes::from("never exported")).await.unwrap();

    let archive = export_archive(&board(), &store).await.unwrap();

    // img-1 is shared by two cards but stored once
    assert_eq!(
        entry_names(&archive),
        vec!["images/img-1", "images/img-2", "state.json"]
    );
}

#[tokio::test]
async fn test_state_json_is_plain_json() {
    let (_dir, store) = test_store();
    let archive = export_archive(&board(), &store).await.unwrap();

    let mut zip = ZipArchive::new(Cursor::new(archive)).unwrap();
    let entry = zip.by_name(STATE_ENTRY).unwrap();
    let json: serde_json::Value = serde_json::from_reader(entry).unwrap();

    assert_eq!(json["title"], "Quest log");
    assert_eq!(json["currentMaxZoneId"], "side");
    assert_eq!(json["zones"][0]["items"][0]["imageBlobId"], "img-1");
    assert_eq!(json["zones"][0]["items"][2]["deadline"]["hour"], 23);
}

#[tokio::test]
async fn test_export_tolerates_missing_blob() {
    let (_dir, store) = test_store();
    // Only img-2 exists; img-1 is dangling
    store.put_blob("img-2", Bytes::from("two")).await.unwrap();
    let state = board();

    let archive = export_archive(&state, &store).await.unwrap();
    assert_eq!(entry_names(&archive), vec!["images/img-2", "state.json"]);

    let (_dst_dir, target) = test_store();
    let imported = import_archive(archive, &target).await.unwrap();
    let c1 = imported.find_card("c1").unwrap();
    assert_eq!(c1.image_blob_id.as_deref(), Some("img-1"));
    assert!(target.get_blob("img-1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_import_overwrites_and_keeps_other_blobs() {
    let (_dir, store) = test_store();
    store.put_blob("img-1", Bytes::from("old")).await.unwrap();
    store.put_blob("local-only", Bytes::from("mine")).await.unwrap();

    let archive = zip_of(&[
        (STATE_ENTRY, r#"{"title":"from archive"}"#),
        ("images/img-1", "new"),
    ]);
    let state = import_archive(archive, &store).await.unwrap();

    assert_eq!(state.title, "from archive");
    assert_eq!(store.get_blob("img-1").await.unwrap(), Some(Bytes::from("new")));
    assert_eq!(
        store.get_blob("local-only").await.unwrap(),
        Some(Bytes::from("mine"))
    );
}

#[tokio::test]
async fn test_import_missing_state_entry() {
    let (_dir, store) = test_store();
    let archive = zip_of(&[("images/img-1", "bytes")]);

    let err = import_archive(archive, &store).await.unwrap_err();
    assert!(matches!(err, ArchiveError::Malformed(_)));

    // No blob was written
    assert!(store.list_blob_ids().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_import_not_a_zip() {
    let (_dir, store) = test_store();
    let err = import_archive(b"plain text".to_vec(), &store)
        .await
        .unwrap_err();
    assert!(matches!(err, ArchiveError::Malformed(_)));
}

#[tokio::test]
async fn test_import_invalid_json() {
    let (_dir, store) = test_store();
    let archive = zip_of(&[(STATE_ENTRY, r#"{"title": "#), ("images/img-1", "x")]);

    let err = import_archive(archive, &store).await.unwrap_err();
    assert!(matches!(err, ArchiveError::Json(_)));
    assert!(store.list_blob_ids().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_import_accepts_sparse_state() {
    let (_dir, store) = test_store();
    let archive = zip_of(&[(STATE_ENTRY, "{}")]);

    let state = import_archive(archive, &store).await.unwrap();
    assert_eq!(state, AppState::default());
}

#[tokio::test]
async fn test_import_accepts_null_fields() {
    let (_dir, store) = test_store();
    let archive = zip_of(&[(
        STATE_ENTRY,
        r#"{
            "title": null,
            "taskTypes": null,
            "darkMode": null,
            "currentMaxZoneId": null,
            "zones": [{
                "id": "z", "name": null, "color": null, "collapseState": null,
                "order": null,
                "items": [
                    {"type": "card", "id": "c", "text": null, "imageBlobId": null,
                     "deadline": {"date": "2025-03-01", "hour": null}, "order": null},
                    {"type": "divider", "id": "d", "text": null}
                ]
            }, {"id": "empty", "items": null}]
        }"#,
    )]);

    let state = import_archive(archive, &store).await.unwrap();
    assert_eq!(state.title, "");
    assert!(state.task_types.is_empty());
    assert!(!state.dark_mode);
    assert_eq!(state.zones[0].collapse_state, CollapseState::Normal);
    assert!(state.zones[1].items.is_empty());

    let c = state.find_card("c").unwrap();
    assert_eq!(c.text, "");
    assert!(c.image_blob_id.is_none());
    assert_eq!(c.deadline, Some(Deadline::new("2025-03-01", 0)));
}

#[tokio::test]
async fn test_import_accepts_null_zones() {
    let (_dir, store) = test_store();
    let archive = zip_of(&[(STATE_ENTRY, r#"{"title": "t", "zones": null}"#)]);

    let state = import_archive(archive, &store).await.unwrap();
    assert_eq!(state.title, "t");
    assert!(state.zones.is_empty());
}

#[tokio::test]
async fn test_import_missing_hour_is_midnight() {
    let (_dir, store) = test_store();
    let archive = zip_of(&[(
        STATE_ENTRY,
        r#"{"zones": [{"id": "z", "items": [
            {"type": "card", "id": "c", "deadline": {"date": "2025-03-01"}}
        ]}]}"#,
    )]);

    let state = import_archive(archive, &store).await.unwrap();
    let deadline = state.find_card("c").unwrap().deadline.clone().unwrap();
    assert_eq!(deadline.hour, 0);
    assert_eq!(deadline.date, "2025-03-01");
}

#[tokio::test]
async fn test_import_keeps_fractional_orders() {
    let (_dir, store) = test_store();
    let archive = zip_of(&[(
        STATE_ENTRY,
        r#"{"zones": [
            {"id": "late", "order": 2.25, "items": []},
            {"id": "early", "order": 1.5, "items": [
                {"type": "card", "id": "b", "order": 1},
                {"type": "divider", "id": "between", "order": 0.5},
                {"type": "card", "id": "a", "order": 0}
            ]}
        ]}"#,
    )]);

    let state = import_archive(archive, &store).await.unwrap();
    let zones = state.sorted_zones();
    let zone_ids: Vec<&str> = zones.iter().map(|z| z.id.as_str()).collect();
    assert_eq!(zone_ids, vec!["early", "late"]);

    let early = state.zone("early").unwrap();
    assert_eq!(early.order, 1.5);
    let sorted = early.sorted_items();
    let item_ids: Vec<&str> = sorted.iter().map(|i| i.id()).collect();
    assert_eq!(item_ids, vec!["a", "between", "b"]);
}

#[tokio::test]
async fn test_import_numeric_ids_become_strings() {
    let (_dir, store) = test_store();
    let archive = zip_of(&[
        (
            STATE_ENTRY,
            r#"{"taskTypes": [{"id": 5, "name": "Custom", "icon": "x"}],
                "selectedZoneId": 1,
                "zones": [{"id": 1, "items": [
                    {"type": "card", "id": 7, "taskTypeId": 5, "imageBlobId": 42}
                ]}]}"#,
        ),
        ("images/42", "bytes"),
    ]);

    let state = import_archive(archive, &store).await.unwrap();
    assert_eq!(state.task_types[0].id, "5");
    assert_eq!(state.selected_zone_id.as_deref(), Some("1"));
    assert!(state.zone("1").is_some());

    let c = state.find_card("7").unwrap();
    assert_eq!(c.task_type_id, "5");
    assert_eq!(c.image_blob_id.as_deref(), Some("42"));
    assert_eq!(store.get_blob("42").await.unwrap(), Some(Bytes::from("bytes")));
}

#[tokio::test]
async fn test_tolerant_import_survives_save_and_reload() {
    let (_dir, store) = test_store();
    let archive = zip_of(&[(
        STATE_ENTRY,
        r#"{"zones": [{"id": 3, "order": 0.5, "items": [
            {"type": "card", "id": 9, "order": 1.75, "deadline": {"date": "2025-03-01", "hour": null}}
        ]}]}"#,
    )]);

    let state = import_archive(archive, &store).await.unwrap();
    store.save_state(&state).await.unwrap();
    assert_eq!(store.load_state().await.unwrap(), Some(state));
}

#[tokio::test]
async fn test_round_trip_through_local_blob_store() {
    let dir = tempfile::tempdir().unwrap();
    let source = LocalBlobStore::new(dir.path().join("a")).unwrap();
    let target = LocalBlobStore::new(dir.path().join("b")).unwrap();
    source.put("img-1", Bytes::from("one")).await.unwrap();
    source.put("img-2", Bytes::from("two")).await.unwrap();

    let path = dir.path().join("board.zip");
    export_archive_to_file(&board(), &source, &path).await.unwrap();
    let imported = import_archive_from_file(&path, &target).await.unwrap();

    assert_eq!(imported, board());
    assert_eq!(target.list_ids().await.unwrap(), vec!["img-1", "img-2"]);
    assert_eq!(target.get("img-2").await.unwrap(), Some(Bytes::from("two")));
}

#[tokio::test]
async fn test_export_through_trait_object() {
    let (_dir, store) = test_store();
    store.put_blob("img-1", Bytes::from("one")).await.unwrap();
    let blobs: &dyn BlobStore = &store;

    let archive = export_archive(&board(), blobs).await.unwrap();
    assert!(entry_names(&archive).contains(&"images/img-1".to_string()));
}
