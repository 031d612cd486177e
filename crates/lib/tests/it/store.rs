//! In-memory store bridge and notification batching.

use serde_json::json;

use refract::{RecordStore, resolve_attr};

use crate::helpers::{TestSchema, notified_keys, resource};

#[test]
fn one_push_flushes_one_coalesced_batch() {
    let store = TestSchema::new().into_store();
    let book = store.record_data_for("book", Some("urn:1"));
    book.push_data(
        &resource("book", "urn:1", json!({"name": "A", "chapter": {"name": "C1"}})),
        true,
        true,
    )
    .unwrap();

    let notes = store.take_notifications();
    let keys = notified_keys(&notes, book.client_id());
    // One notification per changed key, no duplicates, single flush.
    assert_eq!(keys, vec!["chapter".to_string(), "name".to_string()]);
}

#[test]
fn cascading_child_updates_notify_child_identities() {
    let store = TestSchema::new().into_store();
    let book = store.record_data_for("book", Some("urn:1"));
    book.push_data(
        &resource("book", "urn:1", json!({"chapter": {"name": "C1"}})),
        true,
        true,
    )
    .unwrap();
    let chapter = resolve_attr(&book, "chapter")
        .unwrap()
        .as_nested()
        .cloned()
        .unwrap();
    store.take_notifications();

    book.push_data(
        &resource("book", "urn:1", json!({"chapter": {"name": "C2"}})),
        true,
        true,
    )
    .unwrap();

    let notes = store.take_notifications();
    // The child absorbed the update; the parent key stays quiet.
    assert!(notified_keys(&notes, book.client_id()).is_empty());
    assert_eq!(notified_keys(&notes, chapter.client_id()), vec!["name"]);
}

#[test]
fn suppressed_writes_do_not_notify() {
    let store = TestSchema::new().into_store();
    let book = store.record_data_for("book", Some("urn:1"));
    store.take_notifications();

    book.set_attr("name", json!("quiet"), true).unwrap();
    assert!(store.take_notifications().is_empty());
    assert_eq!(book.get_attr("name"), Some(json!("quiet")));
}

#[test]
fn unload_disconnects_from_every_map() {
    let store = TestSchema::new().into_store();
    let book = store.record_data_for("book", Some("urn:1"));
    assert_eq!(store.record_count(), 1);

    assert!(book.unload_record());
    assert_eq!(store.record_count(), 0);
    assert!(store.peek_record_data(Some("book"), "urn:1").is_none());
    assert!(store.peek_record_data(None, "urn:1").is_none());

    // A later access mints a fresh record data.
    let again = store.record_data_for("book", Some("urn:1"));
    assert!(!again.same_record(&book));
}

#[test]
fn destroying_a_parent_destroys_its_children() {
    let store = TestSchema::new().into_store();
    let book = store.record_data_for("book", Some("urn:1"));
    book.push_data(
        &resource("book", "urn:1", json!({"chapter": {"name": "C1"}})),
        true,
        false,
    )
    .unwrap();
    let chapter = resolve_attr(&book, "chapter")
        .unwrap()
        .as_nested()
        .cloned()
        .unwrap();

    assert!(book.unload_record());
    assert!(chapter.is_destroyed());
    let err = chapter
        .set_attr("name", json!("x"), false)
        .expect_err("children die with their parent");
    assert!(err.is_destroyed_error());
}

#[test]
fn records_without_ids_live_outside_the_identity_map() {
    let store = TestSchema::new().into_store();
    let draft = store.record_data_for("book", None);
    let other = store.record_data_for("book", None);
    // No id means no identity-map coalescing: each access is a new record.
    assert!(!draft.same_record(&other));
    assert_eq!(store.record_count(), 2);
}
