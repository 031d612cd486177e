//! ManagedArray / TrackedArray replace semantics.

use serde_json::json;

use refract::{ArrayInsert, ArrayMode, RecordStore, Reference, resolve_attr};

use crate::helpers::{TestSchema, resource};

#[test]
fn mixed_array_resolves_element_wise() {
    let store = TestSchema::new().into_store();
    let author = store.record_data_for("person", Some("urn:a"));
    let book = store.record_data_for("book", Some("urn:1"));
    book.push_data(
        &resource(
            "book",
            "urn:1",
            json!({"contents": [
                {"name": "C1"},
                "interlude",
                {"type": "person", "id": "urn:a"}
            ]}),
        ),
        true,
        false,
    )
    .unwrap();

    let array = resolve_attr(&book, "contents")
        .unwrap()
        .as_managed()
        .cloned()
        .expect("mixed array");
    assert_eq!(array.len(), 3);
    assert_eq!(array.mode(), ArrayMode::Nested);

    let first = array.get(0).unwrap();
    let chapter = first.as_nested().expect("index 0 is nested");
    assert_eq!(chapter.get_attr("name"), Some(json!("C1")));
    assert!(
        book.child_record_data_at("contents", 0)
            .is_some_and(|hit| hit.same_record(chapter))
    );

    assert_eq!(array.get(1).unwrap().as_raw(), Some(&json!("interlude")));
    assert!(
        array
            .get(2)
            .unwrap()
            .as_record()
            .is_some_and(|hit| hit.same_record(&author))
    );
    // Non-record elements leave holes in the child slot.
    assert!(book.child_record_data_at("contents", 1).is_none());
}

#[test]
fn array_mode_is_sticky_once_nested() {
    let store = TestSchema::new().into_store();
    let peer = store.record_data_for("person", Some("urn:a"));
    let book = store.record_data_for("book", Some("urn:1"));
    book.push_data(&resource("book", "urn:1", json!({"contents": []})), true, false)
        .unwrap();

    let array = resolve_attr(&book, "contents")
        .unwrap()
        .as_managed()
        .cloned()
        .unwrap();
    assert_eq!(array.mode(), ArrayMode::Undetermined);

    // First non-empty write is a nested POJO: nested mode, permanently.
    array
        .replace(0, 0, vec![ArrayInsert::Raw(json!({"name": "C1"}))])
        .unwrap();
    assert_eq!(array.mode(), ArrayMode::Nested);

    // A later reference insert still goes through nested-element rules.
    array.push(ArrayInsert::Record(peer.clone())).unwrap();
    assert_eq!(array.mode(), ArrayMode::Nested);
    assert!(
        array
            .get(1)
            .unwrap()
            .as_record()
            .is_some_and(|hit| hit.same_record(&peer))
    );
}

#[test]
fn first_peer_record_fixes_all_reference_mode() {
    let store = TestSchema::new().into_store();
    let peer = store.record_data_for("person", Some("urn:a"));
    let book = store.record_data_for("book", Some("urn:1"));
    book.push_data(&resource("book", "urn:1", json!({"authors": []})), true, false)
        .unwrap();

    let array = resolve_attr(&book, "authors")
        .unwrap()
        .as_managed()
        .cloned()
        .unwrap();
    array.push(ArrayInsert::Record(peer)).unwrap();
    assert_eq!(array.mode(), ArrayMode::AllReference);

    // The owning attribute now carries the identity-array raw form and the
    // record is dirty.
    assert_eq!(
        book.get_attr("authors"),
        Some(json!([{"type": "person", "id": "urn:a"}]))
    );
    assert!(book.has_local_attr("authors"));
}

#[test]
fn nested_replace_keeps_child_slots_aligned() {
    let store = TestSchema::new().into_store();
    let book = store.record_data_for("book", Some("urn:1"));
    book.push_data(
        &resource(
            "book",
            "urn:1",
            json!({"chapters": [{"name": "C1"}, {"name": "C2"}, {"name": "C3"}]}),
        ),
        true,
        false,
    )
    .unwrap();
    let array = resolve_attr(&book, "chapters")
        .unwrap()
        .as_managed()
        .cloned()
        .unwrap();
    let first = book.child_record_data_at("chapters", 0).unwrap();
    let third = book.child_record_data_at("chapters", 2).unwrap();

    array.remove(0).unwrap();
    assert!(first.is_destroyed());
    assert_eq!(array.len(), 2);
    // Survivors shift down with their records intact.
    assert!(
        book.child_record_data_at("chapters", 1)
            .is_some_and(|hit| hit.same_record(&third))
    );
    assert_eq!(
        array.get(1).unwrap().as_nested().unwrap().get_attr("name"),
        Some(json!("C3"))
    );
}

#[test]
fn inserting_raw_nested_values_creates_children() {
    let store = TestSchema::new().into_store();
    let book = store.record_data_for("book", Some("urn:1"));
    book.push_data(&resource("book", "urn:1", json!({"chapters": []})), true, false)
        .unwrap();
    let array = resolve_attr(&book, "chapters")
        .unwrap()
        .as_managed()
        .cloned()
        .unwrap();

    array
        .replace(
            0,
            0,
            vec![
                ArrayInsert::Raw(json!({"name": "C1"})),
                ArrayInsert::Raw(json!("interlude")),
            ],
        )
        .unwrap();

    let chapter = book
        .child_record_data_at("chapters", 0)
        .expect("nested element materialized");
    assert_eq!(chapter.get_attr("name"), Some(json!("C1")));
    assert!(book.child_record_data_at("chapters", 1).is_none());
    assert!(book.has_local_attr("chapters"));
}

#[test]
fn moving_an_embedded_record_reparents_it() {
    let store = TestSchema::new().into_store();
    let source = store.record_data_for("book", Some("urn:1"));
    let target = store.record_data_for("book", Some("urn:2"));
    source
        .push_data(
            &resource("book", "urn:1", json!({"chapters": [{"name": "C1"}]})),
            true,
            false,
        )
        .unwrap();
    target
        .push_data(&resource("book", "urn:2", json!({"chapters": []})), true, false)
        .unwrap();

    let source_array = resolve_attr(&source, "chapters")
        .unwrap()
        .as_managed()
        .cloned()
        .unwrap();
    let target_array = resolve_attr(&target, "chapters")
        .unwrap()
        .as_managed()
        .cloned()
        .unwrap();
    let chapter = source_array.get(0).unwrap().as_nested().cloned().unwrap();

    target_array
        .replace(0, 0, vec![ArrayInsert::Record(chapter.clone())])
        .unwrap();

    // Moved, not re-resolved: same record, new owner.
    assert!(!chapter.is_destroyed());
    assert!(
        chapter
            .parent_record_data()
            .is_some_and(|parent| parent.same_record(&target))
    );
    assert!(
        target
            .child_record_data_at("chapters", 0)
            .is_some_and(|hit| hit.same_record(&chapter))
    );
}

#[test]
fn tracked_array_replace_rewrites_the_owning_attribute() {
    let store = TestSchema::new().into_store();
    let book = store.record_data_for("book", Some("urn:1"));
    book.push_data(
        &resource("book", "urn:1", json!({"authors": [{"type": "person", "id": "urn:a"}]})),
        true,
        false,
    )
    .unwrap();
    let authors = resolve_attr(&book, "authors")
        .unwrap()
        .as_references()
        .cloned()
        .expect("reference array");

    authors
        .replace(1, 0, vec![Reference::new("person", "urn:b")])
        .unwrap();

    assert_eq!(
        book.get_attr("authors"),
        Some(json!([
            {"type": "person", "id": "urn:a"},
            {"type": "person", "id": "urn:b"}
        ]))
    );
    assert!(book.has_local_attr("authors"));
    // The raw change marks the resolution stale for the next reader.
    assert!(book.is_resolved_stale("authors"));
}
