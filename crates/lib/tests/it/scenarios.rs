//! End-to-end fixtures for cross-component contracts.

use serde_json::json;

use refract::{AttributeDiff, RecordStore, resolve_attr};

use crate::helpers::{TestSchema, notified_keys, resource};

#[test]
fn chapter_update_flows_through_the_same_child() {
    let store = TestSchema::new().into_store();
    let book = store.record_data_for("book", Some("1"));
    book.push_data(
        &resource("book", "1", json!({"name": "A", "chapter": {"name": "C1"}})),
        true,
        true,
    )
    .unwrap();

    // Reading materializes exactly one child record data.
    let chapter = resolve_attr(&book, "chapter")
        .unwrap()
        .as_nested()
        .cloned()
        .expect("chapter resolves to a nested record");
    assert_eq!(chapter.get_attr("name"), Some(json!("C1")));
    store.take_notifications();

    book.push_data(
        &resource("book", "1", json!({"name": "A", "chapter": {"name": "C2"}})),
        true,
        true,
    )
    .unwrap();

    // Same child object, no reallocation.
    let reread = resolve_attr(&book, "chapter")
        .unwrap()
        .as_nested()
        .cloned()
        .unwrap();
    assert!(reread.same_record(&chapter));
    assert_eq!(reread.get_attr("name"), Some(json!("C2")));

    // Exactly one notification, on the chapter's own identity; zero for the
    // book's `name`.
    let notes = store.take_notifications();
    assert_eq!(notified_keys(&notes, chapter.client_id()), vec!["name"]);
    assert!(notified_keys(&notes, book.client_id()).is_empty());
    assert_eq!(notes.len(), 1);
}

#[test]
fn projection_write_shows_up_in_base_changed_attributes() {
    let store = TestSchema::new()
        .with_base("book-excerpt", "book")
        .into_store();
    let excerpt = store.record_data_for("book-excerpt", Some("isbn:1"));
    let base = store.record_data_for("book", Some("isbn:1"));
    base.push_data(&resource("book", "isbn:1", json!({"title": "Silence"})), true, false)
        .unwrap();

    excerpt.set_attr("title", json!("X"), false).unwrap();

    let changes = base.changed_attributes();
    assert_eq!(
        changes.get("title"),
        Some(&AttributeDiff::Value {
            old: Some(json!("Silence")),
            new: Some(json!("X")),
        })
    );
}

#[test]
fn commit_keeps_overrides_written_during_the_flight() {
    let store = TestSchema::new().into_store();
    let record = store.record_data_for("book", Some("urn:1"));
    record
        .push_data(
            &resource("book", "urn:1", json!({"name": "A", "other": "O"})),
            true,
            false,
        )
        .unwrap();

    record.will_commit().unwrap();
    record.set_attr("other", json!("local"), false).unwrap();
    record
        .did_commit(Some(&resource("book", "urn:1", json!({"name": "Z"}))), false)
        .unwrap();

    assert_eq!(record.get_attr("name"), Some(json!("Z")));
    assert_eq!(record.get_attr("other"), Some(json!("local")));
    assert!(record.has_changed_attributes());

    let changes = record.changed_attributes();
    assert_eq!(changes.len(), 1);
    assert_eq!(
        changes.get("other"),
        Some(&AttributeDiff::Value {
            old: Some(json!("O")),
            new: Some(json!("local")),
        })
    );
}

#[test]
fn changed_attributes_interleaves_placeholders_for_array_children() {
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

    // Dirty only the middle element.
    let second = array.get(1).unwrap().as_nested().cloned().unwrap();
    second.set_attr("name", json!("C2+"), false).unwrap();

    let changes = book.changed_attributes();
    let Some(AttributeDiff::NestedArray(per_index)) = changes.get("chapters") else {
        panic!("chapters diff must keep the index-aligned array shape");
    };
    assert_eq!(per_index.len(), 3);
    assert!(per_index[0].is_none());
    assert!(per_index[2].is_none());

    let middle = per_index[1].as_ref().expect("changed element has a diff");
    assert_eq!(
        middle.get("name"),
        Some(&AttributeDiff::Value {
            old: Some(json!("C2")),
            new: Some(json!("C2+")),
        })
    );
}

#[test]
fn deep_nesting_recurses_through_every_level() {
    let store = TestSchema::new().into_store();
    let book = store.record_data_for("book", Some("urn:1"));
    book.push_data(
        &resource(
            "book",
            "urn:1",
            json!({"chapter": {"name": "C1", "footnote": {"text": "fine print"}}}),
        ),
        true,
        false,
    )
    .unwrap();

    let chapter = resolve_attr(&book, "chapter")
        .unwrap()
        .as_nested()
        .cloned()
        .unwrap();
    let footnote = resolve_attr(&chapter, "footnote")
        .unwrap()
        .as_nested()
        .cloned()
        .unwrap();
    assert_eq!(footnote.get_attr("text"), Some(json!("fine print")));

    footnote.set_attr("text", json!("fine print, revised"), false).unwrap();
    assert!(book.has_changed_attributes());

    // Rollback reaches the deepest level.
    book.rollback_attributes(false).unwrap();
    assert!(!book.has_changed_attributes());
    assert_eq!(footnote.get_attr("text"), Some(json!("fine print")));

    let changes = book.changed_attributes();
    assert!(changes.is_empty());
}
