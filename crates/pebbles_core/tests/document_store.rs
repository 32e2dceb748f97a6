use pebbles_core::db::open_db_in_memory;
use pebbles_core::{
    Collection, Document, DocumentStore, Filter, Patch, SqliteDocumentStore, StoreError,
};
use rusqlite::Connection;
use serde_json::{json, Value};

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn doc(value: Value) -> Document {
    value.as_object().cloned().unwrap()
}

fn patch(value: Value) -> Patch {
    value.as_object().cloned().unwrap()
}

#[test]
fn insert_then_find_by_field() {
    let conn = setup();
    let store = SqliteDocumentStore::try_new(&conn).unwrap();

    store
        .insert_one(Collection::Pebbles, &doc(json!({"id": "p1", "topic": "Tides"})))
        .unwrap();
    store
        .insert_one(Collection::Pebbles, &doc(json!({"id": "p2", "topic": "Orbits"})))
        .unwrap();

    let found = store
        .find(Collection::Pebbles, &Filter::new().eq("id", "p2"), 10)
        .unwrap();
    assert_eq!(found, vec![doc(json!({"id": "p2", "topic": "Orbits"}))]);
}

#[test]
fn collections_are_isolated() {
    let conn = setup();
    let store = SqliteDocumentStore::try_new(&conn).unwrap();

    store
        .insert_one(Collection::Folders, &doc(json!({"id": "shared"})))
        .unwrap();
    store
        .insert_one(Collection::Pebbles, &doc(json!({"id": "shared"})))
        .unwrap();

    assert_eq!(
        store
            .find(Collection::Folders, &Filter::new(), 10)
            .unwrap()
            .len(),
        1
    );
    let deleted = store
        .delete_one(Collection::Folders, &Filter::new().eq("id", "shared"))
        .unwrap();
    assert_eq!(deleted, 1);
    assert!(store
        .find_one(Collection::Pebbles, &Filter::new().eq("id", "shared"))
        .unwrap()
        .is_some());
}

#[test]
fn duplicate_id_for_same_owner_is_rejected() {
    let conn = setup();
    let store = SqliteDocumentStore::try_new(&conn).unwrap();

    store
        .insert_one(
            Collection::Pebbles,
            &doc(json!({"id": "p1", "owner_id": "alice"})),
        )
        .unwrap();
    let err = store
        .insert_one(
            Collection::Pebbles,
            &doc(json!({"id": "p1", "owner_id": "alice", "topic": "again"})),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::DuplicateId { collection: Collection::Pebbles, ref id } if id == "p1"
    ));
}

#[test]
fn same_id_under_different_owners_is_allowed() {
    let conn = setup();
    let store = SqliteDocumentStore::try_new(&conn).unwrap();

    for owner in ["alice", "bob"] {
        store
            .insert_one(
                Collection::Folders,
                &doc(json!({"id": "f1", "owner_id": owner})),
            )
            .unwrap();
    }
    assert_eq!(
        store
            .count(Collection::Folders, &Filter::new().eq("id", "f1"))
            .unwrap(),
        2
    );
    assert_eq!(
        store
            .count(
                Collection::Folders,
                &Filter::new().eq("id", "f1").eq("owner_id", "bob")
            )
            .unwrap(),
        1
    );
}

#[test]
fn null_filter_matches_missing_and_null_fields() {
    let conn = setup();
    let store = SqliteDocumentStore::try_new(&conn).unwrap();

    store
        .insert_one(Collection::Folders, &doc(json!({"id": "a", "parentId": null})))
        .unwrap();
    store
        .insert_one(Collection::Folders, &doc(json!({"id": "b"})))
        .unwrap();
    store
        .insert_one(Collection::Folders, &doc(json!({"id": "c", "parentId": "a"})))
        .unwrap();

    let roots = store
        .find(
            Collection::Folders,
            &Filter::new().eq("parentId", Value::Null),
            10,
        )
        .unwrap();
    let ids: Vec<&str> = roots
        .iter()
        .map(|document| document["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["a", "b"]);
}

#[test]
fn boolean_filter_does_not_match_integers() {
    let conn = setup();
    let store = SqliteDocumentStore::try_new(&conn).unwrap();

    store
        .insert_one(Collection::Pebbles, &doc(json!({"id": "p1", "isDeleted": false})))
        .unwrap();
    store
        .insert_one(Collection::Pebbles, &doc(json!({"id": "p2", "isDeleted": 0})))
        .unwrap();

    let live = store
        .find(Collection::Pebbles, &Filter::new().eq("isDeleted", false), 10)
        .unwrap();
    assert_eq!(live.len(), 1);
    assert_eq!(live[0]["id"], "p1");
}

#[test]
fn update_one_sets_only_patched_fields_and_reports_match() {
    let conn = setup();
    let store = SqliteDocumentStore::try_new(&conn).unwrap();

    store
        .insert_one(
            Collection::Pebbles,
            &doc(json!({"id": "p1", "topic": "Tides", "content": {"eli5": "water"}})),
        )
        .unwrap();

    let matched = store
        .update_one(
            Collection::Pebbles,
            &Filter::new().eq("id", "p1"),
            &patch(json!({"topic": "Moon tides", "folderId": null, "tags": ["sea"]})),
        )
        .unwrap();
    assert_eq!(matched, 1);

    let stored = store
        .find_one(Collection::Pebbles, &Filter::new().eq("id", "p1"))
        .unwrap()
        .unwrap();
    assert_eq!(
        stored,
        doc(json!({
            "id": "p1",
            "topic": "Moon tides",
            "content": {"eli5": "water"},
            "folderId": null,
            "tags": ["sea"]
        }))
    );
}

#[test]
fn update_with_unchanged_value_still_counts_as_matched() {
    let conn = setup();
    let store = SqliteDocumentStore::try_new(&conn).unwrap();

    store
        .insert_one(Collection::Folders, &doc(json!({"id": "f1", "name": "Same"})))
        .unwrap();
    let matched = store
        .update_one(
            Collection::Folders,
            &Filter::new().eq("id", "f1"),
            &patch(json!({"name": "Same"})),
        )
        .unwrap();
    assert_eq!(matched, 1);

    let matched_empty = store
        .update_one(Collection::Folders, &Filter::new().eq("id", "f1"), &Patch::new())
        .unwrap();
    assert_eq!(matched_empty, 1);

    let missed = store
        .update_one(
            Collection::Folders,
            &Filter::new().eq("id", "nope"),
            &patch(json!({"name": "x"})),
        )
        .unwrap();
    assert_eq!(missed, 0);
}

#[test]
fn update_many_touches_every_match_and_update_one_only_first() {
    let conn = setup();
    let store = SqliteDocumentStore::try_new(&conn).unwrap();

    for id in ["p1", "p2", "p3"] {
        store
            .insert_one(Collection::Pebbles, &doc(json!({"id": id, "folderId": "f1"})))
            .unwrap();
    }

    let first = store
        .update_one(
            Collection::Pebbles,
            &Filter::new().eq("folderId", "f1"),
            &patch(json!({"pinned": true})),
        )
        .unwrap();
    assert_eq!(first, 1);

    let moved = store
        .update_many(
            Collection::Pebbles,
            &Filter::new().eq("folderId", "f1"),
            &patch(json!({"folderId": "f0"})),
        )
        .unwrap();
    assert_eq!(moved, 3);

    let pinned = store
        .find(Collection::Pebbles, &Filter::new().eq("pinned", true), 10)
        .unwrap();
    assert_eq!(pinned.len(), 1);
    assert_eq!(pinned[0]["id"], "p1");
}

#[test]
fn find_respects_limit() {
    let conn = setup();
    let store = SqliteDocumentStore::try_new(&conn).unwrap();

    for index in 0..5 {
        store
            .insert_one(Collection::Pebbles, &doc(json!({"id": format!("p{index}")})))
            .unwrap();
    }
    let found = store.find(Collection::Pebbles, &Filter::new(), 3).unwrap();
    assert_eq!(found.len(), 3);
}

#[test]
fn arbitrary_keys_are_addressed_literally() {
    let conn = setup();
    let store = SqliteDocumentStore::try_new(&conn).unwrap();

    store
        .insert_one(
            Collection::Pebbles,
            &doc(json!({"id": "p1", "my-note": "y", "标题": "x"})),
        )
        .unwrap();

    let injected = store
        .find(
            Collection::Pebbles,
            &Filter::new().eq("id') OR 1=1 --", "x"),
            10,
        )
        .unwrap();
    assert!(injected.is_empty());

    let matched = store
        .update_one(
            Collection::Pebbles,
            &Filter::new().eq("my-note", "y"),
            &patch(json!({"标题": "z", "a.b": 1})),
        )
        .unwrap();
    assert_eq!(matched, 1);

    let stored = store
        .find_one(Collection::Pebbles, &Filter::new().eq("标题", "z"))
        .unwrap()
        .unwrap();
    assert_eq!(stored["a.b"], 1);
    assert!(!stored.contains_key("a"));
}

#[test]
fn unquotable_field_names_are_rejected_before_sql() {
    let conn = setup();
    let store = SqliteDocumentStore::try_new(&conn).unwrap();

    let err = store
        .find(Collection::Pebbles, &Filter::new().eq("a\"b", "x"), 10)
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidFieldName(_)));

    let err = store
        .update_many(Collection::Pebbles, &Filter::new(), &patch(json!({"": 1})))
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidFieldName(_)));
}

#[test]
fn count_matches_find_without_limit() {
    let conn = setup();
    let store = SqliteDocumentStore::try_new(&conn).unwrap();

    for (id, deleted) in [("p1", false), ("p2", true), ("p3", false)] {
        store
            .insert_one(
                Collection::Pebbles,
                &doc(json!({"id": id, "isDeleted": deleted})),
            )
            .unwrap();
    }
    assert_eq!(store.count(Collection::Pebbles, &Filter::new()).unwrap(), 3);
    assert_eq!(
        store
            .count(Collection::Pebbles, &Filter::new().eq("isDeleted", false))
            .unwrap(),
        2
    );
    assert_eq!(store.count(Collection::Folders, &Filter::new()).unwrap(), 0);
}

#[test]
fn atomically_rolls_back_on_error() {
    let conn = setup();
    let store = SqliteDocumentStore::try_new(&conn).unwrap();

    store
        .insert_one(Collection::Folders, &doc(json!({"id": "f1"})))
        .unwrap();

    let result: Result<(), StoreError> = store.atomically(|| {
        store.delete_one(Collection::Folders, &Filter::new().eq("id", "f1"))?;
        store.insert_one(Collection::Folders, &doc(json!({"id": "f2"})))?;
        Err(StoreError::InvalidData("abort".to_string()))
    });
    assert!(result.is_err());

    let remaining = store.find(Collection::Folders, &Filter::new(), 10).unwrap();
    assert_eq!(remaining, vec![doc(json!({"id": "f1"}))]);
}

#[test]
fn atomically_commits_on_success() {
    let conn = setup();
    let store = SqliteDocumentStore::try_new(&conn).unwrap();

    let inserted: Result<usize, StoreError> = store.atomically(|| {
        store.insert_one(Collection::Folders, &doc(json!({"id": "f1"})))?;
        store.insert_one(Collection::Folders, &doc(json!({"id": "f2"})))?;
        Ok(2)
    });
    assert_eq!(inserted.unwrap(), 2);
    assert_eq!(
        store
            .find(Collection::Folders, &Filter::new(), 10)
            .unwrap()
            .len(),
        2
    );
}
