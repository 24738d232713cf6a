//! Integration tests for the PostgreSQL document store
//!
//! These need a database. Run with:
//! DATABASE_URL=postgres://... cargo test -- --ignored --test-threads=1

use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use congregation_api::aggregate::sermon::SermonDraft;
use congregation_api::aggregate::{Discussable, Document, Sermon};
use congregation_api::store::{DocumentStore, PgDocumentStore, Repository, StoreError};
use congregation_api::{Identity, OperationContext, Role};

mod common;

#[tokio::test]
#[ignore]
async fn test_insert_load_and_versioned_save() {
    let pool = common::setup_test_db().await;
    let store = PgDocumentStore::new(pool);
    let id = Uuid::new_v4();

    let inserted = store.insert("Sermon", id, json!({ "n": 1 })).await.unwrap();
    assert_eq!(inserted.version, 1);

    let saved = store.save("Sermon", id, 1, json!({ "n": 2 })).await.unwrap();
    assert_eq!(saved.version, 2);

    let stale = store.save("Sermon", id, 1, json!({ "n": 3 })).await;
    assert!(matches!(
        stale,
        Err(StoreError::ConcurrencyConflict { expected: 1, actual: 2, .. })
    ));

    let loaded = store.load("Sermon", id).await.unwrap().unwrap();
    assert_eq!(loaded.body["n"], 2);

    let duplicate = store.insert("Sermon", id, json!({})).await;
    assert!(matches!(duplicate, Err(StoreError::DuplicateDocument { .. })));

    assert!(store.delete("Sermon", id).await.unwrap());
    assert!(!store.delete("Sermon", id).await.unwrap());
    assert!(store.load("Sermon", id).await.unwrap().is_none());
}

#[tokio::test]
#[ignore]
async fn test_concurrent_likes_all_land() {
    let pool = common::setup_test_db().await;
    let store: Arc<dyn DocumentStore> = Arc::new(PgDocumentStore::new(pool));
    let repository: Repository<Sermon> = Repository::new(store);

    let admin = OperationContext::new().with_identity(Identity::new("admin-1", "Pastor Ade", Role::Admin));
    let draft: SermonDraft = serde_json::from_value(json!({
        "verse": "Psalm 23",
        "preacher": "Pastor Ade",
        "description": "The Lord is my shepherd",
    }))
    .unwrap();
    let sermon = Sermon::from_draft(draft, &admin, chrono::Utc::now()).unwrap();
    let id = repository.create(sermon).await.unwrap().id;

    let (first, second) = tokio::join!(
        repository.mutate(id, |sermon| sermon.toggle_like("u-1")),
        repository.mutate(id, |sermon| sermon.toggle_like("u-2")),
    );
    first.unwrap();
    second.unwrap();

    let sermon = repository.load(id).await.unwrap();
    assert_eq!(sermon.statistics.likes_count, 2);
    assert_eq!(sermon.version, 3);
}
