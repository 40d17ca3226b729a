//! Tests for the session manager

use super::*;
use crate::adapter::MockStorageAdapter;
use crate::sqlite_adapter::SqliteAdapter;
use serde_json::json;
use std::time::Duration;

async fn create_manager() -> (SessionManager, Arc<SqliteAdapter>) {
    let storage = Arc::new(SqliteAdapter::connect_in_memory().await.unwrap());
    (SessionManager::new(storage.clone(), 3600), storage)
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

#[tokio::test]
async fn test_create_and_get_session() {
    let (mgr, _storage) = create_manager().await;

    let session = mgr.create(None).await.unwrap();
    assert!(Uuid::parse_str(&session.id).is_ok());
    assert!(session.data.is_empty());
    assert_eq!(session.created_at, session.updated_at);

    let loaded = mgr.get(&session.id).await.unwrap();
    assert_eq!(loaded.id, session.id);
    assert!(mgr.exists(&session.id).await.unwrap());
}

#[tokio::test]
async fn test_update_merges_shallowly() {
    let (mgr, _storage) = create_manager().await;

    let session = mgr
        .create(Some(object(json!({"step": "classify"}))))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(5)).await;
    let updated = mgr
        .update(&session.id, object(json!({"step": "purpose", "extra": 1})))
        .await
        .unwrap();

    assert_eq!(Value::Object(updated.data.clone()), json!({"step": "purpose", "extra": 1}));
    assert!(updated.updated_at > updated.created_at);
    assert_eq!(updated.created_at, session.created_at);

    // Persisted, not just returned
    let loaded = mgr.get(&session.id).await.unwrap();
    assert_eq!(loaded.data, updated.data);
}

#[tokio::test]
async fn test_update_keeps_untouched_keys() {
    let (mgr, _storage) = create_manager().await;
    let session = mgr
        .create(Some(object(json!({"concept": "glucose monitor", "nested": {"a": 1}}))))
        .await
        .unwrap();

    let updated = mgr
        .update(&session.id, object(json!({"nested": {"b": 2}})))
        .await
        .unwrap();

    // Nested objects are replaced, not deep-merged
    assert_eq!(
        Value::Object(updated.data),
        json!({"concept": "glucose monitor", "nested": {"b": 2}})
    );
}

#[tokio::test]
async fn test_session_not_found() {
    let (mgr, _storage) = create_manager().await;

    assert!(matches!(
        mgr.get("missing").await,
        Err(Error::SessionNotFound(id)) if id == "missing"
    ));
    assert!(matches!(
        mgr.update("missing", Map::new()).await,
        Err(Error::SessionNotFound(_))
    ));
    assert!(matches!(
        mgr.delete("missing").await,
        Err(Error::SessionNotFound(_))
    ));
}

#[tokio::test]
async fn test_delete_session() {
    let (mgr, _storage) = create_manager().await;
    let session = mgr.create(None).await.unwrap();

    mgr.delete(&session.id).await.unwrap();

    assert!(!mgr.exists(&session.id).await.unwrap());
    assert!(mgr.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_list_sessions_skips_corrupt_and_foreign_keys() {
    let (mgr, storage) = create_manager().await;
    let a = mgr.create(None).await.unwrap();
    let b = mgr.create(Some(object(json!({"k": "v"})))).await.unwrap();

    storage
        .set("session:broken", &json!({"id": "broken"}), None)
        .await
        .unwrap();
    storage
        .set("plan:p1", &json!({"id": "p1"}), None)
        .await
        .unwrap();

    let mut ids: Vec<String> = mgr.list().await.unwrap().into_iter().map(|s| s.id).collect();
    ids.sort();
    let mut expected = vec![a.id, b.id];
    expected.sort();
    assert_eq!(ids, expected);
}

#[tokio::test]
async fn test_sessions_are_stored_with_ttl() {
    let (mgr, storage) = create_manager().await;
    let session = mgr.create(None).await.unwrap();

    let row: (Option<String>,) = sqlx::query_as("SELECT expires_at FROM storage WHERE key = ?")
        .bind(session_key(&session.id))
        .fetch_one(&storage.raw_pool().await)
        .await
        .unwrap();
    let expires_at = timestamp::parse(&row.0.unwrap()).unwrap();
    let remaining = expires_at - session.created_at;
    assert!(remaining.num_seconds() > 3590 && remaining.num_seconds() <= 3600);
}

#[tokio::test]
async fn test_persisted_shape() {
    let (mgr, storage) = create_manager().await;
    let session = mgr
        .create(Some(object(json!({"step": "classify"}))))
        .await
        .unwrap();

    let doc = storage
        .get(&session_key(&session.id))
        .await
        .unwrap()
        .unwrap();
    let obj = doc.as_object().unwrap();
    assert_eq!(obj["id"], json!(session.id));
    assert_eq!(obj["data"], json!({"step": "classify"}));
    assert!(obj["created_at"].as_str().unwrap().ends_with('Z'));
    assert!(obj["updated_at"].is_string());
}

#[tokio::test]
async fn test_reads_naive_timestamps() {
    let (mgr, storage) = create_manager().await;
    storage
        .set(
            "session:legacy",
            &json!({
                "id": "legacy",
                "data": {"step": "classify"},
                "created_at": "2024-05-01T10:00:00.000001",
                "updated_at": "2024-05-01T10:05:00"
            }),
            None,
        )
        .await
        .unwrap();

    let session = mgr.get("legacy").await.unwrap();
    assert!(session.updated_at > session.created_at);
}

#[tokio::test]
async fn test_storage_failure_is_not_not_found() {
    let mut mock = MockStorageAdapter::new();
    mock.expect_get()
        .returning(|_| Err(Error::Storage("connection reset".to_string())));

    let mgr = SessionManager::with_default_ttl(Arc::new(mock));
    let err = mgr.get("abc").await.unwrap_err();
    assert!(err.is_storage_failure());
    assert!(!err.is_not_found());
}

#[tokio::test]
async fn test_list_survives_failing_entry() {
    let mut mock = MockStorageAdapter::new();
    mock.expect_list_keys()
        .returning(|_| Ok(vec!["session:good".to_string(), "session:bad".to_string()]));
    mock.expect_get().returning(|key| {
        if key == "session:bad" {
            Err(Error::Storage("Failed to deserialize session:bad".to_string()))
        } else {
            Ok(Some(json!({
                "id": "good",
                "data": {},
                "created_at": "2025-01-01T00:00:00Z",
                "updated_at": "2025-01-01T00:00:00Z"
            })))
        }
    });

    let mgr = SessionManager::with_default_ttl(Arc::new(mock));
    let sessions = mgr.list().await.unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].id, "good");
}

#[tokio::test]
async fn test_update_reapplies_ttl() {
    let mut mock = MockStorageAdapter::new();
    mock.expect_get().returning(|_| {
        Ok(Some(json!({
            "id": "s1",
            "data": {},
            "created_at": "2025-01-01T00:00:00Z",
            "updated_at": "2025-01-01T00:00:00Z"
        })))
    });
    mock.expect_set()
        .withf(|key, _, ttl| key == "session:s1" && *ttl == Some(120))
        .times(1)
        .returning(|_, _, _| Ok(()));

    let mgr = SessionManager::new(Arc::new(mock), 120);
    mgr.update("s1", object(json!({"a": 1}))).await.unwrap();
}
