use chrono::Duration;
use dreamteam_portal::sessions::{InMemorySessionStore, SessionStore};
use uuid::Uuid;

#[tokio::test]
async fn create_then_get_roundtrip() {
    let store = InMemorySessionStore::new();
    let employee_id = Uuid::new_v4();

    let session = store.create(employee_id, Duration::seconds(3600)).await;
    assert_eq!(session.employee_id, employee_id);
    assert!(session.expires_at > session.created_at);

    let resolved = store.get(session.id).await.expect("session must resolve");
    assert_eq!(resolved.employee_id, employee_id);
}

#[tokio::test]
async fn get_unknown_token_is_none() {
    let store = InMemorySessionStore::new();
    assert!(store.get(Uuid::new_v4()).await.is_none());
}

#[tokio::test]
async fn destroy_removes_the_session() {
    let store = InMemorySessionStore::new();
    let session = store.create(Uuid::new_v4(), Duration::seconds(3600)).await;

    assert!(store.destroy(session.id).await);
    assert!(store.get(session.id).await.is_none());
    // Double destroy reports that nothing was there.
    assert!(!store.destroy(session.id).await);
}

#[tokio::test]
async fn expired_session_is_never_returned() {
    let store = InMemorySessionStore::new();
    let session = store.create(Uuid::new_v4(), Duration::seconds(-1)).await;

    assert!(store.get(session.id).await.is_none());
    // The expired entry was evicted on read.
    assert!(!store.destroy(session.id).await);
}

#[tokio::test]
async fn one_employee_may_hold_concurrent_sessions() {
    let store = InMemorySessionStore::new();
    let employee_id = Uuid::new_v4();

    let first = store.create(employee_id, Duration::seconds(3600)).await;
    let second = store.create(employee_id, Duration::seconds(3600)).await;

    assert_ne!(first.id, second.id);
    assert!(store.get(first.id).await.is_some());
    assert!(store.get(second.id).await.is_some());

    // Destroying one leaves the other intact.
    store.destroy(first.id).await;
    assert!(store.get(second.id).await.is_some());
}

#[tokio::test]
async fn purge_drops_only_expired_sessions() {
    let store = InMemorySessionStore::new();
    let live = store.create(Uuid::new_v4(), Duration::seconds(3600)).await;
    store.create(Uuid::new_v4(), Duration::seconds(-1)).await;
    store.create(Uuid::new_v4(), Duration::seconds(-1)).await;

    assert_eq!(store.purge_expired().await, 2);
    assert!(store.get(live.id).await.is_some());
    assert_eq!(store.purge_expired().await, 0);
}
