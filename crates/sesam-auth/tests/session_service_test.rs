//! Integration tests for the session service policy layer, run over
//! the in-memory key-value engine.

use chrono::{Duration, Utc};
use sesam_auth::session::SessionService;
use sesam_core::models::session::{INFO_USER_ID, Session, SessionKind};
use sesam_core::models::user::{User, UserId};
use sesam_core::store::SessionStore;
use sesam_store::{KvSessionStore, MemoryKv};

fn test_user(id: UserId) -> User {
    let now = Utc::now();
    User {
        id,
        name: format!("user-{id}"),
        email: format!("user-{id}@example.com"),
        address: String::new(),
        password_hash: "$argon2id$fake".into(),
        created_by: 0,
        created_at: now,
        updated_by: 0,
        updated_at: now,
        deleted_by: None,
        deleted_at: None,
    }
}

/// Helper: service plus a raw handle on the same underlying store.
fn setup() -> (SessionService<KvSessionStore<MemoryKv>>, KvSessionStore<MemoryKv>) {
    let store = KvSessionStore::new(MemoryKv::new());
    (SessionService::new(store.clone()), store)
}

#[tokio::test]
async fn create_session_strips_the_digest_and_fills_the_info_bag() {
    let (service, _) = setup();
    let alice = test_user(1);

    let session = service
        .create_session(&alice, "token-1".into())
        .await
        .unwrap();

    assert_eq!(session.kind, SessionKind::Login);
    assert_eq!(session.owner_id(), Some(1));
    assert_eq!(session.info.get(INFO_USER_ID), Some(&serde_json::json!(1)));
    assert_eq!(session.user.as_ref().unwrap().password_hash, "");
    assert!(session.expires_at > Utc::now() + Duration::hours(47));
}

#[tokio::test]
async fn create_session_replaces_previous_sessions() {
    let (service, _) = setup();
    let alice = test_user(1);

    service.create_session(&alice, "first".into()).await.unwrap();
    service.create_session(&alice, "second".into()).await.unwrap();

    assert!(service.get_session("first").await.unwrap().is_none());
    assert!(service.get_session("second").await.unwrap().is_some());
}

#[tokio::test]
async fn remove_unknown_token_is_a_noop() {
    let (service, _) = setup();
    service.remove_session("never-issued").await.unwrap();
}

#[tokio::test]
async fn remove_session_without_snapshot_is_a_noop() {
    let (service, store) = setup();

    // A session that carries an owner hint but no snapshot: the
    // service refuses to act on it.
    let mut info = serde_json::Map::new();
    info.insert(INFO_USER_ID.into(), serde_json::json!(9));
    let bare = Session {
        token: "bare".into(),
        kind: SessionKind::Login,
        expires_at: Utc::now() + Duration::hours(1),
        info,
        user: None,
    };
    store.put(&bare).await.unwrap();

    service.remove_session("bare").await.unwrap();
    assert!(service.get_session("bare").await.unwrap().is_some());
}

#[tokio::test(start_paused = true)]
async fn extend_session_pushes_the_deadline_out() {
    let (service, _) = setup();
    let alice = test_user(1);
    service.create_session(&alice, "tok".into()).await.unwrap();

    // Renew shortly before the original 48h deadline.
    tokio::time::advance(std::time::Duration::from_secs(47 * 3600)).await;
    let renewed = service.extend_session("tok").await.unwrap();
    assert!(renewed.is_some());

    // 94h after creation: long past the original deadline, still
    // inside the renewed one.
    tokio::time::advance(std::time::Duration::from_secs(47 * 3600)).await;
    assert!(service.get_session("tok").await.unwrap().is_some());

    tokio::time::advance(std::time::Duration::from_secs(2 * 3600)).await;
    assert!(service.get_session("tok").await.unwrap().is_none());
}

#[tokio::test]
async fn sync_snapshot_rewrites_without_touching_expiry() {
    let (service, _) = setup();
    let mut alice = test_user(1);

    let session = service
        .create_session(&alice, "tok".into())
        .await
        .unwrap();

    alice.name = "Alice Renamed".into();
    alice.password_hash = "$argon2id$rotated".into();
    let updated = service.sync_user_snapshot(&alice).await.unwrap();
    assert_eq!(updated, 1);

    let fetched = service.get_session("tok").await.unwrap().unwrap();
    let snapshot = fetched.user.as_ref().unwrap();
    assert_eq!(snapshot.name, "Alice Renamed");
    // The digest never reaches the session store.
    assert_eq!(snapshot.password_hash, "");
    assert_eq!(fetched.expires_at, session.expires_at);
    assert_eq!(fetched.info, session.info);
}

#[tokio::test]
async fn purge_only_hits_the_given_user() {
    let (service, _) = setup();
    let alice = test_user(1);
    let bob = test_user(2);

    service.create_session(&alice, "alice-tok".into()).await.unwrap();
    service.create_session(&bob, "bob-tok".into()).await.unwrap();

    let purged = service.purge_user_sessions(alice.id).await.unwrap();
    assert_eq!(purged, 1);

    assert!(service.get_session("alice-tok").await.unwrap().is_none());
    assert!(service.get_session("bob-tok").await.unwrap().is_some());
}
