use super::{BotSlot, Store};
use selina_core::models::{BotRecord, BotStatus, BroadcastEntry, SettingsPatch, User};
use serde_json::json;

async fn test_store() -> (tempfile::TempDir, Store) {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::new(&dir.path().join("data")).await.unwrap();
    (dir, store)
}

#[tokio::test]
async fn test_user_roundtrip_and_lookup_by_email() {
    let (_dir, store) = test_store().await;
    let user = User::new("a@b.co", "$argon2id$fake".into());
    store.insert_user(&user).await.unwrap();

    let by_email = store.find_user_by_email("a@b.co").await.unwrap().unwrap();
    assert_eq!(by_email, user);
    assert!(store.find_user_by_email("x@b.co").await.unwrap().is_none());
    assert_eq!(store.list_users().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_bot_counters_floor_at_zero() {
    let (_dir, store) = test_store().await;
    let user = User::new("a@b.co", "h".into());
    store.insert_user(&user).await.unwrap();

    store.record_bot_created(&user.id).await.unwrap();
    let u = store.get_user(&user.id).await.unwrap().unwrap();
    assert_eq!(u.total_bots, 1);
    assert!(u.free_bot_used);

    store.record_bot_deleted(&user.id).await.unwrap();
    store.record_bot_deleted(&user.id).await.unwrap();
    let u = store.get_user(&user.id).await.unwrap().unwrap();
    assert_eq!(u.total_bots, 0);
    assert!(u.free_bot_used);

    assert!(!store.record_bot_created("missing").await.unwrap());
}

#[tokio::test]
async fn test_bot_status_transitions() {
    let (_dir, store) = test_store().await;
    let bot = BotRecord::new("u1", "15551234567", true, 30);
    store.insert_bot(&bot).await.unwrap();

    store
        .set_bot_status(&bot.id, BotStatus::Failed, json!({ "error": "boom" }))
        .await
        .unwrap();
    let got = store.get_bot(&bot.id).await.unwrap().unwrap();
    assert_eq!(got.status, BotStatus::Failed);
    assert_eq!(got.error.as_deref(), Some("boom"));

    assert_eq!(
        store.bots_with_status(BotStatus::Failed).await.unwrap().len(),
        1
    );
    assert!(store
        .bots_with_status(BotStatus::Active)
        .await
        .unwrap()
        .is_empty());
    assert_eq!(store.bots_for_user("u1").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_update_missing_bot_leaves_file_byte_identical() {
    let (dir, store) = test_store().await;
    let bot = BotRecord::new("u1", "15551234567", true, 30);
    store.insert_bot(&bot).await.unwrap();
    let path = dir.path().join("data").join("bots.json");
    let before = std::fs::read(&path).unwrap();

    let updated = store
        .update_bot("x", json!({ "status": "active" }))
        .await
        .unwrap();
    assert!(!updated);
    assert_eq!(std::fs::read(&path).unwrap(), before);
}

#[tokio::test]
async fn test_delete_bot() {
    let (_dir, store) = test_store().await;
    let bot = BotRecord::new("u1", "15551234567", true, 30);
    store.insert_bot(&bot).await.unwrap();

    assert_eq!(store.delete_bot(&bot.id).await.unwrap(), Some(bot.clone()));
    assert!(store.delete_bot(&bot.id).await.unwrap().is_none());
    assert!(store.list_bots().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_settings_created_lazily_and_stable() {
    let (_dir, store) = test_store().await;
    let first = store.settings_for("b1").await.unwrap();
    let second = store.settings_for("b1").await.unwrap();
    assert_eq!(first, second);
    assert!(first.react_to_commands);
    assert!(!first.auto_react);
}

#[tokio::test]
async fn test_concurrent_first_settings_access_creates_one_record() {
    let (_dir, store) = test_store().await;
    let mut handles = Vec::new();
    for _ in 0..8 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store.settings_for("bot-x").await.unwrap()
        }));
    }
    for h in handles {
        h.await.unwrap();
    }

    let records = store
        .inner
        .settings
        .find(&json!({ "botId": "bot-x" }))
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn test_update_settings_creates_when_absent() {
    let (_dir, store) = test_store().await;
    let patch = SettingsPatch {
        auto_react: Some(true),
        reactions: Some(vec!["🔥".into()]),
        ..Default::default()
    };
    let s = store.update_settings("b2", &patch).await.unwrap();
    assert!(s.auto_react);
    assert_eq!(s.reactions, vec!["🔥".to_string()]);
    assert!(s.react_to_commands);

    let again = store.settings_for("b2").await.unwrap();
    assert_eq!(again, s);
}

#[tokio::test]
async fn test_broadcast_log_appends() {
    let (_dir, store) = test_store().await;
    store
        .insert_broadcast(&BroadcastEntry::new("hello", 3))
        .await
        .unwrap();
    store
        .insert_broadcast(&BroadcastEntry::new("again", 0))
        .await
        .unwrap();
    let log = store.list_broadcasts().await.unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].message, "hello");
    assert_eq!(log[0].sent_to, 3);
}

#[tokio::test]
async fn test_concurrent_bot_counters_are_not_lost() {
    let (_dir, store) = test_store().await;
    let user = User::new("a@b.co", "h".into());
    store.insert_user(&user).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..10 {
        let store = store.clone();
        let id = user.id.clone();
        handles.push(tokio::spawn(async move {
            store.record_bot_created(&id).await.unwrap()
        }));
    }
    for h in handles {
        assert!(h.await.unwrap());
    }
    assert_eq!(store.get_user(&user.id).await.unwrap().unwrap().total_bots, 10);

    let mut handles = Vec::new();
    for _ in 0..4 {
        let store = store.clone();
        let id = user.id.clone();
        handles.push(tokio::spawn(async move {
            store.record_bot_deleted(&id).await.unwrap()
        }));
    }
    for h in handles {
        h.await.unwrap();
    }
    assert_eq!(store.get_user(&user.id).await.unwrap().unwrap().total_bots, 6);
}

#[tokio::test]
async fn test_reserve_bot_slot_enforces_limit_under_contention() {
    let (_dir, store) = test_store().await;
    let user = User::new("a@b.co", "h".into());
    store.insert_user(&user).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..10 {
        let store = store.clone();
        let id = user.id.clone();
        handles.push(tokio::spawn(async move {
            store.reserve_bot_slot(&id, 3).await.unwrap()
        }));
    }
    let mut slots = Vec::new();
    for h in handles {
        slots.push(h.await.unwrap());
    }

    let free = slots
        .iter()
        .filter(|s| **s == BotSlot::Reserved { is_free: true })
        .count();
    let paid = slots
        .iter()
        .filter(|s| **s == BotSlot::Reserved { is_free: false })
        .count();
    let refused = slots.iter().filter(|s| **s == BotSlot::LimitReached).count();
    assert_eq!((free, paid, refused), (1, 2, 7));
    assert_eq!(store.get_user(&user.id).await.unwrap().unwrap().total_bots, 3);

    assert_eq!(
        store.reserve_bot_slot("missing", 3).await.unwrap(),
        BotSlot::UnknownUser
    );
}
