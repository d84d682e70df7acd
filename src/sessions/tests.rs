use super::*;
use crate::testing::{chat, test_config, FakeConnection, FakeFactory};
use selina_core::{message::InboundMessage, models::BotRecord, traits::ConnectionEvent};
use std::sync::atomic::Ordering as AtomicOrdering;

async fn setup(
    dir: &std::path::Path,
    factory: FakeFactory,
) -> (Arc<SessionRegistry>, Arc<FakeFactory>, Store) {
    setup_with(test_config(dir), factory).await
}

async fn setup_with(
    config: selina_core::config::Config,
    factory: FakeFactory,
) -> (Arc<SessionRegistry>, Arc<FakeFactory>, Store) {
    let store = Store::new(&config.selina.records_dir()).await.unwrap();
    let services = Arc::new(Services::new(config.services.clone(), "Queen Selina").unwrap());
    let dispatcher = Arc::new(Dispatcher::new(
        store.clone(),
        services.clone(),
        config.bot.clone(),
        "Queen Selina",
    ));
    let factory = Arc::new(factory);
    let registry = Arc::new(SessionRegistry::new(
        store.clone(),
        factory.clone(),
        dispatcher,
        services,
        config.bot.clone(),
        "Queen Selina",
    ));
    (registry, factory, store)
}

async fn insert_bot(store: &Store) -> String {
    let bot = BotRecord::new("user-1", "94771234567", true, 30);
    store.insert_bot(&bot).await.unwrap();
    bot.id
}

/// Poll until `check` holds, failing after two seconds.
async fn eventually(mut check: impl FnMut() -> bool) {
    for _ in 0..200 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}

async fn wait_for_status(store: &Store, bot_id: &str, status: BotStatus) -> BotRecord {
    for _ in 0..200 {
        let bot = store.get_bot(bot_id).await.unwrap().unwrap();
        if bot.status == status {
            return bot;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("bot {bot_id} never reached {status:?}");
}

async fn ready_session(registry: &Arc<SessionRegistry>, factory: &FakeFactory, id: &str) {
    registry.create_session(id, "94771234567").await.unwrap();
    factory.last().emit(ConnectionEvent::Ready).await;
    eventually(|| registry.get_status(id) == SessionStatus::Active).await;
}

#[tokio::test]
async fn test_unknown_bot_is_inactive() {
    let tmp = tempfile::tempdir().unwrap();
    let (registry, _, _) = setup(tmp.path(), FakeFactory::default()).await;

    assert_eq!(registry.get_status("nope"), SessionStatus::Inactive);
    assert!(registry.get_qr("nope").is_none());
    assert!(registry.request_pairing_code("nope", "94771234567").await.is_none());
    assert!(!registry.stop_session("nope").await);
    assert_eq!(registry.broadcast("nope", "hi").await, 0);
}

#[tokio::test]
async fn test_create_session_twice_registers_once() {
    let tmp = tempfile::tempdir().unwrap();
    let (registry, factory, store) = setup(tmp.path(), FakeFactory::default()).await;
    let id = insert_bot(&store).await;

    assert!(registry.create_session(&id, "94771234567").await.unwrap());
    assert!(!registry.create_session(&id, "94771234567").await.unwrap());

    assert_eq!(factory.count(), 1);
    assert_eq!(registry.session_count(), 1);
    assert_eq!(registry.get_status(&id), SessionStatus::Initializing);
    assert_eq!(registry.phone_number(&id).as_deref(), Some("94771234567"));
    let bot = store.get_bot(&id).await.unwrap().unwrap();
    assert_eq!(bot.status, BotStatus::Pending);
}

#[tokio::test]
async fn test_qr_event_is_cached_and_persisted() {
    let tmp = tempfile::tempdir().unwrap();
    let (registry, factory, store) = setup(tmp.path(), FakeFactory::default()).await;
    let id = insert_bot(&store).await;
    registry.create_session(&id, "94771234567").await.unwrap();

    factory
        .last()
        .emit(ConnectionEvent::Qr("2@abc,def,ghi".into()))
        .await;
    eventually(|| registry.get_qr(&id).is_some()).await;

    let qr = registry.get_qr(&id).unwrap();
    assert!(qr.starts_with("data:image/png;base64,"));
    let bot = store.get_bot(&id).await.unwrap().unwrap();
    assert_eq!(bot.qr_code.as_deref(), Some(qr.as_str()));
    assert_eq!(bot.status, BotStatus::Pending);
}

#[tokio::test]
async fn test_ready_marks_active_and_clears_qr() {
    let tmp = tempfile::tempdir().unwrap();
    let (registry, factory, store) = setup(tmp.path(), FakeFactory::default()).await;
    let id = insert_bot(&store).await;
    registry.create_session(&id, "94771234567").await.unwrap();
    let conn = factory.last();

    conn.emit(ConnectionEvent::Qr("2@abc".into())).await;
    conn.emit(ConnectionEvent::Authenticated).await;
    wait_for_status(&store, &id, BotStatus::Authenticated).await;
    conn.emit(ConnectionEvent::Ready).await;

    let bot = wait_for_status(&store, &id, BotStatus::Active).await;
    assert!(bot.connected_at.is_some());
    assert_eq!(registry.get_status(&id), SessionStatus::Active);
    assert!(registry.get_qr(&id).is_none());
}

#[tokio::test]
async fn test_disconnect_removes_session() {
    let tmp = tempfile::tempdir().unwrap();
    let (registry, factory, store) = setup(tmp.path(), FakeFactory::default()).await;
    let id = insert_bot(&store).await;
    registry.create_session(&id, "94771234567").await.unwrap();
    let conn = factory.last();

    conn.emit(ConnectionEvent::Qr("2@abc".into())).await;
    eventually(|| registry.get_qr(&id).is_some()).await;
    conn.emit(ConnectionEvent::Disconnected("closed".into()))
        .await;

    let bot = wait_for_status(&store, &id, BotStatus::Disconnected).await;
    assert!(bot.disconnected_at.is_some());
    eventually(|| registry.get_status(&id) == SessionStatus::Inactive).await;
    assert!(registry.get_qr(&id).is_none());
    assert!(conn.destroyed.load(AtomicOrdering::SeqCst));
}

#[tokio::test]
async fn test_auth_failure_keeps_handle() {
    let tmp = tempfile::tempdir().unwrap();
    let (registry, factory, store) = setup(tmp.path(), FakeFactory::default()).await;
    let id = insert_bot(&store).await;
    registry.create_session(&id, "94771234567").await.unwrap();

    factory
        .last()
        .emit(ConnectionEvent::AuthFailure("logged out".into()))
        .await;

    let bot = wait_for_status(&store, &id, BotStatus::Failed).await;
    assert_eq!(bot.error.as_deref(), Some("logged out"));
    assert_eq!(registry.get_status(&id), SessionStatus::Initializing);
}

#[tokio::test]
async fn test_stale_generation_is_ignored() {
    let tmp = tempfile::tempdir().unwrap();
    let (registry, _, store) = setup(tmp.path(), FakeFactory::default()).await;
    let id = insert_bot(&store).await;
    registry.create_session(&id, "94771234567").await.unwrap();

    registry.apply(&id, 9_999, ConnectionEvent::Ready).await;

    assert_eq!(registry.get_status(&id), SessionStatus::Initializing);
    let bot = store.get_bot(&id).await.unwrap().unwrap();
    assert_eq!(bot.status, BotStatus::Pending);
}

#[tokio::test]
async fn test_connect_failure_marks_failed() {
    let tmp = tempfile::tempdir().unwrap();
    let factory = FakeFactory::new(|| FakeConnection {
        fail_connect: true,
        ..Default::default()
    });
    let (registry, _, store) = setup(tmp.path(), factory).await;
    let id = insert_bot(&store).await;

    assert!(registry.create_session(&id, "94771234567").await.is_err());

    assert_eq!(registry.get_status(&id), SessionStatus::Inactive);
    let bot = store.get_bot(&id).await.unwrap().unwrap();
    assert_eq!(bot.status, BotStatus::Failed);
    assert!(bot.error.unwrap().contains("refused to start"));
}

#[tokio::test]
async fn test_pairing_code_is_cached_and_persisted() {
    let tmp = tempfile::tempdir().unwrap();
    let factory = FakeFactory::new(|| FakeConnection {
        pairing_code: Some("ABCD-1234".into()),
        ..Default::default()
    });
    let (registry, _, store) = setup(tmp.path(), factory).await;
    let id = insert_bot(&store).await;
    registry.create_session(&id, "94771234567").await.unwrap();

    let code = registry.request_pairing_code(&id, "94771234567").await;

    assert_eq!(code.as_deref(), Some("ABCD-1234"));
    assert_eq!(registry.get_pairing_code(&id).as_deref(), Some("ABCD-1234"));
    let bot = store.get_bot(&id).await.unwrap().unwrap();
    assert_eq!(bot.pairing_code.as_deref(), Some("ABCD-1234"));
    assert_eq!(bot.pairing_phone_number.as_deref(), Some("94771234567"));
    assert!(bot.pairing_generated_at.is_some());
}

#[tokio::test]
async fn test_pairing_code_transport_error_is_none() {
    let tmp = tempfile::tempdir().unwrap();
    let (registry, _, store) = setup(tmp.path(), FakeFactory::default()).await;
    let id = insert_bot(&store).await;
    registry.create_session(&id, "94771234567").await.unwrap();

    assert!(registry.request_pairing_code(&id, "94771234567").await.is_none());
    assert!(registry.get_pairing_code(&id).is_none());
}

#[tokio::test]
async fn test_broadcast_counts_successful_direct_chats() {
    let tmp = tempfile::tempdir().unwrap();
    let factory = FakeFactory::new(|| FakeConnection {
        chats: vec![
            chat("1@s.whatsapp.net", false),
            chat("2@s.whatsapp.net", false),
            chat("group@g.us", true),
            chat("3@s.whatsapp.net", false),
        ],
        fail_send_to: Some("2@s.whatsapp.net".into()),
        ..Default::default()
    });
    let (registry, factory, store) = setup(tmp.path(), factory).await;
    let id = insert_bot(&store).await;
    ready_session(&registry, &factory, &id).await;

    assert_eq!(registry.broadcast(&id, "Hello all").await, 2);

    let sent = factory.last().sent.lock().unwrap().clone();
    let targets: Vec<&str> = sent.iter().map(|(chat, _)| chat.as_str()).collect();
    assert_eq!(targets, vec!["1@s.whatsapp.net", "3@s.whatsapp.net"]);
    assert_eq!(sent[0].1, broadcast_text("Queen Selina", "Hello all"));
}

#[tokio::test]
async fn test_broadcast_waits_between_sends_only() {
    let tmp = tempfile::tempdir().unwrap();
    let mut config = test_config(tmp.path());
    config.bot.broadcast_delay_secs = 3;
    let factory = FakeFactory::new(|| FakeConnection {
        chats: vec![
            chat("1@s.whatsapp.net", false),
            chat("2@s.whatsapp.net", false),
            chat("3@s.whatsapp.net", false),
        ],
        ..Default::default()
    });
    let (registry, factory, store) = setup_with(config, factory).await;
    let id = insert_bot(&store).await;
    ready_session(&registry, &factory, &id).await;
    wait_for_status(&store, &id, BotStatus::Active).await;

    tokio::time::pause();
    let started = tokio::time::Instant::now();
    assert_eq!(registry.broadcast(&id, "throttled").await, 3);
    let elapsed = started.elapsed();

    assert!(elapsed >= Duration::from_secs(6), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_secs(7), "elapsed {elapsed:?}");
}

#[tokio::test]
async fn test_broadcast_requires_ready_session() {
    let tmp = tempfile::tempdir().unwrap();
    let factory = FakeFactory::new(|| FakeConnection {
        chats: vec![chat("1@s.whatsapp.net", false)],
        ..Default::default()
    });
    let (registry, _, store) = setup(tmp.path(), factory).await;
    let id = insert_bot(&store).await;
    registry.create_session(&id, "94771234567").await.unwrap();

    assert_eq!(registry.broadcast(&id, "too early").await, 0);
}

#[tokio::test]
async fn test_broadcast_to_active_logs_entry() {
    let tmp = tempfile::tempdir().unwrap();
    let factory = FakeFactory::new(|| FakeConnection {
        chats: vec![chat("1@s.whatsapp.net", false)],
        ..Default::default()
    });
    let (registry, factory, store) = setup(tmp.path(), factory).await;
    let id = insert_bot(&store).await;
    ready_session(&registry, &factory, &id).await;
    wait_for_status(&store, &id, BotStatus::Active).await;

    let entry = registry.broadcast_to_active("News").await.unwrap();

    assert_eq!(entry.sent_to, 1);
    assert_eq!(entry.message, "News");
    let log = store.list_broadcasts().await.unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].id, entry.id);
}

#[tokio::test]
async fn test_inbound_message_is_dispatched() {
    let tmp = tempfile::tempdir().unwrap();
    let (registry, factory, store) = setup(tmp.path(), FakeFactory::default()).await;
    let id = insert_bot(&store).await;
    registry.create_session(&id, "94771234567").await.unwrap();
    let conn = factory.last();

    conn.emit(ConnectionEvent::Message(InboundMessage::text(
        "1@s.whatsapp.net",
        ".alive",
    )))
    .await;

    eventually(|| !conn.sent_texts().is_empty()).await;
    assert!(conn.sent_texts()[0].contains("*Status:* Online"));
    assert_eq!(registry.get_status(&id), SessionStatus::Initializing);
}

#[tokio::test]
async fn test_handler_panic_keeps_session_alive() {
    let tmp = tempfile::tempdir().unwrap();
    let factory = FakeFactory::new(|| FakeConnection {
        panic_send_to: Some("boom@s.whatsapp.net".into()),
        ..Default::default()
    });
    let (registry, factory, store) = setup(tmp.path(), factory).await;
    let id = insert_bot(&store).await;
    ready_session(&registry, &factory, &id).await;
    let conn = factory.last();

    conn.emit(ConnectionEvent::Message(InboundMessage::text(
        "boom@s.whatsapp.net",
        ".alive",
    )))
    .await;
    conn.emit(ConnectionEvent::Message(InboundMessage::text(
        "1@s.whatsapp.net",
        ".alive",
    )))
    .await;

    eventually(|| !conn.sent_texts().is_empty()).await;
    let sent = conn.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "1@s.whatsapp.net");
    assert_eq!(registry.get_status(&id), SessionStatus::Active);
    assert_eq!(registry.session_count(), 1);

    conn.emit(ConnectionEvent::Message(InboundMessage::text(
        "2@s.whatsapp.net",
        ".alive",
    )))
    .await;
    eventually(|| conn.sent_texts().len() == 2).await;
}

#[tokio::test]
async fn test_stop_session_destroys_connection() {
    let tmp = tempfile::tempdir().unwrap();
    let (registry, factory, store) = setup(tmp.path(), FakeFactory::default()).await;
    let id = insert_bot(&store).await;
    registry.create_session(&id, "94771234567").await.unwrap();

    assert!(registry.stop_session(&id).await);

    assert!(factory.last().destroyed.load(AtomicOrdering::SeqCst));
    assert_eq!(registry.get_status(&id), SessionStatus::Inactive);
    assert!(registry.create_session(&id, "94771234567").await.unwrap());
    assert_eq!(factory.count(), 2);
}

#[tokio::test]
async fn test_stop_all() {
    let tmp = tempfile::tempdir().unwrap();
    let (registry, factory, store) = setup(tmp.path(), FakeFactory::default()).await;
    let a = insert_bot(&store).await;
    let b = insert_bot(&store).await;
    registry.create_session(&a, "94771234567").await.unwrap();
    registry.create_session(&b, "94771234568").await.unwrap();

    registry.stop_all().await;

    assert_eq!(registry.session_count(), 0);
    let created = factory.created.lock().unwrap().clone();
    assert!(created
        .iter()
        .all(|c| c.destroyed.load(AtomicOrdering::SeqCst)));
}

#[tokio::test]
async fn test_resume_persisted_linked_bots() {
    let tmp = tempfile::tempdir().unwrap();
    let (registry, factory, store) = setup(tmp.path(), FakeFactory::default()).await;
    let active = insert_bot(&store).await;
    let authenticated = insert_bot(&store).await;
    let failed = insert_bot(&store).await;
    store
        .set_bot_status(&active, BotStatus::Active, serde_json::json!({}))
        .await
        .unwrap();
    store
        .set_bot_status(&authenticated, BotStatus::Authenticated, serde_json::json!({}))
        .await
        .unwrap();
    store
        .set_bot_status(&failed, BotStatus::Failed, serde_json::json!({}))
        .await
        .unwrap();

    assert_eq!(registry.resume_persisted().await.unwrap(), 2);

    assert_eq!(factory.count(), 2);
    assert_eq!(registry.get_status(&failed), SessionStatus::Inactive);
    assert_eq!(registry.get_status(&active), SessionStatus::Initializing);
}
