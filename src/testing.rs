//! Scripted connection fakes shared by the binary's tests.

use async_trait::async_trait;
use selina_core::{
    config::Config,
    error::SelinaError,
    message::{ChatRef, InboundMessage, Media, MediaKind},
    traits::{Connection, ConnectionEvent, ConnectionFactory},
};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Closed local port: every request fails fast with a connection error.
pub const DEAD_ENDPOINT: &str = "http://127.0.0.1:9";

/// Config rooted in `dir` with every external endpoint unreachable.
pub fn test_config(dir: &Path) -> Config {
    let mut config = Config::default();
    config.selina.data_dir = dir.to_string_lossy().into_owned();
    config.bot.broadcast_delay_secs = 0;
    config.bot.pairing_timeout_secs = 2;
    config.bot.profile_picture_url = String::new();

    let s = &mut config.services;
    for url in [
        &mut s.google_url,
        &mut s.popcat_url,
        &mut s.simsimi_url,
        &mut s.hercai_url,
        &mut s.tiktok_url,
        &mut s.instagram_url,
        &mut s.facebook_url,
        &mut s.spotify_url,
        &mut s.apkpure_url,
        &mut s.infinity_url,
        &mut s.weather_url,
        &mut s.joke_url,
        &mut s.quote_url,
        &mut s.translate_url,
    ] {
        *url = DEAD_ENDPOINT.to_string();
    }
    s.ai_budget_secs = 5;
    config
}

/// In-memory connection that records everything sent through it.
#[derive(Default)]
pub struct FakeConnection {
    pub events: Mutex<Option<mpsc::Sender<ConnectionEvent>>>,
    pub sent: Mutex<Vec<(String, String)>>,
    pub media: Mutex<Vec<(String, MediaKind)>>,
    pub reactions: Mutex<Vec<String>>,
    pub typing: AtomicUsize,
    pub destroyed: AtomicBool,
    pub chats: Vec<ChatRef>,
    /// Sends into this chat fail.
    pub fail_send_to: Option<String>,
    /// Sends into this chat panic.
    pub panic_send_to: Option<String>,
    /// Returned by `request_pairing_code`; `None` makes it fail.
    pub pairing_code: Option<String>,
    pub fail_connect: bool,
}

impl FakeConnection {
    /// Push an event as if the transport produced it.
    pub async fn emit(&self, event: ConnectionEvent) {
        let sender = self.events.lock().unwrap().clone();
        sender
            .expect("connect() was not called")
            .send(event)
            .await
            .expect("event loop gone");
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(_, text)| text.clone())
            .collect()
    }
}

#[async_trait]
impl Connection for FakeConnection {
    async fn connect(&self, events: mpsc::Sender<ConnectionEvent>) -> Result<(), SelinaError> {
        if self.fail_connect {
            return Err(SelinaError::Connection("transport refused to start".into()));
        }
        *self.events.lock().unwrap() = Some(events);
        Ok(())
    }

    async fn send_text(&self, chat_id: &str, text: &str) -> Result<(), SelinaError> {
        if self.panic_send_to.as_deref() == Some(chat_id) {
            panic!("send to {chat_id} blew up");
        }
        if self.fail_send_to.as_deref() == Some(chat_id) {
            return Err(SelinaError::Connection(format!("send to {chat_id} failed")));
        }
        self.sent
            .lock()
            .unwrap()
            .push((chat_id.to_string(), text.to_string()));
        Ok(())
    }

    async fn send_media(&self, chat_id: &str, media: Media) -> Result<(), SelinaError> {
        self.media
            .lock()
            .unwrap()
            .push((chat_id.to_string(), media.kind));
        Ok(())
    }

    async fn send_typing(&self, _chat_id: &str) -> Result<(), SelinaError> {
        self.typing.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn react(&self, _message: &InboundMessage, emoji: &str) -> Result<(), SelinaError> {
        self.reactions.lock().unwrap().push(emoji.to_string());
        Ok(())
    }

    async fn request_pairing_code(&self, _phone_number: &str) -> Result<String, SelinaError> {
        self.pairing_code
            .clone()
            .ok_or_else(|| SelinaError::Connection("pairing unavailable".into()))
    }

    async fn chats(&self) -> Result<Vec<ChatRef>, SelinaError> {
        Ok(self.chats.clone())
    }

    async fn set_profile_picture(&self, _image: &[u8]) -> Result<(), SelinaError> {
        Ok(())
    }

    async fn destroy(&self) -> Result<(), SelinaError> {
        self.destroyed.store(true, Ordering::SeqCst);
        self.events.lock().unwrap().take();
        Ok(())
    }
}

type MakeFake = Box<dyn Fn() -> FakeConnection + Send + Sync>;

/// Factory that hands out [`FakeConnection`]s and remembers them.
pub struct FakeFactory {
    make: MakeFake,
    pub created: Mutex<Vec<Arc<FakeConnection>>>,
}

impl FakeFactory {
    pub fn new(make: impl Fn() -> FakeConnection + Send + Sync + 'static) -> Self {
        Self {
            make: Box::new(make),
            created: Mutex::new(Vec::new()),
        }
    }

    pub fn last(&self) -> Arc<FakeConnection> {
        self.created
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no connection created")
    }

    pub fn count(&self) -> usize {
        self.created.lock().unwrap().len()
    }
}

impl Default for FakeFactory {
    fn default() -> Self {
        Self::new(FakeConnection::default)
    }
}

impl ConnectionFactory for FakeFactory {
    fn create(&self, _bot_id: &str, _phone_number: &str) -> Arc<dyn Connection> {
        let conn = Arc::new((self.make)());
        self.created.lock().unwrap().push(conn.clone());
        conn
    }
}

pub fn chat(id: &str, is_group: bool) -> ChatRef {
    ChatRef {
        id: id.to_string(),
        name: None,
        is_group,
    }
}
