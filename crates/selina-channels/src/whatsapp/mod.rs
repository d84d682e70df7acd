//! WhatsApp connection, pure Rust implementation via `whatsapp-rust`.
//!
//! Uses the WhatsApp Web protocol (Noise handshake + Signal encryption).
//! Linking is done by scanning a QR code or entering a phone-pairing code.
//! Each bot keeps its own session at `{sessions_dir}/{bot_id}/whatsapp.db`.

mod bot;
mod chats;
mod connection;
mod events;
mod send;


use selina_core::{
    config::Config,
    message::ChatRef,
    traits::{Connection, ConnectionEvent, ConnectionFactory},
};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;

/// One linked WhatsApp account.
pub struct WhatsAppConnection {
    pub(super) bot_id: String,
    pub(super) phone_number: String,
    pub(super) session_dir: PathBuf,
    pub(super) device_name: String,
    pub(super) pairing_timeout: Duration,
    pub(super) state: Arc<SharedState>,
}

/// State shared with the running bot's event handler.
#[derive(Default)]
pub(super) struct SharedState {
    /// Client handle for sending messages, set once the bot is built.
    pub(super) client: Mutex<Option<Arc<whatsapp_rust::client::Client>>>,
    /// Lifecycle events go here; `None` once destroyed.
    pub(super) events: Mutex<Option<mpsc::Sender<ConnectionEvent>>>,
    /// Conversations seen on this account, keyed by JID.
    pub(super) chats: Mutex<HashMap<String, ChatRef>>,
    /// Message IDs we sent, used to ignore our own echo.
    pub(super) sent_ids: Mutex<HashSet<String>>,
    /// Resolved by the handler when the next pairing code arrives.
    pub(super) pairing_waiter: Mutex<Option<oneshot::Sender<String>>>,
    /// Background task driving the bot.
    pub(super) run_handle: Mutex<Option<JoinHandle<()>>>,
}

impl WhatsAppConnection {
    pub fn new(
        bot_id: &str,
        phone_number: &str,
        sessions_dir: PathBuf,
        device_name: &str,
        pairing_timeout: Duration,
    ) -> Self {
        Self {
            bot_id: bot_id.to_string(),
            phone_number: phone_number.to_string(),
            session_dir: sessions_dir.join(bot_id),
            device_name: device_name.to_string(),
            pairing_timeout,
            state: Arc::new(SharedState::default()),
        }
    }

    /// Check if the WhatsApp client is currently available.
    pub async fn is_connected(&self) -> bool {
        self.state.client.lock().await.is_some()
    }

    pub(super) fn session_db_path(&self) -> PathBuf {
        self.session_dir.join("whatsapp.db")
    }
}

/// Builds a [`WhatsAppConnection`] per bot.
pub struct WhatsAppConnectionFactory {
    sessions_dir: PathBuf,
    device_name: String,
    pairing_timeout: Duration,
}

impl WhatsAppConnectionFactory {
    pub fn new(config: &Config) -> Self {
        Self {
            sessions_dir: config.selina.sessions_dir(),
            device_name: config.selina.name.clone(),
            pairing_timeout: Duration::from_secs(config.bot.pairing_timeout_secs),
        }
    }
}

impl ConnectionFactory for WhatsAppConnectionFactory {
    fn create(&self, bot_id: &str, phone_number: &str) -> Arc<dyn Connection> {
        Arc::new(WhatsAppConnection::new(
            bot_id,
            phone_number,
            self.sessions_dir.clone(),
            &self.device_name,
            self.pairing_timeout,
        ))
    }
}
