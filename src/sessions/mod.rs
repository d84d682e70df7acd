//! Session registry: one live WhatsApp connection per bot.
//!
//! Each session gets an event loop task that applies lifecycle transitions
//! (QR issued, authenticated, ready, failed, disconnected) to the bot record
//! one event at a time. Inbound messages are dispatched on their own tasks so
//! a failing command never takes the session down.

mod lifecycle;

#[cfg(test)]
mod tests;

use crate::commands::Dispatcher;
use selina_core::{
    config::BotConfig,
    error::SelinaError,
    models::{BotStatus, BroadcastEntry},
    traits::{Connection, ConnectionEvent, ConnectionFactory},
};
use selina_services::Services;
use selina_store::Store;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Buffered lifecycle events per session.
const EVENT_BUFFER: usize = 64;

/// Extra time allowed on top of the transport's own pairing timeout.
const PAIRING_GRACE: Duration = Duration::from_secs(5);

/// In-memory view of a session, as reported by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Inactive,
    Initializing,
    Active,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Inactive => "inactive",
            SessionStatus::Initializing => "initializing",
            SessionStatus::Active => "active",
        }
    }
}

struct SessionHandle {
    connection: Arc<dyn Connection>,
    phone_number: String,
    initialized: bool,
    /// Distinguishes this handle from earlier ones registered under the same id.
    generation: u64,
    events_task: Option<JoinHandle<()>>,
}

/// A registered handle whose transport has not been started yet.
struct PendingStart {
    connection: Arc<dyn Connection>,
    generation: u64,
    events: mpsc::Sender<ConnectionEvent>,
}

/// Owns every bot's connection and its cached QR / pairing code.
pub struct SessionRegistry {
    store: Store,
    factory: Arc<dyn ConnectionFactory>,
    dispatcher: Arc<Dispatcher>,
    services: Arc<Services>,
    bot: BotConfig,
    bot_name: String,
    sessions: Mutex<HashMap<String, SessionHandle>>,
    qr_codes: Mutex<HashMap<String, String>>,
    pairing_codes: Mutex<HashMap<String, String>>,
    next_generation: AtomicU64,
}

impl SessionRegistry {
    pub fn new(
        store: Store,
        factory: Arc<dyn ConnectionFactory>,
        dispatcher: Arc<Dispatcher>,
        services: Arc<Services>,
        bot: BotConfig,
        bot_name: &str,
    ) -> Self {
        Self {
            store,
            factory,
            dispatcher,
            services,
            bot,
            bot_name: bot_name.to_string(),
            sessions: Mutex::new(HashMap::new()),
            qr_codes: Mutex::new(HashMap::new()),
            pairing_codes: Mutex::new(HashMap::new()),
            next_generation: AtomicU64::new(1),
        }
    }

    /// Start a session for `bot_id` and wait for the transport to come up.
    ///
    /// Returns `Ok(false)` when one is already registered. On a failed start
    /// the handle is dropped again and the bot record is marked `failed`.
    pub async fn create_session(
        self: &Arc<Self>,
        bot_id: &str,
        phone_number: &str,
    ) -> Result<bool, SelinaError> {
        let Some(pending) = self.register(bot_id, phone_number).await else {
            return Ok(false);
        };
        self.start(bot_id, pending).await?;
        Ok(true)
    }

    /// Register a session now and bring the transport up in the background.
    ///
    /// The handle is visible to `get_status` and `stop_session` as soon as this
    /// returns. Returns false when one was already registered.
    pub async fn spawn_session(self: &Arc<Self>, bot_id: &str, phone_number: &str) -> bool {
        let Some(pending) = self.register(bot_id, phone_number).await else {
            return false;
        };
        let registry = Arc::clone(self);
        let id = bot_id.to_string();
        tokio::spawn(async move {
            if let Err(e) = registry.start(&id, pending).await {
                warn!("[{id}] session start failed: {e}");
            }
        });
        true
    }

    /// Insert the handle, mark the record pending and start its event loop.
    async fn register(self: &Arc<Self>, bot_id: &str, phone_number: &str) -> Option<PendingStart> {
        let (connection, generation) = {
            let mut sessions = lock(&self.sessions);
            if sessions.contains_key(bot_id) {
                warn!("[{bot_id}] session already exists");
                return None;
            }
            let connection = self.factory.create(bot_id, phone_number);
            let generation = self.next_generation.fetch_add(1, Ordering::SeqCst);
            sessions.insert(
                bot_id.to_string(),
                SessionHandle {
                    connection: connection.clone(),
                    phone_number: phone_number.to_string(),
                    initialized: false,
                    generation,
                    events_task: None,
                },
            );
            (connection, generation)
        };
        info!("[{bot_id}] creating session for {phone_number}");
        self.persist(bot_id, BotStatus::Pending, json!({})).await;

        let (events, mut rx) = mpsc::channel(EVENT_BUFFER);
        let registry = Arc::clone(self);
        let id = bot_id.to_string();
        let task = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                registry.apply(&id, generation, event).await;
            }
        });
        if let Some(handle) = lock(&self.sessions).get_mut(bot_id) {
            if handle.generation == generation {
                handle.events_task = Some(task);
            }
        }
        Some(PendingStart {
            connection,
            generation,
            events,
        })
    }

    async fn start(&self, bot_id: &str, pending: PendingStart) -> Result<(), SelinaError> {
        let PendingStart {
            connection,
            generation,
            events,
        } = pending;
        if let Err(e) = connection.connect(events).await {
            warn!("[{bot_id}] failed to start connection: {e}");
            if let Some(task) = self
                .deregister(bot_id, Some(generation))
                .and_then(|h| h.events_task)
            {
                task.abort();
            }
            self.persist(bot_id, BotStatus::Failed, json!({ "error": e.to_string() }))
                .await;
            return Err(e);
        }
        Ok(())
    }

    /// Ask the transport for a phone-pairing code. `None` when the bot has no
    /// session or the transport could not produce one.
    pub async fn request_pairing_code(&self, bot_id: &str, phone_number: &str) -> Option<String> {
        let connection = self.connection(bot_id)?;
        let timeout = Duration::from_secs(self.bot.pairing_timeout_secs) + PAIRING_GRACE;

        let code = match tokio::time::timeout(timeout, connection.request_pairing_code(phone_number))
            .await
        {
            Ok(Ok(code)) => code,
            Ok(Err(e)) => {
                warn!("[{bot_id}] pairing code request failed: {e}");
                return None;
            }
            Err(_) => {
                warn!("[{bot_id}] pairing code request timed out");
                return None;
            }
        };

        lock(&self.pairing_codes).insert(bot_id.to_string(), code.clone());
        self.update(
            bot_id,
            json!({
                "pairingCode": code,
                "pairingPhoneNumber": phone_number,
                "pairingGeneratedAt": chrono::Utc::now(),
            }),
        )
        .await;
        info!("[{bot_id}] pairing code generated");
        Some(code)
    }

    /// Latest QR code as a PNG data URL.
    pub fn get_qr(&self, bot_id: &str) -> Option<String> {
        lock(&self.qr_codes).get(bot_id).cloned()
    }

    /// Latest pairing code produced for the bot.
    pub fn get_pairing_code(&self, bot_id: &str) -> Option<String> {
        lock(&self.pairing_codes).get(bot_id).cloned()
    }

    pub fn get_status(&self, bot_id: &str) -> SessionStatus {
        match lock(&self.sessions).get(bot_id) {
            None => SessionStatus::Inactive,
            Some(h) if h.initialized => SessionStatus::Active,
            Some(_) => SessionStatus::Initializing,
        }
    }

    /// Phone number a live session was created for.
    pub fn phone_number(&self, bot_id: &str) -> Option<String> {
        lock(&self.sessions)
            .get(bot_id)
            .map(|h| h.phone_number.clone())
    }

    /// Tear a session down. Returns false when nothing was registered.
    pub async fn stop_session(&self, bot_id: &str) -> bool {
        let Some(handle) = self.deregister(bot_id, None) else {
            return false;
        };
        if let Some(task) = handle.events_task {
            task.abort();
        }
        if let Err(e) = handle.connection.destroy().await {
            warn!("[{bot_id}] error while destroying connection: {e}");
        }
        info!("[{bot_id}] session stopped");
        true
    }

    /// Send `text` to every direct chat of one bot. Returns the number of
    /// chats that received it.
    pub async fn broadcast(&self, bot_id: &str, text: &str) -> u64 {
        let connection = {
            let sessions = lock(&self.sessions);
            match sessions.get(bot_id) {
                Some(h) if h.initialized => h.connection.clone(),
                _ => return 0,
            }
        };

        let chats = match connection.chats().await {
            Ok(chats) => chats,
            Err(e) => {
                warn!("[{bot_id}] broadcast: could not list chats: {e}");
                return 0;
            }
        };

        let body = broadcast_text(&self.bot_name, text);
        let delay = Duration::from_secs(self.bot.broadcast_delay_secs);
        let mut sent = 0;
        let mut attempted = 0;
        for chat in chats.iter().filter(|c| !c.is_group) {
            if attempted > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            attempted += 1;
            match connection.send_text(&chat.id, &body).await {
                Ok(()) => sent += 1,
                Err(e) => warn!("[{bot_id}] broadcast to {} failed: {e}", chat.id),
            }
        }
        info!("[{bot_id}] broadcast delivered to {sent}/{attempted} chats");
        sent
    }

    /// Broadcast through every bot whose record is `active`, then log the run.
    pub async fn broadcast_to_active(&self, text: &str) -> Result<BroadcastEntry, SelinaError> {
        let bots = self.store.bots_with_status(BotStatus::Active).await?;
        let mut total = 0;
        for bot in &bots {
            total += self.broadcast(&bot.id, text).await;
        }
        let entry = BroadcastEntry::new(text, total);
        self.store.insert_broadcast(&entry).await?;
        info!("admin broadcast sent to {total} chats via {} bots", bots.len());
        Ok(entry)
    }

    /// Tear every session down.
    pub async fn stop_all(&self) {
        let ids: Vec<String> = lock(&self.sessions).keys().cloned().collect();
        for id in &ids {
            self.stop_session(id).await;
        }
        if !ids.is_empty() {
            info!("stopped {} sessions", ids.len());
        }
    }

    /// Re-create sessions for bots that were linked when the process last ran.
    pub async fn resume_persisted(self: &Arc<Self>) -> Result<usize, SelinaError> {
        let mut bots = self.store.bots_with_status(BotStatus::Active).await?;
        bots.extend(self.store.bots_with_status(BotStatus::Authenticated).await?);

        let mut resumed = 0;
        for bot in bots {
            match self.create_session(&bot.id, &bot.phone_number).await {
                Ok(true) => resumed += 1,
                Ok(false) => {}
                Err(e) => warn!("[{}] resume failed: {e}", bot.id),
            }
        }
        info!("resumed {resumed} sessions");
        Ok(resumed)
    }

    pub fn session_count(&self) -> usize {
        lock(&self.sessions).len()
    }

    fn connection(&self, bot_id: &str) -> Option<Arc<dyn Connection>> {
        lock(&self.sessions)
            .get(bot_id)
            .map(|h| h.connection.clone())
    }

    /// Remove the handle and cached codes. With `generation` set, only a
    /// handle of that generation is removed.
    fn deregister(&self, bot_id: &str, generation: Option<u64>) -> Option<SessionHandle> {
        let handle = {
            let mut sessions = lock(&self.sessions);
            let current = sessions.get(bot_id).map(|h| h.generation);
            match (current, generation) {
                (None, _) => return None,
                (Some(c), Some(g)) if c != g => return None,
                _ => sessions.remove(bot_id),
            }
        };
        lock(&self.qr_codes).remove(bot_id);
        lock(&self.pairing_codes).remove(bot_id);
        handle
    }

    fn is_current(&self, bot_id: &str, generation: u64) -> bool {
        lock(&self.sessions)
            .get(bot_id)
            .is_some_and(|h| h.generation == generation)
    }

    async fn persist(&self, bot_id: &str, status: BotStatus, extra: Value) {
        match self.store.set_bot_status(bot_id, status, extra).await {
            Ok(true) => {}
            Ok(false) => warn!("[{bot_id}] no bot record to mark {}", status.as_str()),
            Err(e) => warn!("[{bot_id}] failed to persist {}: {e}", status.as_str()),
        }
    }

    async fn update(&self, bot_id: &str, partial: Value) {
        if let Err(e) = self.store.update_bot(bot_id, partial).await {
            warn!("[{bot_id}] failed to update bot record: {e}");
        }
    }
}

pub fn broadcast_text(bot_name: &str, message: &str) -> String {
    format!("📢 *BROADCAST*\n\n{message}\n\n_From {bot_name}_")
}

/// Lock a registry map, recovering from poisoning.
fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}
