use super::{lock, SessionRegistry};
use selina_channels::qr_data_url;
use selina_core::{
    message::InboundMessage,
    models::{BotStatus, Settings},
    traits::{Connection, ConnectionEvent},
};
use serde_json::json;
use tracing::{debug, error, info, warn};

impl SessionRegistry {
    /// Apply one connection event. Events from a replaced or removed handle are dropped.
    pub(super) async fn apply(&self, bot_id: &str, generation: u64, event: ConnectionEvent) {
        if !self.is_current(bot_id, generation) {
            debug!("[{bot_id}] ignoring event from stale session");
            return;
        }

        match event {
            ConnectionEvent::Qr(raw) => self.on_qr(bot_id, &raw).await,
            ConnectionEvent::PairingCode(code) => {
                lock(&self.pairing_codes).insert(bot_id.to_string(), code.clone());
                self.update(bot_id, json!({ "pairingCode": code })).await;
            }
            ConnectionEvent::Authenticated => {
                info!("[{bot_id}] authenticated");
                self.persist(bot_id, BotStatus::Authenticated, json!({}))
                    .await;
            }
            ConnectionEvent::Ready => self.on_ready(bot_id, generation).await,
            ConnectionEvent::AuthFailure(reason) => {
                warn!("[{bot_id}] authentication failed: {reason}");
                self.persist(bot_id, BotStatus::Failed, json!({ "error": reason }))
                    .await;
            }
            ConnectionEvent::Disconnected(reason) => {
                self.on_disconnected(bot_id, generation, &reason).await
            }
            ConnectionEvent::Message(message) => self.on_message(bot_id, message),
        }
    }

    async fn on_qr(&self, bot_id: &str, raw: &str) {
        let data_url = match qr_data_url(raw) {
            Ok(url) => url,
            Err(e) => {
                warn!("[{bot_id}] could not render QR code: {e}");
                return;
            }
        };
        self.persist(bot_id, BotStatus::Pending, json!({ "qrCode": data_url }))
            .await;
        lock(&self.qr_codes).insert(bot_id.to_string(), data_url);
        info!("[{bot_id}] QR code ready");
    }

    async fn on_ready(&self, bot_id: &str, generation: u64) {
        let connection = {
            let mut sessions = lock(&self.sessions);
            match sessions.get_mut(bot_id) {
                Some(h) if h.generation == generation => {
                    h.initialized = true;
                    h.connection.clone()
                }
                _ => return,
            }
        };
        lock(&self.qr_codes).remove(bot_id);
        self.persist(
            bot_id,
            BotStatus::Active,
            json!({ "connectedAt": chrono::Utc::now() }),
        )
        .await;
        info!("[{bot_id}] ready");

        // Branding and channel join are slow and optional; keep them off the event loop.
        let store = self.store.clone();
        let services = self.services.clone();
        let avatar_url = self.bot.profile_picture_url.clone();
        let channel = self.bot.channel_jid.clone();
        let id = bot_id.to_string();
        tokio::spawn(async move {
            if !avatar_url.is_empty() {
                set_avatar(&id, connection.as_ref(), &services, &avatar_url).await;
            }
            let settings = store
                .settings_for(&id)
                .await
                .unwrap_or_else(|_| Settings::defaults_for(&id));
            if settings.auto_join_channel {
                auto_join_channel(&id, &channel);
            }
        });
    }

    async fn on_disconnected(&self, bot_id: &str, generation: u64, reason: &str) {
        warn!("[{bot_id}] disconnected: {reason}");
        self.persist(
            bot_id,
            BotStatus::Disconnected,
            json!({ "disconnectedAt": chrono::Utc::now() }),
        )
        .await;

        if let Some(handle) = self.deregister(bot_id, Some(generation)) {
            if let Err(e) = handle.connection.destroy().await {
                debug!("[{bot_id}] destroy after disconnect: {e}");
            }
        }
    }

    fn on_message(&self, bot_id: &str, message: InboundMessage) {
        let Some(connection) = self.connection(bot_id) else {
            return;
        };
        let dispatcher = self.dispatcher.clone();
        let id = bot_id.to_string();
        let task = tokio::spawn(async move {
            dispatcher.handle(&id, connection, message).await;
        });

        let id = bot_id.to_string();
        tokio::spawn(async move {
            if let Err(e) = task.await {
                error!("[{id}] message handler crashed: {e}");
            }
        });
    }
}

/// Fetch the configured avatar and apply it. Failures are logged only.
async fn set_avatar(
    bot_id: &str,
    connection: &dyn Connection,
    services: &selina_services::Services,
    url: &str,
) {
    let image = match services.fetch_bytes(url, services.image_timeout()).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("[{bot_id}] could not fetch profile picture: {e}");
            return;
        }
    };
    match connection.set_profile_picture(&image).await {
        Ok(()) => info!("[{bot_id}] profile picture set"),
        Err(e) => warn!("[{bot_id}] could not set profile picture: {e}"),
    }
}

/// Channel auto-join hook. The transport has no newsletter join call, so this only records intent.
fn auto_join_channel(bot_id: &str, channel_jid: &str) {
    if channel_jid.is_empty() {
        debug!("[{bot_id}] auto-join enabled but no channel configured");
    } else {
        info!("[{bot_id}] would join channel {channel_jid}");
    }
}
